//! Per-component hook storage.
//!
//! Each rendered component instance owns a list of slots keyed by its tree
//! position. Hooks claim slots in call order; a render pass marks the
//! instances it visits and [`HookState::sweep`] drops the rest, running
//! their effect cleanups.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::builtins::arg;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::Interpreter;
use crate::value::Value;

#[derive(Debug)]
enum HookSlot {
    State { value: Value, setter: Value },
    Reducer { state: Value, reducer: Value, dispatch: Value },
    Effect { deps: Option<Vec<Value>>, cleanup: Value },
    Memo { deps: Option<Vec<Value>>, value: Value },
    Ref(Value),
    Id(Rc<str>),
}

#[derive(Debug)]
struct Frame {
    key: Rc<str>,
    cursor: usize,
}

#[derive(Debug)]
struct PendingEffect {
    key: Rc<str>,
    index: usize,
    callback: Value,
    layout: bool,
}

/// Hook slots for every mounted component instance in one scope.
#[derive(Debug, Default)]
pub struct HookState {
    slots: BTreeMap<Rc<str>, Vec<HookSlot>>,
    frames: Vec<Frame>,
    visited: BTreeSet<Rc<str>>,
    pending: Vec<PendingEffect>,
    /// Active context providers, innermost last.
    providers: Vec<(usize, Value)>,
    /// Default value of every context created in the scope.
    context_defaults: BTreeMap<usize, Value>,
    dirty: bool,
    next_id: usize,
}

impl HookState {
    /// Whether a state update happened since the last call.
    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Request another render pass without a state slot changing.
    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn begin_pass(&mut self) {
        self.visited.clear();
        self.providers.clear();
        self.frames.clear();
    }

    pub(crate) fn enter(&mut self, key: Rc<str>) {
        self.visited.insert(Rc::clone(&key));
        self.frames.push(Frame { key, cursor: 0 });
    }

    pub(crate) fn leave(&mut self) {
        self.frames.pop();
    }

    pub(crate) fn push_provider(&mut self, context: usize, value: Value) {
        self.providers.push((context, value));
    }

    pub(crate) fn pop_provider(&mut self) {
        self.providers.pop();
    }

    pub(crate) fn define_context(&mut self, context: usize, default: Value) {
        self.context_defaults.insert(context, default);
    }

    /// The innermost provided value, else the context's default.
    pub(crate) fn context_value(&self, context: usize) -> Value {
        self.providers
            .iter()
            .rev()
            .find(|(id, _)| *id == context)
            .map(|(_, value)| value.clone())
            .or_else(|| self.context_defaults.get(&context).cloned())
            .unwrap_or_default()
    }

    /// Number of mounted component instances.
    pub fn instance_count(&self) -> usize {
        self.slots.len()
    }

    fn claim(&mut self) -> EvalResult<(Rc<str>, usize)> {
        let frame = self.frames.last_mut().ok_or_else(|| {
            EvalError::type_error(
                "Invalid hook call. Hooks can only be called inside of the body of a function component.",
            )
        })?;
        let index = frame.cursor;
        frame.cursor += 1;
        Ok((Rc::clone(&frame.key), index))
    }

    fn slot(&self, key: &str, index: usize) -> Option<&HookSlot> {
        self.slots.get(key)?.get(index)
    }

    fn slot_mut(&mut self, key: &str, index: usize) -> Option<&mut HookSlot> {
        self.slots.get_mut(key)?.get_mut(index)
    }

    fn store(&mut self, key: &Rc<str>, index: usize, slot: HookSlot) {
        let slots = self.slots.entry(Rc::clone(key)).or_default();
        if index < slots.len() {
            slots[index] = slot;
        } else {
            slots.push(slot);
        }
    }

    /// Cleanups of instances not visited by the last pass; removes them.
    pub(crate) fn sweep(&mut self) -> Vec<Value> {
        let stale: Vec<Rc<str>> = self
            .slots
            .keys()
            .filter(|key| !self.visited.contains(*key))
            .cloned()
            .collect();
        let mut cleanups = Vec::new();
        for key in &stale {
            if let Some(slots) = self.slots.remove(key) {
                cleanups.extend(effect_cleanups(slots));
            }
        }
        self.pending.retain(|effect| !stale.contains(&effect.key));
        cleanups
    }

    /// Every outstanding cleanup; empties the store.
    pub(crate) fn unmount_all(&mut self) -> Vec<Value> {
        self.pending.clear();
        self.providers.clear();
        self.frames.clear();
        std::mem::take(&mut self.slots)
            .into_values()
            .flat_map(effect_cleanups)
            .collect()
    }
}

fn effect_cleanups(slots: Vec<HookSlot>) -> Vec<Value> {
    slots
        .into_iter()
        .filter_map(|slot| match slot {
            HookSlot::Effect { cleanup, .. } if cleanup.is_callable() => Some(cleanup),
            _ => None,
        })
        .collect()
}

/// `None` for a missing dependency list: the hook re-runs every render.
fn dependency_list(interp: &mut Interpreter, deps: &Value) -> EvalResult<Option<Vec<Value>>> {
    match deps {
        Value::Undefined | Value::Null => Ok(None),
        other => interp.iterate(other).map(Some),
    }
}

fn deps_changed(old: Option<&Vec<Value>>, new: Option<&Vec<Value>>) -> bool {
    match (old, new) {
        (Some(old), Some(new)) => {
            old.len() != new.len() || old.iter().zip(new).any(|(a, b)| !a.object_is(b))
        }
        _ => true,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Hooks
// ══════════════════════════════════════════════════════════════════════════════

impl Interpreter {
    pub(crate) fn use_state(&mut self, initial: Value) -> EvalResult<Value> {
        let (key, index) = self.hooks.claim()?;
        if let Some(HookSlot::State { value, setter }) = self.hooks.slot(&key, index) {
            return Ok(Value::array(vec![value.clone(), setter.clone()]));
        }
        let value = if initial.is_callable() {
            self.call(&initial, Value::Undefined, Vec::new())?
        } else {
            initial
        };
        let slot_key = Rc::clone(&key);
        let setter = Value::native("setState", move |interp, _, args| {
            let next = arg(&args, 0);
            let current = match interp.hooks.slot(&slot_key, index) {
                Some(HookSlot::State { value, .. }) => value.clone(),
                // The component is gone.
                _ => return Ok(Value::Undefined),
            };
            let next = if next.is_callable() {
                interp.call(&next, Value::Undefined, vec![current.clone()])?
            } else {
                next
            };
            if !next.object_is(&current) {
                if let Some(HookSlot::State { value, .. }) = interp.hooks.slot_mut(&slot_key, index) {
                    *value = next;
                    interp.hooks.dirty = true;
                }
            }
            Ok(Value::Undefined)
        });
        self.hooks.store(
            &key,
            index,
            HookSlot::State {
                value: value.clone(),
                setter: setter.clone(),
            },
        );
        Ok(Value::array(vec![value, setter]))
    }

    pub(crate) fn use_reducer(&mut self, reducer: Value, initial: Value, init: Value) -> EvalResult<Value> {
        let (key, index) = self.hooks.claim()?;
        if let Some(HookSlot::Reducer {
            state,
            reducer: stored,
            dispatch,
        }) = self.hooks.slot_mut(&key, index)
        {
            // The latest reducer closure wins; it may capture fresh props.
            *stored = reducer;
            return Ok(Value::array(vec![state.clone(), dispatch.clone()]));
        }
        let state = if init.is_callable() {
            self.call(&init, Value::Undefined, vec![initial])?
        } else {
            initial
        };
        let slot_key = Rc::clone(&key);
        let dispatch = Value::native("dispatch", move |interp, _, args| {
            let (current, reducer) = match interp.hooks.slot(&slot_key, index) {
                Some(HookSlot::Reducer { state, reducer, .. }) => (state.clone(), reducer.clone()),
                _ => return Ok(Value::Undefined),
            };
            let next = interp.call(&reducer, Value::Undefined, vec![current.clone(), arg(&args, 0)])?;
            if !next.object_is(&current) {
                if let Some(HookSlot::Reducer { state, .. }) = interp.hooks.slot_mut(&slot_key, index) {
                    *state = next;
                    interp.hooks.dirty = true;
                }
            }
            Ok(Value::Undefined)
        });
        self.hooks.store(
            &key,
            index,
            HookSlot::Reducer {
                state: state.clone(),
                reducer,
                dispatch: dispatch.clone(),
            },
        );
        Ok(Value::array(vec![state, dispatch]))
    }

    pub(crate) fn use_effect(&mut self, callback: Value, deps: &Value, layout: bool) -> EvalResult<Value> {
        let (key, index) = self.hooks.claim()?;
        let deps = dependency_list(self, deps)?;
        let changed = match self.hooks.slot(&key, index) {
            Some(HookSlot::Effect { deps: old, .. }) => deps_changed(old.as_ref(), deps.as_ref()),
            _ => {
                self.hooks.store(
                    &key,
                    index,
                    HookSlot::Effect {
                        deps: None,
                        cleanup: Value::Undefined,
                    },
                );
                true
            }
        };
        if changed {
            if let Some(HookSlot::Effect { deps: old, .. }) = self.hooks.slot_mut(&key, index) {
                *old = deps;
            }
            self.hooks.pending.push(PendingEffect {
                key,
                index,
                callback,
                layout,
            });
        }
        Ok(Value::Undefined)
    }

    pub(crate) fn use_memo(&mut self, factory: Value, deps: &Value, callback: bool) -> EvalResult<Value> {
        let (key, index) = self.hooks.claim()?;
        let deps = dependency_list(self, deps)?;
        if let Some(HookSlot::Memo { deps: old, value }) = self.hooks.slot(&key, index) {
            if !deps_changed(old.as_ref(), deps.as_ref()) {
                return Ok(value.clone());
            }
        }
        let value = if callback {
            factory
        } else {
            self.call(&factory, Value::Undefined, Vec::new())?
        };
        self.hooks.store(
            &key,
            index,
            HookSlot::Memo {
                deps,
                value: value.clone(),
            },
        );
        Ok(value)
    }

    pub(crate) fn use_ref(&mut self, initial: Value) -> EvalResult<Value> {
        let (key, index) = self.hooks.claim()?;
        if let Some(HookSlot::Ref(object)) = self.hooks.slot(&key, index) {
            return Ok(object.clone());
        }
        let object = Value::object_from([("current", initial)]);
        self.hooks.store(&key, index, HookSlot::Ref(object.clone()));
        Ok(object)
    }

    pub(crate) fn use_id(&mut self) -> EvalResult<Value> {
        let (key, index) = self.hooks.claim()?;
        if let Some(HookSlot::Id(id)) = self.hooks.slot(&key, index) {
            return Ok(Value::String(Rc::clone(id)));
        }
        let id: Rc<str> = Rc::from(format!(":r{}:", self.hooks.next_id));
        self.hooks.next_id += 1;
        self.hooks.store(&key, index, HookSlot::Id(Rc::clone(&id)));
        Ok(Value::String(id))
    }

    pub(crate) fn use_context(&mut self, context: &Value) -> EvalResult<Value> {
        // Not a slot: contexts are read fresh on every render.
        self.hooks.claim()?;
        let id = context.get("_id");
        let Value::Number(id) = id else {
            return Err(EvalError::type_error("useContext expects a context object"));
        };
        Ok(self.hooks.context_value(id as usize))
    }

    /// Run effects queued by the last render: layout effects first, then
    /// passive ones, each in call order. The previous cleanup of a slot runs
    /// right before its effect.
    pub(crate) fn run_effects(&mut self) -> EvalResult<()> {
        let mut pending = std::mem::take(&mut self.hooks.pending);
        pending.sort_by_key(|effect| !effect.layout);
        for effect in pending {
            let previous = match self.hooks.slot_mut(&effect.key, effect.index) {
                Some(HookSlot::Effect { cleanup, .. }) => std::mem::take(cleanup),
                _ => continue,
            };
            if previous.is_callable() {
                self.call(&previous, Value::Undefined, Vec::new())?;
            }
            let cleanup = self.call(&effect.callback, Value::Undefined, Vec::new())?;
            if let Some(HookSlot::Effect { cleanup: slot, .. }) = self.hooks.slot_mut(&effect.key, effect.index) {
                *slot = cleanup;
            }
        }
        Ok(())
    }

    /// Run cleanups for instances that left the tree.
    pub(crate) fn sweep_hooks(&mut self) -> EvalResult<()> {
        for cleanup in self.hooks.sweep() {
            self.call(&cleanup, Value::Undefined, Vec::new())?;
        }
        Ok(())
    }

    /// Tear every instance down, running all cleanups. Errors in cleanups
    /// are logged, not returned: teardown always completes.
    pub(crate) fn unmount_hooks(&mut self) {
        for cleanup in self.hooks.unmount_all() {
            if let Err(err) = self.call(&cleanup, Value::Undefined, Vec::new()) {
                tracing::warn!(error = %err, "effect cleanup failed during unmount");
            }
        }
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(interp: &mut Interpreter, key: &str) {
        interp.hooks.enter(Rc::from(key));
    }

    #[test]
    fn test_hooks_outside_components_fail() {
        let mut interp = Interpreter::default();
        let err = interp.use_state(Value::Number(0.0)).unwrap_err();
        assert!(err.to_string().contains("Invalid hook call"));
    }

    #[test]
    fn test_state_persists_per_position() {
        let mut interp = Interpreter::default();
        interp.hooks.begin_pass();
        component(&mut interp, "/0:1");
        let pair = interp.use_state(Value::Number(1.0)).unwrap();
        let setter = interp.get_property(&pair, "1").unwrap();
        interp.hooks.leave();

        interp.call(&setter, Value::Undefined, vec![Value::Number(5.0)]).unwrap();
        assert!(interp.hooks.take_dirty());

        interp.hooks.begin_pass();
        component(&mut interp, "/0:1");
        let pair = interp.use_state(Value::Number(1.0)).unwrap();
        assert_eq!(interp.get_property(&pair, "0").unwrap().to_number(), 5.0);
        let again = interp.get_property(&pair, "1").unwrap();
        assert!(again.strict_eq(&setter));
    }

    #[test]
    fn test_same_value_update_is_not_dirty() {
        let mut interp = Interpreter::default();
        interp.hooks.begin_pass();
        component(&mut interp, "/0:1");
        let pair = interp.use_state(Value::string("x")).unwrap();
        let setter = interp.get_property(&pair, "1").unwrap();
        interp.call(&setter, Value::Undefined, vec![Value::string("x")]).unwrap();
        assert!(!interp.hooks.is_dirty());
    }

    #[test]
    fn test_memo_recomputes_on_dependency_change() {
        let mut interp = Interpreter::default();
        let calls = Value::array(Vec::new());
        let counter = {
            let calls = calls.clone();
            Value::native("factory", move |_, _, _| {
                if let Value::Array(items) = &calls {
                    items.borrow_mut().push(Value::Null);
                    return Ok(Value::Number(items.borrow().len() as f64));
                }
                Ok(Value::Undefined)
            })
        };
        for dep in [1.0, 1.0, 2.0] {
            interp.hooks.begin_pass();
            component(&mut interp, "/0:1");
            let deps = Value::array(vec![Value::Number(dep)]);
            interp.use_memo(counter.clone(), &deps, false).unwrap();
            interp.hooks.leave();
        }
        assert_eq!(interp.get_property(&calls, "length").unwrap().to_number(), 2.0);
    }

    #[test]
    fn test_sweep_drops_unvisited_instances() {
        let mut interp = Interpreter::default();
        interp.hooks.begin_pass();
        component(&mut interp, "/0:1");
        interp.use_ref(Value::Null).unwrap();
        interp.hooks.leave();
        component(&mut interp, "/1:1");
        interp.use_ref(Value::Null).unwrap();
        interp.hooks.leave();
        assert_eq!(interp.hooks.instance_count(), 2);

        interp.hooks.begin_pass();
        component(&mut interp, "/0:1");
        interp.hooks.leave();
        interp.sweep_hooks().unwrap();
        assert_eq!(interp.hooks.instance_count(), 1);
    }

    #[test]
    fn test_ids_are_stable_and_unique() {
        let mut interp = Interpreter::default();
        interp.hooks.begin_pass();
        component(&mut interp, "/0:1");
        let a = interp.use_id().unwrap();
        let b = interp.use_id().unwrap();
        interp.hooks.leave();
        assert_eq!(a.to_js_string(), ":r0:");
        assert_eq!(b.to_js_string(), ":r1:");
        interp.hooks.begin_pass();
        component(&mut interp, "/0:1");
        assert!(interp.use_id().unwrap().strict_eq(&a));
    }
}
