//! Lexical scopes for the evaluator.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::value::Value;

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Debug, Default)]
struct Scope {
    bindings: BTreeMap<String, Binding>,
    parent: Option<Env>,
}

/// Why an assignment failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetError {
    Undeclared,
    Constant,
}

/// A scope chain. Cloning shares the scope; closures capture it this way.
///
/// `define` always creates in this scope. `get` and `set` search from this
/// scope outward.
#[derive(Debug, Clone, Default)]
pub struct Env(Rc<RefCell<Scope>>);

impl Env {
    /// A new outermost scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new scope nested in this one.
    pub fn child(&self) -> Self {
        Self(Rc::new(RefCell::new(Scope {
            bindings: BTreeMap::new(),
            parent: Some(self.clone()),
        })))
    }

    /// Define (or redefine) a binding in this scope.
    pub fn define(&self, name: &str, value: Value, mutable: bool) {
        self.0
            .borrow_mut()
            .bindings
            .insert(name.to_string(), Binding { value, mutable });
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let scope = self.0.borrow();
        match scope.bindings.get(name) {
            Some(binding) => Some(binding.value.clone()),
            None => scope.parent.as_ref()?.get(name),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        let scope = self.0.borrow();
        scope.bindings.contains_key(name)
            || scope.parent.as_ref().is_some_and(|parent| parent.has(name))
    }

    /// Update the nearest binding of `name`.
    pub fn set(&self, name: &str, value: Value) -> Result<(), SetError> {
        let mut scope = self.0.borrow_mut();
        if let Some(binding) = scope.bindings.get_mut(name) {
            if !binding.mutable {
                return Err(SetError::Constant);
            }
            binding.value = value;
            return Ok(());
        }
        match &scope.parent {
            Some(parent) => parent.clone().set(name, value),
            None => Err(SetError::Undeclared),
        }
    }

    /// Names bound directly in this scope, sorted.
    pub fn names(&self) -> Vec<String> {
        self.0.borrow().bindings.keys().cloned().collect()
    }

    pub fn ptr_eq(&self, other: &Env) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outward() {
        let global = Env::new();
        global.define("x", Value::Number(1.0), true);
        let inner = global.child();
        inner.define("y", Value::Number(2.0), true);
        assert!(matches!(inner.get("x"), Some(Value::Number(n)) if n == 1.0));
        assert!(global.get("y").is_none());
    }

    #[test]
    fn test_shadowing_and_set() {
        let global = Env::new();
        global.define("x", Value::Number(1.0), true);
        let inner = global.child();
        inner.define("x", Value::Number(5.0), true);
        inner.set("x", Value::Number(6.0)).unwrap();
        assert!(matches!(global.get("x"), Some(Value::Number(n)) if n == 1.0));
        assert!(matches!(inner.get("x"), Some(Value::Number(n)) if n == 6.0));
    }

    #[test]
    fn test_constants_and_undeclared() {
        let env = Env::new();
        env.define("c", Value::Null, false);
        assert_eq!(env.set("c", Value::Null), Err(SetError::Constant));
        assert_eq!(env.child().set("nope", Value::Null), Err(SetError::Undeclared));
    }
}
