//! The module loader: a per-render table of module records, evaluated
//! lazily on first `require`.
//!
//! `require` consults the scope's [`ShimTable`] first, then the records
//! already created, then the compiled project. A record is created before
//! its body runs, so a circular `require` observes the partially populated
//! exports container instead of re-entering the module.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use canvas_compiler::{CompiledModule, CompiledProject};
use tracing::{debug, instrument};

use crate::builtins::arg;
use crate::env::Env;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::Interpreter;
use crate::shims::ShimTable;
use crate::value::Value;

/// Linking state owned by exactly one loader.
#[derive(Debug)]
struct LoaderState {
    modules: BTreeMap<String, Rc<CompiledModule>>,
    shims: ShimTable,
    /// Exports containers by path, evaluated or still evaluating.
    records: BTreeMap<String, Value>,
    counts: BTreeMap<String, usize>,
}

/// Resolves `require` calls for one execution scope.
///
/// Cloning shares the table; two loaders built with [`Loader::new`] never
/// share records.
#[derive(Debug, Clone)]
pub struct Loader {
    state: Rc<RefCell<LoaderState>>,
}

impl Loader {
    pub fn new(project: &CompiledProject, shims: ShimTable) -> Self {
        Self {
            state: Rc::new(RefCell::new(LoaderState {
                modules: project.modules.clone(),
                shims,
                records: BTreeMap::new(),
                counts: BTreeMap::new(),
            })),
        }
    }

    /// Resolve `specifier` to a value. A namespace request returns the whole
    /// exports container; otherwise `exports.default` when present.
    pub fn require(&self, interp: &mut Interpreter, specifier: &str, namespace: bool) -> EvalResult<Value> {
        let exports = self.exports(interp, specifier)?;
        if namespace {
            return Ok(exports);
        }
        Ok(match exports.get("default") {
            Value::Undefined => exports,
            default => default,
        })
    }

    fn exports(&self, interp: &mut Interpreter, specifier: &str) -> EvalResult<Value> {
        let module = {
            let state = self.state.borrow();
            if let Some(container) = state.shims.container(specifier) {
                return Ok(container);
            }
            if let Some(exports) = state.records.get(specifier) {
                return Ok(exports.clone());
            }
            state
                .modules
                .get(specifier)
                .cloned()
                .ok_or_else(|| EvalError::ModuleNotFound(specifier.to_string()))?
        };
        self.evaluate(interp, &module)
    }

    #[instrument(level = "debug", name = "evaluate_module", skip_all, fields(path = %module.path))]
    fn evaluate(&self, interp: &mut Interpreter, module: &CompiledModule) -> EvalResult<Value> {
        let exports = Value::object(Default::default());
        {
            let mut state = self.state.borrow_mut();
            state.records.insert(module.path.clone(), exports.clone());
            *state.counts.entry(module.path.clone()).or_default() += 1;
        }

        let env: Env = interp.globals().child();
        env.define("exports", exports.clone(), false);
        env.define("module", Value::object_from([("exports", exports.clone())]), false);
        env.define("require", self.require_fn(), false);

        let path: Rc<str> = Rc::from(module.path.as_str());
        if let Err(err) = interp.exec_module(path, &module.executable.body.body, &env) {
            debug!(error = %err, "module evaluation failed");
            self.state.borrow_mut().records.remove(&module.path);
            return Err(err);
        }
        debug!(exports = exports_len(&exports), "module evaluated");
        Ok(exports)
    }

    /// The script-visible `require(specifier, namespace?)`.
    pub fn require_fn(&self) -> Value {
        let state: Weak<RefCell<LoaderState>> = Rc::downgrade(&self.state);
        Value::native("require", move |interp, _, args| {
            let state = state
                .upgrade()
                .ok_or_else(|| EvalError::Unsupported("require after the loader was dropped".into()))?;
            let loader = Loader { state };
            let specifier = arg(&args, 0).to_js_string();
            loader.require(interp, &specifier, arg(&args, 1).is_truthy())
        })
    }

    /// Forget every record; the next `require` evaluates again.
    pub fn reset(&self) {
        self.state.borrow_mut().records.clear();
    }

    /// How many times the module at `path` has been evaluated.
    pub fn evaluation_count(&self, path: &str) -> usize {
        self.state.borrow().counts.get(path).copied().unwrap_or(0)
    }

    /// Paths with a record, sorted.
    pub fn loaded(&self) -> Vec<String> {
        self.state.borrow().records.keys().cloned().collect()
    }
}

fn exports_len(exports: &Value) -> usize {
    match exports {
        Value::Object(map) => map.borrow().len(),
        _ => 0,
    }
}
