//! Tree-walking evaluator for lowered modules.
//!
//! One [`Interpreter`] is one execution scope: its globals, console, random
//! state, hook store and timers belong to it alone. Values created by one
//! interpreter are never handed to another.

mod expr;
mod stmt;

pub(crate) use expr::{own_entries, property_key};

use canvas_compiler::RuntimeConfig;
use canvas_types::ast::{FunctionBody, Stmt};
use canvas_types::Span;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::rc::Rc;
use tracing::{debug, error, info, warn};

use crate::builtins::{self, Timers};
use crate::env::Env;
use crate::error::{EvalError, EvalResult, Location};
use crate::hooks::HookState;
use crate::shims::router::RouterState;
use crate::value::{Closure, Value};

/// Nested calls allowed before a `RangeError`.
pub const MAX_CALL_DEPTH: usize = 100;

/// Severity of a captured `console` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

/// One captured `console` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsoleEntry {
    pub level: ConsoleLevel,
    pub message: String,
}

/// How a statement finished.
#[derive(Debug, Clone)]
pub(crate) enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// The evaluator for one execution scope.
pub struct Interpreter {
    globals: Env,
    config: RuntimeConfig,
    steps: u64,
    depth: usize,
    /// Module of the code currently running.
    path: Option<Rc<str>>,
    fault: Option<Location>,
    rng: StdRng,
    console: Vec<ConsoleEntry>,
    next_context: usize,
    pub(crate) hooks: HookState,
    pub(crate) timers: Timers,
    pub(crate) router: RouterState,
}

impl Interpreter {
    /// A scope with fresh globals.
    pub fn new(config: RuntimeConfig) -> Self {
        let globals = Env::new();
        builtins::install(&globals);
        Self::with_globals(globals, config)
    }

    /// A scope evaluating against existing globals, e.g. a host page's.
    pub fn with_globals(globals: Env, config: RuntimeConfig) -> Self {
        Self {
            globals,
            rng: StdRng::seed_from_u64(config.random_seed),
            config,
            steps: 0,
            depth: 0,
            path: None,
            fault: None,
            console: Vec::new(),
            next_context: 0,
            hooks: HookState::default(),
            timers: Timers::default(),
            router: RouterState::default(),
        }
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn console(&self) -> &[ConsoleEntry] {
        &self.console
    }

    pub(crate) fn tick(&mut self) -> EvalResult<()> {
        self.steps += 1;
        match self.config.step_limit {
            Some(limit) if self.steps > limit => Err(EvalError::StepLimit(limit)),
            _ => Ok(()),
        }
    }

    /// Record a console line and forward it to `tracing`.
    pub(crate) fn log(&mut self, level: ConsoleLevel, message: String) {
        let path = self.path.as_deref().unwrap_or("<host>");
        match level {
            ConsoleLevel::Error => error!(target: "canvas::console", path, "{message}"),
            ConsoleLevel::Warn => warn!(target: "canvas::console", path, "{message}"),
            ConsoleLevel::Debug => debug!(target: "canvas::console", path, "{message}"),
            ConsoleLevel::Log | ConsoleLevel::Info => {
                info!(target: "canvas::console", path, "{message}")
            }
        }
        self.console.push(ConsoleEntry { level, message });
    }

    /// `Math.random`, drawn from the generator seeded by the config.
    pub(crate) fn random(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    pub(crate) fn now_ms(&self) -> f64 {
        self.config.clock_ms
    }

    pub(crate) fn next_context_id(&mut self) -> usize {
        self.next_context += 1;
        self.next_context
    }

    // ══════════════════════════════════════════════════════════════════════
    // Error locations
    // ══════════════════════════════════════════════════════════════════════

    /// Remember where an error surfaced; the innermost report wins.
    pub(crate) fn note_fault(&mut self, span: Span) {
        if self.fault.is_none() {
            self.fault = Some(Location {
                path: self.path.clone(),
                span,
            });
        }
    }

    pub(crate) fn clear_fault(&mut self) {
        self.fault = None;
    }

    /// Where the last uncaught error surfaced.
    pub fn take_fault(&mut self) -> Option<Location> {
        self.fault.take()
    }

    // ══════════════════════════════════════════════════════════════════════
    // Entry points
    // ══════════════════════════════════════════════════════════════════════

    /// Run a module body in `env`, attributing errors to `path`.
    pub fn exec_module(&mut self, path: Rc<str>, body: &[Stmt], env: &Env) -> EvalResult<()> {
        let saved = self.path.replace(path);
        let result = self.exec_block(body, env);
        self.path = saved;
        result.map(|_| ())
    }

    /// Call any callable value.
    pub fn call(&mut self, callee: &Value, this: Value, args: Vec<Value>) -> EvalResult<Value> {
        if !callee.is_callable() {
            return Err(EvalError::type_error(format!(
                "{} is not a function",
                callee.type_of()
            )));
        }
        if self.depth >= MAX_CALL_DEPTH {
            return Err(EvalError::Range("Maximum call stack size exceeded".into()));
        }
        self.depth += 1;
        let result = match callee {
            Value::Closure(closure) => self.call_closure(closure, args),
            Value::Native(native) => native.call(self, this, args),
            _ => Ok(Value::Undefined),
        };
        self.depth -= 1;
        result
    }

    /// `new callee(args)`. Only host constructors are supported.
    pub(crate) fn construct(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult<Value> {
        match callee {
            Value::Native(_) => self.call(callee, Value::Undefined, args),
            Value::Closure(_) => Err(EvalError::Unsupported(
                "constructing script functions with `new`".into(),
            )),
            other => Err(EvalError::type_error(format!(
                "{} is not a constructor",
                other.type_of()
            ))),
        }
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>) -> EvalResult<Value> {
        let saved = std::mem::replace(&mut self.path, closure.path.clone());
        let result = self.run_closure(closure, args);
        self.path = saved;
        result
    }

    fn run_closure(&mut self, closure: &Closure, mut args: Vec<Value>) -> EvalResult<Value> {
        let func = Rc::clone(&closure.func);
        let env = closure.env.child();
        let rest = if args.len() > func.params.len() {
            args.split_off(func.params.len())
        } else {
            Vec::new()
        };
        let mut args = args.into_iter();
        for param in &func.params {
            let mut value = args.next().unwrap_or_default();
            if matches!(value, Value::Undefined) {
                if let Some(default) = &param.default {
                    value = self.eval(default, &env)?;
                }
            }
            self.bind_pattern(&param.pattern, value, &env, true)?;
        }
        if let Some(pattern) = &func.rest {
            self.bind_pattern(pattern, Value::array(rest), &env, true)?;
        }

        match &func.body {
            FunctionBody::Block(stmts) => match self.exec_block(stmts, &env)? {
                Completion::Return(value) => Ok(value),
                _ => Ok(Value::Undefined),
            },
            FunctionBody::Expr(expr) => self.eval(expr, &env).inspect_err(|_| {
                self.note_fault(expr.span);
            }),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Evaluate a snippet and return the value bound to `result`.
    pub(crate) fn run(source: &str) -> EvalResult<Value> {
        let mut interp = Interpreter::default();
        run_in(&mut interp, source)
    }

    pub(crate) fn run_in(interp: &mut Interpreter, source: &str) -> EvalResult<Value> {
        let module = canvas_compiler::transpile(source, "/test.ts").expect("transpiles");
        let env = interp.globals().child();
        interp.exec_module(Rc::from("/test.ts"), &module.body.body, &env)?;
        Ok(env.get("result").unwrap_or_default())
    }

    fn number(source: &str) -> f64 {
        match run(source).unwrap() {
            Value::Number(n) => n,
            other => panic!("expected number, got {other:?}"),
        }
    }

    fn string(source: &str) -> String {
        run(source).unwrap().to_js_string()
    }

    // ── Expressions ──────────────────────────────────────────────────────

    #[test]
    fn test_arithmetic_and_precedence() {
        assert_eq!(number("const result = 1 + 2 * 3 - 4 / 2;"), 5.0);
        assert_eq!(number("const result = 2 ** 10 % 1000;"), 24.0);
        assert_eq!(string("const result = 1 + \"2\";"), "12");
        assert_eq!(number("const result = \"6\" * \"7\";"), 42.0);
    }

    #[test]
    fn test_logical_and_nullish() {
        assert_eq!(string("const result = null ?? \"d\";"), "d");
        assert_eq!(number("const result = 0 || 5;"), 5.0);
        assert_eq!(number("const result = 0 ?? 5;"), 0.0);
        assert_eq!(string("const result = \"a\" && \"b\";"), "b");
    }

    #[test]
    fn test_template_literals() {
        assert_eq!(
            string("const n = 3; const result = `n=${n}, twice=${n * 2}`;"),
            "n=3, twice=6"
        );
    }

    #[test]
    fn test_optional_chaining_short_circuits() {
        assert_eq!(string("const o = null; const result = o?.a.b.c;"), "undefined");
        assert_eq!(string("const o = {}; const result = o.f?.();"), "undefined");
        assert_eq!(number("const o = { a: { b: 4 } }; const result = o?.a?.b;"), 4.0);
    }

    #[test]
    fn test_typeof_undeclared_is_undefined() {
        assert_eq!(string("const result = typeof missing;"), "undefined");
        assert_eq!(string("const result = typeof (() => 1);"), "function");
    }

    // ── Functions & scope ────────────────────────────────────────────────

    #[test]
    fn test_closures_capture_scope() {
        let source = "function counter() { let n = 0; return () => ++n; }\nconst c = counter();\nc(); c();\nconst result = c();";
        assert_eq!(number(source), 3.0);
    }

    #[test]
    fn test_hoisted_functions() {
        assert_eq!(number("const result = twice(4);\nfunction twice(x) { return x * 2; }"), 8.0);
    }

    #[test]
    fn test_default_and_rest_parameters() {
        let source = "function f(a, b = 10, ...rest) { return a + b + rest.length; }\nconst result = f(1) + f(1, 2, 3, 4);";
        assert_eq!(number(source), 11.0 + 5.0);
    }

    #[test]
    fn test_destructuring() {
        let source = "const { a, b: { c = 5 } = {}, ...others } = { a: 1, x: 2, y: 3 };\nconst [first, , third = 9, ...tail] = [1, 2, undefined, 4, 5];\nconst result = [a, c, Object.keys(others).join(\"\"), first, third, tail.length].join(\",\");";
        assert_eq!(string(source), "1,5,xy,1,9,2");
    }

    #[test]
    fn test_const_reassignment_is_type_error() {
        let err = run("const x = 1; x = 2;").unwrap_err();
        assert!(matches!(err, EvalError::Type(_)));
        assert_eq!(err.to_string(), "TypeError: Assignment to constant variable.");
    }

    #[test]
    fn test_unknown_identifier_is_reference_error() {
        let err = run("const result = nope + 1;").unwrap_err();
        assert_eq!(err.to_string(), "ReferenceError: nope is not defined");
    }

    #[test]
    fn test_call_depth_is_limited() {
        let err = run("function f() { return f(); }\nf();").unwrap_err();
        assert!(matches!(err, EvalError::Range(_)));
    }

    #[test]
    fn test_step_limit() {
        let mut interp = Interpreter::new(RuntimeConfig {
            step_limit: Some(1_000),
            ..RuntimeConfig::default()
        });
        let err = run_in(&mut interp, "while (true) {}").unwrap_err();
        assert!(matches!(err, EvalError::StepLimit(1_000)));
    }

    // ── Statements ───────────────────────────────────────────────────────

    #[test]
    fn test_loops() {
        let source = "let s = 0;\nfor (let i = 0; i < 10; i++) { if (i === 3) continue; if (i === 6) break; s += i; }\nfor (const x of [10, 20]) s += x;\nfor (const k in { a: 1, b: 2 }) s += k.length;\nlet w = 0; while (w < 3) w++;\nconst result = s + w;";
        assert_eq!(number(source), (0 + 1 + 2 + 4 + 5 + 30 + 2 + 3) as f64);
    }

    #[test]
    fn test_loop_closures_capture_each_iteration() {
        let source = "const fs = [];\nfor (let i = 0; i < 3; i++) fs.push(() => i);\nconst result = fs.map(f => f()).join(\"\");";
        assert_eq!(string(source), "012");
    }

    #[test]
    fn test_switch_falls_through() {
        let source = "function f(x) { let out = \"\"; switch (x) { case 1: out += \"a\"; case 2: out += \"b\"; break; default: out += \"z\"; } return out; }\nconst result = f(1) + f(2) + f(3);";
        assert_eq!(string(source), "abbz");
    }

    #[test]
    fn test_try_catch_finally() {
        let source = "let log = \"\";\ntry { null.x; } catch (e) { log += e.name; } finally { log += \"!\"; }\ntry { throw new Error(\"boom\"); } catch ({ message }) { log += message; }\nconst result = log;";
        assert_eq!(string(source), "TypeError!boom");
    }

    #[test]
    fn test_uncaught_throw_is_located() {
        let mut interp = Interpreter::default();
        let err = run_in(&mut interp, "const a = 1;\nthrow new Error(\"bad\");").unwrap_err();
        assert_eq!(err.to_string(), "Uncaught Error: bad");
        let fault = interp.take_fault().expect("location");
        assert_eq!(fault.path.as_deref(), Some("/test.ts"));
        assert_eq!(fault.span.line, 2);
    }

    #[test]
    fn test_random_is_seeded() {
        let a = run("const result = Math.random();").unwrap();
        let b = run("const result = Math.random();").unwrap();
        assert!(a.strict_eq(&b));
        let n = a.to_number();
        assert!((0.0..1.0).contains(&n));

        let mut config = RuntimeConfig::default();
        config.random_seed += 1;
        let mut other = Interpreter::new(config);
        let c = run_in(&mut other, "const result = Math.random();").unwrap();
        assert!(!a.strict_eq(&c));
        let d = run_in(&mut other, "const result = Math.random();").unwrap();
        assert!(!c.strict_eq(&d));
    }
}
