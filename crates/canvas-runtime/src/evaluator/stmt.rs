//! Statement execution and pattern binding.

use canvas_types::ast::*;

use super::{Completion, Interpreter};
use crate::env::Env;
use crate::error::{EvalError, EvalResult};
use crate::value::Value;

impl Interpreter {
    /// Run statements in `env`, hoisting function declarations first.
    pub(crate) fn exec_block(&mut self, stmts: &[Stmt], env: &Env) -> EvalResult<Completion> {
        for stmt in stmts {
            if let StmtKind::Function(func) = &stmt.kind {
                if let Some(name) = &func.name {
                    let closure = self.closure(func, env);
                    env.define(&name.name, closure, true);
                }
            }
        }
        for stmt in stmts {
            match self.exec(stmt, env)? {
                Completion::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Env) -> EvalResult<Completion> {
        self.tick()?;
        self.exec_kind(stmt, env).inspect_err(|_| self.note_fault(stmt.span))
    }

    fn exec_kind(&mut self, stmt: &Stmt, env: &Env) -> EvalResult<Completion> {
        match &stmt.kind {
            StmtKind::Var(decl) => {
                self.exec_var(decl, env)?;
                Ok(Completion::Normal)
            }
            // Hoisted by `exec_block`.
            StmtKind::Function(_) => Ok(Completion::Normal),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.is_truthy() {
                    self.exec(consequent, env)
                } else if let Some(alternate) = alternate {
                    self.exec(alternate, env)
                } else {
                    Ok(Completion::Normal)
                }
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => self.exec_for(init.as_ref(), test.as_ref(), update.as_ref(), body, env),
            StmtKind::ForEach {
                kind,
                binding,
                pattern,
                iterable,
                body,
            } => {
                let iterable = self.eval(iterable, env)?;
                let items = match kind {
                    ForEachKind::Of => self.iterate(&iterable)?,
                    ForEachKind::In => keys_of(&iterable),
                };
                for item in items {
                    let scope = env.child();
                    self.bind_pattern(pattern, item, &scope, *binding != VarKind::Const)?;
                    match self.exec(body, &scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }
            StmtKind::While { test, body } => {
                while self.eval(test, env)?.is_truthy() {
                    match self.exec(body, env)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => self.exec_switch(discriminant, cases, env),
            StmtKind::Break => Ok(Completion::Break),
            StmtKind::Continue => Ok(Completion::Continue),
            StmtKind::Throw(expr) => Err(EvalError::Thrown(self.eval(expr, env)?)),
            StmtKind::Try {
                block,
                param,
                handler,
                finalizer,
            } => self.exec_try(block, param.as_ref(), handler.as_deref(), finalizer.as_deref(), env),
            StmtKind::Block(stmts) => self.exec_block(stmts, &env.child()),
            StmtKind::Expr(expr) => {
                self.eval(expr, env)?;
                Ok(Completion::Normal)
            }
            StmtKind::Empty => Ok(Completion::Normal),
            StmtKind::Import(_) | StmtKind::Export(_) => Err(EvalError::Unsupported(
                "module syntax must be lowered before evaluation".into(),
            )),
        }
    }

    fn exec_var(&mut self, decl: &VarDecl, env: &Env) -> EvalResult<()> {
        let mutable = decl.kind != VarKind::Const;
        for declarator in &decl.declarators {
            let value = match &declarator.init {
                Some(init) => self.eval(init, env)?,
                None => Value::Undefined,
            };
            self.bind_pattern(&declarator.pattern, value, env, mutable)?;
        }
        Ok(())
    }

    fn exec_for(
        &mut self,
        init: Option<&ForInit>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        env: &Env,
    ) -> EvalResult<Completion> {
        let mut scope = env.child();
        let mut loop_vars = Vec::new();
        match init {
            Some(ForInit::Var(decl)) => {
                self.exec_var(decl, &scope)?;
                if decl.kind != VarKind::Var {
                    for declarator in &decl.declarators {
                        loop_vars.extend(
                            declarator
                                .pattern
                                .bound_names()
                                .into_iter()
                                .map(|name| (name.to_string(), decl.kind != VarKind::Const)),
                        );
                    }
                }
            }
            Some(ForInit::Expr(expr)) => {
                self.eval(expr, &scope)?;
            }
            None => {}
        }
        loop {
            if let Some(test) = test {
                if !self.eval(test, &scope)?.is_truthy() {
                    break;
                }
            }
            match self.exec(body, &scope)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Normal | Completion::Continue => {}
            }
            // Each iteration sees a fresh copy of the loop bindings.
            if !loop_vars.is_empty() {
                let next = env.child();
                for (name, mutable) in &loop_vars {
                    next.define(name, scope.get(name).unwrap_or_default(), *mutable);
                }
                scope = next;
            }
            if let Some(update) = update {
                self.eval(update, &scope)?;
            }
        }
        Ok(Completion::Normal)
    }

    fn exec_switch(
        &mut self,
        discriminant: &Expr,
        cases: &[SwitchCase],
        env: &Env,
    ) -> EvalResult<Completion> {
        let value = self.eval(discriminant, env)?;
        let scope = env.child();
        let mut start = None;
        for (i, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                if self.eval(test, &scope)?.strict_eq(&value) {
                    start = Some(i);
                    break;
                }
            }
        }
        let start = start.or_else(|| cases.iter().position(|case| case.test.is_none()));
        let Some(start) = start else {
            return Ok(Completion::Normal);
        };
        for case in &cases[start..] {
            match self.exec_block(&case.body, &scope)? {
                Completion::Normal => {}
                Completion::Break => return Ok(Completion::Normal),
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal)
    }

    fn exec_try(
        &mut self,
        block: &[Stmt],
        param: Option<&Pattern>,
        handler: Option<&[Stmt]>,
        finalizer: Option<&[Stmt]>,
        env: &Env,
    ) -> EvalResult<Completion> {
        let mut result = self.exec_block(block, &env.child());
        let caught = match (&result, handler) {
            (Err(err), Some(_)) if err.is_catchable() => Some(error_value(err.clone())),
            _ => None,
        };
        if let (Some(caught), Some(handler)) = (caught, handler) {
            self.clear_fault();
            let scope = env.child();
            result = match param {
                Some(pattern) => self
                    .bind_pattern(pattern, caught, &scope, true)
                    .and_then(|()| self.exec_block(handler, &scope)),
                None => self.exec_block(handler, &scope),
            };
        }
        if let Some(finalizer) = finalizer {
            match self.exec_block(finalizer, &env.child())? {
                Completion::Normal => {}
                other => return Ok(other),
            }
        }
        result
    }

    // ══════════════════════════════════════════════════════════════════════
    // Patterns
    // ══════════════════════════════════════════════════════════════════════

    /// Bind `pattern` to `value` as new declarations in `env`.
    pub(crate) fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: Value,
        env: &Env,
        mutable: bool,
    ) -> EvalResult<()> {
        match pattern {
            Pattern::Ident(ident) => {
                env.define(&ident.name, value, mutable);
                Ok(())
            }
            Pattern::Object { props, rest } => {
                if value.is_nullish() {
                    return Err(EvalError::type_error(format!(
                        "Cannot destructure '{}' as it is {}.",
                        value.to_js_string(),
                        value.to_js_string()
                    )));
                }
                let mut used = Vec::with_capacity(props.len());
                for prop in props {
                    let key = match &prop.key {
                        PropKey::Named(name) => name.clone(),
                        PropKey::Computed(expr) => super::expr::property_key(&self.eval(expr, env)?),
                    };
                    let mut item = self.get_property(&value, &key)?;
                    if let (Value::Undefined, Some(default)) = (&item, &prop.default) {
                        item = self.eval(default, env)?;
                    }
                    self.bind_pattern(&prop.value, item, env, mutable)?;
                    used.push(key);
                }
                if let Some(rest) = rest {
                    let remaining = super::expr::own_entries(&value)
                        .into_iter()
                        .filter(|(key, _)| !used.contains(key));
                    self.bind_pattern(rest, Value::object(remaining.collect()), env, mutable)?;
                }
                Ok(())
            }
            Pattern::Array { elems, rest } => {
                let items = self.iterate(&value)?;
                for (i, elem) in elems.iter().enumerate() {
                    let Some(elem) = elem else { continue };
                    let mut item = items.get(i).cloned().unwrap_or_default();
                    if let (Value::Undefined, Some(default)) = (&item, &elem.default) {
                        item = self.eval(default, env)?;
                    }
                    self.bind_pattern(&elem.pattern, item, env, mutable)?;
                }
                if let Some(rest) = rest {
                    let tail = items.get(elems.len()..).map(<[Value]>::to_vec).unwrap_or_default();
                    self.bind_pattern(rest, Value::array(tail), env, mutable)?;
                }
                Ok(())
            }
        }
    }

    /// The items a spread or `for…of` sees.
    pub(crate) fn iterate(&self, value: &Value) -> EvalResult<Vec<Value>> {
        match value {
            Value::Array(items) => Ok(items.borrow().clone()),
            Value::String(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
            other => Err(EvalError::type_error(format!(
                "{} is not iterable",
                match other {
                    Value::Undefined | Value::Null => other.to_js_string(),
                    _ => other.type_of().to_string(),
                }
            ))),
        }
    }
}

/// Keys visited by `for…in`.
fn keys_of(value: &Value) -> Vec<Value> {
    match value {
        Value::Object(map) => map.borrow().keys().map(Value::string).collect(),
        Value::Array(items) => (0..items.borrow().len())
            .map(|i| Value::string(i.to_string()))
            .collect(),
        Value::String(s) => (0..s.chars().count())
            .map(|i| Value::string(i.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

/// The value a `catch` clause receives for an error.
pub(crate) fn error_value(err: EvalError) -> Value {
    let (name, message) = match err {
        EvalError::Thrown(value) => return value,
        EvalError::Type(message) => ("TypeError", message),
        EvalError::Reference(name) => ("ReferenceError", format!("{name} is not defined")),
        EvalError::Range(message) => ("RangeError", message),
        other => ("Error", other.to_string()),
    };
    Value::object_from([
        ("name", Value::string(name)),
        ("message", Value::string(message)),
    ])
}
