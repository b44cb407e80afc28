//! Expression evaluation.

use canvas_types::ast::*;
use std::rc::Rc;

use super::Interpreter;
use crate::env::{Env, SetError};
use crate::error::{EvalError, EvalResult};
use crate::value::{format_number, Closure, Object, Value};

impl Interpreter {
    /// Evaluate an expression to a value.
    pub(crate) fn eval(&mut self, expr: &Expr, env: &Env) -> EvalResult<Value> {
        self.tick()?;
        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::String(s) => Ok(Value::string(s)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Template { quasis, exprs } => self.eval_template(quasis, exprs, env),
            ExprKind::Ident(name) => self.lookup(name, env),
            ExprKind::Array(elems) => self.eval_array(elems, env),
            ExprKind::Object(props) => self.eval_object(props, env),
            ExprKind::Function(func) => Ok(self.closure(func, env)),
            ExprKind::Member { .. } | ExprKind::Call { .. } => {
                Ok(self.eval_chain(expr, env)?.unwrap_or_default())
            }
            ExprKind::New { callee, args } => {
                let callee = self.eval(callee, env)?;
                let args = self.eval_args(args, env)?;
                self.construct(&callee, args)
            }
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand, env),
            ExprKind::Update { op, prefix, target } => self.eval_update(*op, *prefix, target, env),
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                self.binary(*op, &left, &right)
            }
            ExprKind::Logical { op, left, right } => {
                let left = self.eval(left, env)?;
                if short_circuits(*op, &left) {
                    Ok(left)
                } else {
                    self.eval(right, env)
                }
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.is_truthy() {
                    self.eval(consequent, env)
                } else {
                    self.eval(alternate, env)
                }
            }
            ExprKind::Assign { op, target, value } => self.eval_assign(*op, target, value, env),
            ExprKind::Sequence(exprs) => {
                let mut last = Value::Undefined;
                for expr in exprs {
                    last = self.eval(expr, env)?;
                }
                Ok(last)
            }
            ExprKind::Jsx(_) => Err(EvalError::Unsupported(
                "markup must be lowered before evaluation".into(),
            )),
        }
    }

    pub(crate) fn closure(&self, func: &Rc<Function>, env: &Env) -> Value {
        Value::Closure(Rc::new(Closure {
            func: Rc::clone(func),
            env: env.clone(),
            path: self.path.clone(),
        }))
    }

    fn lookup(&self, name: &str, env: &Env) -> EvalResult<Value> {
        match env.get(name) {
            Some(value) => Ok(value),
            None if name == "undefined" => Ok(Value::Undefined),
            None => Err(EvalError::Reference(name.to_string())),
        }
    }

    // ── Literals ──────────────────────────────────────────────────────────

    fn eval_template(&mut self, quasis: &[String], exprs: &[Expr], env: &Env) -> EvalResult<Value> {
        let mut out = String::new();
        for (i, quasi) in quasis.iter().enumerate() {
            out.push_str(quasi);
            if let Some(expr) = exprs.get(i) {
                out.push_str(&self.eval(expr, env)?.to_js_string());
            }
        }
        Ok(Value::string(out))
    }

    fn eval_array(&mut self, elems: &[ArrayElem], env: &Env) -> EvalResult<Value> {
        let mut items = Vec::with_capacity(elems.len());
        for elem in elems {
            match elem {
                ArrayElem::Expr(expr) => items.push(self.eval(expr, env)?),
                ArrayElem::Spread(expr) => {
                    let value = self.eval(expr, env)?;
                    items.extend(self.iterate(&value)?);
                }
                ArrayElem::Hole => items.push(Value::Undefined),
            }
        }
        Ok(Value::array(items))
    }

    fn eval_object(&mut self, props: &[ObjectProp], env: &Env) -> EvalResult<Value> {
        let mut object = Object::new();
        for prop in props {
            match prop {
                ObjectProp::KeyValue { key, value } => {
                    let key = self.prop_key(key, env)?;
                    let value = self.eval(value, env)?;
                    object.insert(key, value);
                }
                ObjectProp::Shorthand(ident) => {
                    let value = self.lookup(&ident.name, env)?;
                    object.insert(ident.name.clone(), value);
                }
                ObjectProp::Spread(expr) => {
                    let value = self.eval(expr, env)?;
                    for (key, value) in own_entries(&value) {
                        object.insert(key, value);
                    }
                }
            }
        }
        Ok(Value::object(object))
    }

    fn prop_key(&mut self, key: &PropKey, env: &Env) -> EvalResult<String> {
        match key {
            PropKey::Named(name) => Ok(name.clone()),
            PropKey::Computed(expr) => Ok(property_key(&self.eval(expr, env)?)),
        }
    }

    fn member_key(&mut self, property: &MemberProp, env: &Env) -> EvalResult<String> {
        match property {
            MemberProp::Name(name) => Ok(name.clone()),
            MemberProp::Computed(expr) => Ok(property_key(&self.eval(expr, env)?)),
        }
    }

    // ── Member access & calls ────────────────────────────────────────────

    /// Evaluate a member/call chain. `None` means an optional link hit a
    /// nullish value and the rest of the chain is skipped.
    fn eval_chain(&mut self, expr: &Expr, env: &Env) -> EvalResult<Option<Value>> {
        match &expr.kind {
            ExprKind::Member {
                object,
                property,
                optional,
            } => {
                let Some(object) = self.eval_chain(object, env)? else {
                    return Ok(None);
                };
                if *optional && object.is_nullish() {
                    return Ok(None);
                }
                let key = self.member_key(property, env)?;
                self.get_property(&object, &key).map(Some)
            }
            ExprKind::Call {
                callee,
                args,
                optional,
            } => {
                let (this, func) = match &callee.kind {
                    ExprKind::Member {
                        object,
                        property,
                        optional: member_optional,
                    } => {
                        let Some(object) = self.eval_chain(object, env)? else {
                            return Ok(None);
                        };
                        if *member_optional && object.is_nullish() {
                            return Ok(None);
                        }
                        let key = self.member_key(property, env)?;
                        let func = self.get_property(&object, &key)?;
                        (object, func)
                    }
                    _ => match self.eval_chain(callee, env)? {
                        Some(func) => (Value::Undefined, func),
                        None => return Ok(None),
                    },
                };
                if *optional && func.is_nullish() {
                    return Ok(None);
                }
                if !func.is_callable() {
                    return Err(EvalError::type_error(format!(
                        "{} is not a function",
                        callee_label(callee)
                    )));
                }
                let args = self.eval_args(args, env)?;
                self.call(&func, this, args).map(Some)
            }
            _ => self.eval(expr, env).map(Some),
        }
    }

    pub(crate) fn eval_args(&mut self, args: &[Arg], env: &Env) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Arg::Expr(expr) => values.push(self.eval(expr, env)?),
                Arg::Spread(expr) => {
                    let value = self.eval(expr, env)?;
                    values.extend(self.iterate(&value)?);
                }
            }
        }
        Ok(values)
    }

    // ── Operators ────────────────────────────────────────────────────────

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, env: &Env) -> EvalResult<Value> {
        if op == UnaryOp::TypeOf {
            if let ExprKind::Ident(name) = &operand.kind {
                if !env.has(name) {
                    return Ok(Value::string("undefined"));
                }
            }
        }
        let value = self.eval(operand, env)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.is_truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::TypeOf => Value::string(value.type_of()),
            UnaryOp::Void => Value::Undefined,
        })
    }

    fn eval_update(
        &mut self,
        op: UpdateOp,
        prefix: bool,
        target: &Expr,
        env: &Env,
    ) -> EvalResult<Value> {
        let old = self.eval(target, env)?.to_number();
        let new = match op {
            UpdateOp::Increment => old + 1.0,
            UpdateOp::Decrement => old - 1.0,
        };
        self.assign_to(target, Value::Number(new), env)?;
        Ok(Value::Number(if prefix { new } else { old }))
    }

    /// Apply a binary operator to two evaluated operands.
    pub(crate) fn binary(&mut self, op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
        let number = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));
        Ok(match op {
            BinaryOp::Add => {
                let left = to_primitive(left);
                let right = to_primitive(right);
                if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                    Value::string(format!("{}{}", left.to_js_string(), right.to_js_string()))
                } else {
                    Value::Number(left.to_number() + right.to_number())
                }
            }
            BinaryOp::Sub => number(|a, b| a - b),
            BinaryOp::Mul => number(|a, b| a * b),
            BinaryOp::Div => number(|a, b| a / b),
            BinaryOp::Mod => number(|a, b| a % b),
            BinaryOp::Exp => number(f64::powf),
            BinaryOp::StrictEq => Value::Bool(left.strict_eq(right)),
            BinaryOp::StrictNotEq => Value::Bool(!left.strict_eq(right)),
            BinaryOp::LooseEq => Value::Bool(left.loose_eq(right)),
            BinaryOp::LooseNotEq => Value::Bool(!left.loose_eq(right)),
            BinaryOp::Less => compare(left, right, |o| o.is_lt()),
            BinaryOp::Greater => compare(left, right, |o| o.is_gt()),
            BinaryOp::LessEq => compare(left, right, |o| o.is_le()),
            BinaryOp::GreaterEq => compare(left, right, |o| o.is_ge()),
            BinaryOp::In => {
                let key = property_key(left);
                Value::Bool(match right {
                    Value::Object(map) => map.borrow().contains_key(&key),
                    Value::Array(items) => {
                        key == "length"
                            || key.parse::<usize>().is_ok_and(|i| i < items.borrow().len())
                    }
                    Value::Icons(_) => !right.get(&key).is_nullish(),
                    Value::Closure(_) | Value::Native(_) | Value::Element(_) => {
                        !self.get_property(right, &key)?.is_nullish()
                    }
                    other => {
                        return Err(EvalError::type_error(format!(
                            "Cannot use 'in' operator to search for '{key}' in {}",
                            other.to_js_string()
                        )))
                    }
                })
            }
        })
    }

    // ── Assignment ───────────────────────────────────────────────────────

    fn eval_assign(&mut self, op: AssignOp, target: &Expr, value: &Expr, env: &Env) -> EvalResult<Value> {
        let binary = match op {
            AssignOp::Assign => {
                let value = self.eval(value, env)?;
                self.assign_to(target, value.clone(), env)?;
                return Ok(value);
            }
            AssignOp::And | AssignOp::Or | AssignOp::Nullish => {
                let current = self.eval(target, env)?;
                let logical = match op {
                    AssignOp::And => LogicalOp::And,
                    AssignOp::Or => LogicalOp::Or,
                    _ => LogicalOp::Nullish,
                };
                if short_circuits(logical, &current) {
                    return Ok(current);
                }
                let value = self.eval(value, env)?;
                self.assign_to(target, value.clone(), env)?;
                return Ok(value);
            }
            AssignOp::Add => BinaryOp::Add,
            AssignOp::Sub => BinaryOp::Sub,
            AssignOp::Mul => BinaryOp::Mul,
            AssignOp::Div => BinaryOp::Div,
            AssignOp::Mod => BinaryOp::Mod,
        };
        let current = self.eval(target, env)?;
        let operand = self.eval(value, env)?;
        let value = self.binary(binary, &current, &operand)?;
        self.assign_to(target, value.clone(), env)?;
        Ok(value)
    }

    /// Store `value` into an assignment target, destructuring array and
    /// object literals.
    pub(crate) fn assign_to(&mut self, target: &Expr, value: Value, env: &Env) -> EvalResult<()> {
        match &target.kind {
            ExprKind::Ident(name) => env.set(name, value).map_err(|err| match err {
                SetError::Constant => EvalError::type_error("Assignment to constant variable."),
                SetError::Undeclared => EvalError::Reference(name.clone()),
            }),
            ExprKind::Member {
                object, property, ..
            } => {
                let object = self.eval(object, env)?;
                let key = self.member_key(property, env)?;
                self.set_property(&object, &key, value)
            }
            ExprKind::Array(elems) => {
                let items = self.iterate(&value)?;
                for (i, elem) in elems.iter().enumerate() {
                    match elem {
                        ArrayElem::Expr(target) => {
                            let item = items.get(i).cloned().unwrap_or_default();
                            self.assign_with_default(target, item, env)?;
                        }
                        ArrayElem::Spread(target) => {
                            let rest = items.get(i..).map(<[Value]>::to_vec).unwrap_or_default();
                            self.assign_to(target, Value::array(rest), env)?;
                        }
                        ArrayElem::Hole => {}
                    }
                }
                Ok(())
            }
            ExprKind::Object(props) => {
                if value.is_nullish() {
                    return Err(EvalError::type_error(format!(
                        "Cannot destructure '{}' as it is {}.",
                        value.to_js_string(),
                        value.to_js_string()
                    )));
                }
                for prop in props {
                    match prop {
                        ObjectProp::KeyValue { key, value: target } => {
                            let key = self.prop_key(key, env)?;
                            let item = self.get_property(&value, &key)?;
                            self.assign_with_default(target, item, env)?;
                        }
                        ObjectProp::Shorthand(ident) => {
                            let item = self.get_property(&value, &ident.name)?;
                            env.set(&ident.name, item).map_err(|_| {
                                EvalError::Reference(ident.name.clone())
                            })?;
                        }
                        ObjectProp::Spread(_) => {
                            return Err(EvalError::Unsupported(
                                "rest properties in assignment".into(),
                            ))
                        }
                    }
                }
                Ok(())
            }
            _ => Err(EvalError::Unsupported("invalid assignment target".into())),
        }
    }

    fn assign_with_default(&mut self, target: &Expr, value: Value, env: &Env) -> EvalResult<()> {
        if let ExprKind::Assign {
            op: AssignOp::Assign,
            target,
            value: default,
        } = &target.kind
        {
            let value = match value {
                Value::Undefined => self.eval(default, env)?,
                other => other,
            };
            return self.assign_to(target, value, env);
        }
        self.assign_to(target, value, env)
    }
}

fn short_circuits(op: LogicalOp, left: &Value) -> bool {
    match op {
        LogicalOp::And => !left.is_truthy(),
        LogicalOp::Or => left.is_truthy(),
        LogicalOp::Nullish => !left.is_nullish(),
    }
}

fn to_primitive(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) | Value::Element(_) | Value::Icons(_) => {
            Value::string(value.to_js_string())
        }
        other => other.clone(),
    }
}

fn compare(left: &Value, right: &Value, test: fn(std::cmp::Ordering) -> bool) -> Value {
    let (left, right) = (to_primitive(left), to_primitive(right));
    if let (Value::String(a), Value::String(b)) = (&left, &right) {
        return Value::Bool(test(a.cmp(b)));
    }
    Value::Bool(
        left.to_number()
            .partial_cmp(&right.to_number())
            .is_some_and(test),
    )
}

/// The property name a value denotes when used as a key.
pub(crate) fn property_key(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        other => other.to_js_string(),
    }
}

/// Enumerable own `(key, value)` pairs, as object spread sees them.
pub(crate) fn own_entries(value: &Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(map) => map
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        Value::Array(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        Value::String(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), Value::string(c.to_string())))
            .collect(),
        _ => Vec::new(),
    }
}

fn callee_label(callee: &Expr) -> String {
    match &callee.kind {
        ExprKind::Ident(name) => name.clone(),
        ExprKind::Member {
            object,
            property: MemberProp::Name(name),
            ..
        } => format!("{}.{name}", callee_label(object)),
        ExprKind::Member { object, .. } => format!("{}[...]", callee_label(object)),
        ExprKind::Call { callee, .. } => format!("{}(...)", callee_label(callee)),
        _ => "expression".to_string(),
    }
}
