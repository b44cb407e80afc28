//! Script values and the conversions between them.

use canvas_types::ast::Function;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::env::Env;
use crate::error::EvalResult;
use crate::evaluator::Interpreter;

/// Properties of a plain object, in insertion order.
pub type Object = IndexMap<String, Value>;

/// Host function body: `(interpreter, this, args)`.
pub type NativeFn = dyn Fn(&mut Interpreter, Value, Vec<Value>) -> EvalResult<Value>;

/// A value the evaluator manipulates.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<Object>>),
    Closure(Rc<Closure>),
    Native(Rc<NativeFunction>),
    Element(Rc<Element>),
    /// The icon package: every PascalCase property is a component.
    Icons(Rc<IconSet>),
}

/// A script function together with the scope it was created in.
pub struct Closure {
    pub func: Rc<Function>,
    pub env: Env,
    /// The module the function was written in.
    pub path: Option<Rc<str>>,
}

/// What the renderer should make of a host function used as an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKind {
    Plain,
    Fragment,
    Provider(usize),
    Consumer(usize),
}

/// A function implemented by the host.
pub struct NativeFunction {
    pub name: Rc<str>,
    pub kind: NativeKind,
    /// Properties read off the function itself, like `Object.keys`.
    pub statics: Value,
    func: Box<NativeFn>,
}

impl NativeFunction {
    pub fn call(&self, interp: &mut Interpreter, this: Value, args: Vec<Value>) -> EvalResult<Value> {
        (self.func)(interp, this, args)
    }
}

/// An element description produced by the element factory.
#[derive(Debug)]
pub struct Element {
    pub ty: ElementType,
    /// Always an object; `children` lives here.
    pub props: Value,
    pub key: Option<Rc<str>>,
}

#[derive(Debug, Clone)]
pub enum ElementType {
    Tag(Rc<str>),
    Fragment,
    Provider(usize),
    Consumer(usize),
    Component(Value),
}

/// Lazily created icon components, one per name.
#[derive(Default)]
pub struct IconSet {
    icons: RefCell<BTreeMap<String, Value>>,
    factory: Option<Box<dyn Fn(&str) -> Value>>,
}

impl IconSet {
    pub fn new(factory: impl Fn(&str) -> Value + 'static) -> Self {
        Self {
            icons: RefCell::default(),
            factory: Some(Box::new(factory)),
        }
    }

    /// The component for `name`, or `undefined` if it is not an icon name.
    pub fn get(&self, name: &str) -> Value {
        if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
            return Value::Undefined;
        }
        if let Some(icon) = self.icons.borrow().get(name) {
            return icon.clone();
        }
        let Some(factory) = &self.factory else {
            return Value::Undefined;
        };
        let icon = factory(name);
        self.icons.borrow_mut().insert(name.to_string(), icon.clone());
        icon
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Construction
// ══════════════════════════════════════════════════════════════════════════════

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(props: Object) -> Self {
        Value::Object(Rc::new(RefCell::new(props)))
    }

    /// An object from `(key, value)` pairs.
    pub fn object_from<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn native<F>(name: &str, func: F) -> Self
    where
        F: Fn(&mut Interpreter, Value, Vec<Value>) -> EvalResult<Value> + 'static,
    {
        Value::native_kind(name, NativeKind::Plain, func)
    }

    pub fn native_kind<F>(name: &str, kind: NativeKind, func: F) -> Self
    where
        F: Fn(&mut Interpreter, Value, Vec<Value>) -> EvalResult<Value> + 'static,
    {
        Value::Native(Rc::new(NativeFunction {
            name: Rc::from(name),
            kind,
            statics: Value::Undefined,
            func: Box::new(func),
        }))
    }

    /// A host function that also carries properties.
    pub fn native_with_statics<F>(name: &str, statics: Value, func: F) -> Self
    where
        F: Fn(&mut Interpreter, Value, Vec<Value>) -> EvalResult<Value> + 'static,
    {
        Value::Native(Rc::new(NativeFunction {
            name: Rc::from(name),
            kind: NativeKind::Plain,
            statics,
            func: Box::new(func),
        }))
    }

    pub fn element(ty: ElementType, props: Value, key: Option<Rc<str>>) -> Self {
        Value::Element(Rc::new(Element { ty, props, key }))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Inspection
// ══════════════════════════════════════════════════════════════════════════════

impl Value {
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Closure(_) | Value::Native(_) => "function",
            Value::Null
            | Value::Array(_)
            | Value::Object(_)
            | Value::Element(_)
            | Value::Icons(_) => "object",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Native(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Own property of an object, `undefined` otherwise.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(map) => map.borrow().get(key).cloned().unwrap_or_default(),
            Value::Icons(icons) => icons.get(key),
            _ => Value::Undefined,
        }
    }

    /// Function name, for messages and component identity.
    pub fn function_name(&self) -> Option<String> {
        match self {
            Value::Closure(c) => Some(c.func.name.as_ref().map_or_else(String::new, |n| n.name.clone())),
            Value::Native(n) => Some(n.name.to_string()),
            _ => None,
        }
    }

    /// Identity of a function value; stable across closures of the same
    /// source function.
    pub fn function_id(&self) -> Option<usize> {
        match self {
            Value::Closure(c) => Some(Rc::as_ptr(&c.func) as usize),
            Value::Native(n) => Some(Rc::as_ptr(n) as *const () as usize),
            _ => None,
        }
    }

    /// How an uncaught thrown value reads in an error message.
    pub fn describe_thrown(&self) -> String {
        if let Value::Object(map) = self {
            let map = map.borrow();
            if let Some(message) = map.get("message") {
                let name = map
                    .get("name")
                    .map(Value::to_js_string)
                    .unwrap_or_else(|| "Error".to_string());
                return format!("{name}: {}", message.to_js_string());
            }
        }
        self.to_js_string()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Conversions
// ══════════════════════════════════════════════════════════════════════════════

impl Value {
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_js_string()),
            _ => f64::NAN,
        }
    }

    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Array(items) => items
                .borrow()
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.to_js_string() })
                .collect::<Vec<_>>()
                .join(","),
            Value::Closure(_) | Value::Native(_) => {
                let name = self.function_name().unwrap_or_default();
                format!("function {name}() {{ [native code] }}")
            }
            Value::Object(_) | Value::Element(_) | Value::Icons(_) => "[object Object]".to_string(),
        }
    }

    /// Integer conversion used by indices and string methods.
    pub fn to_integer(&self) -> f64 {
        let n = self.to_number();
        if n.is_nan() {
            0.0
        } else {
            n.trunc()
        }
    }

    /// `value` as a JSON value; functions and `undefined` have none.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value as Json;
        Some(match self {
            Value::Undefined | Value::Closure(_) | Value::Native(_) => return None,
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Json::from(*n as i64),
            Value::Number(n) => serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number),
            Value::String(s) => Json::String(s.to_string()),
            Value::Array(items) => Json::Array(
                items
                    .borrow()
                    .iter()
                    .map(|v| v.to_json().unwrap_or(Json::Null))
                    .collect(),
            ),
            Value::Object(map) => Json::Object(
                map.borrow()
                    .iter()
                    .filter_map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                    .collect(),
            ),
            Value::Element(_) | Value::Icons(_) => Json::Object(serde_json::Map::new()),
        })
    }

    pub fn from_json(json: &serde_json::Value) -> Value {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::string(s),
            Json::Array(items) => Value::array(items.iter().map(Value::from_json).collect()),
            Json::Object(map) => Value::object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// `Number(text)` semantics.
pub fn string_to_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };
    if body == "Infinity" {
        return sign * f64::INFINITY;
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).map_or(f64::NAN, |n| n as f64);
        }
    }
    if body.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    text.parse().unwrap_or(f64::NAN)
}

/// `String(number)` semantics.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if n.fract() == 0.0 && abs < 1e21 {
        return format!("{n:.0}");
    }
    if abs >= 1e21 || abs < 1e-6 {
        let text = format!("{n:e}");
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => text,
        };
    }
    format!("{n}")
}

// ══════════════════════════════════════════════════════════════════════════════
// Equality
// ══════════════════════════════════════════════════════════════════════════════

impl Value {
    /// `===`
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => self.same_reference(other),
        }
    }

    /// `Object.is`: like `===` except for `NaN` and signed zeros.
    pub fn object_is(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                (a.is_nan() && b.is_nan()) || (a == b && a.is_sign_negative() == b.is_sign_negative())
            }
            _ => self.strict_eq(other),
        }
    }

    /// `==`
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Value::Bool(_), _) => Value::Number(self.to_number()).loose_eq(other),
            (_, Value::Bool(_)) => self.loose_eq(&Value::Number(other.to_number())),
            (Value::Array(_) | Value::Object(_), Value::String(_) | Value::Number(_)) => {
                Value::string(self.to_js_string()).loose_eq(other)
            }
            (Value::String(_) | Value::Number(_), Value::Array(_) | Value::Object(_)) => {
                self.loose_eq(&Value::string(other.to_js_string()))
            }
            _ => self.strict_eq(other),
        }
    }

    fn same_reference(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Element(a), Value::Element(b)) => Rc::ptr_eq(a, b),
            (Value::Icons(a), Value::Icons(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Formatting
// ══════════════════════════════════════════════════════════════════════════════

/// How `console.log` shows a value: strings bare, everything else in a
/// JSON-like form with cycles and depth cut off.
pub fn inspect(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        other => inspect_nested(other, 0),
    }
}

const MAX_INSPECT_DEPTH: usize = 4;

fn inspect_nested(value: &Value, depth: usize) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        Value::Array(items) => {
            if depth >= MAX_INSPECT_DEPTH {
                return "[Array]".to_string();
            }
            let Ok(items) = items.try_borrow() else {
                return "[Circular]".to_string();
            };
            let parts: Vec<String> = items.iter().map(|v| inspect_nested(v, depth + 1)).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(map) => {
            if depth >= MAX_INSPECT_DEPTH {
                return "[Object]".to_string();
            }
            let Ok(map) = map.try_borrow() else {
                return "[Circular]".to_string();
            };
            if map.is_empty() {
                return "{}".to_string();
            }
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{k}: {}", inspect_nested(v, depth + 1)))
                .collect();
            format!("{{ {} }}", parts.join(", "))
        }
        Value::Closure(_) | Value::Native(_) => {
            format!("[Function: {}]", value.function_name().unwrap_or_default())
        }
        Value::Element(element) => match &element.ty {
            ElementType::Tag(tag) => format!("<{tag} />"),
            ElementType::Component(c) => format!("<{} />", c.function_name().unwrap_or_default()),
            _ => "<>".to_string(),
        },
        Value::Icons(_) => "[Module: icons]".to_string(),
        other => other.to_js_string(),
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            other => f.write_str(&inspect_nested(other, 0)),
        }
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.func.name.as_ref().map(|n| n.name.as_str()))
            .field("path", &self.path)
            .finish()
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}
