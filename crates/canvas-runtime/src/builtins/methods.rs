//! Property access: own properties plus the built-in methods of strings,
//! arrays, numbers and functions.
//!
//! Methods are materialised on access as host functions bound to their
//! receiver. String indices count `char`s.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use super::{arg, array_length, string_length, to_fixed};
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{property_key, Interpreter};
use crate::value::{format_number, ElementType, Value};

const ARRAY_METHODS: &[&str] = &[
    "map", "filter", "forEach", "reduce", "reduceRight", "find", "findIndex", "findLast",
    "findLastIndex", "some", "every", "includes", "indexOf", "lastIndexOf", "join", "slice",
    "concat", "push", "pop", "shift", "unshift", "splice", "reverse", "sort", "flat", "flatMap",
    "fill", "at", "keys", "entries", "toString",
];

const STRING_METHODS: &[&str] = &[
    "toUpperCase", "toLowerCase", "trim", "trimStart", "trimEnd", "split", "includes",
    "startsWith", "endsWith", "indexOf", "lastIndexOf", "slice", "substring", "charAt",
    "replace", "replaceAll", "padStart", "padEnd", "repeat", "at", "charCodeAt",
    "localeCompare", "concat", "toString",
];

impl Interpreter {
    /// `object[key]`.
    pub(crate) fn get_property(&mut self, object: &Value, key: &str) -> EvalResult<Value> {
        Ok(match object {
            Value::Undefined | Value::Null => {
                return Err(EvalError::type_error(format!(
                    "Cannot read properties of {} (reading '{key}')",
                    object.to_js_string()
                )))
            }
            Value::Object(map) => {
                if let Some(value) = map.borrow().get(key) {
                    return Ok(value.clone());
                }
                match key {
                    "hasOwnProperty" => {
                        let map = Rc::clone(map);
                        Value::native("hasOwnProperty", move |_, _, args| {
                            Ok(Value::Bool(map.borrow().contains_key(&property_key(&arg(&args, 0)))))
                        })
                    }
                    "toString" => Value::native("toString", |_, _, _| Ok(Value::string("[object Object]"))),
                    _ => Value::Undefined,
                }
            }
            Value::Array(items) => {
                if key == "length" {
                    return Ok(Value::Number(items.borrow().len() as f64));
                }
                if let Ok(index) = key.parse::<usize>() {
                    return Ok(items.borrow().get(index).cloned().unwrap_or_default());
                }
                match ARRAY_METHODS.iter().find(|m| **m == key) {
                    Some(name) => {
                        let items = Rc::clone(items);
                        Value::native(name, move |interp, _, args| array_method(interp, &items, name, args))
                    }
                    None => Value::Undefined,
                }
            }
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.chars().count() as f64));
                }
                if let Ok(index) = key.parse::<usize>() {
                    return Ok(s
                        .chars()
                        .nth(index)
                        .map_or(Value::Undefined, |c| Value::string(c.to_string())));
                }
                match STRING_METHODS.iter().find(|m| **m == key) {
                    Some(name) => {
                        let s = Rc::clone(s);
                        Value::native(name, move |interp, _, args| string_method(interp, &s, name, args))
                    }
                    None => Value::Undefined,
                }
            }
            Value::Number(n) => {
                let n = *n;
                match key {
                    "toFixed" => Value::native("toFixed", move |_, _, args| {
                        let digits = arg(&args, 0).to_integer();
                        if !(0.0..=100.0).contains(&digits) {
                            return Err(EvalError::Range("toFixed() digits argument must be between 0 and 100".into()));
                        }
                        Ok(Value::string(to_fixed(n, digits as usize)))
                    }),
                    "toString" => Value::native("toString", move |_, _, args| {
                        Ok(Value::string(match arg(&args, 0) {
                            Value::Undefined => format_number(n),
                            radix => to_radix(n, radix.to_integer() as u32),
                        }))
                    }),
                    "toLocaleString" => Value::native("toLocaleString", move |_, _, _| {
                        Ok(Value::string(to_locale(n)))
                    }),
                    "valueOf" => Value::native("valueOf", move |_, _, _| Ok(Value::Number(n))),
                    _ => Value::Undefined,
                }
            }
            Value::Bool(b) => match key {
                "toString" => {
                    let b = *b;
                    Value::native("toString", move |_, _, _| Ok(Value::string(b.to_string())))
                }
                _ => Value::Undefined,
            },
            Value::Closure(_) | Value::Native(_) => function_property(object, key),
            Value::Element(element) => match key {
                "props" => element.props.clone(),
                "key" => element
                    .key
                    .as_ref()
                    .map_or(Value::Null, |k| Value::String(Rc::clone(k))),
                "type" => match &element.ty {
                    ElementType::Tag(tag) => Value::String(Rc::clone(tag)),
                    ElementType::Component(component) => component.clone(),
                    _ => Value::Undefined,
                },
                _ => Value::Undefined,
            },
            Value::Icons(icons) => icons.get(key),
        })
    }

    /// `object[key] = value`.
    pub(crate) fn set_property(&mut self, object: &Value, key: &str, value: Value) -> EvalResult<()> {
        match object {
            Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
                "Cannot set properties of {} (setting '{key}')",
                object.to_js_string()
            ))),
            Value::Object(map) => {
                map.borrow_mut().insert(key.to_string(), value);
                Ok(())
            }
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                if key == "length" {
                    let length = array_length(value.to_number())?;
                    grow(&mut items, length)?;
                    items.truncate(length);
                } else if let Ok(index) = key.parse::<usize>() {
                    if index >= items.len() {
                        grow(&mut items, array_length(index as f64 + 1.0)?)?;
                    }
                    items[index] = value;
                }
                Ok(())
            }
            // Primitives and functions silently drop writes, e.g.
            // `Component.displayName = "..."`.
            _ => Ok(()),
        }
    }
}

/// Extend `items` with holes up to `length`.
fn grow(items: &mut Vec<Value>, length: usize) -> EvalResult<()> {
    if length > items.len() {
        items
            .try_reserve_exact(length - items.len())
            .map_err(|_| EvalError::Range("Invalid array length".into()))?;
        items.resize(length, Value::Undefined);
    }
    Ok(())
}

fn function_property(func: &Value, key: &str) -> Value {
    if let Value::Native(native) = func {
        let value = native.statics.get(key);
        if !matches!(value, Value::Undefined) {
            return value;
        }
    }
    let func = func.clone();
    match key {
        "name" => Value::string(func.function_name().unwrap_or_default()),
        "call" => Value::native("call", move |interp, _, mut args| {
            let this = if args.is_empty() { Value::Undefined } else { args.remove(0) };
            interp.call(&func, this, args)
        }),
        "apply" => Value::native("apply", move |interp, _, args| {
            let list = match arg(&args, 1) {
                Value::Undefined | Value::Null => Vec::new(),
                other => interp.iterate(&other)?,
            };
            interp.call(&func, arg(&args, 0), list)
        }),
        "bind" => Value::native("bind", move |_, _, mut args| {
            let this = if args.is_empty() { Value::Undefined } else { args.remove(0) };
            let (func, bound) = (func.clone(), args);
            Ok(Value::native("bound", move |interp, _, args| {
                let mut all = bound.clone();
                all.extend(args);
                interp.call(&func, this.clone(), all)
            }))
        }),
        _ => Value::Undefined,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Arrays
// ══════════════════════════════════════════════════════════════════════════════

fn array_method(
    interp: &mut Interpreter,
    items: &Rc<RefCell<Vec<Value>>>,
    name: &str,
    args: Vec<Value>,
) -> EvalResult<Value> {
    let this = Value::Array(Rc::clone(items));
    let snapshot = || items.borrow().clone();
    let callback = arg(&args, 0);
    let visit = |interp: &mut Interpreter, item: &Value, index: usize| -> EvalResult<Value> {
        interp.call(
            &callback,
            Value::Undefined,
            vec![item.clone(), Value::Number(index as f64), this.clone()],
        )
    };
    let require_callback = || {
        if arg(&args, 0).is_callable() {
            Ok(())
        } else {
            Err(EvalError::type_error(format!(
                "{} is not a function",
                arg(&args, 0).to_js_string()
            )))
        }
    };

    Ok(match name {
        "map" => {
            require_callback()?;
            let mut out = Vec::new();
            for (i, item) in snapshot().iter().enumerate() {
                out.push(visit(interp, item, i)?);
            }
            Value::array(out)
        }
        "filter" => {
            require_callback()?;
            let mut out = Vec::new();
            for (i, item) in snapshot().into_iter().enumerate() {
                if visit(interp, &item, i)?.is_truthy() {
                    out.push(item);
                }
            }
            Value::array(out)
        }
        "forEach" => {
            require_callback()?;
            for (i, item) in snapshot().iter().enumerate() {
                visit(interp, item, i)?;
            }
            Value::Undefined
        }
        "flatMap" => {
            require_callback()?;
            let mut out = Vec::new();
            for (i, item) in snapshot().iter().enumerate() {
                match visit(interp, item, i)? {
                    Value::Array(inner) => out.extend(inner.borrow().iter().cloned()),
                    other => out.push(other),
                }
            }
            Value::array(out)
        }
        "some" | "every" | "find" | "findIndex" | "findLast" | "findLastIndex" => {
            require_callback()?;
            let items = snapshot();
            let mut order: Vec<usize> = (0..items.len()).collect();
            if name.starts_with("findLast") {
                order.reverse();
            }
            let mut hit = None;
            for i in order {
                let matched = visit(interp, &items[i], i)?.is_truthy();
                if matched != (name == "every") {
                    hit = Some(i);
                    break;
                }
            }
            match name {
                "some" => Value::Bool(hit.is_some()),
                "every" => Value::Bool(hit.is_none()),
                "find" | "findLast" => hit.map_or(Value::Undefined, |i| items[i].clone()),
                _ => Value::Number(hit.map_or(-1.0, |i| i as f64)),
            }
        }
        "reduce" | "reduceRight" => {
            require_callback()?;
            let mut items: Vec<(usize, Value)> = snapshot().into_iter().enumerate().collect();
            if name == "reduceRight" {
                items.reverse();
            }
            let mut items = items.into_iter();
            let mut acc = match args.get(1) {
                Some(initial) => initial.clone(),
                None => match items.next() {
                    Some((_, first)) => first,
                    None => {
                        return Err(EvalError::type_error(
                            "Reduce of empty array with no initial value",
                        ))
                    }
                },
            };
            for (i, item) in items {
                acc = interp.call(
                    &callback,
                    Value::Undefined,
                    vec![acc, item, Value::Number(i as f64), this.clone()],
                )?;
            }
            acc
        }
        "includes" => {
            let needle = arg(&args, 0);
            Value::Bool(items.borrow().iter().any(|v| v.object_is(&needle) || v.strict_eq(&needle)))
        }
        "indexOf" | "lastIndexOf" => {
            let needle = arg(&args, 0);
            let items = items.borrow();
            let found = if name == "indexOf" {
                items.iter().position(|v| v.strict_eq(&needle))
            } else {
                items.iter().rposition(|v| v.strict_eq(&needle))
            };
            Value::Number(found.map_or(-1.0, |i| i as f64))
        }
        "join" => {
            let sep = match arg(&args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_js_string(),
            };
            let parts: Vec<String> = items
                .borrow()
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.to_js_string() })
                .collect();
            Value::string(parts.join(&sep))
        }
        "toString" => Value::string(this.to_js_string()),
        "slice" => {
            let items = items.borrow();
            let (start, end) = range(items.len(), &arg(&args, 0), &arg(&args, 1));
            Value::array(items.get(start..end.max(start)).map(<[Value]>::to_vec).unwrap_or_default())
        }
        "at" => {
            let items = items.borrow();
            let index = arg(&args, 0).to_integer();
            let index = if index < 0.0 { items.len() as f64 + index } else { index };
            if index < 0.0 {
                Value::Undefined
            } else {
                items.get(index as usize).cloned().unwrap_or_default()
            }
        }
        "concat" => {
            let mut out = snapshot();
            for extra in &args {
                match extra {
                    Value::Array(more) => out.extend(more.borrow().iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Value::array(out)
        }
        "push" => {
            let mut items = items.borrow_mut();
            items.extend(args);
            Value::Number(items.len() as f64)
        }
        "pop" => items.borrow_mut().pop().unwrap_or_default(),
        "shift" => {
            let mut items = items.borrow_mut();
            if items.is_empty() {
                Value::Undefined
            } else {
                items.remove(0)
            }
        }
        "unshift" => {
            let mut items = items.borrow_mut();
            let tail = std::mem::take(&mut *items);
            items.extend(args);
            items.extend(tail);
            Value::Number(items.len() as f64)
        }
        "splice" => {
            let mut items = items.borrow_mut();
            let len = items.len();
            let (start, _) = range(len, &arg(&args, 0), &Value::Undefined);
            let count = match args.get(1) {
                Some(count) => (count.to_integer().max(0.0) as usize).min(len - start),
                None => len - start,
            };
            let inserted: Vec<Value> = args.into_iter().skip(2).collect();
            Value::array(items.splice(start..start + count, inserted).collect())
        }
        "reverse" => {
            items.borrow_mut().reverse();
            this
        }
        "fill" => {
            let value = arg(&args, 0);
            let mut items = items.borrow_mut();
            let (start, end) = range(items.len(), &arg(&args, 1), &arg(&args, 2));
            for slot in items.iter_mut().take(end).skip(start) {
                *slot = value.clone();
            }
            drop(items);
            this
        }
        "flat" => {
            let depth = match arg(&args, 0) {
                Value::Undefined => 1.0,
                other => other.to_integer(),
            };
            Value::array(flatten(&snapshot(), depth))
        }
        "sort" => {
            let mut sorted = snapshot();
            let mut failure = None;
            sorted.sort_by(|a, b| {
                if failure.is_some() {
                    return Ordering::Equal;
                }
                match sort_order(interp, &callback, a, b) {
                    Ok(order) => order,
                    Err(err) => {
                        failure = Some(err);
                        Ordering::Equal
                    }
                }
            });
            if let Some(err) = failure {
                return Err(err);
            }
            *items.borrow_mut() = sorted;
            this
        }
        "keys" => Value::array((0..items.borrow().len()).map(|i| Value::Number(i as f64)).collect()),
        "entries" => Value::array(
            snapshot()
                .into_iter()
                .enumerate()
                .map(|(i, v)| Value::array(vec![Value::Number(i as f64), v]))
                .collect(),
        ),
        _ => Value::Undefined,
    })
}

fn sort_order(interp: &mut Interpreter, compare: &Value, a: &Value, b: &Value) -> EvalResult<Ordering> {
    // Undefined always sorts last.
    match (a, b) {
        (Value::Undefined, Value::Undefined) => return Ok(Ordering::Equal),
        (Value::Undefined, _) => return Ok(Ordering::Greater),
        (_, Value::Undefined) => return Ok(Ordering::Less),
        _ => {}
    }
    if compare.is_callable() {
        let n = interp
            .call(compare, Value::Undefined, vec![a.clone(), b.clone()])?
            .to_number();
        return Ok(n.partial_cmp(&0.0).unwrap_or(Ordering::Equal));
    }
    Ok(a.to_js_string().cmp(&b.to_js_string()))
}

fn flatten(items: &[Value], depth: f64) -> Vec<Value> {
    let mut out = Vec::new();
    for item in items {
        match item {
            Value::Array(inner) if depth >= 1.0 => out.extend(flatten(&inner.borrow(), depth - 1.0)),
            other => out.push(other.clone()),
        }
    }
    out
}

/// Resolve `slice`-style `start`/`end` arguments against `len`.
fn range(len: usize, start: &Value, end: &Value) -> (usize, usize) {
    let clamp = |value: &Value, default: usize| -> usize {
        if matches!(value, Value::Undefined) {
            return default;
        }
        let n = value.to_integer();
        if n < 0.0 {
            (len as f64 + n).max(0.0) as usize
        } else {
            (n as usize).min(len)
        }
    };
    (clamp(start, 0), clamp(end, len))
}

// ══════════════════════════════════════════════════════════════════════════════
// Strings
// ══════════════════════════════════════════════════════════════════════════════

fn string_method(interp: &mut Interpreter, s: &str, name: &str, args: Vec<Value>) -> EvalResult<Value> {
    let text_arg = |i: usize| arg(&args, i).to_js_string();
    let chars: Vec<char> = s.chars().collect();
    let substring = |start: usize, end: usize| -> Value {
        let start = start.min(chars.len());
        let end = end.clamp(start, chars.len());
        Value::string(chars[start..end].iter().collect::<String>())
    };

    Ok(match name {
        "toUpperCase" => Value::string(s.to_uppercase()),
        "toLowerCase" => Value::string(s.to_lowercase()),
        "trim" => Value::string(s.trim()),
        "trimStart" => Value::string(s.trim_start()),
        "trimEnd" => Value::string(s.trim_end()),
        "toString" => Value::string(s),
        "concat" => Value::string(args.iter().fold(s.to_string(), |mut out, v| {
            out.push_str(&v.to_js_string());
            out
        })),
        "split" => {
            let parts: Vec<Value> = match arg(&args, 0) {
                Value::Undefined => vec![Value::string(s)],
                sep => {
                    let sep = sep.to_js_string();
                    if sep.is_empty() {
                        chars.iter().map(|c| Value::string(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str()).map(Value::string).collect()
                    }
                }
            };
            let limit = match arg(&args, 1) {
                Value::Undefined => parts.len(),
                n => n.to_integer().max(0.0) as usize,
            };
            Value::array(parts.into_iter().take(limit).collect())
        }
        "includes" => Value::Bool(s.contains(&text_arg(0))),
        "startsWith" => Value::Bool(s.starts_with(&text_arg(0))),
        "endsWith" => Value::Bool(s.ends_with(&text_arg(0))),
        "indexOf" | "lastIndexOf" => {
            let needle = text_arg(0);
            let found = if name == "indexOf" { s.find(&needle) } else { s.rfind(&needle) };
            Value::Number(found.map_or(-1.0, |byte| s[..byte].chars().count() as f64))
        }
        "slice" => {
            let (start, end) = range(chars.len(), &arg(&args, 0), &arg(&args, 1));
            substring(start, end)
        }
        "substring" => {
            let bound = |v: Value, default: usize| match v {
                Value::Undefined => default,
                v => (v.to_integer().max(0.0) as usize).min(chars.len()),
            };
            let (a, b) = (bound(arg(&args, 0), 0), bound(arg(&args, 1), chars.len()));
            substring(a.min(b), a.max(b))
        }
        "charAt" => {
            let i = arg(&args, 0).to_integer();
            if i < 0.0 {
                Value::string("")
            } else {
                substring(i as usize, i as usize + 1)
            }
        }
        "at" => {
            let i = arg(&args, 0).to_integer();
            let i = if i < 0.0 { chars.len() as f64 + i } else { i };
            match chars.get(i as usize) {
                Some(c) if i >= 0.0 => Value::string(c.to_string()),
                _ => Value::Undefined,
            }
        }
        "charCodeAt" => {
            let i = arg(&args, 0).to_integer();
            match chars.get(i as usize) {
                Some(c) if i >= 0.0 => Value::Number(f64::from(u32::from(*c))),
                _ => Value::Number(f64::NAN),
            }
        }
        "replace" | "replaceAll" => {
            let pattern = text_arg(0);
            let replacement = arg(&args, 1);
            let mut out = String::new();
            let mut rest = s;
            while let Some(found) = rest.find(&pattern) {
                out.push_str(&rest[..found]);
                let piece = if replacement.is_callable() {
                    interp
                        .call(&replacement, Value::Undefined, vec![Value::string(&pattern)])?
                        .to_js_string()
                } else {
                    replacement.to_js_string().replace("$&", &pattern)
                };
                out.push_str(&piece);
                rest = &rest[found + pattern.len()..];
                if name == "replace" || pattern.is_empty() {
                    break;
                }
            }
            out.push_str(rest);
            Value::string(out)
        }
        "padStart" | "padEnd" => {
            let target = string_length(arg(&args, 0).to_integer())?;
            let filler = match arg(&args, 1) {
                Value::Undefined => " ".to_string(),
                other => other.to_js_string(),
            };
            if chars.len() >= target || filler.is_empty() {
                Value::string(s)
            } else {
                let pad: String = filler.chars().cycle().take(target - chars.len()).collect();
                Value::string(if name == "padStart" { pad + s } else { format!("{s}{pad}") })
            }
        }
        "repeat" => {
            let count = arg(&args, 0).to_integer();
            if count < 0.0 || count.is_infinite() {
                return Err(EvalError::Range(format!("Invalid count value: {}", format_number(count))));
            }
            let total = string_length(count * chars.len() as f64)?;
            if total == 0 {
                return Ok(Value::string(""));
            }
            Value::string(s.repeat(count as usize))
        }
        "localeCompare" => {
            let other = text_arg(0);
            Value::Number(match s.cmp(other.as_str()) {
                Ordering::Less => -1.0,
                Ordering::Equal => 0.0,
                Ordering::Greater => 1.0,
            })
        }
        _ => Value::Undefined,
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Numbers
// ══════════════════════════════════════════════════════════════════════════════

fn to_radix(n: f64, radix: u32) -> String {
    if radix == 10 || !(2..=36).contains(&radix) || n.fract() != 0.0 || !n.is_finite() {
        return format_number(n);
    }
    let mut value = n.abs() as u64;
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(std::char::from_digit((value % u64::from(radix)) as u32, radix).unwrap_or('0'));
        value /= u64::from(radix);
    }
    if n < 0.0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

/// `toLocaleString` for the `en-US` locale: grouped thousands, at most
/// three fraction digits.
fn to_locale(n: f64) -> String {
    if !n.is_finite() {
        return format_number(n);
    }
    let fixed = format!("{:.3}", n.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac.trim_end_matches('0');
    let mut grouped = String::new();
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if n < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::tests::run;
    use pretty_assertions::assert_eq;

    fn eval_str(source: &str) -> String {
        run(source).unwrap().to_js_string()
    }

    #[test]
    fn test_array_iteration_methods() {
        let source = "const xs = [3, 1, 2];\nconst result = [xs.map(x => x * 2).join(\"-\"), xs.filter(x => x > 1).length, xs.reduce((a, b) => a + b, 0), xs.find(x => x < 3), xs.findIndex(x => x === 2), xs.some(x => x > 2), xs.every(x => x > 2)].join(\"|\");";
        assert_eq!(eval_str(source), "6-2-4|2|6|1|2|true|false");
    }

    #[test]
    fn test_array_mutation_methods() {
        let source = "const xs = [1, 2, 3, 4];\nxs.push(5);\nxs.shift();\nxs.unshift(0);\nconst removed = xs.splice(1, 2, \"a\");\nconst result = xs.join() + \"/\" + removed.join();";
        assert_eq!(eval_str(source), "0,a,4,5/2,3");
    }

    #[test]
    fn test_sort_with_and_without_comparator() {
        assert_eq!(eval_str("const result = [10, 9, 1].sort().join();"), "1,10,9");
        assert_eq!(eval_str("const result = [10, 9, 1].sort((a, b) => a - b).join();"), "1,9,10");
        assert_eq!(eval_str("const result = [\"b\", \"a\"].sort((a, b) => a.localeCompare(b)).join();"), "a,b");
    }

    #[test]
    fn test_flat_and_slice() {
        assert_eq!(eval_str("const result = [1, [2, [3]]].flat().length;"), "3");
        assert_eq!(eval_str("const result = [1, [2, [3]]].flat(Infinity).join();"), "1,2,3");
        assert_eq!(eval_str("const result = [1, 2, 3, 4].slice(-2).join();"), "3,4");
        assert_eq!(eval_str("const result = [1, 2, 3].at(-1);"), "3");
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(eval_str("const result = \" Hi \".trim().toUpperCase();"), "HI");
        assert_eq!(eval_str("const result = \"a-b-c\".split(\"-\").length;"), "3");
        assert_eq!(eval_str("const result = \"hello\".slice(1, -1);"), "ell");
        assert_eq!(eval_str("const result = \"5\".padStart(3, \"0\");"), "005");
        assert_eq!(eval_str("const result = \"a.b.c\".replaceAll(\".\", \"/\");"), "a/b/c");
        assert_eq!(eval_str("const result = \"a.b.c\".replace(\".\", \"/\");"), "a/b.c");
        assert_eq!(eval_str("const result = \"héllo\".indexOf(\"l\");"), "2");
        assert_eq!(eval_str("const result = \"abc\"[1] + \"abc\".length;"), "b3");
    }

    #[test]
    fn test_array_length_writes_are_bounded() {
        assert_eq!(eval_str("const xs = [];\nxs[3] = 1;\nconst result = xs.length;"), "4");
        assert_eq!(eval_str("const xs = [1, 2, 3];\nxs.length = 1;\nconst result = xs.join();"), "1");
        let err = run("const xs = [];\nxs[3000000000] = 1;").unwrap_err();
        assert!(matches!(err, EvalError::Range(ref m) if m == "Invalid array length"), "{err}");
        let err = run("const xs = [];\nxs.length = 4294967295;").unwrap_err();
        assert!(matches!(err, EvalError::Range(_)), "{err}");
        let err = run("const xs = new Array(1e12);").unwrap_err();
        assert!(matches!(err, EvalError::Range(_)), "{err}");
    }

    #[test]
    fn test_string_building_is_bounded() {
        assert_eq!(eval_str("const result = \"ab\".repeat(3);"), "ababab");
        assert_eq!(eval_str("const result = \"\".repeat(1e15);"), "");
        let err = run("const result = \"ab\".repeat(1e12);").unwrap_err();
        assert!(matches!(err, EvalError::Range(ref m) if m == "Invalid string length"), "{err}");
        let err = run("const result = \"x\".padStart(1e12);").unwrap_err();
        assert!(matches!(err, EvalError::Range(_)), "{err}");
    }

    #[test]
    fn test_number_methods() {
        assert_eq!(eval_str("const result = (3.14159).toFixed(2);"), "3.14");
        assert_eq!(eval_str("const result = (255).toString(16);"), "ff");
        assert_eq!(eval_str("const result = (1234567.891).toLocaleString();"), "1,234,567.891");
        assert_eq!(eval_str("const result = (-1000).toLocaleString();"), "-1,000");
    }

    #[test]
    fn test_function_call_apply_bind() {
        let source = "function add(a, b) { return a + b; }\nconst inc = add.bind(null, 1);\nconst result = [add.call(null, 2, 3), add.apply(null, [4, 5]), inc(9), add.name].join();";
        assert_eq!(eval_str(source), "5,9,10,add");
    }

    #[test]
    fn test_property_errors() {
        let err = run("const o = undefined; o.x;").unwrap_err();
        assert_eq!(err.to_string(), "TypeError: Cannot read properties of undefined (reading 'x')");
        let err = run("const o = null; o.x = 1;").unwrap_err();
        assert_eq!(err.to_string(), "TypeError: Cannot set properties of null (setting 'x')");
    }

    #[test]
    fn test_array_length_and_index_writes() {
        assert_eq!(eval_str("const xs = [1, 2, 3]; xs.length = 1; xs[3] = 4; const result = xs.join();"), "1,,,4");
    }
}
