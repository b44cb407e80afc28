//! Global objects every execution scope starts with.

mod date;
mod json;
pub(crate) mod methods;

use std::collections::BTreeMap;

use crate::env::Env;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{ConsoleLevel, Interpreter};
use crate::value::{format_number, inspect, string_to_number, Object, Value};

/// Longest array a script may create or grow to.
pub const MAX_ARRAY_LENGTH: usize = 1 << 22;

/// Longest string, in chars, a script may build with `repeat` or padding.
pub const MAX_STRING_LENGTH: usize = 1 << 24;

/// Validate a requested array length.
pub(crate) fn array_length(n: f64) -> EvalResult<usize> {
    if n < 0.0 || n.fract() != 0.0 || n > MAX_ARRAY_LENGTH as f64 {
        return Err(EvalError::Range("Invalid array length".into()));
    }
    Ok(n as usize)
}

/// Validate the char length of a string about to be built.
pub(crate) fn string_length(n: f64) -> EvalResult<usize> {
    if n > MAX_STRING_LENGTH as f64 {
        return Err(EvalError::Range("Invalid string length".into()));
    }
    Ok(n.max(0.0) as usize)
}

/// A vector of `length` holes, reserved fallibly.
pub(crate) fn holes(length: usize) -> EvalResult<Vec<Value>> {
    let mut items = Vec::new();
    items
        .try_reserve_exact(length)
        .map_err(|_| EvalError::Range("Invalid array length".into()))?;
    items.resize(length, Value::Undefined);
    Ok(items)
}

/// The argument at `index`, or `undefined`.
pub(crate) fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// Install the standard globals into `globals`.
pub fn install(globals: &Env) {
    let define = |name: &str, value: Value| globals.define(name, value, false);

    define("NaN", Value::Number(f64::NAN));
    define("Infinity", Value::Number(f64::INFINITY));
    define("Math", math());
    define("JSON", json::json_object());
    define("Object", object_ctor());
    define("Array", array_ctor());
    define("String", string_ctor());
    define("Number", number_ctor());
    define("Boolean", Value::native("Boolean", |_, _, args| {
        Ok(Value::Bool(arg(&args, 0).is_truthy()))
    }));
    define("Date", date::date_ctor());
    define("console", console());
    for name in ["Error", "TypeError", "RangeError", "ReferenceError", "SyntaxError"] {
        define(name, error_ctor(name));
    }

    define("parseInt", Value::native("parseInt", |_, _, args| {
        Ok(Value::Number(parse_int(&arg(&args, 0).to_js_string(), &arg(&args, 1))))
    }));
    define("parseFloat", Value::native("parseFloat", |_, _, args| {
        Ok(Value::Number(parse_float(&arg(&args, 0).to_js_string())))
    }));
    define("isNaN", Value::native("isNaN", |_, _, args| {
        Ok(Value::Bool(arg(&args, 0).to_number().is_nan()))
    }));
    define("isFinite", Value::native("isFinite", |_, _, args| {
        Ok(Value::Bool(arg(&args, 0).to_number().is_finite()))
    }));
    define("structuredClone", Value::native("structuredClone", |_, _, args| {
        let value = arg(&args, 0);
        Ok(value.to_json().map_or(Value::Undefined, |json| Value::from_json(&json)))
    }));

    define("setTimeout", Value::native("setTimeout", |interp, _, args| {
        Ok(Value::Number(interp.timers.schedule(args, false) as f64))
    }));
    define("setInterval", Value::native("setInterval", |interp, _, args| {
        Ok(Value::Number(interp.timers.schedule(args, true) as f64))
    }));
    for name in ["clearTimeout", "clearInterval"] {
        define(name, Value::native(name, |interp, _, args| {
            interp.timers.cancel(arg(&args, 0).to_number() as u64);
            Ok(Value::Undefined)
        }));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Timers
// ══════════════════════════════════════════════════════════════════════════════

struct Timer {
    callback: Value,
    delay: f64,
    args: Vec<Value>,
    repeat: bool,
}

/// Callbacks registered with `setTimeout`/`setInterval`. Nothing fires on
/// its own: the host advances them explicitly.
#[derive(Default)]
pub struct Timers {
    next_id: u64,
    pending: BTreeMap<u64, Timer>,
}

impl Timers {
    fn schedule(&mut self, mut args: Vec<Value>, repeat: bool) -> u64 {
        self.next_id += 1;
        let rest = args.split_off(args.len().min(2));
        let delay = args.get(1).map_or(0.0, Value::to_number);
        let callback = args.into_iter().next().unwrap_or_default();
        self.pending.insert(
            self.next_id,
            Timer {
                callback,
                delay: if delay.is_nan() { 0.0 } else { delay },
                args: rest,
                repeat,
            },
        );
        self.next_id
    }

    fn cancel(&mut self, id: u64) {
        self.pending.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }
}

impl Interpreter {
    /// Fire every pending timer once, shortest delay first. Timeouts are
    /// consumed; intervals stay scheduled. Returns how many fired.
    pub fn run_timers(&mut self) -> EvalResult<usize> {
        let mut due: Vec<(f64, u64)> = self
            .timers
            .pending
            .iter()
            .map(|(id, timer)| (timer.delay, *id))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let mut fired = 0;
        for (_, id) in due {
            let Some(timer) = self.timers.pending.get(&id) else {
                continue;
            };
            let (callback, args, repeat) = (timer.callback.clone(), timer.args.clone(), timer.repeat);
            if !repeat {
                self.timers.pending.remove(&id);
            }
            if callback.is_callable() {
                self.call(&callback, Value::Undefined, args)?;
                fired += 1;
            }
        }
        Ok(fired)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Globals
// ══════════════════════════════════════════════════════════════════════════════

fn math() -> Value {
    fn unary(name: &str, f: fn(f64) -> f64) -> (String, Value) {
        let value = Value::native(name, move |_, _, args| Ok(Value::Number(f(arg(&args, 0).to_number()))));
        (name.to_string(), value)
    }

    let mut math: Object = [
        unary("abs", f64::abs),
        unary("floor", f64::floor),
        unary("ceil", f64::ceil),
        unary("round", |n| (n + 0.5).floor()),
        unary("trunc", f64::trunc),
        unary("sign", |n| if n == 0.0 || n.is_nan() { n } else { n.signum() }),
        unary("sqrt", f64::sqrt),
        unary("cbrt", f64::cbrt),
        unary("exp", f64::exp),
        unary("log", f64::ln),
        unary("log10", f64::log10),
        unary("log2", f64::log2),
        unary("sin", f64::sin),
        unary("cos", f64::cos),
        unary("tan", f64::tan),
        unary("atan", f64::atan),
    ]
    .into_iter()
    .collect();

    math.insert("PI".into(), Value::Number(std::f64::consts::PI));
    math.insert("E".into(), Value::Number(std::f64::consts::E));
    math.insert(
        "max".into(),
        Value::native("max", |_, _, args| {
            Ok(Value::Number(args.iter().map(Value::to_number).fold(
                f64::NEG_INFINITY,
                |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(n) },
            )))
        }),
    );
    math.insert(
        "min".into(),
        Value::native("min", |_, _, args| {
            Ok(Value::Number(args.iter().map(Value::to_number).fold(
                f64::INFINITY,
                |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.min(n) },
            )))
        }),
    );
    math.insert(
        "pow".into(),
        Value::native("pow", |_, _, args| {
            Ok(Value::Number(arg(&args, 0).to_number().powf(arg(&args, 1).to_number())))
        }),
    );
    math.insert(
        "atan2".into(),
        Value::native("atan2", |_, _, args| {
            Ok(Value::Number(arg(&args, 0).to_number().atan2(arg(&args, 1).to_number())))
        }),
    );
    math.insert(
        "hypot".into(),
        Value::native("hypot", |_, _, args| {
            Ok(Value::Number(args.iter().map(|v| v.to_number().powi(2)).sum::<f64>().sqrt()))
        }),
    );
    math.insert(
        "random".into(),
        Value::native("random", |interp, _, _| Ok(Value::Number(interp.random()))),
    );
    Value::object(math)
}

fn object_ctor() -> Value {
    let statics = [
        (
            "keys",
            Value::native("keys", |_, _, args| {
                Ok(Value::array(
                    crate::evaluator::own_entries(&arg(&args, 0))
                        .into_iter()
                        .map(|(k, _)| Value::string(k))
                        .collect(),
                ))
            }),
        ),
        (
            "values",
            Value::native("values", |_, _, args| {
                Ok(Value::array(
                    crate::evaluator::own_entries(&arg(&args, 0))
                        .into_iter()
                        .map(|(_, v)| v)
                        .collect(),
                ))
            }),
        ),
        (
            "entries",
            Value::native("entries", |_, _, args| {
                Ok(Value::array(
                    crate::evaluator::own_entries(&arg(&args, 0))
                        .into_iter()
                        .map(|(k, v)| Value::array(vec![Value::string(k), v]))
                        .collect(),
                ))
            }),
        ),
        (
            "assign",
            Value::native("assign", |interp, _, args| {
                let target = arg(&args, 0);
                for source in args.iter().skip(1) {
                    for (key, value) in crate::evaluator::own_entries(source) {
                        interp.set_property(&target, &key, value)?;
                    }
                }
                Ok(target)
            }),
        ),
        (
            "fromEntries",
            Value::native("fromEntries", |interp, _, args| {
                let mut object = Object::new();
                for entry in interp.iterate(&arg(&args, 0))? {
                    let key = interp.get_property(&entry, "0")?;
                    let value = interp.get_property(&entry, "1")?;
                    object.insert(crate::evaluator::property_key(&key), value);
                }
                Ok(Value::object(object))
            }),
        ),
        ("freeze", Value::native("freeze", |_, _, args| Ok(arg(&args, 0)))),
        (
            "is",
            Value::native("is", |_, _, args| {
                Ok(Value::Bool(arg(&args, 0).object_is(&arg(&args, 1))))
            }),
        ),
    ];
    constructor("Object", statics, |_, _, args| {
        Ok(match arg(&args, 0) {
            value @ (Value::Object(_) | Value::Array(_)) => value,
            _ => Value::object(Object::new()),
        })
    })
}

fn array_ctor() -> Value {
    let statics = [
        (
            "isArray",
            Value::native("isArray", |_, _, args| {
                Ok(Value::Bool(matches!(arg(&args, 0), Value::Array(_))))
            }),
        ),
        (
            "from",
            Value::native("from", |interp, _, args| {
                let source = arg(&args, 0);
                let items = match &source {
                    Value::Object(_) => {
                        let length = interp.get_property(&source, "length")?.to_integer().max(0.0);
                        holes(array_length(length)?)?
                    }
                    Value::Array(_) | Value::String(_) => interp.iterate(&source)?,
                    _ => Vec::new(),
                };
                let mapper = arg(&args, 1);
                if !mapper.is_callable() {
                    return Ok(Value::array(items));
                }
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    out.push(interp.call(&mapper, Value::Undefined, vec![item, Value::Number(i as f64)])?);
                }
                Ok(Value::array(out))
            }),
        ),
        ("of", Value::native("of", |_, _, args| Ok(Value::array(args)))),
    ];
    constructor("Array", statics, |_, _, args| match args.as_slice() {
        [Value::Number(n)] => Ok(Value::array(holes(array_length(*n)?)?)),
        _ => Ok(Value::array(args)),
    })
}

fn string_ctor() -> Value {
    constructor("String", [], |_, _, args| {
        Ok(Value::string(match args.first() {
            Some(value) => value.to_js_string(),
            None => String::new(),
        }))
    })
}

fn number_ctor() -> Value {
    let statics = [
        (
            "isInteger",
            Value::native("isInteger", |_, _, args| {
                Ok(Value::Bool(matches!(arg(&args, 0), Value::Number(n) if n.is_finite() && n.fract() == 0.0)))
            }),
        ),
        (
            "isFinite",
            Value::native("isFinite", |_, _, args| {
                Ok(Value::Bool(matches!(arg(&args, 0), Value::Number(n) if n.is_finite())))
            }),
        ),
        (
            "isNaN",
            Value::native("isNaN", |_, _, args| {
                Ok(Value::Bool(matches!(arg(&args, 0), Value::Number(n) if n.is_nan())))
            }),
        ),
        (
            "parseFloat",
            Value::native("parseFloat", |_, _, args| {
                Ok(Value::Number(parse_float(&arg(&args, 0).to_js_string())))
            }),
        ),
        ("MAX_SAFE_INTEGER", Value::Number(9_007_199_254_740_991.0)),
        ("EPSILON", Value::Number(f64::EPSILON)),
    ];
    constructor("Number", statics, |_, _, args| {
        Ok(Value::Number(args.first().map_or(0.0, Value::to_number)))
    })
}

/// A callable global with static members.
fn constructor<const N: usize>(
    name: &str,
    statics: [(&str, Value); N],
    call: impl Fn(&mut Interpreter, Value, Vec<Value>) -> EvalResult<Value> + 'static,
) -> Value {
    Value::native_with_statics(name, Value::object_from(statics), call)
}

fn error_ctor(name: &'static str) -> Value {
    Value::native(name, move |_, _, args| {
        let message = match arg(&args, 0) {
            Value::Undefined => String::new(),
            other => other.to_js_string(),
        };
        Ok(Value::object_from([
            ("name", Value::string(name)),
            ("message", Value::string(message)),
        ]))
    })
}

fn console() -> Value {
    let entries = [
        ("log", ConsoleLevel::Log),
        ("info", ConsoleLevel::Info),
        ("warn", ConsoleLevel::Warn),
        ("error", ConsoleLevel::Error),
        ("debug", ConsoleLevel::Debug),
    ];
    Value::object_from(entries.map(|(name, level)| {
        let func = Value::native(name, move |interp, _, args| {
            let message = args.iter().map(inspect).collect::<Vec<_>>().join(" ");
            interp.log(level, message);
            Ok(Value::Undefined)
        });
        (name, func)
    }))
}

// ══════════════════════════════════════════════════════════════════════════════
// Number parsing
// ══════════════════════════════════════════════════════════════════════════════

fn parse_int(text: &str, radix: &Value) -> f64 {
    let text = text.trim_start();
    let (sign, mut digits) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };
    let mut radix = match radix {
        Value::Undefined => 0,
        other => other.to_integer() as u32,
    };
    if radix == 0 || radix == 16 {
        if let Some(rest) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            digits = rest;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    let valid: String = digits.chars().take_while(|c| c.is_digit(radix)).collect();
    if valid.is_empty() {
        return f64::NAN;
    }
    let value = valid
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
    sign * value
}

fn parse_float(text: &str) -> f64 {
    let text = text.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'0'..=b'9' => end = i + 1,
            b'+' | b'-' if i == 0 || matches!(bytes[i - 1], b'e' | b'E') => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if !seen_exp && end > 0 => seen_exp = true,
            _ => break,
        }
    }
    if end == 0 {
        return if text.starts_with("Infinity") || text.starts_with("+Infinity") {
            f64::INFINITY
        } else if text.starts_with("-Infinity") {
            f64::NEG_INFINITY
        } else {
            f64::NAN
        };
    }
    let number = &text[..end];
    number
        .parse()
        .unwrap_or_else(|_| string_to_number(number.trim_end_matches(['e', 'E', '+', '-'])))
}

/// `Number.prototype.toFixed`.
pub(crate) fn to_fixed(n: f64, digits: usize) -> String {
    if !n.is_finite() {
        return format_number(n);
    }
    format!("{n:.digits$}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::tests::run;

    fn eval_str(source: &str) -> String {
        run(source).unwrap().to_js_string()
    }

    #[test]
    fn test_parse_int_and_float() {
        assert_eq!(parse_int("42px", &Value::Undefined), 42.0);
        assert_eq!(parse_int("  -17", &Value::Undefined), -17.0);
        assert_eq!(parse_int("ff", &Value::Number(16.0)), 255.0);
        assert_eq!(parse_int("0x1A", &Value::Undefined), 26.0);
        assert!(parse_int("px", &Value::Undefined).is_nan());
        assert_eq!(parse_float("3.25rem"), 3.25);
        assert_eq!(parse_float("1e3x"), 1000.0);
        assert!(parse_float("abc").is_nan());
    }

    #[test]
    fn test_math_globals() {
        assert_eq!(eval_str("const result = Math.max(1, 7, 3) + Math.min(4, 2);"), "9");
        assert_eq!(eval_str("const result = Math.round(2.5) + Math.floor(-1.5);"), "1");
        assert_eq!(eval_str("const result = Math.max();"), "-Infinity");
    }

    #[test]
    fn test_object_statics() {
        let source = "const o = Object.assign({}, { a: 1 }, { b: 2 });\nconst result = Object.entries(o).map(([k, v]) => k + v).join(\"|\") + Object.keys(Object.fromEntries([[\"x\", 1]]));";
        assert_eq!(eval_str(source), "a1|b2x");
    }

    #[test]
    fn test_array_statics() {
        assert_eq!(eval_str("const result = Array.from({ length: 3 }, (_, i) => i * 2).join();"), "0,2,4");
        assert_eq!(eval_str("const result = Array.isArray([]) && !Array.isArray(\"x\");"), "true");
        assert_eq!(eval_str("const result = Array.from(\"abc\").length;"), "3");
    }

    #[test]
    fn test_conversions() {
        assert_eq!(eval_str("const result = String(12) + Number(\"3\") + Boolean(\"\");"), "123false");
        assert_eq!(eval_str("const result = parseInt(\"08\") + parseFloat(\".5\");"), "8.5");
        assert_eq!(eval_str("const result = Number.isInteger(5) && !Number.isInteger(5.5);"), "true");
    }

    #[test]
    fn test_console_is_captured() {
        let mut interp = Interpreter::default();
        crate::evaluator::tests::run_in(&mut interp, "console.log(\"hi\", { a: 1 }); console.warn(2);").unwrap();
        let console = interp.console();
        assert_eq!(console.len(), 2);
        assert_eq!(console[0].message, "hi { a: 1 }");
        assert_eq!(console[1].level, ConsoleLevel::Warn);
    }

    #[test]
    fn test_timers_fire_on_demand() {
        let mut interp = Interpreter::default();
        let source = "let log = [];\nsetTimeout(() => log.push(\"late\"), 50);\nsetTimeout(() => log.push(\"early\"), 10);\nconst id = setTimeout(() => log.push(\"never\"), 0);\nclearTimeout(id);\nconst result = log;";
        let log = crate::evaluator::tests::run_in(&mut interp, source).unwrap();
        assert_eq!(interp.timers.len(), 2);
        assert_eq!(interp.run_timers().unwrap(), 2);
        assert_eq!(log.to_js_string(), "early,late");
        assert!(interp.timers.is_empty());
    }
}
