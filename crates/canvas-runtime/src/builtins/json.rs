//! The `JSON` global.

use super::arg;
use crate::error::{EvalError, EvalResult};
use crate::value::Value;

pub(super) fn json_object() -> Value {
    Value::object_from([
        ("stringify", Value::native("stringify", |_, _, args| stringify(&args))),
        (
            "parse",
            Value::native("parse", |_, _, args| {
                let text = arg(&args, 0).to_js_string();
                serde_json::from_str::<serde_json::Value>(&text)
                    .map(|json| Value::from_json(&json))
                    .map_err(|err| {
                        EvalError::Thrown(Value::object_from([
                            ("name", Value::string("SyntaxError")),
                            (
                                "message",
                                Value::string(format!(
                                    "Unexpected token in JSON at line {} column {}",
                                    err.line(),
                                    err.column()
                                )),
                            ),
                        ]))
                    })
            }),
        ),
    ])
}

fn stringify(args: &[Value]) -> EvalResult<Value> {
    let Some(json) = arg(args, 0).to_json() else {
        return Ok(Value::Undefined);
    };
    let indent = match arg(args, 2) {
        Value::Number(n) if n >= 1.0 => " ".repeat(n.min(10.0) as usize),
        Value::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    if indent.is_empty() {
        return Ok(Value::string(json.to_string()));
    }
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    serde::Serialize::serialize(&json, &mut serializer)
        .map_err(|err| EvalError::type_error(err.to_string()))?;
    Ok(Value::string(String::from_utf8_lossy(&out)))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::tests::run;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stringify() {
        let value = run("const result = JSON.stringify({ a: [1, \"x\", null], b: undefined, c: true });").unwrap();
        assert_eq!(value.to_js_string(), r#"{"a":[1,"x",null],"c":true}"#);
    }

    #[test]
    fn test_stringify_with_indent() {
        let value = run("const result = JSON.stringify({ a: 1 }, null, 2);").unwrap();
        assert_eq!(value.to_js_string(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_parse_and_syntax_error() {
        let value = run("const result = JSON.parse('{\"n\": [1, 2]}').n[1];").unwrap();
        assert_eq!(value.to_js_string(), "2");
        let value = run("let result; try { JSON.parse(\"{\"); } catch (e) { result = e.name; }").unwrap();
        assert_eq!(value.to_js_string(), "SyntaxError");
    }
}
