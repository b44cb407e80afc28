//! The icon package: every PascalCase export is a component rendering an
//! outline `<svg>`.

use std::rc::Rc;

use crate::builtins::arg;
use crate::evaluator::own_entries;
use crate::value::{ElementType, IconSet, Object, Value};

const DEFAULT_SIZE: f64 = 24.0;
const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Props the icon consumes instead of forwarding to the `<svg>`.
const CONSUMED: [&str; 5] = ["size", "color", "strokeWidth", "absoluteStrokeWidth", "className"];

pub(super) fn icon_module() -> Value {
    Value::Icons(Rc::new(IconSet::new(icon_component)))
}

fn icon_component(name: &str) -> Value {
    let class = format!("lucide lucide-{}", kebab_case(name));
    Value::native(name, move |_, _, args| {
        let props = arg(&args, 0);
        Ok(render_icon(&class, &props))
    })
}

fn render_icon(class: &str, props: &Value) -> Value {
    let size = match props.get("size") {
        Value::Undefined | Value::Null => Value::Number(DEFAULT_SIZE),
        size => size,
    };
    let color = match props.get("color") {
        Value::String(color) => Value::String(color),
        _ => Value::string("currentColor"),
    };
    let stroke_width = match props.get("strokeWidth") {
        Value::Undefined | Value::Null => Value::Number(DEFAULT_STROKE_WIDTH),
        width => width,
    };
    let class = match props.get("className") {
        Value::String(extra) if !extra.is_empty() => format!("{class} {extra}"),
        _ => class.to_string(),
    };

    let mut attrs = Object::new();
    attrs.insert("xmlns".into(), Value::string("http://www.w3.org/2000/svg"));
    attrs.insert("width".into(), size.clone());
    attrs.insert("height".into(), size);
    attrs.insert("viewBox".into(), Value::string("0 0 24 24"));
    attrs.insert("fill".into(), Value::string("none"));
    attrs.insert("stroke".into(), color);
    attrs.insert("strokeWidth".into(), stroke_width);
    attrs.insert("strokeLinecap".into(), Value::string("round"));
    attrs.insert("strokeLinejoin".into(), Value::string("round"));
    attrs.insert("className".into(), Value::string(class));
    for (key, value) in own_entries(props) {
        if !CONSUMED.contains(&key.as_str()) {
            attrs.insert(key, value);
        }
    }
    Value::element(ElementType::Tag(Rc::from("svg")), Value::object(attrs), None)
}

/// `ChevronDown` → `chevron-down`, `Grid2x2` → `grid-2x-2`.
fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        let boundary = match prev {
            Some(p) => (c.is_ascii_uppercase() && !p.is_ascii_uppercase()) || (c.is_ascii_digit() && !p.is_ascii_digit()),
            None => false,
        };
        if boundary && !out.ends_with('-') {
            out.push('-');
        }
        out.push(c.to_ascii_lowercase());
        prev = Some(c);
    }
    out
}
