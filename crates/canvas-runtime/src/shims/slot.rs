//! The passthrough slot: `<Slot {...props}><child/></Slot>` renders the
//! child with the slot's props merged in.

use crate::builtins::arg;
use crate::evaluator::own_entries;
use crate::value::{Object, Value};

pub(super) fn slot_module() -> Value {
    let slot = Value::native("Slot", |_, _, args| Ok(render_slot(&arg(&args, 0))));
    Value::object_from([("Slot", slot.clone()), ("Root", slot)])
}

fn render_slot(props: &Value) -> Value {
    let child = match props.get("children") {
        Value::Array(items) if items.borrow().len() == 1 => items.borrow()[0].clone(),
        child => child,
    };
    let Value::Element(element) = &child else {
        return child;
    };

    let mut merged: Object = own_entries(props)
        .into_iter()
        .filter(|(key, _)| key != "children")
        .collect();
    for (key, child_value) in own_entries(&element.props) {
        let slot_value = merged.get(&key).cloned().unwrap_or_default();
        let value = match key.as_str() {
            "className" => join_classes(&slot_value, &child_value),
            "style" => merge_styles(&slot_value, &child_value),
            handler if is_handler(handler) && slot_value.is_callable() && child_value.is_callable() => {
                compose_handlers(child_value, slot_value)
            }
            _ => child_value,
        };
        merged.insert(key, value);
    }
    Value::element(element.ty.clone(), Value::object(merged), element.key.clone())
}

fn is_handler(key: &str) -> bool {
    key.len() > 2 && key.starts_with("on") && key[2..].starts_with(|c: char| c.is_ascii_uppercase())
}

fn join_classes(slot: &Value, child: &Value) -> Value {
    match (slot.as_str(), child.as_str()) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => Value::string(format!("{a} {b}")),
        (Some(a), _) if child.is_nullish() || child.as_str() == Some("") => Value::string(a),
        _ => child.clone(),
    }
}

fn merge_styles(slot: &Value, child: &Value) -> Value {
    if slot.is_nullish() {
        return child.clone();
    }
    let mut style: Object = own_entries(slot).into_iter().collect();
    style.extend(own_entries(child));
    Value::object(style)
}

/// The child's handler runs first; the slot's runs unless the child
/// prevented the default action.
fn compose_handlers(child: Value, slot: Value) -> Value {
    Value::native("composedHandler", move |interp, this, args| {
        let result = interp.call(&child, this.clone(), args.clone())?;
        let prevented = args.first().map(|event| event.get("defaultPrevented").is_truthy());
        if prevented != Some(true) {
            interp.call(&slot, this, args)?;
        }
        Ok(result)
    })
}
