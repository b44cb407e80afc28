//! The core UI runtime handle: element factory, fragment marker, hooks and
//! contexts.

use std::rc::Rc;

use crate::builtins::arg;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::own_entries;
use crate::value::{ElementType, NativeKind, Object, Value};

pub(super) const HOOK_NAMES: [&str; 9] = [
    "useState",
    "useReducer",
    "useEffect",
    "useLayoutEffect",
    "useMemo",
    "useCallback",
    "useRef",
    "useId",
    "useContext",
];

/// `createElement(type, props, ...children)`.
pub(crate) fn create_element(args: Vec<Value>) -> EvalResult<Value> {
    let mut args = args.into_iter();
    let ty = args.next().unwrap_or_default();
    let props = args.next().unwrap_or_default();
    let children: Vec<Value> = args.collect();

    let ty = element_type(&ty)?;
    let mut object: Object = own_entries(&props).into_iter().collect();
    let key = match object.shift_remove("key") {
        None | Some(Value::Undefined) | Some(Value::Null) => None,
        Some(key) => Some(Rc::from(key.to_js_string())),
    };
    match children.len() {
        0 => {}
        1 => {
            let child = children.into_iter().next().unwrap_or_default();
            object.insert("children".into(), child);
        }
        _ => {
            object.insert("children".into(), Value::array(children));
        }
    }
    Ok(Value::element(ty, Value::object(object), key))
}

fn element_type(ty: &Value) -> EvalResult<ElementType> {
    Ok(match ty {
        Value::String(tag) => ElementType::Tag(Rc::clone(tag)),
        Value::Native(native) => match native.kind {
            NativeKind::Fragment => ElementType::Fragment,
            NativeKind::Provider(id) => ElementType::Provider(id),
            NativeKind::Consumer(id) => ElementType::Consumer(id),
            NativeKind::Plain => ElementType::Component(ty.clone()),
        },
        Value::Closure(_) => ElementType::Component(ty.clone()),
        other => {
            return Err(EvalError::type_error(format!(
                "Element type is invalid: expected a string (for built-in components) or a function (for composite components) but got: {}",
                other.type_of()
            )))
        }
    })
}

fn fragment() -> Value {
    Value::native_kind("Fragment", NativeKind::Fragment, |_, _, args| {
        Ok(arg(&args, 0).get("children"))
    })
}

/// The `react` export container.
pub(super) fn react_module() -> Value {
    let fragment = fragment();
    let mut module = Object::new();
    module.insert(
        "createElement".into(),
        Value::native("createElement", |_, _, args| create_element(args)),
    );
    module.insert("Fragment".into(), fragment.clone());
    module.insert("StrictMode".into(), fragment);
    module.insert(
        "cloneElement".into(),
        Value::native("cloneElement", |_, _, args| {
            let Value::Element(element) = arg(&args, 0) else {
                return Err(EvalError::type_error("cloneElement expects an element"));
            };
            let mut props: Object = own_entries(&element.props).into_iter().collect();
            props.extend(own_entries(&arg(&args, 1)));
            if args.len() > 2 {
                let children: Vec<Value> = args[2..].to_vec();
                let children = match <[Value; 1]>::try_from(children) {
                    Ok([only]) => only,
                    Err(many) => Value::array(many),
                };
                props.insert("children".into(), children);
            }
            let key = match props.shift_remove("key") {
                Some(key) if !key.is_nullish() => Some(Rc::from(key.to_js_string())),
                _ => element.key.clone(),
            };
            Ok(Value::element(element.ty.clone(), Value::object(props), key))
        }),
    );
    module.insert(
        "isValidElement".into(),
        Value::native("isValidElement", |_, _, args| {
            Ok(Value::Bool(matches!(arg(&args, 0), Value::Element(_))))
        }),
    );
    module.insert(
        "memo".into(),
        Value::native("memo", |_, _, args| Ok(arg(&args, 0))),
    );
    module.insert(
        "forwardRef".into(),
        Value::native("forwardRef", |_, _, args| {
            let render = arg(&args, 0);
            let name = render.function_name().unwrap_or_else(|| "ForwardRef".into());
            Ok(Value::native(&name, move |interp, _, args| {
                let props = arg(&args, 0);
                let reference = props.get("ref");
                interp.call(&render, Value::Undefined, vec![props, reference])
            }))
        }),
    );
    module.insert(
        "createContext".into(),
        Value::native("createContext", |interp, _, args| {
            let id = interp.next_context_id();
            interp.hooks.define_context(id, arg(&args, 0));
            Ok(Value::object_from([
                (
                    "Provider",
                    Value::native_kind("Provider", NativeKind::Provider(id), |_, _, _| Ok(Value::Undefined)),
                ),
                (
                    "Consumer",
                    Value::native_kind("Consumer", NativeKind::Consumer(id), |_, _, _| Ok(Value::Undefined)),
                ),
                ("_id", Value::Number(id as f64)),
                ("_defaultValue", arg(&args, 0)),
            ]))
        }),
    );
    module.insert("Children".into(), children_helpers());

    module.insert(
        "useState".into(),
        Value::native("useState", |interp, _, args| interp.use_state(arg(&args, 0))),
    );
    module.insert(
        "useReducer".into(),
        Value::native("useReducer", |interp, _, args| {
            interp.use_reducer(arg(&args, 0), arg(&args, 1), arg(&args, 2))
        }),
    );
    module.insert(
        "useEffect".into(),
        Value::native("useEffect", |interp, _, args| {
            interp.use_effect(arg(&args, 0), &arg(&args, 1), false)
        }),
    );
    module.insert(
        "useLayoutEffect".into(),
        Value::native("useLayoutEffect", |interp, _, args| {
            interp.use_effect(arg(&args, 0), &arg(&args, 1), true)
        }),
    );
    module.insert(
        "useMemo".into(),
        Value::native("useMemo", |interp, _, args| {
            interp.use_memo(arg(&args, 0), &arg(&args, 1), false)
        }),
    );
    module.insert(
        "useCallback".into(),
        Value::native("useCallback", |interp, _, args| {
            interp.use_memo(arg(&args, 0), &arg(&args, 1), true)
        }),
    );
    module.insert(
        "useRef".into(),
        Value::native("useRef", |interp, _, args| interp.use_ref(arg(&args, 0))),
    );
    module.insert(
        "useId".into(),
        Value::native("useId", |interp, _, _| interp.use_id()),
    );
    module.insert(
        "useContext".into(),
        Value::native("useContext", |interp, _, args| interp.use_context(&arg(&args, 0))),
    );
    Value::object(module)
}

/// `React.Children`.
fn children_helpers() -> Value {
    fn flatten(children: &Value) -> Vec<Value> {
        match children {
            Value::Undefined | Value::Null | Value::Bool(_) => Vec::new(),
            Value::Array(items) => items.borrow().iter().flat_map(flatten).collect(),
            other => vec![other.clone()],
        }
    }

    Value::object_from([
        (
            "toArray",
            Value::native("toArray", |_, _, args| Ok(Value::array(flatten(&arg(&args, 0))))),
        ),
        (
            "count",
            Value::native("count", |_, _, args| {
                Ok(Value::Number(flatten(&arg(&args, 0)).len() as f64))
            }),
        ),
        (
            "map",
            Value::native("map", |interp, _, args| {
                let callback = arg(&args, 1);
                let mut out = Vec::new();
                for (i, child) in flatten(&arg(&args, 0)).into_iter().enumerate() {
                    out.push(interp.call(&callback, Value::Undefined, vec![child, Value::Number(i as f64)])?);
                }
                Ok(Value::array(out))
            }),
        ),
        (
            "forEach",
            Value::native("forEach", |interp, _, args| {
                let callback = arg(&args, 1);
                for (i, child) in flatten(&arg(&args, 0)).into_iter().enumerate() {
                    interp.call(&callback, Value::Undefined, vec![child, Value::Number(i as f64)])?;
                }
                Ok(Value::Undefined)
            }),
        ),
        (
            "only",
            Value::native("only", |_, _, args| match arg(&args, 0) {
                element @ Value::Element(_) => Ok(element),
                _ => Err(EvalError::type_error(
                    "React.Children.only expected to receive a single React element child.",
                )),
            }),
        ),
    ])
}

/// The `react/jsx-runtime` container: the element factory lowered markup
/// calls, and the fragment marker shared with `react`.
pub(super) fn jsx_runtime(react: &Value) -> Value {
    let factory = react.get("createElement");
    Value::object_from([
        ("jsx", factory.clone()),
        ("jsxs", factory),
        ("Fragment", react.get("Fragment")),
    ])
}
