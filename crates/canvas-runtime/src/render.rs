//! Mounting element trees into a [`Document`].
//!
//! Every pass rebuilds the container's children from the root element.
//! Components are called with a hook frame keyed by their tree position,
//! so state survives passes as long as the position and the component
//! stay the same. A pass that leaves updates pending is followed by
//! another, up to [`MAX_RENDER_PASSES`].

use std::rc::Rc;

use tracing::trace;

use crate::dom::{Document, NodeId};
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{own_entries, Interpreter};
use crate::value::{format_number, ElementType, Value};

/// Consecutive passes allowed before updates are considered runaway.
pub const MAX_RENDER_PASSES: usize = 50;

/// Style properties whose numeric values take no unit.
const UNITLESS: &[&str] = &[
    "opacity", "zIndex", "fontWeight", "lineHeight", "flex", "flexGrow", "flexShrink", "order",
    "zoom", "gridRow", "gridColumn", "aspectRatio", "scale",
];

/// Props renamed on their way to attributes.
const ATTRIBUTE_NAMES: &[(&str, &str)] = &[
    ("className", "class"),
    ("htmlFor", "for"),
    ("tabIndex", "tabindex"),
    ("readOnly", "readonly"),
    ("autoFocus", "autofocus"),
    ("autoComplete", "autocomplete"),
    ("maxLength", "maxlength"),
    ("minLength", "minlength"),
    ("colSpan", "colspan"),
    ("rowSpan", "rowspan"),
    ("srcSet", "srcset"),
    ("crossOrigin", "crossorigin"),
    ("strokeWidth", "stroke-width"),
    ("strokeLinecap", "stroke-linecap"),
    ("strokeLinejoin", "stroke-linejoin"),
    ("strokeDasharray", "stroke-dasharray"),
    ("strokeDashoffset", "stroke-dashoffset"),
    ("strokeOpacity", "stroke-opacity"),
    ("fillOpacity", "fill-opacity"),
    ("fillRule", "fill-rule"),
    ("clipRule", "clip-rule"),
    ("stopColor", "stop-color"),
    ("textAnchor", "text-anchor"),
];

/// Render `root` into `container`, repeating passes until no update is
/// pending, then run effects.
pub(crate) fn render_root(
    interp: &mut Interpreter,
    doc: &mut Document,
    container: NodeId,
    root: &Value,
) -> EvalResult<()> {
    interp.hooks.take_dirty();
    for pass in 0..MAX_RENDER_PASSES {
        trace!(pass, "render pass");
        interp.hooks.begin_pass();
        doc.clear_children(container);
        Renderer {
            interp: &mut *interp,
            doc: &mut *doc,
        }
        .render(root, container, "root")?;
        interp.sweep_hooks()?;
        interp.run_effects()?;
        if !interp.hooks.take_dirty() {
            return Ok(());
        }
    }
    Err(EvalError::Render(
        "Too many re-renders. Updates kept being scheduled while rendering.".into(),
    ))
}

struct Renderer<'a> {
    interp: &'a mut Interpreter,
    doc: &'a mut Document,
}

impl Renderer<'_> {
    fn render(&mut self, value: &Value, parent: NodeId, position: &str) -> EvalResult<()> {
        match value {
            Value::Undefined | Value::Null | Value::Bool(_) => Ok(()),
            Value::Number(n) => {
                let text = self.doc.create_text(&format_number(*n));
                self.doc.append_child(parent, text);
                Ok(())
            }
            Value::String(s) => {
                let text = self.doc.create_text(s);
                self.doc.append_child(parent, text);
                Ok(())
            }
            Value::Array(items) => {
                let items = items.borrow().clone();
                for (i, item) in items.iter().enumerate() {
                    let slot = match item {
                        Value::Element(element) => element
                            .key
                            .as_ref()
                            .map_or_else(|| i.to_string(), |k| format!("k{k}")),
                        _ => i.to_string(),
                    };
                    self.render(item, parent, &format!("{position}/{slot}"))?;
                }
                Ok(())
            }
            Value::Element(element) => {
                let props = &element.props;
                match &element.ty {
                    ElementType::Tag(tag) => self.render_tag(tag, props, parent, position),
                    ElementType::Fragment => self.render(&props.get("children"), parent, position),
                    ElementType::Provider(id) => {
                        self.interp.hooks.push_provider(*id, props.get("value"));
                        let result = self.render(&props.get("children"), parent, position);
                        self.interp.hooks.pop_provider();
                        result
                    }
                    ElementType::Consumer(id) => {
                        let value = self.interp.hooks.context_value(*id);
                        let render = props.get("children");
                        let child = self.interp.call(&render, Value::Undefined, vec![value])?;
                        self.render(&child, parent, &format!("{position}/consumer"))
                    }
                    ElementType::Component(component) => {
                        self.render_component(component, props, parent, position)
                    }
                }
            }
            Value::Closure(_) | Value::Native(_) | Value::Icons(_) => Ok(()),
            Value::Object(map) => {
                let keys: Vec<String> = map.borrow().keys().cloned().collect();
                Err(EvalError::Render(format!(
                    "Objects are not valid as a React child (found: object with keys {{{}}}).",
                    keys.join(", ")
                )))
            }
        }
    }

    fn render_component(&mut self, component: &Value, props: &Value, parent: NodeId, position: &str) -> EvalResult<()> {
        let name = component.function_name().unwrap_or_default();
        let identity = component.function_id().unwrap_or_default();
        let key: Rc<str> = Rc::from(format!("{position}:{name}#{identity:x}"));
        self.interp.hooks.enter(Rc::clone(&key));
        let output = self.interp.call(component, Value::Undefined, vec![props.clone()]);
        self.interp.hooks.leave();
        let output = output?;
        self.render(&output, parent, &key)
    }

    fn render_tag(&mut self, tag: &str, props: &Value, parent: NodeId, position: &str) -> EvalResult<()> {
        let node = self.doc.create_element(tag);
        self.doc.append_child(parent, node);
        let mut inner_html = None;
        for (name, value) in own_entries(props) {
            match name.as_str() {
                "children" | "key" => {}
                "ref" => self.attach_ref(&value, tag, props)?,
                "dangerouslySetInnerHTML" => inner_html = Some(value.get("__html").to_js_string()),
                "style" => {
                    let css = style_text(&value);
                    if !css.is_empty() {
                        self.doc.set_attribute(node, "style", &css);
                    }
                }
                _ if is_event_prop(&name) => {
                    if value.is_callable() {
                        self.doc.add_listener(node, &event_name(&name), value);
                    }
                }
                _ => set_prop_attribute(self.doc, node, &name, &value),
            }
        }
        if let Some(html) = inner_html {
            let text = self.doc.create_text(&html);
            self.doc.append_child(node, text);
            return Ok(());
        }
        self.render(&props.get("children"), node, &format!("{position}.{tag}"))
    }

    /// Refs receive a plain handle describing the element.
    fn attach_ref(&mut self, reference: &Value, tag: &str, props: &Value) -> EvalResult<()> {
        let noop = || Value::native("noop", |_, _, _| Ok(Value::Undefined));
        let handle = Value::object_from([
            ("tagName", Value::string(tag.to_ascii_uppercase())),
            ("id", props.get("id")),
            ("value", props.get("value")),
            ("focus", noop()),
            ("blur", noop()),
            ("scrollIntoView", noop()),
        ]);
        match reference {
            Value::Object(_) => self.interp.set_property(reference, "current", handle),
            callback if callback.is_callable() => {
                self.interp.call(callback, Value::Undefined, vec![handle]).map(|_| ())
            }
            _ => Ok(()),
        }
    }
}

fn is_event_prop(name: &str) -> bool {
    name.len() > 2 && name.starts_with("on") && name[2..].starts_with(|c: char| c.is_ascii_uppercase())
}

/// `onClick` → `click`, `onMouseEnter` → `mouseenter`.
pub(crate) fn event_name(prop: &str) -> String {
    prop[2..].to_ascii_lowercase()
}

fn set_prop_attribute(doc: &mut Document, node: NodeId, name: &str, value: &Value) {
    let attr = ATTRIBUTE_NAMES
        .iter()
        .find(|(prop, _)| *prop == name)
        .map_or(name, |(_, attr)| attr);
    match value {
        Value::Undefined | Value::Null | Value::Bool(false) => {}
        Value::Bool(true) if attr.starts_with("aria-") || attr.starts_with("data-") => {
            doc.set_attribute(node, attr, "true");
        }
        Value::Bool(true) => doc.set_attribute(node, attr, ""),
        Value::Closure(_) | Value::Native(_) => {}
        other => doc.set_attribute(node, attr, &other.to_js_string()),
    }
}

/// Inline CSS text of a style object, in property order.
pub(crate) fn style_text(style: &Value) -> String {
    match style {
        Value::String(css) => css.to_string(),
        Value::Object(_) => own_entries(style)
            .into_iter()
            .filter(|(_, value)| !value.is_nullish() && !matches!(value, Value::Bool(_)))
            .map(|(name, value)| {
                let css_value = match value {
                    Value::Number(n) if n != 0.0 && !UNITLESS.contains(&name.as_str()) => {
                        format!("{}px", format_number(n))
                    }
                    other => other.to_js_string(),
                };
                format!("{}: {css_value}", css_property(&name))
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => String::new(),
    }
}

/// `backgroundColor` → `background-color`; custom properties as written.
fn css_property(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::tests::run_in;
    use crate::shims::ShimTable;
    use pretty_assertions::assert_eq;

    fn mount(source: &str) -> EvalResult<(Interpreter, Document)> {
        let mut interp = Interpreter::default();
        ShimTable::new().install_globals(interp.globals());
        let root = run_in(&mut interp, source)?;
        let mut doc = Document::new();
        let body = doc.body();
        render_root(&mut interp, &mut doc, body, &root)?;
        Ok((interp, doc))
    }

    fn html(source: &str) -> String {
        let (_, doc) = mount(source).unwrap();
        doc.inner_html(doc.body())
    }

    #[test]
    fn test_props_become_attributes() {
        let source = r#"
const h = React.createElement;
const result = h("label", { className: "field", htmlFor: "name", hidden: false, disabled: true, "aria-busy": true, style: { marginTop: 4, opacity: 0.5, backgroundColor: "red" } }, "Name", 3);
"#;
        assert_eq!(
            html(source),
            "<label aria-busy=\"true\" class=\"field\" disabled for=\"name\" style=\"margin-top: 4px; opacity: 0.5; background-color: red\">Name3</label>"
        );
    }

    #[test]
    fn test_components_and_fragments() {
        let source = r#"
const h = React.createElement;
function Item({ label }) { return h("li", null, label); }
function List({ items }) {
  return h(React.Fragment, null, h("ul", null, items.map((x) => h(Item, { key: x, label: x }))), null, false);
}
const result = h(List, { items: ["a", "b"] });
"#;
        assert_eq!(html(source), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_state_updates_during_effects_re_render() {
        let source = r#"
const h = React.createElement;
function Counter() {
  const [n, setN] = useState(0);
  useEffect(() => { if (n < 3) setN(n + 1); }, [n]);
  return h("span", null, "n=", n);
}
const result = h(Counter, null);
"#;
        assert_eq!(html(source), "<span>n=3</span>");
    }

    #[test]
    fn test_runaway_updates_are_an_error() {
        let source = r#"
const h = React.createElement;
function Loop() {
  const [n, setN] = useState(0);
  setN(n + 1);
  return h("i", null, n);
}
const result = h(Loop, null);
"#;
        let err = mount(source).err().unwrap();
        assert!(err.to_string().contains("Too many re-renders"));
    }

    #[test]
    fn test_context_providers() {
        let source = r#"
const h = React.createElement;
const Theme = React.createContext("light");
function Label() { return h("b", null, useContext(Theme)); }
const result = h("div", null, h(Label, null), h(Theme.Provider, { value: "dark" }, h(Label, null)), h(Theme.Consumer, null, (v) => v.toUpperCase()));
"#;
        assert_eq!(html(source), "<div><b>light</b><b>dark</b>LIGHT</div>");
    }

    #[test]
    fn test_object_child_is_a_render_error() {
        let err = mount("const result = React.createElement(\"p\", null, { a: 1 });").err().unwrap();
        assert!(matches!(err, EvalError::Render(_)));
        assert!(err.to_string().contains("object with keys {a}"));
    }

    #[test]
    fn test_css_property_names() {
        assert_eq!(css_property("borderTopLeftRadius"), "border-top-left-radius");
        assert_eq!(css_property("--accent"), "--accent");
        assert_eq!(event_name("onMouseEnter"), "mouseenter");
    }
}
