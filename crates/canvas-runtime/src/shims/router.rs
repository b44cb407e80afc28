//! In-memory routing: every router component reads and writes the scope's
//! [`RouterState`]; navigation schedules a re-render.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::builtins::arg;
use crate::error::EvalResult;
use crate::evaluator::{own_entries, Interpreter};
use crate::value::{ElementType, Object, Value};

/// Current location and history of one scope.
#[derive(Debug, Clone)]
pub(crate) struct RouterState {
    /// Path plus optional `?search` and `#hash`.
    pub(crate) location: String,
    pub(crate) history: Vec<String>,
    /// Parameters captured by the last matched route.
    pub(crate) params: BTreeMap<String, String>,
}

impl Default for RouterState {
    fn default() -> Self {
        Self {
            location: "/".into(),
            history: Vec::new(),
            params: BTreeMap::new(),
        }
    }
}

impl RouterState {
    pub(crate) fn pathname(&self) -> &str {
        let end = self.location.find(['?', '#']).unwrap_or(self.location.len());
        &self.location[..end]
    }

    fn search(&self) -> &str {
        let rest = &self.location[self.pathname().len()..];
        match rest.find('#') {
            Some(i) => &rest[..i],
            None => rest,
        }
    }

    fn hash(&self) -> &str {
        self.location.find('#').map_or("", |i| &self.location[i..])
    }
}

impl Interpreter {
    /// Go to `to`, relative to the current path unless absolute.
    pub(crate) fn navigate(&mut self, to: &str, replace: bool) {
        let target = resolve_location(self.router.pathname(), to);
        if target == self.router.location {
            return;
        }
        let previous = std::mem::replace(&mut self.router.location, target);
        if !replace {
            self.router.history.push(previous);
        }
        self.hooks.mark_dirty();
    }

    /// Go back `steps` entries; stops at the oldest one.
    pub(crate) fn navigate_back(&mut self, steps: usize) {
        let mut moved = false;
        for _ in 0..steps {
            let Some(previous) = self.router.history.pop() else {
                break;
            };
            self.router.location = previous;
            moved = true;
        }
        if moved {
            self.hooks.mark_dirty();
        }
    }
}

fn resolve_location(current: &str, to: &str) -> String {
    if to.starts_with('/') {
        return to.to_string();
    }
    if to.starts_with(['?', '#']) {
        return format!("{current}{to}");
    }
    let mut segments: Vec<&str> = current.split('/').filter(|s| !s.is_empty()).collect();
    for part in to.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            part => segments.push(part),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Match `pattern` (`/users/:id`, `/files/*`) against `pathname`.
pub(crate) fn match_path(pattern: &str, pathname: &str) -> Option<BTreeMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_parts: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();
    let mut params = BTreeMap::new();
    for (i, part) in pattern_parts.iter().enumerate() {
        if *part == "*" {
            params.insert("*".to_string(), path_parts.get(i..).unwrap_or_default().join("/"));
            return Some(params);
        }
        let segment = path_parts.get(i)?;
        match part.strip_prefix(':') {
            Some(name) => {
                params.insert(name.trim_end_matches('?').to_string(), (*segment).to_string());
            }
            None if part == segment => {}
            None => return None,
        }
    }
    (pattern_parts.len() == path_parts.len()).then_some(params)
}

// ══════════════════════════════════════════════════════════════════════════════
// Components and hooks
// ══════════════════════════════════════════════════════════════════════════════

pub(super) fn router_module() -> Value {
    let route = Value::native("Route", |_, _, args| Ok(arg(&args, 0).get("element")));
    let routes = {
        let route = route.clone();
        Value::native("Routes", move |interp, _, args| {
            let children = arg(&args, 0).get("children");
            let pathname = interp.router.pathname().to_string();
            match select_route(&route, &children, "", &pathname) {
                Some((element, params)) => {
                    interp.router.params = params;
                    Ok(element)
                }
                None => {
                    interp.router.params.clear();
                    Ok(Value::Null)
                }
            }
        })
    };
    let memory_router = Value::native("MemoryRouter", |interp, _, args| {
        let props = arg(&args, 0);
        let seeded = interp.use_ref(Value::Bool(false))?;
        if !seeded.get("current").is_truthy() {
            let entries = match props.get("initialEntries") {
                Value::Array(items) => items.borrow().clone(),
                _ => Vec::new(),
            };
            let index = match props.get("initialIndex") {
                Value::Number(n) if n >= 0.0 => n as usize,
                _ => entries.len().saturating_sub(1),
            };
            if let Some(entry) = entries.get(index) {
                let location = match entry {
                    Value::Object(_) => entry.get("pathname").to_js_string(),
                    other => other.to_js_string(),
                };
                interp.router.history = entries[..index].iter().map(Value::to_js_string).collect();
                interp.router.location = location;
            }
            interp.set_property(&seeded, "current", Value::Bool(true))?;
        }
        Ok(props.get("children"))
    });
    let browser_router = Value::native("BrowserRouter", |_, _, args| Ok(arg(&args, 0).get("children")));

    Value::object_from([
        ("BrowserRouter", browser_router.clone()),
        ("HashRouter", browser_router),
        ("MemoryRouter", memory_router),
        ("Routes", routes),
        ("Route", route),
        ("Link", Value::native("Link", |interp, _, args| link(interp, &arg(&args, 0), false))),
        ("NavLink", Value::native("NavLink", |interp, _, args| link(interp, &arg(&args, 0), true))),
        (
            "useNavigate",
            Value::native("useNavigate", |_, _, _| Ok(navigate_fn())),
        ),
        (
            "useLocation",
            Value::native("useLocation", |interp, _, _| {
                let router = &interp.router;
                Ok(Value::object_from([
                    ("pathname", Value::string(router.pathname())),
                    ("search", Value::string(router.search())),
                    ("hash", Value::string(router.hash())),
                    ("state", Value::Null),
                    ("key", Value::string("default")),
                ]))
            }),
        ),
        (
            "useParams",
            Value::native("useParams", |interp, _, _| {
                Ok(Value::object_from(
                    interp
                        .router
                        .params
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::string(v))),
                ))
            }),
        ),
    ])
}

fn navigate_fn() -> Value {
    Value::native("navigate", |interp, _, args| {
        match arg(&args, 0) {
            Value::Number(delta) if delta < 0.0 => interp.navigate_back(delta.abs() as usize),
            Value::Number(_) => {}
            to => {
                let replace = arg(&args, 1).get("replace").is_truthy();
                interp.navigate(&to.to_js_string(), replace);
            }
        }
        Ok(Value::Undefined)
    })
}

/// Route elements among `children`, fragments and arrays flattened.
fn route_children(route: &Value, children: &Value, out: &mut Vec<Value>) {
    match children {
        Value::Array(items) => {
            for item in items.borrow().iter() {
                route_children(route, item, out);
            }
        }
        Value::Element(element) => match &element.ty {
            ElementType::Fragment => route_children(route, &element.props.get("children"), out),
            ElementType::Component(ty) if ty.strict_eq(route) => out.push(element.props.clone()),
            _ => {}
        },
        _ => {}
    }
}

fn select_route(
    route: &Value,
    children: &Value,
    base: &str,
    pathname: &str,
) -> Option<(Value, BTreeMap<String, String>)> {
    let mut candidates = Vec::new();
    route_children(route, children, &mut candidates);
    for props in candidates {
        let path = match props.get("path") {
            Value::String(path) if path.starts_with('/') => path.to_string(),
            Value::String(path) => format!("{}/{path}", base.trim_end_matches('/')),
            // Index and pathless routes match their parent's path.
            _ => base.to_string(),
        };
        let nested = props.get("children");
        if !nested.is_nullish() && props.get("element").is_nullish() {
            if let Some(found) = select_route(route, &nested, &path, pathname) {
                return Some(found);
            }
            continue;
        }
        if let Some(params) = match_path(&path, pathname) {
            return Some((props.get("element"), params));
        }
    }
    None
}

/// `Link` and `NavLink`: an anchor whose click navigates in-scope.
fn link(interp: &mut Interpreter, props: &Value, nav: bool) -> EvalResult<Value> {
    let to = props.get("to").to_js_string();
    let href = resolve_location(interp.router.pathname(), &to);
    let active = nav && {
        let current = interp.router.pathname();
        let target = href.split(['?', '#']).next().unwrap_or_default();
        current == target
            || (!props.get("end").is_truthy() && target != "/" && current.starts_with(&format!("{target}/")))
    };

    let mut attrs: Object = own_entries(props)
        .into_iter()
        .filter(|(key, _)| !matches!(key.as_str(), "to" | "replace" | "end" | "state"))
        .collect();
    attrs.insert("href".into(), Value::string(&href));
    if nav {
        let state = Value::object_from([("isActive", Value::Bool(active)), ("isPending", Value::Bool(false))]);
        for key in ["className", "style", "children"] {
            let value = props.get(key);
            if value.is_callable() {
                attrs.insert(key.into(), interp.call(&value, Value::Undefined, vec![state.clone()])?);
            }
        }
        if active {
            let class = match attrs.get("className") {
                Some(Value::String(class)) if !class.is_empty() => format!("{class} active"),
                Some(Value::String(_)) | None => "active".into(),
                Some(other) => other.to_js_string(),
            };
            if !props.get("className").is_callable() {
                attrs.insert("className".into(), Value::string(class));
            }
            attrs.insert("aria-current".into(), Value::string("page"));
        }
    }

    let user_click = props.get("onClick");
    let replace = props.get("replace").is_truthy();
    let target = Rc::<str>::from(href.as_str());
    attrs.insert(
        "onClick".into(),
        Value::native("onClick", move |interp, _, args| {
            let event = arg(&args, 0);
            if user_click.is_callable() {
                interp.call(&user_click, Value::Undefined, vec![event.clone()])?;
            }
            if event.get("defaultPrevented").is_truthy() {
                return Ok(Value::Undefined);
            }
            let prevent = event.get("preventDefault");
            if prevent.is_callable() {
                interp.call(&prevent, event.clone(), Vec::new())?;
            }
            interp.navigate(&target, replace);
            Ok(Value::Undefined)
        }),
    );
    Ok(Value::element(ElementType::Tag(Rc::from("a")), Value::object(attrs), None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_match_path() {
        let params = match_path("/users/:id", "/users/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert!(match_path("/users/:id", "/users").is_none());
        assert!(match_path("/", "/").is_some());
        assert!(match_path("/about", "/contact").is_none());
        let rest = match_path("/files/*", "/files/a/b.txt").unwrap();
        assert_eq!(rest.get("*").map(String::as_str), Some("a/b.txt"));
        assert!(match_path("*", "/anything/at/all").is_some());
    }

    #[test]
    fn test_resolve_location() {
        assert_eq!(resolve_location("/a/b", "/c"), "/c");
        assert_eq!(resolve_location("/a/b", "c"), "/a/b/c");
        assert_eq!(resolve_location("/a/b", ".."), "/a");
        assert_eq!(resolve_location("/a", "?q=1"), "/a?q=1");
    }

    #[test]
    fn test_navigation_history() {
        let mut interp = Interpreter::default();
        interp.navigate("/settings?tab=2#top", false);
        assert!(interp.hooks.take_dirty());
        assert_eq!(interp.router.pathname(), "/settings");
        assert_eq!(interp.router.search(), "?tab=2");
        assert_eq!(interp.router.hash(), "#top");

        interp.navigate("/settings?tab=2#top", false);
        assert!(!interp.hooks.is_dirty());

        interp.navigate_back(1);
        assert_eq!(interp.router.location, "/");
        interp.navigate_back(3);
        assert_eq!(interp.router.location, "/");
    }

    #[test]
    fn test_link_renders_anchor() {
        let mut interp = Interpreter::default();
        interp.navigate("/about", true);
        let props = Value::object_from([
            ("to", Value::string("/about")),
            ("className", Value::string("nav")),
            ("children", Value::string("About")),
        ]);
        let Value::Element(anchor) = link(&mut interp, &props, true).unwrap() else {
            panic!("expected element");
        };
        assert_eq!(anchor.props.get("href").to_js_string(), "/about");
        assert_eq!(anchor.props.get("className").to_js_string(), "nav active");
        assert_eq!(anchor.props.get("aria-current").to_js_string(), "page");
        assert!(anchor.props.get("to").is_nullish());

        let navigate = anchor.props.get("onClick");
        interp.navigate("/", true);
        interp.call(&navigate, Value::Undefined, vec![Value::object_from([("type", Value::string("click"))])]).unwrap();
        assert_eq!(interp.router.pathname(), "/about");
    }
}
