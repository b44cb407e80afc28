//! Execution strategies: where a compiled project is evaluated and mounted.
//!
//! [`IsolatedStrategy`] builds a fresh scope (globals and document) for
//! every render and supports interaction. [`SharedStrategy`] evaluates in
//! a [`HostPage`]'s own globals and mounts into its container, inert.
//! Both run inside an error boundary: script errors and interpreter panics
//! become [`RenderOutcome::Error`].

use std::cell::{Cell, Ref, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use canvas_compiler::{CompiledProject, RuntimeConfig};
use canvas_types::RenderFailure;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::builtins;
use crate::dom::{Document, DomSnapshot, NodeId};
use crate::env::Env;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{ConsoleEntry, Interpreter};
use crate::loader::Loader;
use crate::render::render_root;
use crate::shims::{create_element, ShimTable};
use crate::value::{Object, Value};

/// Marks a shared-mode container.
pub const INERT_ATTRIBUTE: &str = "data-canvas-inert";

/// Marks the style node injected for shared mounts.
pub const STYLE_ATTRIBUTE: &str = "data-canvas-style";

/// Turns off hover styling, transitions and animations under an inert
/// container.
const INERT_CSS: &str = "[data-canvas-inert], [data-canvas-inert] * { pointer-events: none !important; } \
[data-canvas-inert] *, [data-canvas-inert] *::before, [data-canvas-inert] *::after { transition: none !important; animation: none !important; } \
[data-canvas-inert] *:hover { filter: none !important; }";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Isolated,
    Shared,
}

/// Props injected into the mounted element: `defaults`, then `overrides`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropBag {
    pub defaults: serde_json::Map<String, serde_json::Value>,
    pub overrides: serde_json::Map<String, serde_json::Value>,
}

impl PropBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, key: &str, value: serde_json::Value) -> Self {
        self.defaults.insert(key.to_string(), value);
        self
    }

    pub fn with_override(mut self, key: &str, value: serde_json::Value) -> Self {
        self.overrides.insert(key.to_string(), value);
        self
    }

    /// Defaults overlaid with overrides; an override wins on a shared key.
    pub fn merged(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut merged = self.defaults.clone();
        for (key, value) in &self.overrides {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Host page
// ══════════════════════════════════════════════════════════════════════════════

/// The page a shared-mode render runs in: its globals, its document and
/// the container it lends to the canvas.
#[derive(Debug, Clone)]
pub struct HostPage {
    globals: Env,
    document: Rc<RefCell<Document>>,
    container: NodeId,
    // Token of the mount that currently owns the container.
    owner: Rc<Cell<u64>>,
}

impl HostPage {
    pub fn new() -> Self {
        let globals = Env::new();
        builtins::install(&globals);
        let mut document = Document::new();
        let container = document.create_element("div");
        document.set_attribute(container, "id", "canvas-root");
        let body = document.body();
        document.append_child(body, container);
        Self {
            globals,
            document: Rc::new(RefCell::new(document)),
            container,
            owner: Rc::new(Cell::new(0)),
        }
    }

    /// Hand the container to a new mount, revoking any earlier lease.
    fn lease(&self) -> Lease {
        let token = self.owner.get() + 1;
        self.owner.set(token);
        Lease {
            owner: Rc::clone(&self.owner),
            token,
        }
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    pub fn document(&self) -> Ref<'_, Document> {
        self.document.borrow()
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Markup of the whole page body.
    pub fn body_html(&self) -> String {
        let doc = self.document.borrow();
        doc.inner_html(doc.body())
    }
}

/// A shared mount's claim on the host container.
#[derive(Debug)]
struct Lease {
    owner: Rc<Cell<u64>>,
    token: u64,
}

impl Lease {
    fn is_current(&self) -> bool {
        self.owner.get() == self.token
    }
}

impl Default for HostPage {
    fn default() -> Self {
        Self::new()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Outcomes
// ══════════════════════════════════════════════════════════════════════════════

/// The result of one render attempt.
#[derive(Debug)]
pub enum RenderOutcome {
    Ready(MountedTree),
    Error(RenderFailure),
}

/// Serialisable summary of a [`RenderOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeReport {
    Ready {
        mode: Mode,
        html: String,
        text: String,
        console: Vec<ConsoleEntry>,
    },
    Error {
        #[serde(flatten)]
        failure: RenderFailure,
    },
}

impl RenderOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, RenderOutcome::Ready(_))
    }

    pub fn tree(&self) -> Option<&MountedTree> {
        match self {
            RenderOutcome::Ready(tree) => Some(tree),
            RenderOutcome::Error(_) => None,
        }
    }

    pub fn tree_mut(&mut self) -> Option<&mut MountedTree> {
        match self {
            RenderOutcome::Ready(tree) => Some(tree),
            RenderOutcome::Error(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&RenderFailure> {
        match self {
            RenderOutcome::Ready(_) => None,
            RenderOutcome::Error(failure) => Some(failure),
        }
    }

    pub fn report(&self) -> OutcomeReport {
        match self {
            RenderOutcome::Ready(tree) => OutcomeReport::Ready {
                mode: tree.mode,
                html: tree.html(),
                text: tree.text(),
                console: tree.console().to_vec(),
            },
            RenderOutcome::Error(failure) => OutcomeReport::Error {
                failure: failure.clone(),
            },
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Mounted trees
// ══════════════════════════════════════════════════════════════════════════════

/// A user interaction delivered to a mounted node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Event {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }
}

/// A rendered project: the scope it runs in and the container it owns.
///
/// Dropping the tree unmounts it: effect cleanups run, the container is
/// emptied and shared-mode markers are removed.
pub struct MountedTree {
    mode: Mode,
    interp: Interpreter,
    document: Rc<RefCell<Document>>,
    container: NodeId,
    root: Value,
    style: Option<NodeId>,
    lease: Option<Lease>,
    // Keeps records alive for `require` calls made after mounting.
    _loader: Loader,
}

impl std::fmt::Debug for MountedTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedTree")
            .field("mode", &self.mode)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

impl MountedTree {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn document(&self) -> Ref<'_, Document> {
        self.document.borrow()
    }

    /// Markup inside the container.
    pub fn html(&self) -> String {
        self.document.borrow().inner_html(self.container)
    }

    pub fn text(&self) -> String {
        self.document.borrow().text_content(self.container)
    }

    /// Structural snapshot of the container's children.
    pub fn snapshot(&self) -> Vec<DomSnapshot> {
        let doc = self.document.borrow();
        doc.children(self.container)
            .iter()
            .filter_map(|c| doc.snapshot(*c))
            .collect()
    }

    pub fn query(&self, selector: &str) -> Option<NodeId> {
        self.document.borrow().query_selector(self.container, selector)
    }

    pub fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.document.borrow().query_selector_all(self.container, selector)
    }

    pub fn find_by_text(&self, text: &str) -> Option<NodeId> {
        self.document.borrow().find_by_text(self.container, text)
    }

    pub fn console(&self) -> &[ConsoleEntry] {
        self.interp.console()
    }

    /// Mounted component instances.
    pub fn instance_count(&self) -> usize {
        self.interp.hooks.instance_count()
    }

    /// Deliver `event` to `target`, bubbling to the container, then
    /// re-render if state changed. Returns whether a handler prevented the
    /// default action.
    pub fn dispatch(&mut self, target: NodeId, event: Event) -> EvalResult<bool> {
        self.interact(|tree| {
            let prevented = tree.fire(target, &event)?;
            tree.refresh()?;
            Ok(prevented)
        })
    }

    /// Click the first node matching `selector`. Checkboxes toggle and
    /// also fire `change`.
    pub fn click(&mut self, selector: &str) -> EvalResult<()> {
        let target = self.target(selector)?;
        self.interact(|tree| {
            let checkbox = {
                let doc = tree.document.borrow();
                doc.tag(target) == Some("input")
                    && matches!(doc.attribute(target, "type"), Some("checkbox" | "radio"))
            };
            let mut event = Event::new("click");
            if checkbox {
                let checked = !tree.document.borrow().has_attribute(target, "checked");
                event = event.with_checked(checked);
            }
            tree.fire(target, &event)?;
            if checkbox {
                tree.fire(target, &Event { kind: "change".into(), ..event })?;
            }
            tree.refresh()
        })
    }

    /// Type `value` into the first node matching `selector`: fires `input`
    /// then `change`.
    pub fn input(&mut self, selector: &str, value: &str) -> EvalResult<()> {
        let target = self.target(selector)?;
        self.interact(|tree| {
            tree.fire(target, &Event::new("input").with_value(value))?;
            tree.fire(target, &Event::new("change").with_value(value))?;
            tree.refresh()
        })
    }

    /// Render again from the root element.
    pub fn rerender(&mut self) -> EvalResult<()> {
        boundary(|| {
            let mut doc = self.document.borrow_mut();
            render_root(&mut self.interp, &mut doc, self.container, &self.root)
        })
    }

    /// Fire pending timers once and re-render if state changed.
    pub fn run_timers(&mut self) -> EvalResult<usize> {
        boundary(|| {
            let fired = self.interp.run_timers()?;
            self.refresh()?;
            Ok(fired)
        })
    }

    fn target(&self, selector: &str) -> EvalResult<NodeId> {
        self.query(selector)
            .ok_or_else(|| EvalError::Render(format!("no element matches '{selector}'")))
    }

    fn interact<T>(&mut self, f: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        if self.mode == Mode::Shared {
            return Err(EvalError::InteractionBlocked);
        }
        boundary(|| f(self))
    }

    fn refresh(&mut self) -> EvalResult<()> {
        if !self.interp.hooks.is_dirty() {
            return Ok(());
        }
        let mut doc = self.document.borrow_mut();
        render_root(&mut self.interp, &mut doc, self.container, &self.root)
    }

    /// Apply the event to the target's form state, then call listeners from
    /// the target up to the container.
    fn fire(&mut self, target: NodeId, event: &Event) -> EvalResult<bool> {
        {
            let mut doc = self.document.borrow_mut();
            if !doc.contains(target) {
                return Err(EvalError::Render("event target is no longer mounted".into()));
            }
            if let Some(value) = &event.value {
                doc.set_attribute(target, "value", value);
            }
            match event.checked {
                Some(true) => doc.set_attribute(target, "checked", ""),
                Some(false) => doc.remove_attribute(target, "checked"),
                None => {}
            }
        }
        let event_object = self.event_object(target, event);

        let mut node = Some(target);
        while let Some(current) = node {
            let (handler, parent) = {
                let doc = self.document.borrow();
                (doc.listener(current, &event.kind), doc.parent(current))
            };
            if let Some(handler) = handler {
                let current_target = self.node_object(current);
                self.interp
                    .set_property(&event_object, "currentTarget", current_target)?;
                self.interp.call(&handler, Value::Undefined, vec![event_object.clone()])?;
                if event_object.get("_stopped").is_truthy() {
                    break;
                }
            }
            if current == self.container {
                break;
            }
            node = parent;
        }
        Ok(event_object.get("defaultPrevented").is_truthy())
    }

    fn node_object(&self, node: NodeId) -> Value {
        let doc = self.document.borrow();
        let attr = |name: &str| doc.attribute(node, name).map_or(Value::Undefined, Value::string);
        Value::object_from([
            ("tagName", Value::string(doc.tag(node).unwrap_or_default().to_ascii_uppercase())),
            ("id", attr("id")),
            ("name", attr("name")),
            ("type", attr("type")),
            ("value", doc.attribute(node, "value").map_or(Value::string(""), Value::string)),
            ("checked", Value::Bool(doc.has_attribute(node, "checked"))),
        ])
    }

    fn event_object(&self, target: NodeId, event: &Event) -> Value {
        let target = self.node_object(target);
        let mut object = Object::new();
        object.insert("type".into(), Value::string(&event.kind));
        object.insert("target".into(), target.clone());
        object.insert("currentTarget".into(), target);
        object.insert("bubbles".into(), Value::Bool(true));
        object.insert("defaultPrevented".into(), Value::Bool(false));
        if let Some(key) = &event.key {
            object.insert("key".into(), Value::string(key));
        }
        object.insert(
            "preventDefault".into(),
            Value::native("preventDefault", |interp, this, _| {
                interp.set_property(&this, "defaultPrevented", Value::Bool(true))?;
                Ok(Value::Undefined)
            }),
        );
        object.insert(
            "stopPropagation".into(),
            Value::native("stopPropagation", |interp, this, _| {
                interp.set_property(&this, "_stopped", Value::Bool(true))?;
                Ok(Value::Undefined)
            }),
        );
        object.insert("persist".into(), Value::native("persist", |_, _, _| Ok(Value::Undefined)));
        Value::object(object)
    }
}

impl Drop for MountedTree {
    fn drop(&mut self) {
        self.interp.unmount_hooks();
        if self.lease.as_ref().is_some_and(|lease| !lease.is_current()) {
            debug!("container remounted since; leaving it as is");
            return;
        }
        let Ok(mut doc) = self.document.try_borrow_mut() else {
            warn!("document busy while unmounting; container left as is");
            return;
        };
        doc.clear_children(self.container);
        if self.mode == Mode::Shared {
            doc.remove_attribute(self.container, INERT_ATTRIBUTE);
            doc.remove_attribute(self.container, "style");
        }
        if let Some(style) = self.style.take() {
            doc.remove(style);
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Strategies
// ══════════════════════════════════════════════════════════════════════════════

/// Evaluates a compiled project and mounts its default export.
pub trait ExecutionStrategy {
    fn mode(&self) -> Mode;

    fn execute(&self, project: &CompiledProject, props: &PropBag) -> RenderOutcome;
}

/// A new scope per render, fully interactive.
#[derive(Debug, Clone, Default)]
pub struct IsolatedStrategy {
    pub config: RuntimeConfig,
}

impl ExecutionStrategy for IsolatedStrategy {
    fn mode(&self) -> Mode {
        Mode::Isolated
    }

    #[instrument(level = "debug", skip_all, fields(entry = %project.entry, mode = "isolated"))]
    fn execute(&self, project: &CompiledProject, props: &PropBag) -> RenderOutcome {
        let interp = Interpreter::new(self.config.clone());
        let mut document = Document::new();
        let container = document.create_element("div");
        document.set_attribute(container, "id", "root");
        let body = document.body();
        document.append_child(body, container);
        let scope = Scope {
            mode: Mode::Isolated,
            interp,
            document: Rc::new(RefCell::new(document)),
            container,
            style: None,
            lease: None,
        };
        scope.mount(project, props)
    }
}

/// The host page's scope, inert.
#[derive(Debug, Clone, Default)]
pub struct SharedStrategy {
    pub host: HostPage,
    pub config: RuntimeConfig,
}

impl ExecutionStrategy for SharedStrategy {
    fn mode(&self) -> Mode {
        Mode::Shared
    }

    #[instrument(level = "debug", skip_all, fields(entry = %project.entry, mode = "shared"))]
    fn execute(&self, project: &CompiledProject, props: &PropBag) -> RenderOutcome {
        let interp = Interpreter::with_globals(self.host.globals.clone(), self.config.clone());
        let container = self.host.container;
        let lease = self.host.lease();
        let style = {
            let mut doc = self.host.document.borrow_mut();
            doc.clear_children(container);
            doc.set_attribute(container, INERT_ATTRIBUTE, "");
            doc.set_attribute(container, "style", "pointer-events: none");
            let body = doc.body();
            match doc.query_selector(body, &format!("style[{STYLE_ATTRIBUTE}]")) {
                Some(style) => style,
                None => {
                    let style = doc.create_element("style");
                    doc.set_attribute(style, STYLE_ATTRIBUTE, "");
                    let css = doc.create_text(INERT_CSS);
                    doc.append_child(style, css);
                    doc.append_child(body, style);
                    style
                }
            }
        };
        let scope = Scope {
            mode: Mode::Shared,
            interp,
            document: Rc::clone(&self.host.document),
            container,
            style: Some(style),
            lease: Some(lease),
        };
        scope.mount(project, props)
    }
}

/// The strategy for `mode`. Shared mode uses `host`, or a fresh page.
pub fn strategy_for(mode: Mode, host: Option<&HostPage>, config: RuntimeConfig) -> Box<dyn ExecutionStrategy> {
    match mode {
        Mode::Isolated => Box::new(IsolatedStrategy { config }),
        Mode::Shared => Box::new(SharedStrategy {
            host: host.cloned().unwrap_or_default(),
            config,
        }),
    }
}

/// A scope prepared for one mount.
struct Scope {
    mode: Mode,
    interp: Interpreter,
    document: Rc<RefCell<Document>>,
    container: NodeId,
    style: Option<NodeId>,
    lease: Option<Lease>,
}

impl Scope {
    fn mount(mut self, project: &CompiledProject, props: &PropBag) -> RenderOutcome {
        let shims = ShimTable::new();
        shims.install_globals(self.interp.globals());
        let loader = Loader::new(project, shims);

        let result = boundary(|| {
            let exports = loader.require(&mut self.interp, &project.entry, true)?;
            let root = root_element(&project.entry, &exports, props)?;
            let mut doc = self.document.borrow_mut();
            render_root(&mut self.interp, &mut doc, self.container, &root)?;
            Ok(root)
        });

        let tree_parts = match result {
            Ok(root) => Ok(root),
            Err(err) => {
                let location = self.interp.take_fault();
                Err(err.into_render_error(location))
            }
        };
        let tree = MountedTree {
            mode: self.mode,
            interp: self.interp,
            document: self.document,
            container: self.container,
            root: tree_parts.as_ref().map_or(Value::Undefined, Value::clone),
            style: self.style,
            lease: self.lease,
            _loader: loader,
        };
        match tree_parts {
            Ok(_) => {
                debug!(html_len = tree.html().len(), "mounted");
                RenderOutcome::Ready(tree)
            }
            Err(error) => {
                warn!(%error, "render failed");
                let failure = project.failure(&error);
                // Unmounting empties the container and detaches listeners.
                drop(tree);
                RenderOutcome::Error(failure)
            }
        }
    }
}

/// The element to mount for the entry's exports.
fn root_element(entry: &str, exports: &Value, props: &PropBag) -> EvalResult<Value> {
    let injected: Object = props
        .merged()
        .iter()
        .map(|(key, value)| (key.clone(), Value::from_json(value)))
        .collect();
    match exports.get("default") {
        component if component.is_callable() => create_element(vec![component, Value::object(injected)]),
        Value::Element(element) => {
            let mut merged: Object = Object::new();
            for (key, value) in props.defaults.iter() {
                merged.insert(key.clone(), Value::from_json(value));
            }
            for (key, value) in crate::evaluator::own_entries(&element.props) {
                merged.insert(key, value);
            }
            for (key, value) in props.overrides.iter() {
                merged.insert(key.clone(), Value::from_json(value));
            }
            Ok(Value::element(element.ty.clone(), Value::object(merged), element.key.clone()))
        }
        Value::Undefined => Err(EvalError::type_error(format!(
            "{entry} has no default export to mount"
        ))),
        other => Err(EvalError::type_error(format!(
            "the default export of {entry} is not a component (found {})",
            other.type_of()
        ))),
    }
}

/// Run `f`, turning a panic into [`EvalError::Panic`].
fn boundary<T>(f: impl FnOnce() -> EvalResult<T>) -> EvalResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            Err(EvalError::Panic(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_compiler::{compile_project, CanvasConfig};
    use canvas_types::VirtualProject;
    use pretty_assertions::assert_eq;

    fn compile(source: &str) -> CompiledProject {
        compile_project(&VirtualProject::single("/App.tsx", source), &CanvasConfig::default()).unwrap()
    }

    #[test]
    fn test_prop_bag_overrides_win() {
        let bag = PropBag::new()
            .with_default("title", "a".into())
            .with_default("size", 1.into())
            .with_override("title", "b".into());
        let merged = bag.merged();
        assert_eq!(merged["title"], "b");
        assert_eq!(merged["size"], 1);
    }

    #[test]
    fn test_boundary_catches_panics() {
        let err = boundary::<()>(|| panic!("exploded")).unwrap_err();
        assert!(matches!(err, EvalError::Panic(ref m) if m == "exploded"));
    }

    #[test]
    fn test_non_component_default_export() {
        let project = compile("export default 42;");
        let outcome = IsolatedStrategy::default().execute(&project, &PropBag::new());
        let failure = outcome.failure().unwrap();
        assert!(failure.message.contains("not a component"), "{}", failure.message);
    }

    #[test]
    fn test_injected_props() {
        let project = compile("export default function App({ title, n }) { return <h1>{title}:{n}</h1>; }");
        let props = PropBag::new()
            .with_default("title", "Default".into())
            .with_default("n", 1.into())
            .with_override("n", 2.into());
        let outcome = IsolatedStrategy::default().execute(&project, &props);
        assert_eq!(outcome.tree().unwrap().html(), "<h1>Default:2</h1>");
    }

    #[test]
    fn test_shared_failure_leaves_container_empty() {
        let host = HostPage::new();
        let strategy = SharedStrategy {
            host: host.clone(),
            config: RuntimeConfig::default(),
        };
        let outcome = strategy.execute(&compile("export default function App() { throw new Error('nope'); }"), &PropBag::new());
        assert!(!outcome.is_ready());
        assert_eq!(host.body_html(), "<div id=\"canvas-root\"></div>");
    }
}
