//! A virtual DOM document: an arena of element and text nodes with
//! attributes, event listeners, HTML serialization and simple selector
//! queries.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Handle to a node of one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

#[derive(Debug)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
        listeners: BTreeMap<String, Value>,
    },
    Text(String),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Structural form of a subtree, for comparisons and JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomSnapshot {
    Element {
        tag: String,
        #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
        attrs: BTreeMap<String, String>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        children: Vec<DomSnapshot>,
    },
    Text {
        text: String,
    },
}

/// An arena of nodes. Removed nodes leave a hole; ids are never reused.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    body: NodeId,
}

impl Document {
    /// A document with an empty `<body>`.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            body: NodeId(0),
        };
        doc.body = doc.create_element("body");
        doc
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Some(Node {
            kind,
            parent: None,
            children: Vec::new(),
        }));
        NodeId(self.nodes.len() - 1)
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(NodeKind::Element {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            listeners: BTreeMap::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.insert(NodeKind::Text(text.to_string()))
    }

    /// Whether `id` still names a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old) = self.parent(child) {
            if let Some(node) = self.node_mut(old) {
                node.children.retain(|c| *c != child);
            }
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    /// Detach and free `id` with its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            if let Some(node) = self.node_mut(parent) {
                node.children.retain(|c| *c != id);
            }
        }
        self.free(id);
    }

    fn free(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        for child in node.children {
            self.free(child);
        }
    }

    /// Remove every child of `id`, listeners included.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        for child in children {
            self.free(child);
        }
        if let Some(node) = self.node_mut(id) {
            node.children.clear();
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Attributes and listeners
    // ══════════════════════════════════════════════════════════════════════

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(Node {
            kind: NodeKind::Element { attrs, .. },
            ..
        }) = self.node_mut(id)
        {
            attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(Node {
            kind: NodeKind::Element { attrs, .. },
            ..
        }) = self.node_mut(id)
        {
            attrs.remove(name);
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn add_listener(&mut self, id: NodeId, event: &str, handler: Value) {
        if let Some(Node {
            kind: NodeKind::Element { listeners, .. },
            ..
        }) = self.node_mut(id)
        {
            listeners.insert(event.to_string(), handler);
        }
    }

    pub fn listener(&self, id: NodeId, event: &str) -> Option<Value> {
        match self.kind(id)? {
            NodeKind::Element { listeners, .. } => listeners.get(event).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    /// Number of listeners attached anywhere under `id`, itself included.
    pub fn listener_count(&self, id: NodeId) -> usize {
        let own = match self.kind(id) {
            Some(NodeKind::Element { listeners, .. }) => listeners.len(),
            _ => 0,
        };
        own + self
            .children(id)
            .iter()
            .map(|c| self.listener_count(*c))
            .sum::<usize>()
    }

    // ══════════════════════════════════════════════════════════════════════
    // Reading
    // ══════════════════════════════════════════════════════════════════════

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::Element { .. }) => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_html(*child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => out.push_str(&escape_text(text)),
            Some(NodeKind::Element { tag, attrs, .. }) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    if value.is_empty() {
                        let _ = write!(out, " {name}");
                    } else {
                        let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in self.children(id) {
                    self.write_html(*child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
            None => {}
        }
    }

    pub fn snapshot(&self, id: NodeId) -> Option<DomSnapshot> {
        Some(match self.kind(id)? {
            NodeKind::Text(text) => DomSnapshot::Text { text: text.clone() },
            NodeKind::Element { tag, attrs, .. } => DomSnapshot::Element {
                tag: tag.clone(),
                attrs: attrs.clone(),
                children: self
                    .children(id)
                    .iter()
                    .filter_map(|c| self.snapshot(*c))
                    .collect(),
            },
        })
    }

    // ══════════════════════════════════════════════════════════════════════
    // Queries
    // ══════════════════════════════════════════════════════════════════════

    /// First element under `root` (excluding `root`) matching `selector`,
    /// in document order.
    pub fn query_selector(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        self.query_selector_all(root, selector).into_iter().next()
    }

    /// Every element under `root` matching `selector`. Selectors are one
    /// compound (`tag#id.class[attr][attr=value]`) or several joined by `,`.
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let compounds: Vec<Compound> = selector.split(',').filter_map(Compound::parse).collect();
        let mut out = Vec::new();
        self.walk(root, &mut |id| {
            if compounds.iter().any(|c| c.matches(self, id)) {
                out.push(id);
            }
        });
        out
    }

    /// First element under `root` whose own text children equal `text`
    /// after trimming.
    pub fn find_by_text(&self, root: NodeId, text: &str) -> Option<NodeId> {
        let mut found = None;
        self.walk(root, &mut |id| {
            if found.is_some() {
                return;
            }
            let own: String = self
                .children(id)
                .iter()
                .filter_map(|c| match self.kind(*c) {
                    Some(NodeKind::Text(t)) => Some(t.as_str()),
                    _ => None,
                })
                .collect();
            if own.trim() == text {
                found = Some(id);
            }
        });
        found
    }

    fn walk(&self, root: NodeId, visit: &mut dyn FnMut(NodeId)) {
        for child in self.children(root) {
            if matches!(self.kind(*child), Some(NodeKind::Element { .. })) {
                visit(*child);
                self.walk(*child, visit);
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// One compound selector.
#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Compound {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let mut compound = Compound::default();
        let mut rest = text;
        let tag_end = rest.find(['#', '.', '[']).unwrap_or(rest.len());
        if tag_end > 0 && &rest[..tag_end] != "*" {
            compound.tag = Some(rest[..tag_end].to_ascii_lowercase());
        }
        rest = &rest[tag_end..];
        while let Some(marker) = rest.chars().next() {
            rest = &rest[1..];
            match marker {
                '[' => {
                    let end = rest.find(']')?;
                    let inner = &rest[..end];
                    rest = &rest[end + 1..];
                    match inner.split_once('=') {
                        Some((name, value)) => compound.attrs.push((
                            name.trim().to_string(),
                            Some(value.trim().trim_matches(['"', '\'']).to_string()),
                        )),
                        None => compound.attrs.push((inner.trim().to_string(), None)),
                    }
                }
                '#' | '.' => {
                    let end = rest.find(['#', '.', '[']).unwrap_or(rest.len());
                    let name = rest[..end].to_string();
                    rest = &rest[end..];
                    if marker == '#' {
                        compound.id = Some(name);
                    } else {
                        compound.classes.push(name);
                    }
                }
                _ => return None,
            }
        }
        Some(compound)
    }

    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(tag) = doc.tag(id) else {
            return false;
        };
        if self.tag.as_deref().is_some_and(|t| t != tag) {
            return false;
        }
        if self.id.as_deref().is_some_and(|want| doc.attribute(id, "id") != Some(want)) {
            return false;
        }
        let classes: Vec<&str> = doc
            .attribute(id, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default();
        if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
            return false;
        }
        self.attrs.iter().all(|(name, value)| match value {
            Some(value) => doc.attribute(id, name) == Some(value.as_str()),
            None => doc.has_attribute(id, name),
        })
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let div = doc.create_element("div");
        doc.set_attribute(div, "class", "card wide");
        doc.set_attribute(div, "id", "main");
        let button = doc.create_element("button");
        doc.set_attribute(button, "type", "button");
        doc.set_attribute(button, "disabled", "");
        let label = doc.create_text("Save & close");
        let br = doc.create_element("br");
        doc.append_child(body, div);
        doc.append_child(div, button);
        doc.append_child(button, label);
        doc.append_child(div, br);
        (doc, div)
    }

    #[test]
    fn test_serialization() {
        let (doc, _) = sample();
        assert_eq!(
            doc.inner_html(doc.body()),
            "<div class=\"card wide\" id=\"main\"><button disabled type=\"button\">Save &amp; close</button><br></div>"
        );
        assert_eq!(doc.text_content(doc.body()), "Save & close");
    }

    #[test]
    fn test_queries() {
        let (doc, div) = sample();
        let body = doc.body();
        assert_eq!(doc.query_selector(body, "div.card#main"), Some(div));
        assert_eq!(doc.query_selector(body, ".wide"), Some(div));
        assert!(doc.query_selector(body, ".missing").is_none());
        assert!(doc.query_selector(body, "button[disabled]").is_some());
        assert!(doc.query_selector(body, "button[type=\"button\"]").is_some());
        assert_eq!(doc.query_selector_all(body, "br, button").len(), 2);
        assert_eq!(doc.tag(doc.find_by_text(body, "Save & close").unwrap()), Some("button"));
    }

    #[test]
    fn test_clear_children_frees_subtree() {
        let (mut doc, div) = sample();
        let button = doc.children(div)[0];
        doc.add_listener(button, "click", Value::Null);
        assert_eq!(doc.listener_count(doc.body()), 1);
        let body = doc.body();
        doc.clear_children(body);
        assert!(!doc.contains(div));
        assert!(!doc.contains(button));
        assert_eq!(doc.listener_count(body), 0);
        assert_eq!(doc.inner_html(body), "");
    }

    #[test]
    fn test_snapshot_serializes() {
        let (doc, div) = sample();
        let snapshot = doc.snapshot(div).unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["tag"], "div");
        assert_eq!(json["children"][0]["children"][0]["text"], "Save & close");
    }
}
