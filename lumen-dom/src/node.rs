//! Live node tree.
//!
//! `NodeRef` is a cheap handle to a shared, mutable node. The tree is the
//! render target of the whole framework: the parser builds it, directives
//! splice it, and the reconciliation engine rewrites small parts of it in
//! place. Identity matters more than structure here — two handles are equal
//! when they point at the same node, and every node carries a process-unique
//! id so out-of-band side tables can key on it without holding the node
//! alive.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

pub type NodeId = u64;

thread_local! {
    static NEXT_NODE_ID: Cell<NodeId> = const { Cell::new(1) };
}

fn next_node_id() -> NodeId {
    NEXT_NODE_ID.with(|c| {
        let id = c.get();
        c.set(id + 1);
        id
    })
}

/// A structured property assignment produced by the parser's marker-attribute
/// syntax (`:name.sub="value"`). Stored on the element instance, never as a
/// serialized DOM attribute, so directive arguments escape HTML-attribute
/// quoting constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct PropAssignment {
    pub value: String,
    pub prop: Option<String>,
}

/// An attribute snapshot: `value` is `None` when the attribute was written
/// without `=` (distinct from `Some("")` for `attr=""`).
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug)]
pub enum NodeKind {
    Fragment,
    Element {
        tag: String,
        attrs: IndexMap<String, Option<String>>,
        props: IndexMap<String, PropAssignment>,
    },
    Text(String),
    Comment(String),
}

struct NodeData {
    id: NodeId,
    kind: NodeKind,
    parent: Option<Weak<RefCell<NodeData>>>,
    children: Vec<NodeRef>,
}

#[derive(Clone)]
pub struct NodeRef(Rc<RefCell<NodeData>>);

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NodeRef {}

impl Hash for NodeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        match &data.kind {
            NodeKind::Fragment => write!(f, "Fragment#{}", data.id),
            NodeKind::Element { tag, .. } => write!(f, "<{tag}>#{}", data.id),
            NodeKind::Text(t) => write!(f, "Text({t:?})#{}", data.id),
            NodeKind::Comment(c) => write!(f, "Comment({c:?})#{}", data.id),
        }
    }
}

impl NodeRef {
    fn new(kind: NodeKind) -> Self {
        NodeRef(Rc::new(RefCell::new(NodeData {
            id: next_node_id(),
            kind,
            parent: None,
            children: Vec::new(),
        })))
    }

    pub fn fragment() -> Self {
        Self::new(NodeKind::Fragment)
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::new(NodeKind::Element {
            tag: tag.into().to_ascii_lowercase(),
            attrs: IndexMap::new(),
            props: IndexMap::new(),
        })
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(NodeKind::Text(value.into()))
    }

    pub fn comment(value: impl Into<String>) -> Self {
        Self::new(NodeKind::Comment(value.into()))
    }

    pub fn id(&self) -> NodeId {
        self.0.borrow().id
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Fragment)
    }

    pub fn is_element(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Text(_))
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Comment(_))
    }

    /// Element tag name (lowercase), `None` for non-elements.
    pub fn tag(&self) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    // --- tree structure ---

    pub fn parent(&self) -> Option<NodeRef> {
        self.0
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(NodeRef)
    }

    pub fn children(&self) -> Vec<NodeRef> {
        self.0.borrow().children.clone()
    }

    pub fn first_child(&self) -> Option<NodeRef> {
        self.0.borrow().children.first().cloned()
    }

    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    /// Position of `child` in this node's child list.
    pub fn index_of(&self, child: &NodeRef) -> Option<usize> {
        self.0.borrow().children.iter().position(|c| c == child)
    }

    /// Detach from the current parent, then append as the last child.
    pub fn append_child(&self, child: &NodeRef) {
        child.detach();
        child.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
        self.0.borrow_mut().children.push(child.clone());
    }

    /// Insert `new_child` into this node's child list directly before
    /// `reference`. Appends when `reference` is not a child.
    pub fn insert_before(&self, new_child: &NodeRef, reference: &NodeRef) {
        match self.index_of(reference) {
            Some(idx) => {
                new_child.detach();
                new_child.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
                self.0.borrow_mut().children.insert(idx, new_child.clone());
            }
            None => self.append_child(new_child),
        }
    }

    /// Insert `new_child` directly after `reference`.
    pub fn insert_after(&self, new_child: &NodeRef, reference: &NodeRef) {
        match self.index_of(reference) {
            Some(idx) => {
                new_child.detach();
                new_child.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
                self.0
                    .borrow_mut()
                    .children
                    .insert(idx + 1, new_child.clone());
            }
            None => self.append_child(new_child),
        }
    }

    /// Remove this node from its parent's child list. No-op when detached.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            let mut data = parent.0.borrow_mut();
            data.children.retain(|c| c != self);
        }
        self.0.borrow_mut().parent = None;
    }

    /// True when `other` is this node or one of its descendants.
    pub fn contains(&self, other: &NodeRef) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(node) = cursor {
            if &node == self {
                return true;
            }
            cursor = node.parent();
        }
        false
    }

    /// All descendants in document (preorder) order, excluding this node.
    pub fn descendants(&self) -> Vec<NodeRef> {
        let mut out = Vec::new();
        fn walk(node: &NodeRef, out: &mut Vec<NodeRef>) {
            for child in node.children() {
                out.push(child.clone());
                walk(&child, out);
            }
        }
        walk(self, &mut out);
        out
    }

    // --- attributes ---

    /// `None` when the attribute is absent; `Some(None)` when present with
    /// no value; `Some(Some(v))` otherwise.
    pub fn get_attribute(&self, name: &str) -> Option<Option<String>> {
        match &self.0.borrow().kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).cloned(),
            _ => None,
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        match &self.0.borrow().kind {
            NodeKind::Element { attrs, .. } => attrs.contains_key(name),
            _ => false,
        }
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.set_attribute_value(name, Some(value.into()));
    }

    pub fn set_attribute_value(&self, name: impl Into<String>, value: Option<String>) {
        if let NodeKind::Element { attrs, .. } = &mut self.0.borrow_mut().kind {
            attrs.insert(name.into(), value);
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.0.borrow_mut().kind {
            attrs.shift_remove(name);
        }
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        match &self.0.borrow().kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .map(|(name, value)| Attribute {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    // --- structured props ---

    pub fn get_prop(&self, name: &str) -> Option<PropAssignment> {
        match &self.0.borrow().kind {
            NodeKind::Element { props, .. } => props.get(name).cloned(),
            _ => None,
        }
    }

    pub fn set_prop(&self, name: impl Into<String>, assignment: PropAssignment) {
        if let NodeKind::Element { props, .. } = &mut self.0.borrow_mut().kind {
            props.insert(name.into(), assignment);
        }
    }

    pub fn remove_prop(&self, name: &str) {
        if let NodeKind::Element { props, .. } = &mut self.0.borrow_mut().kind {
            props.shift_remove(name);
        }
    }

    pub fn props(&self) -> Vec<(String, PropAssignment)> {
        match &self.0.borrow().kind {
            NodeKind::Element { props, .. } => props
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    // --- node value / text content ---

    /// Payload of a text or comment node.
    pub fn node_value(&self) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Text(t) | NodeKind::Comment(t) => Some(t.clone()),
            _ => None,
        }
    }

    pub fn set_node_value(&self, value: impl Into<String>) {
        match &mut self.0.borrow_mut().kind {
            NodeKind::Text(t) | NodeKind::Comment(t) => *t = value.into(),
            _ => {}
        }
    }

    /// Concatenated text of this node and all descendants.
    pub fn text_content(&self) -> String {
        match &self.0.borrow().kind {
            NodeKind::Text(t) => t.clone(),
            NodeKind::Comment(_) => String::new(),
            _ => {
                let mut out = String::new();
                for child in &self.0.borrow().children {
                    out.push_str(&child.text_content());
                }
                out
            }
        }
    }

    /// Replace all children with a single text node (elements/fragments) or
    /// rewrite the payload (text nodes).
    pub fn set_text_content(&self, value: impl Into<String>) {
        let value = value.into();
        if self.is_text() {
            self.set_node_value(value);
            return;
        }
        if self.is_comment() {
            return;
        }
        for child in self.children() {
            child.detach();
        }
        self.append_child(&NodeRef::text(value));
    }

    // --- cloning ---

    /// Structural copy with fresh node ids and no parent. Attributes and
    /// structured props are copied; children recursively.
    pub fn deep_clone(&self) -> NodeRef {
        let kind = match &self.0.borrow().kind {
            NodeKind::Fragment => NodeKind::Fragment,
            NodeKind::Element { tag, attrs, props } => NodeKind::Element {
                tag: tag.clone(),
                attrs: attrs.clone(),
                props: props.clone(),
            },
            NodeKind::Text(t) => NodeKind::Text(t.clone()),
            NodeKind::Comment(c) => NodeKind::Comment(c.clone()),
        };
        let clone = NodeRef::new(kind);
        for child in self.children() {
            clone.append_child(&child.deep_clone());
        }
        clone
    }

    // --- class list ---

    pub fn classes(&self) -> Vec<String> {
        self.get_attribute("class")
            .flatten()
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, token: &str) -> bool {
        self.classes().iter().any(|c| c == token)
    }

    pub fn add_class(&self, token: &str) {
        if token.is_empty() || self.has_class(token) {
            return;
        }
        let mut classes = self.classes();
        classes.push(token.to_string());
        self.set_attribute("class", classes.join(" "));
    }

    pub fn remove_class(&self, token: &str) {
        let classes: Vec<String> = self.classes().into_iter().filter(|c| c != token).collect();
        if classes.is_empty() {
            self.remove_attribute("class");
        } else {
            self.set_attribute("class", classes.join(" "));
        }
    }

    // --- inline style ---

    pub fn style_declarations(&self) -> Vec<(String, String)> {
        self.get_attribute("style")
            .flatten()
            .map(|v| parse_style_declarations(&v))
            .unwrap_or_default()
    }

    fn write_style(&self, decls: &[(String, String)]) {
        if decls.is_empty() {
            self.remove_attribute("style");
        } else {
            let text = decls
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join("; ");
            self.set_attribute("style", text);
        }
    }

    pub fn get_style_property(&self, name: &str) -> Option<String> {
        self.style_declarations()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn set_style_property(&self, name: &str, value: &str) {
        let mut decls = self.style_declarations();
        match decls.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => decls.push((name.to_string(), value.to_string())),
        }
        self.write_style(&decls);
    }

    pub fn remove_style_property(&self, name: &str) {
        let decls: Vec<(String, String)> = self
            .style_declarations()
            .into_iter()
            .filter(|(k, _)| k != name)
            .collect();
        self.write_style(&decls);
    }

    // --- data attributes ---

    pub fn set_data_attribute(&self, name: &str, value: &str) {
        self.set_attribute(format!("data-{}", kebab_case(name)), value);
    }

    pub fn remove_data_attribute(&self, name: &str) {
        self.remove_attribute(&format!("data-{}", kebab_case(name)));
    }

    pub fn get_data_attribute(&self, name: &str) -> Option<String> {
        self.get_attribute(&format!("data-{}", kebab_case(name)))
            .flatten()
    }
}

/// Split an inline-style string (`name: value; name: value`) into ordered
/// declarations. Empty names/values are dropped.
pub fn parse_style_declarations(input: &str) -> Vec<(String, String)> {
    input
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                None
            } else {
                Some((name.to_string(), value.to_string()))
            }
        })
        .collect()
}

/// camelCase → kebab-case for data-attribute names.
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
