//! Directive protocol.
//!
//! A directive transforms a node's rendered output based on an attribute's
//! value: `parse_value` turns the raw attribute text into a typed payload
//! (JSON-shaped, mirroring the tuple returns of the protocol), `render`
//! evaluates it against the node and decides what actually appears in the
//! DOM. Directives share per-node state through the scope's context
//! accessors, not through return values.
//!
//! The registry is an explicit name → handler map built once at startup and
//! passed to the engine; there is no ambient global registration.

mod attr;
mod cond;
mod reference;
mod repeat;

pub use attr::AttrDirective;
pub use cond::IfDirective;
pub use reference::RefDirective;
pub use repeat::RepeatDirective;

use std::rc::Rc;

use indexmap::IndexMap;
use lumen_dom::NodeRef;
use lumen_expr::ExprError;
use serde_json::Value;

use crate::context::{Context, effective_context};
use crate::error::DirectiveError;
use crate::meta::MetaStore;
use crate::scope::RenderScope;

/// What a directive decided for the node this cycle.
#[derive(Debug)]
pub enum RenderOutput {
    /// The original node stays the active render target; evaluation
    /// continues with the next directive.
    Keep,
    /// The node is removed from the DOM and replaced by a placeholder
    /// comment; later directives do not run.
    Suppress,
    /// The node is replaced by an ordered (possibly empty) list of nodes;
    /// later directives are skipped.
    Fragment(Vec<NodeRef>),
}

pub trait Directive {
    fn name(&self) -> &'static str;

    /// Transform the raw attribute text (plus the attribute's sub-property
    /// path, when the directive was written as `name.prop`) into a payload.
    fn parse_value(&self, raw: &str, prop: Option<&str>) -> Result<Value, DirectiveError>;

    fn render(
        &self,
        payload: &Value,
        node: &NodeRef,
        scope: &mut DirectiveScope<'_>,
    ) -> Result<RenderOutput, DirectiveError>;
}

/// The capability set directives render against: expression evaluation in
/// the node's scope, ref registration, shared per-node context, and the
/// previous anchor's clone list for reuse.
pub struct DirectiveScope<'a> {
    pub(crate) node: &'a NodeRef,
    pub(crate) meta: &'a mut MetaStore,
    pub(crate) refs: &'a mut IndexMap<String, NodeRef>,
    pub(crate) props: &'a IndexMap<String, Value>,
    pub(crate) component_context: &'a Context,
    pub(crate) prev_clones: Vec<NodeRef>,
}

impl DirectiveScope<'_> {
    /// Evaluate a raw value (bare expression or brace snippets) in the
    /// node's scope.
    pub fn evaluate(&self, raw: &str) -> Result<Value, ExprError> {
        let scope = RenderScope {
            node_context: effective_context(self.node, self.meta),
            component_context: self.component_context,
            props: self.props,
        };
        lumen_expr::evaluate(raw, &scope)
    }

    pub fn set_ref(&mut self, name: &str, node: NodeRef) {
        self.refs.insert(name.to_string(), node);
    }

    pub fn get_context(&self, key: &str) -> Option<Value> {
        effective_context(self.node, self.meta).get(key).cloned()
    }

    pub fn set_context(&mut self, key: &str, value: Value) {
        self.meta.set_context_value(self.node, key, value);
    }

    /// Context override on another node (a repeat clone).
    pub fn set_node_context(&mut self, node: &NodeRef, key: &str, value: Value) {
        self.meta.set_context_value(node, key, value);
    }

    /// Clones produced by the previous render of this node, in order.
    pub fn prev_clones(&self) -> &[NodeRef] {
        &self.prev_clones
    }

    /// The node's raw original markup, captured at track time.
    pub fn source_markup(&mut self) -> String {
        self.meta.source_markup(self.node)
    }
}

#[derive(Default)]
pub struct DirectiveRegistry {
    handlers: IndexMap<String, Rc<dyn Directive>>,
}

impl DirectiveRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in set: if, repeat, ref, attr.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Rc::new(IfDirective));
        registry.register(Rc::new(RepeatDirective));
        registry.register(Rc::new(RefDirective));
        registry.register(Rc::new(AttrDirective));
        registry
    }

    pub fn register(&mut self, handler: Rc<dyn Directive>) {
        self.handlers.insert(handler.name().to_string(), handler);
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Directive>> {
        self.handlers.get(name).cloned()
    }

    /// Split an attribute name into `(directive, prop)` when its head names
    /// a registered directive: `attr.class.active` → `("attr",
    /// Some("class.active"))`, `if` → `("if", None)`.
    pub fn match_attribute(&self, attr_name: &str) -> Option<(String, Option<String>)> {
        let (head, prop) = match attr_name.split_once('.') {
            Some((head, rest)) => (head, Some(rest.to_string())),
            None => (attr_name, None),
        };
        if self.handlers.contains_key(head) {
            Some((head.to_string(), prop))
        } else {
            None
        }
    }
}
