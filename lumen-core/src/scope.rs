//! Name resolution for expression evaluation during rendering.
//!
//! Lookup order: the node's effective context (repeat aliases and other
//! local overrides), then the component context chain, then the component's
//! live properties.

use indexmap::IndexMap;
use lumen_expr::Scope;
use serde_json::Value;

use crate::context::Context;

pub struct RenderScope<'a> {
    pub node_context: Context,
    pub component_context: &'a Context,
    pub props: &'a IndexMap<String, Value>,
}

impl Scope for RenderScope<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.node_context
            .get(name)
            .or_else(|| self.component_context.get(name))
            .or_else(|| self.props.get(name))
            .cloned()
    }
}
