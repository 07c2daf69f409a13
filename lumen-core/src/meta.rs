//! Out-of-band node metadata.
//!
//! State associated 1:1 with a node but never stored on the node itself:
//! tracked flag, the node's raw original markup (captured before any
//! substitution touched it), whether a directive currently shadows it, and
//! its local context overrides. The store is owned by the component and
//! cleared synchronously on the destroy path, entry by entry, so a removed
//! subtree leaves nothing behind.

use indexmap::IndexMap;
use lumen_dom::{NodeId, NodeRef};
use serde_json::Value;

use crate::context::Context;

#[derive(Debug, Default)]
pub struct NodeMeta {
    pub tracked: bool,
    /// Serialized markup at track time, pre-substitution. Repeat clones are
    /// rebuilt from this.
    pub source_markup: String,
    /// True while a directive-produced anchor occupies this node's DOM
    /// position; the node is detached but its track state is retained.
    pub shadowed: bool,
    pub local_context: Context,
}

#[derive(Debug, Default)]
pub struct MetaStore {
    entries: IndexMap<NodeId, NodeMeta>,
}

impl MetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeMeta> {
        self.entries.get(&id)
    }

    /// Entry for a node, created on first touch with its current markup
    /// captured as the raw original.
    pub fn ensure(&mut self, node: &NodeRef) -> &mut NodeMeta {
        self.entries.entry(node.id()).or_insert_with(|| NodeMeta {
            source_markup: node.outer_html(),
            ..NodeMeta::default()
        })
    }

    pub fn is_tracked(&self, id: NodeId) -> bool {
        self.get(id).map(|m| m.tracked).unwrap_or(false)
    }

    pub fn set_tracked(&mut self, node: &NodeRef) {
        self.ensure(node).tracked = true;
    }

    pub fn is_shadowed(&self, id: NodeId) -> bool {
        self.get(id).map(|m| m.shadowed).unwrap_or(false)
    }

    pub fn set_shadowed(&mut self, node: &NodeRef, shadowed: bool) {
        self.ensure(node).shadowed = shadowed;
    }

    pub fn source_markup(&mut self, node: &NodeRef) -> String {
        self.ensure(node).source_markup.clone()
    }

    pub fn set_context_value(&mut self, node: &NodeRef, key: &str, value: Value) {
        self.ensure(node)
            .local_context
            .insert(key.to_string(), value);
    }

    pub fn local_context(&self, id: NodeId) -> Option<&Context> {
        self.get(id).map(|m| &m.local_context)
    }

    pub fn clear(&mut self, id: NodeId) {
        self.entries.shift_remove(&id);
    }

    /// Destroy path: drop the node's entry and every descendant's.
    pub fn clear_subtree(&mut self, node: &NodeRef) {
        self.clear(node.id());
        for descendant in node.descendants() {
            self.clear(descendant.id());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
