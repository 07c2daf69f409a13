//! Context: a string-keyed value environment inherited deeply through the
//! node tree. A node's effective context is the shallow merge of its
//! ancestors' local overrides (root first) with its own, recomputed on
//! every read and never cached, so an ancestor update is immediately
//! visible below without a push phase.

use indexmap::IndexMap;
use lumen_dom::NodeRef;
use serde_json::Value;

use crate::meta::MetaStore;

pub type Context = IndexMap<String, Value>;

/// Shallow merge: `overrides` wins.
pub fn merge(base: &Context, overrides: &Context) -> Context {
    let mut out = base.clone();
    for (key, value) in overrides {
        out.insert(key.clone(), value.clone());
    }
    out
}

/// Effective context of a node: ancestor chain walked root-first, each
/// node's local overrides merged over the accumulated result.
pub fn effective_context(node: &NodeRef, meta: &MetaStore) -> Context {
    let mut chain = vec![node.clone()];
    let mut cursor = node.parent();
    while let Some(parent) = cursor {
        cursor = parent.parent();
        chain.push(parent);
    }

    let mut out = Context::new();
    for link in chain.iter().rev() {
        if let Some(entry) = meta.get(link.id()) {
            out = merge(&out, &entry.local_context);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ancestor_overrides_merge_root_first() {
        let parent = NodeRef::element("div");
        let child = NodeRef::element("span");
        parent.append_child(&child);

        let mut meta = MetaStore::new();
        meta.set_context_value(&parent, "a", json!(1));
        meta.set_context_value(&parent, "b", json!(1));
        meta.set_context_value(&child, "b", json!(2));

        let ctx = effective_context(&child, &meta);
        assert_eq!(ctx.get("a"), Some(&json!(1)));
        assert_eq!(ctx.get("b"), Some(&json!(2)));
    }

    #[test]
    fn recomputed_on_read() {
        let parent = NodeRef::element("div");
        let child = NodeRef::element("span");
        parent.append_child(&child);

        let mut meta = MetaStore::new();
        meta.set_context_value(&parent, "x", json!("old"));
        assert_eq!(
            effective_context(&child, &meta).get("x"),
            Some(&json!("old"))
        );
        meta.set_context_value(&parent, "x", json!("new"));
        assert_eq!(
            effective_context(&child, &meta).get("x"),
            Some(&json!("new"))
        );
    }
}
