//! `repeat` — clone a node once per item of a collection.
//!
//! Syntax: `repeat="<expr>[ as alias][;[<keyExpr>] as keyAlias]"`.
//! An integer count repeats with key = index, item = index + 1; any other
//! value coerces to ordered `[key, value]` pairs. Clones at an index that
//! already existed last cycle are reused with only their context updated,
//! so unchanged indices keep stable DOM nodes.

use lumen_dom::NodeRef;
use lumen_markup::parse_markup;
use serde_json::{Value, json};

use crate::error::DirectiveError;

use super::{Directive, DirectiveScope, RenderOutput};

pub const DEFAULT_ITEM_ALIAS: &str = "$item";
pub const DEFAULT_KEY_ALIAS: &str = "$key";

pub struct RepeatDirective;

/// `"<expr> as x"` → `("<expr>", Some("x"))`.
fn split_alias(part: &str) -> (String, Option<String>) {
    match part.rsplit_once(" as ") {
        Some((expr, alias)) => (expr.trim().to_string(), Some(alias.trim().to_string())),
        None => (part.trim().to_string(), None),
    }
}

/// Coerce the evaluated data into ordered `[key, value]` pairs.
fn pairs_of(data: &Value) -> Vec<(Value, Value)> {
    match data {
        Value::Number(n) => {
            // Integer count: key = index, value = index + 1.
            let count = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0);
            (0..count.max(0))
                .map(|i| (json!(i), json!(i + 1)))
                .collect()
        }
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (json!(i.to_string()), item.clone()))
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (json!(k), v.clone()))
            .collect(),
        Value::String(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (json!(i.to_string()), json!(c.to_string())))
            .collect(),
        _ => Vec::new(),
    }
}

impl Directive for RepeatDirective {
    fn name(&self) -> &'static str {
        "repeat"
    }

    /// → `[expression, itemAlias, keyAlias]`.
    fn parse_value(&self, raw: &str, _prop: Option<&str>) -> Result<Value, DirectiveError> {
        let (item_part, key_part) = match raw.split_once(';') {
            Some((item, key)) => (item, Some(key)),
            None => (raw, None),
        };
        let (expr, item_alias) = split_alias(item_part);
        let key_alias = key_part
            .map(|part| split_alias(part).1.unwrap_or_default())
            .filter(|alias| !alias.is_empty());
        Ok(json!([
            expr,
            item_alias.unwrap_or_else(|| DEFAULT_ITEM_ALIAS.to_string()),
            key_alias.unwrap_or_else(|| DEFAULT_KEY_ALIAS.to_string()),
        ]))
    }

    fn render(
        &self,
        payload: &Value,
        _node: &NodeRef,
        scope: &mut DirectiveScope<'_>,
    ) -> Result<RenderOutput, DirectiveError> {
        let expr = payload[0].as_str().unwrap_or_default();
        let item_alias = payload[1].as_str().unwrap_or(DEFAULT_ITEM_ALIAS).to_string();
        let key_alias = payload[2].as_str().unwrap_or(DEFAULT_KEY_ALIAS).to_string();

        let data = scope.evaluate(expr)?;
        let pairs = pairs_of(&data);
        let prev = scope.prev_clones().to_vec();

        let mut nodes = Vec::with_capacity(pairs.len());
        for (index, (key, item)) in pairs.into_iter().enumerate() {
            let clone = match prev.get(index) {
                Some(existing) => existing.clone(),
                None => spawn_clone(scope)?,
            };
            scope.set_node_context(&clone, &key_alias, key);
            scope.set_node_context(&clone, &item_alias, item);
            nodes.push(clone);
        }
        Ok(RenderOutput::Fragment(nodes))
    }
}

/// Rebuild one clone from the bound node's raw original markup, stripping
/// its own `repeat` and `if` bindings so the clone does not re-trigger the
/// same directives.
fn spawn_clone(scope: &mut DirectiveScope<'_>) -> Result<NodeRef, DirectiveError> {
    let markup = scope.source_markup();
    let fragment = parse_markup(&markup);
    let clone = fragment
        .children()
        .into_iter()
        .find(NodeRef::is_element)
        .ok_or_else(|| {
            DirectiveError::Other(format!("repeat source is not an element: `{markup}`"))
        })?;
    clone.detach();
    for name in ["repeat", "if"] {
        clone.remove_attribute(name);
        clone.remove_prop(name);
    }
    Ok(clone)
}
