//! `ref` — expose a node under a name.

use lumen_dom::NodeRef;
use serde_json::Value;

use crate::error::DirectiveError;

use super::{Directive, DirectiveScope, RenderOutput};

pub struct RefDirective;

fn is_valid_ref_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl Directive for RefDirective {
    fn name(&self) -> &'static str {
        "ref"
    }

    fn parse_value(&self, raw: &str, _prop: Option<&str>) -> Result<Value, DirectiveError> {
        Ok(Value::String(raw.trim().to_string()))
    }

    fn render(
        &self,
        payload: &Value,
        node: &NodeRef,
        scope: &mut DirectiveScope<'_>,
    ) -> Result<RenderOutput, DirectiveError> {
        let name = payload.as_str().unwrap_or_default();
        if !is_valid_ref_name(name) {
            return Err(DirectiveError::InvalidRefName(name.to_string()));
        }
        scope.set_ref(name, node.clone());
        Ok(RenderOutput::Keep)
    }
}
