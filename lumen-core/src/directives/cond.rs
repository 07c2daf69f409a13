//! `if` — conditional rendering.

use lumen_dom::NodeRef;
use lumen_expr::truthy;
use serde_json::Value;

use crate::error::DirectiveError;

use super::{Directive, DirectiveScope, RenderOutput};

pub struct IfDirective;

impl Directive for IfDirective {
    fn name(&self) -> &'static str {
        "if"
    }

    /// Passthrough: the raw value is the condition expression.
    fn parse_value(&self, raw: &str, _prop: Option<&str>) -> Result<Value, DirectiveError> {
        Ok(Value::String(raw.to_string()))
    }

    fn render(
        &self,
        payload: &Value,
        _node: &NodeRef,
        scope: &mut DirectiveScope<'_>,
    ) -> Result<RenderOutput, DirectiveError> {
        let raw = payload.as_str().unwrap_or_default();
        let condition = scope.evaluate(raw)?;
        if truthy(&condition) {
            Ok(RenderOutput::Keep)
        } else {
            Ok(RenderOutput::Suppress)
        }
    }
}
