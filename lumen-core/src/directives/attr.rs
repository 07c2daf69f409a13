//! `attr` — toggle attributes, class tokens, inline style, and data
//! attributes.
//!
//! Written as `attr.<name>[.<sub>]="<literal>,<boolFlag>"`: the value splits
//! on its last comma into a flag expression (after) and a literal fallback
//! (before); the flag decides whether the target is set or removed.

use lumen_dom::{NodeRef, is_boolean_attribute, parse_style_declarations};
use lumen_expr::truthy;
use serde_json::{Value, json};

use crate::error::DirectiveError;

use super::{Directive, DirectiveScope, RenderOutput};

pub struct AttrDirective;

impl Directive for AttrDirective {
    fn name(&self) -> &'static str {
        "attr"
    }

    /// → `[attrName, subProperty, flag, literal]`.
    fn parse_value(&self, raw: &str, prop: Option<&str>) -> Result<Value, DirectiveError> {
        let prop = prop.ok_or_else(|| {
            DirectiveError::Other("attr directive needs a target, e.g. attr.class".to_string())
        })?;
        let (attr_name, sub) = match prop.split_once('.') {
            Some((name, sub)) => (name, Some(sub)),
            None => (prop, None),
        };
        let (literal, flag) = match raw.rsplit_once(',') {
            Some((literal, flag)) => (literal.trim(), flag.trim()),
            None => ("", raw.trim()),
        };
        Ok(json!([attr_name, sub, flag, literal]))
    }

    fn render(
        &self,
        payload: &Value,
        node: &NodeRef,
        scope: &mut DirectiveScope<'_>,
    ) -> Result<RenderOutput, DirectiveError> {
        let attr_name = payload[0].as_str().unwrap_or_default();
        let sub = payload[1].as_str();
        let flag_expr = payload[2].as_str().unwrap_or_default();
        let literal = payload[3].as_str().unwrap_or_default();

        let on = truthy(&scope.evaluate(flag_expr)?);

        match (attr_name, sub) {
            ("style", Some(property)) => {
                if on {
                    node.set_style_property(property, literal);
                } else {
                    node.remove_style_property(property);
                }
            }
            ("style", None) => {
                for (property, value) in parse_style_declarations(literal) {
                    if on {
                        node.set_style_property(&property, &value);
                    } else {
                        node.remove_style_property(&property);
                    }
                }
            }
            ("class", Some(token)) => {
                if on {
                    node.add_class(token);
                } else {
                    node.remove_class(token);
                }
            }
            ("class", None) => {
                for token in literal.split_whitespace() {
                    if on {
                        node.add_class(token);
                    } else {
                        node.remove_class(token);
                    }
                }
            }
            ("data", Some(name)) => {
                if on {
                    node.set_data_attribute(name, literal);
                } else {
                    node.remove_data_attribute(name);
                }
            }
            (other, _) => {
                if on {
                    let value = if is_boolean_attribute(other) { "" } else { literal };
                    node.set_attribute(other, value);
                } else {
                    node.remove_attribute(other);
                }
            }
        }
        Ok(RenderOutput::Keep)
    }
}
