//! HTML serialization.
//!
//! Output is deterministic: attributes in stored order, explicit escaping,
//! void tags emitted unclosed. Structured props serialize back to the
//! parser's marker syntax (`:name.sub="value"`) so serialized markup
//! round-trips through the parser — the metadata store relies on this when
//! a repeat clone is rebuilt from a node's raw original markup.

use crate::is_void_tag;
use crate::node::NodeRef;

pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

impl NodeRef {
    /// Serialized children only.
    pub fn inner_html(&self) -> String {
        self.children().iter().map(NodeRef::outer_html).collect()
    }

    /// Serialized node including itself. Fragments serialize as their
    /// children.
    pub fn outer_html(&self) -> String {
        if self.is_fragment() {
            return self.inner_html();
        }
        if let Some(tag) = self.tag() {
            let mut out = String::new();
            out.push('<');
            out.push_str(&tag);
            for attr in self.attributes() {
                out.push(' ');
                out.push_str(&attr.name);
                if let Some(value) = &attr.value {
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
            }
            for (name, assignment) in self.props() {
                out.push_str(" :");
                out.push_str(&name);
                if let Some(sub) = &assignment.prop {
                    out.push('.');
                    out.push_str(sub);
                }
                out.push_str("=\"");
                out.push_str(&escape_attr(&assignment.value));
                out.push('"');
            }
            out.push('>');
            if is_void_tag(&tag) {
                return out;
            }
            // Raw-text elements serialize their text unescaped.
            if matches!(tag.as_str(), "script" | "style" | "textarea") {
                out.push_str(&self.text_content());
            } else {
                out.push_str(&self.inner_html());
            }
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
            return out;
        }
        // text / comment
        let value = self.node_value().unwrap_or_default();
        if self.is_comment() {
            format!("<!--{value}-->")
        } else {
            escape_text(&value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PropAssignment;

    #[test]
    fn element_with_attrs_and_text() {
        let el = NodeRef::element("a");
        el.set_attribute("href", "/x?a=1&b=2");
        el.set_attribute_value("download", None);
        el.append_child(&NodeRef::text("1 < 2"));
        assert_eq!(
            el.outer_html(),
            r#"<a href="/x?a=1&amp;b=2" download>1 &lt; 2</a>"#
        );
    }

    #[test]
    fn void_and_comment() {
        let frag = NodeRef::fragment();
        let img = NodeRef::element("img");
        img.set_attribute("src", "x.png");
        frag.append_child(&img);
        frag.append_child(&NodeRef::comment("marker"));
        assert_eq!(frag.outer_html(), r#"<img src="x.png"><!--marker-->"#);
    }

    #[test]
    fn marker_props_round_trip_syntax() {
        let el = NodeRef::element("div");
        el.set_prop(
            "options",
            PropAssignment {
                value: "a, b".into(),
                prop: Some("set".into()),
            },
        );
        assert_eq!(el.outer_html(), r#"<div :options.set="a, b"></div>"#);
    }
}
