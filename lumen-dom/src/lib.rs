pub mod node;
pub mod serialize;

pub use node::{
    Attribute, NodeId, NodeKind, NodeRef, PropAssignment, kebab_case, parse_style_declarations,
};
pub use serialize::{escape_attr, escape_text};

/// Tags that never take a closing tag in serialized output and are treated
/// as self-closing by the markup parser.
pub const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Attributes that are presence-based in HTML. Toggling one of these on
/// writes an empty value rather than a literal.
pub const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "autofocus", "checked", "disabled", "hidden", "multiple", "open", "readonly", "required",
    "selected",
];

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

pub fn is_boolean_attribute(name: &str) -> bool {
    BOOLEAN_ATTRIBUTES.iter().any(|a| a.eq_ignore_ascii_case(name))
}
