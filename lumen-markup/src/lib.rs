//! Markup string → live fragment.
//!
//! Hand-rolled byte scanner. Recognizes open/close/self-closing tags,
//! comments, text runs, and a marker-attribute syntax: a leading `:` on an
//! attribute name (with optional `.sub` segment) assigns a structured
//! `PropAssignment` onto the element instead of a DOM attribute, which lets
//! directive arguments bypass HTML-attribute escaping constraints.
//!
//! Parsing never fails. Unmatched closing tags pop the open-element stack;
//! tags still open at end of input are implicitly closed.

use lumen_dom::{NodeRef, PropAssignment, is_void_tag};

/// Elements whose content is raw text: no child tags, no comments, one text
/// node up to the matching close tag.
const RAW_TEXT_TAGS: &[&str] = &["script", "style", "textarea"];

/// Parse markup into a fragment. The fragment owns the parsed tree until it
/// is attached somewhere.
pub fn parse_markup(input: &str) -> NodeRef {
    let bytes = input.as_bytes();
    let mut i = 0usize;
    let fragment = NodeRef::fragment();
    // Stack of open elements; children attach to the innermost entry.
    let mut stack: Vec<NodeRef> = Vec::new();

    fn current_parent<'a>(stack: &'a [NodeRef], fragment: &'a NodeRef) -> &'a NodeRef {
        stack.last().unwrap_or(fragment)
    }

    while i < bytes.len() {
        if bytes[i] == b'<' {
            // comment?
            if input[i..].starts_with("<!--") {
                let start = i + 4;
                let end = input[start..]
                    .find("-->")
                    .map(|p| start + p)
                    .unwrap_or(bytes.len());
                current_parent(&stack, &fragment).append_child(&NodeRef::comment(&input[start..end]));
                i = (end + 3).min(bytes.len());
                continue;
            }

            // closing tag?
            if i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                i += 2;
                let tag = read_ident(bytes, &mut i).to_ascii_lowercase();
                skip_until_gt(bytes, &mut i);
                close_tag(&mut stack, &tag);
                continue;
            }

            // opening tag? anything else after `<` is literal text
            let next = bytes.get(i + 1).copied().unwrap_or(0);
            if !next.is_ascii_alphabetic() {
                let start = i;
                i += 1;
                read_text_run(bytes, &mut i);
                push_text(current_parent(&stack, &fragment), &input[start..i]);
                continue;
            }

            i += 1;
            let tag = read_ident(bytes, &mut i).to_ascii_lowercase();
            let element = NodeRef::element(&tag);
            let mut self_closing = false;

            loop {
                skip_ws(bytes, &mut i);
                if i >= bytes.len() {
                    break;
                }
                match bytes[i] {
                    b'/' => {
                        self_closing = true;
                        i += 1;
                        skip_ws(bytes, &mut i);
                        if i < bytes.len() && bytes[i] == b'>' {
                            i += 1;
                        }
                        break;
                    }
                    b'>' => {
                        i += 1;
                        break;
                    }
                    _ => {
                        if !read_attribute(input, bytes, &mut i, &element) {
                            // skip unknown token
                            i += 1;
                        }
                    }
                }
            }

            current_parent(&stack, &fragment).append_child(&element);
            if self_closing || is_void_tag(&tag) {
                continue;
            }
            if RAW_TEXT_TAGS.contains(&tag.as_str()) {
                let raw = read_raw_text(input, &mut i, &tag);
                if !raw.is_empty() {
                    element.append_child(&NodeRef::text(raw));
                }
                continue;
            }
            stack.push(element);
        } else {
            // text run until the next `<`
            let start = i;
            read_text_run(bytes, &mut i);
            push_text(current_parent(&stack, &fragment), &input[start..i]);
        }
    }

    // Unclosed tags at end of input are implicitly closed; children are
    // already attached, so draining the stack is enough.
    stack.clear();
    fragment
}

fn push_text(parent: &NodeRef, text: &str) {
    if !text.is_empty() {
        parent.append_child(&NodeRef::text(text));
    }
}

fn read_text_run(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i] != b'<' {
        *i += 1;
    }
}

/// Raw-text content: everything up to the matching `</tag` (case-insensitive),
/// which is consumed including its `>`.
fn read_raw_text(input: &str, i: &mut usize, tag: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let close = format!("</{tag}");
    let start = *i;
    match lower[start..].find(&close) {
        Some(offset) => {
            let end = start + offset;
            let mut j = end + close.len();
            let bytes = input.as_bytes();
            skip_until_gt(bytes, &mut j);
            *i = j;
            input[start..end].to_string()
        }
        None => {
            *i = input.len();
            input[start..].to_string()
        }
    }
}

/// Pop the open-element stack for a closing tag. A matching open tag closes
/// everything above it; a stray close pops a single element.
fn close_tag(stack: &mut Vec<NodeRef>, tag: &str) {
    match stack.iter().rposition(|n| n.tag().as_deref() == Some(tag)) {
        Some(pos) => stack.truncate(pos),
        None => {
            stack.pop();
        }
    }
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn skip_until_gt(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i] != b'>' {
        *i += 1;
    }
    if *i < bytes.len() {
        *i += 1;
    }
}

fn read_ident(bytes: &[u8], i: &mut usize) -> String {
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_alphanumeric() || c == b'_' || c == b'-' {
            *i += 1;
        } else {
            break;
        }
    }
    String::from_utf8_lossy(&bytes[start..*i]).into_owned()
}

/// One attribute (or marker prop). Returns false when no name could be read.
fn read_attribute(input: &str, bytes: &[u8], i: &mut usize, element: &NodeRef) -> bool {
    let name_start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_alphanumeric()
            || c == b'_'
            || c == b'-'
            || c == b'.'
            || c == b':'
            || c == b'$'
        {
            *i += 1;
        } else {
            break;
        }
    }
    if *i == name_start {
        return false;
    }
    let raw_name = input[name_start..*i].to_string();

    skip_ws(bytes, i);
    let mut value: Option<String> = None;
    if *i < bytes.len() && bytes[*i] == b'=' {
        *i += 1;
        skip_ws(bytes, i);
        // `attr=` with nothing usable still parses to an empty string:
        // only a missing `=` yields a null value.
        value = Some(read_value(input, bytes, i));
    }

    if let Some(marker_name) = raw_name.strip_prefix(':') {
        let (name, sub) = match marker_name.split_once('.') {
            Some((name, sub)) => (name.to_string(), Some(sub.to_string())),
            None => (marker_name.to_string(), None),
        };
        if !name.is_empty() {
            element.set_prop(
                name,
                PropAssignment {
                    value: value.unwrap_or_default(),
                    prop: sub,
                },
            );
        }
    } else {
        element.set_attribute_value(raw_name, value);
    }
    true
}

fn read_value(input: &str, bytes: &[u8], i: &mut usize) -> String {
    if *i >= bytes.len() {
        return String::new();
    }
    let quote = bytes[*i];
    if quote == b'"' || quote == b'\'' {
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        let value = input[start..*i].to_string();
        if *i < bytes.len() {
            *i += 1;
        }
        return value;
    }
    // unquoted: up to whitespace or tag end
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_whitespace() || c == b'>' || c == b'/' {
            break;
        }
        *i += 1;
    }
    input[start..*i].to_string()
}
