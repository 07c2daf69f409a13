//! Executable-snippet extraction.
//!
//! Scans a string for balanced `{`/`}` pairs with a position stack. Each
//! balanced, non-empty pair emits a snippet; when a later (and therefore
//! enclosing) pair closes, snippets strictly contained in its range are
//! evicted so nested braces are never evaluated twice. `{}` emits nothing.

/// A brace-delimited executable region of a template string.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    /// Byte offset of the opening brace.
    pub from: usize,
    /// Byte offset one past the closing brace (half-open range).
    pub to: usize,
    /// The literal matched text, braces included.
    pub text: String,
    /// The enclosed expression, trimmed.
    pub executable: String,
}

pub fn extract_executables(input: &str) -> Vec<Snippet> {
    let mut open: Vec<usize> = Vec::new();
    let mut out: Vec<Snippet> = Vec::new();

    for (idx, ch) in input.char_indices() {
        match ch {
            '{' => open.push(idx),
            '}' => {
                let Some(from) = open.pop() else { continue };
                let to = idx + 1;
                let inner = input[from + 1..idx].trim();
                if inner.is_empty() {
                    continue;
                }
                // Left-to-right scanning closes inner pairs first, so this
                // later snippet is the outer one: it wins.
                out.retain(|s| !(s.from >= from && s.to <= to));
                out.push(Snippet {
                    from,
                    to,
                    text: input[from..to].to_string(),
                    executable: inner.to_string(),
                });
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_snippets_in_order() {
        let snippets = extract_executables("a {x} b {y}");
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].executable, "x");
        assert_eq!((snippets[0].from, snippets[0].to), (2, 5));
        assert_eq!(snippets[1].executable, "y");
        assert_eq!(snippets[1].text, "{y}");
    }

    #[test]
    fn outermost_wins() {
        let snippets = extract_executables("{a {b} c}");
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].executable, "a {b} c");
        assert_eq!((snippets[0].from, snippets[0].to), (0, 9));
    }

    #[test]
    fn empty_braces_emit_nothing() {
        assert!(extract_executables("{} { } text").is_empty());
    }

    #[test]
    fn unbalanced_close_is_ignored() {
        let snippets = extract_executables("} {x}");
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].executable, "x");
    }
}
