//! Out-of-character (OOC) detection.
//!
//! Two rules coexist on purpose and each belongs to one call site:
//!
//! - [`is_ooc_indicator`] drives the live "OOC" badge while the user is typing.
//!   It is loose: leading whitespace is ignored and only the opening parenthesis
//!   is required.
//! - [`is_ooc_message`] decides the `ooc` flag stored on a submitted message.
//!   It is strict: the text must both start with `(` and end with `)`.

/// Loose check used for the input indicator.
pub fn is_ooc_indicator(raw: &str) -> bool {
    raw.trim_start().starts_with('(')
}

/// Strict check used when tagging a stored message.
///
/// The text is inspected as submitted; callers trim user input before
/// composing the message.
pub fn is_ooc_message(text: &str) -> bool {
    text.starts_with('(') && text.ends_with(')')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_ignores_leading_whitespace() {
        assert!(is_ooc_indicator("   (how do I export?"));
        assert!(!is_ooc_indicator("hi (there)"));
    }

    #[test]
    fn test_message_requires_both_parens() {
        assert!(is_ooc_message("(out of character)"));
        assert!(!is_ooc_message("(still typing"));
        assert!(!is_ooc_message(" (padded)"));
        assert!(!is_ooc_message(""));
    }

    #[test]
    fn test_empty_parens() {
        assert!(is_ooc_message("()"));
        assert!(!is_ooc_message(")"));
    }
}
