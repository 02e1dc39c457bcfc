//! `*emphasis*` markup used in companion replies for actions and narration.

/// A run of message text, either plain or emphasized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'a> {
    pub text: &'a str,
    pub emphasized: bool,
}

/// Splits text into plain and emphasized spans.
///
/// An emphasized span is the shortest `*...*` pair on a single line, scanning
/// left to right. A lone asterisk without a partner on its line stays in the
/// plain text. Empty spans are dropped.
pub fn emphasis_spans(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut plain_start = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find('*') {
        let open = cursor + offset;
        let inner_start = open + 1;
        let line_end = text[inner_start..]
            .find('\n')
            .map_or(text.len(), |i| inner_start + i);

        match text[inner_start..line_end].find('*') {
            Some(offset) => {
                let close = inner_start + offset;
                push_span(&mut spans, &text[plain_start..open], false);
                push_span(&mut spans, &text[inner_start..close], true);
                cursor = close + 1;
                plain_start = cursor;
            }
            None => cursor = inner_start,
        }
    }

    push_span(&mut spans, &text[plain_start..], false);
    spans
}

/// Removes every `*` from text. Speech requests are sent without markup.
pub fn strip_emphasis(text: &str) -> String {
    text.replace('*', "")
}

fn push_span<'a>(spans: &mut Vec<Span<'a>>, text: &'a str, emphasized: bool) {
    if !text.is_empty() {
        spans.push(Span { text, emphasized });
    }
}
