//! Splitting text on placeholder tokens.
//!
//! Source text that already looks like a placeholder is escaped before any
//! extractor runs, so only tokens minted by a [`ComponentMap`] ever resolve.
//!
//! [`ComponentMap`]: crate::component::ComponentMap

use std::borrow::Cow;

use crate::component::Placeholder;

/// Stands in for the opening brace of an author-written placeholder.
const LITERAL_BRACE: char = '\u{E002}';

/// A span of text between placeholders, or a placeholder itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    Placeholder(Placeholder),
}

/// Split `text` into literal spans and placeholder tokens.
///
/// Brace sequences that do not form a valid placeholder stay in the
/// surrounding text span. Empty text spans are never produced.
pub(crate) fn split(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find("{{") {
        let at = cursor + offset;
        if let Some((placeholder, len)) = Placeholder::parse_prefix(&text[at..]) {
            if at > text_start {
                segments.push(Segment::Text(&text[text_start..at]));
            }
            segments.push(Segment::Placeholder(placeholder));
            cursor = at + len;
            text_start = cursor;
        } else {
            cursor = at + 1;
        }
    }

    if text_start < text.len() {
        segments.push(Segment::Text(&text[text_start..]));
    }
    segments
}

/// Break every placeholder-shaped sequence in author-written `text`.
///
/// The first brace of each such sequence is swapped for a private-use
/// character; [`restore_literal_braces`] turns it back after resolution.
pub(crate) fn escape_literal_placeholders(text: &str) -> Cow<'_, str> {
    if !text.contains("{{") && !text.contains(LITERAL_BRACE) {
        return Cow::Borrowed(text);
    }

    // A stray sentinel in the source would otherwise come back as a brace.
    let text = text.replace(LITERAL_BRACE, "");
    let mut output = String::with_capacity(text.len());
    let mut rest = text.as_str();
    while let Some(at) = rest.find("{{") {
        let (before, candidate) = rest.split_at(at);
        output.push_str(before);
        if Placeholder::parse_prefix(candidate).is_some() {
            output.push(LITERAL_BRACE);
        } else {
            output.push('{');
        }
        rest = &candidate[1..];
    }
    output.push_str(rest);
    Cow::Owned(output)
}

/// Undo [`escape_literal_placeholders`] in output text.
pub(crate) fn restore_literal_braces(text: &str) -> Cow<'_, str> {
    if text.contains(LITERAL_BRACE) {
        Cow::Owned(text.replace(LITERAL_BRACE, "{"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Whether `line` (ignoring surrounding whitespace) is exactly one placeholder.
pub(crate) fn sole_placeholder(line: &str) -> Option<Placeholder> {
    Placeholder::parse(line.trim())
}
