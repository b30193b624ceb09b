//! Shared utility functions for rendering.

/// Escape text for use between HTML tags.
#[must_use]
pub fn escape_html(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Escape text for use inside a double-quoted HTML attribute.
#[must_use]
pub(crate) fn escape_attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Whether an HTML fragment has any visible text once tags are removed.
pub(crate) fn has_visible_text(html: &str) -> bool {
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag && !c.is_whitespace() => return true,
            _ => {}
        }
    }
    false
}

/// Convert heading text to an anchor id.
///
/// Lowercases ASCII alphanumerics, turns whitespace, `-` and `_` into single
/// dashes and drops everything else, including markup tags.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;
    let mut in_tag = false;

    for c in text.trim().chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            c if c.is_ascii_alphanumeric() => {
                result.push(c.to_ascii_lowercase());
                last_was_dash = false;
            }
            c if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') => {
                result.push('-');
                last_was_dash = true;
            }
            _ => {}
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    result
}
