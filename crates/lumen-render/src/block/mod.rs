//! Block-level transformation of the text left after extraction.
//!
//! Component placeholders are already in place, so tables, code, math and
//! quotes can never be mistaken for headers, lists or paragraphs here. The
//! passes run in a fixed order:
//!
//! 1. ATX headers
//! 2. backslash-escape protection
//! 3. footnote definitions and references
//! 4. inline code span protection
//! 5. horizontal rules, hard breaks and the inline rules
//! 6. list aggregation
//! 7. paragraph wrapping
//! 8. the footnotes section
//!
//! Protected spans are restored last.

mod footnotes;
mod lists;

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::component::{ComponentMap, ComponentPayload, Placeholder};
use crate::inline::{InlineFormatter, Protected};
use crate::segment::sole_placeholder;
use crate::util::slugify;

use self::footnotes::Footnotes;
use self::lists::aggregate_lists;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(#{1,6})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").unwrap()
});

static HR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:(?:\*[ \t]*){3,}|(?:-[ \t]*){3,}|(?:_[ \t]*){3,})$").unwrap()
});

static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^<(?:/?(?:h[1-6]|ul|ol|li|p|div|section|blockquote|table|thead|tbody|tfoot|tr|td|th|pre|hr|dl|dt|dd|figure|details|summary)\b)",
    )
    .unwrap()
});

/// Run all block passes over `text`.
///
/// `components` is consulted to tell block placeholders (which stand on their
/// own line) from inline math (which is wrapped in a paragraph like text).
pub(crate) fn transform_blocks(
    text: &str,
    components: &ComponentMap,
    formatter: &InlineFormatter,
) -> String {
    let text = headers(text);

    let mut protected = Protected::new();
    let text = protected.protect_escapes(&text);

    let (mut footnotes, text) = Footnotes::collect(&text);
    let text = footnotes.link_references(&text, &mut protected);

    let text = protected.protect_code_spans(&text);
    let text = HR_RE.replace_all(&text, "<hr>");
    let text = hard_breaks(&text);
    let text = formatter.format_protected(&text, &mut protected);

    let text = aggregate_lists(&text);
    let mut text = wrap_paragraphs(&text, components);

    if let Some(section) = footnotes.render(formatter, &mut protected) {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&section);
    }

    protected.restore(&text)
}

/// ATX headers with unique slug ids.
fn headers(text: &str) -> String {
    let mut seen: HashMap<String, usize> = HashMap::new();

    HEADER_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let level = caps[1].len();
            let content = &caps[2];
            let slug = slugify(content);
            if slug.is_empty() {
                return format!("<h{level}>{content}</h{level}>");
            }

            let count = seen.entry(slug.clone()).or_insert(0);
            let id = if *count == 0 {
                slug
            } else {
                format!("{slug}-{count}")
            };
            *count += 1;
            format!(r#"<h{level} id="{id}">{content}</h{level}>"#)
        })
        .into_owned()
}

/// Turn two trailing spaces or a trailing backslash into `<br>` when the
/// next line continues the same block.
fn hard_breaks(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut output = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let continues = lines
            .get(idx + 1)
            .is_some_and(|next| !next.trim().is_empty());
        if continues && !line.trim().is_empty() {
            if let Some(stripped) = line.strip_suffix('\\') {
                output.push(format!("{stripped}<br>"));
                continue;
            }
            if line.ends_with("  ") {
                output.push(format!("{}<br>", line.trim_end()));
                continue;
            }
        }
        output.push((*line).to_owned());
    }

    output.join("\n")
}

/// Wrap runs of non-block lines in `<p>`, splitting on blank lines.
///
/// A block placeholder in the middle of a line ends the paragraph before it
/// and starts a new one after it.
fn wrap_paragraphs(text: &str, components: &ComponentMap) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    let lines = text
        .split('\n')
        .flat_map(|line| split_block_placeholders(line, components));
    for line in lines {
        if line.trim().is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
        } else if is_block_line(line, components) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(line.trim().to_owned());
        } else {
            paragraph.push(line.trim());
        }
    }
    flush_paragraph(&mut paragraph, &mut blocks);

    blocks.join("\n")
}

fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<String>) {
    if paragraph.is_empty() {
        return;
    }
    let inner = paragraph.join("\n");
    paragraph.clear();
    if !inner.trim().is_empty() {
        blocks.push(format!("<p>{inner}</p>"));
    }
}

/// Cut a paragraph line at every block placeholder it contains.
///
/// Lines that already start with a block tag are returned whole.
fn split_block_placeholders<'a>(line: &'a str, components: &ComponentMap) -> Vec<&'a str> {
    if BLOCK_TAG_RE.is_match(line.trim_start()) {
        return vec![line];
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    let mut cursor = 0;
    while let Some(offset) = line[cursor..].find("{{") {
        let at = cursor + offset;
        match Placeholder::parse_prefix(&line[at..]) {
            Some((placeholder, len)) if is_block_component(&placeholder, components) => {
                if !line[start..at].trim().is_empty() {
                    pieces.push(&line[start..at]);
                }
                pieces.push(&line[at..at + len]);
                cursor = at + len;
                start = cursor;
            }
            Some((_, len)) => cursor = at + len,
            None => cursor = at + 1,
        }
    }
    if pieces.is_empty() || !line[start..].trim().is_empty() {
        pieces.push(&line[start..]);
    }
    pieces
}

fn is_block_line(line: &str, components: &ComponentMap) -> bool {
    if BLOCK_TAG_RE.is_match(line.trim_start()) {
        return true;
    }
    sole_placeholder(line).is_some_and(|placeholder| is_block_component(&placeholder, components))
}

/// Everything except inline math stands on its own.
fn is_block_component(placeholder: &Placeholder, components: &ComponentMap) -> bool {
    !matches!(
        components.resolve(placeholder),
        Some(ComponentPayload::Math(math)) if math.is_inline
    )
}
