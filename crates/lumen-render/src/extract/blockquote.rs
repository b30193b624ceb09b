//! Blockquote extraction with nested levels.
//!
//! Runs after the table, code and math passes, so quoted lines may already
//! contain their placeholders. Those are resolved against the shared
//! [`ComponentMap`] and kept as component references inside the quote tree.
//!
//! Nesting is a bracket-matching stack machine: one entry per open level,
//! each holding the children collected so far. Dropping to a shallower level
//! pops entries and attaches each popped level as a nested quote to its
//! parent.

use crate::component::{BlockquotePayload, ComponentMap, ComponentPayload, QuoteNode};
use crate::inline::InlineFormatter;
use crate::lines::{FenceTracker, quote_depth, split_quote_prefix};
use crate::segment::{Segment, split};

/// One line of a quoted region.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BlockquoteLine<'a> {
    level: usize,
    content: &'a str,
}

/// Replace every quoted region in `text` with a `{{QUOTE<N>}}` placeholder.
pub(crate) fn extract_blockquotes(
    text: &str,
    components: &mut ComponentMap,
    formatter: &InlineFormatter,
) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut output: Vec<String> = Vec::with_capacity(lines.len());
    let mut fence = FenceTracker::new();
    let mut i = 0;

    while i < lines.len() {
        let is_fence_marker = fence.update(lines[i]);
        if is_fence_marker || fence.in_fence() || quote_line(lines[i]).is_none() {
            output.push(lines[i].to_owned());
            i += 1;
            continue;
        }

        let (region, consumed) = collect_region(&lines[i..]);
        let payload = build_tree(&region, components, formatter);
        let placeholder = components.insert(ComponentPayload::Blockquote(payload));
        output.push(placeholder.to_string());
        i += consumed;
    }

    output.join("\n")
}

/// Parse a quote-marked line into its level and content.
fn quote_line(line: &str) -> Option<BlockquoteLine<'_>> {
    let (prefix, body) = split_quote_prefix(line);
    let level = quote_depth(prefix);
    (level > 0).then(|| BlockquoteLine {
        level,
        content: body.trim(),
    })
}

/// Collect the lines of one region starting at a quote-marked line.
///
/// A single blank line is absorbed when the next line is quoted again; any
/// other blank line or unquoted line ends the region.
fn collect_region<'a>(lines: &[&'a str]) -> (Vec<BlockquoteLine<'a>>, usize) {
    let mut region: Vec<BlockquoteLine<'a>> = Vec::new();
    let mut j = 0;

    while j < lines.len() {
        if let Some(line) = quote_line(lines[j]) {
            region.push(line);
            j += 1;
            continue;
        }

        let continues = lines[j].trim().is_empty()
            && lines.get(j + 1).and_then(|next| quote_line(next)).is_some();
        if !continues {
            break;
        }

        let level = region.last().map_or(1, |line| line.level);
        region.push(BlockquoteLine { level, content: "" });
        j += 1;
    }

    (region, j)
}

fn build_tree(
    region: &[BlockquoteLine<'_>],
    components: &ComponentMap,
    formatter: &InlineFormatter,
) -> BlockquotePayload {
    let mut stack: Vec<Vec<QuoteNode>> = Vec::new();
    let mut roots: Vec<QuoteNode> = Vec::new();

    for line in region {
        while stack.len() > line.level {
            close_level(&mut stack, &mut roots);
        }
        while stack.len() < line.level {
            stack.push(Vec::new());
        }

        let Some(children) = stack.last_mut() else {
            continue;
        };
        if ends_with_content(children) {
            children.push(QuoteNode::Break);
        }
        if line.content.is_empty() {
            children.push(QuoteNode::Break);
        } else {
            push_content(children, line.content, components, formatter);
        }
    }

    while !stack.is_empty() {
        close_level(&mut stack, &mut roots);
    }

    if roots.len() == 1
        && let Some(QuoteNode::Quote(payload)) = roots.pop()
    {
        return payload;
    }
    BlockquotePayload {
        nested: false,
        content: roots,
    }
}

/// Pop the innermost level and attach it to its parent, or to the roots when
/// no parent is open.
fn close_level(stack: &mut Vec<Vec<QuoteNode>>, roots: &mut Vec<QuoteNode>) {
    let Some(children) = stack.pop() else {
        return;
    };
    let node = QuoteNode::Quote(BlockquotePayload {
        nested: !stack.is_empty(),
        content: children,
    });
    match stack.last_mut() {
        Some(parent) => parent.push(node),
        None => roots.push(node),
    }
}

fn ends_with_content(children: &[QuoteNode]) -> bool {
    matches!(
        children.last(),
        Some(QuoteNode::Text(_) | QuoteNode::Component(_))
    )
}

fn push_content(
    children: &mut Vec<QuoteNode>,
    content: &str,
    components: &ComponentMap,
    formatter: &InlineFormatter,
) {
    for segment in split(content) {
        match segment {
            Segment::Text(text) => children.push(QuoteNode::Text(formatter.format(text))),
            Segment::Placeholder(placeholder) => match components.id_of(&placeholder) {
                Some(id) => children.push(QuoteNode::Component(id)),
                None => {
                    tracing::warn!(%placeholder, "unresolved placeholder inside blockquote");
                    children.push(QuoteNode::Text(placeholder.to_string()));
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{MathPayload, Placeholder};
    use pretty_assertions::assert_eq;

    fn quote_at(components: &ComponentMap, token: &str) -> BlockquotePayload {
        match components.resolve(&Placeholder::parse(token).unwrap()) {
            Some(ComponentPayload::Blockquote(quote)) => quote.clone(),
            other => panic!("expected blockquote, got {other:?}"),
        }
    }

    fn text(s: &str) -> QuoteNode {
        QuoteNode::Text(s.to_owned())
    }

    fn extract(input: &str) -> (String, ComponentMap) {
        let mut components = ComponentMap::new();
        let output = extract_blockquotes(input, &mut components, &InlineFormatter::new());
        (output, components)
    }

    #[test]
    fn test_single_level() {
        let (output, components) = extract("intro\n> one\n> two\noutro");
        assert_eq!(output, "intro\n{{QUOTE0}}\noutro");
        assert_eq!(
            quote_at(&components, "{{QUOTE0}}"),
            BlockquotePayload {
                nested: false,
                content: vec![text("one"), QuoteNode::Break, text("two")],
            }
        );
    }

    #[test]
    fn test_nested_level_closes_before_returning() {
        let (output, components) = extract("> level1\n>> level2\n> back to 1");
        assert_eq!(output, "{{QUOTE0}}");
        assert_eq!(
            quote_at(&components, "{{QUOTE0}}"),
            BlockquotePayload {
                nested: false,
                content: vec![
                    text("level1"),
                    QuoteNode::Quote(BlockquotePayload {
                        nested: true,
                        content: vec![text("level2")],
                    }),
                    text("back to 1"),
                ],
            }
        );
    }

    #[test]
    fn test_starting_deep_opens_intermediate_levels() {
        let (_, components) = extract(">>> deep");
        let outer = quote_at(&components, "{{QUOTE0}}");
        assert!(!outer.nested);
        let QuoteNode::Quote(middle) = &outer.content[0] else {
            panic!("expected nested quote");
        };
        assert!(middle.nested);
        let QuoteNode::Quote(inner) = &middle.content[0] else {
            panic!("expected nested quote");
        };
        assert_eq!(inner.content, vec![text("deep")]);
    }

    #[test]
    fn test_blank_line_inside_quote_continues_region() {
        let (output, components) = extract("> a\n\n> b");
        assert_eq!(output, "{{QUOTE0}}");
        assert_eq!(
            quote_at(&components, "{{QUOTE0}}").content,
            vec![text("a"), QuoteNode::Break, QuoteNode::Break, text("b")]
        );
    }

    #[test]
    fn test_two_blank_lines_end_region() {
        let (output, components) = extract("> a\n\n\n> b");
        assert_eq!(output, "{{QUOTE0}}\n\n\n{{QUOTE1}}");
        assert_eq!(components.len(), 2);
    }

    #[test]
    fn test_blank_then_text_ends_region() {
        let (output, _) = extract("> a\n\nplain");
        assert_eq!(output, "{{QUOTE0}}\n\nplain");
    }

    #[test]
    fn test_empty_marker_line_is_break() {
        let (_, components) = extract(">\n> a");
        assert_eq!(
            quote_at(&components, "{{QUOTE0}}").content,
            vec![QuoteNode::Break, text("a")]
        );
    }

    #[test]
    fn test_inline_formatting_applied() {
        let (_, components) = extract("> **bold**");
        assert_eq!(
            quote_at(&components, "{{QUOTE0}}").content,
            vec![text("<strong>bold</strong>")]
        );
    }

    #[test]
    fn test_embedded_placeholder_resolved() {
        let mut components = ComponentMap::new();
        let math = components.insert(ComponentPayload::Math(MathPayload {
            content: "$x$".to_owned(),
            is_inline: true,
        }));
        let input = format!("> value {math} here");
        extract_blockquotes(&input, &mut components, &InlineFormatter::new());

        let quote = quote_at(&components, "{{QUOTE0}}");
        let id = components.id_of(&math).unwrap();
        assert_eq!(
            quote.content,
            vec![text("value "), QuoteNode::Component(id), text(" here")]
        );
    }

    #[test]
    fn test_unknown_placeholder_kept_as_text() {
        let (_, components) = extract("> {{TABLE9}}");
        assert_eq!(
            quote_at(&components, "{{QUOTE0}}").content,
            vec![text("{{TABLE9}}")]
        );
    }

    #[test]
    fn test_quote_markers_inside_fence_ignored() {
        let input = "~~~\n> not a quote\n~~~";
        let (output, components) = extract(input);
        assert_eq!(output, input);
        assert!(components.is_empty());
    }
}
