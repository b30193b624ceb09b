//! Placeholder resolution into the render tree.
//!
//! Block placeholders become their own nodes. Inline math is hydrated in
//! place inside the surrounding markup, which has already been sanitized, so
//! the renderer's output is never stripped. A placeholder without a payload
//! renders as nothing.
//!
//! Author-written placeholder text was escaped before extraction; every
//! string leaving the resolver has its braces restored.

use crate::collab::{LiteralMath, MathRenderer, highlight_lines, render_math};
use crate::component::{
    BlockquotePayload, CodeBlockPayload, ComponentMap, ComponentPayload, MathPayload, QuoteNode,
    TablePayload,
};
use crate::inline::InlineFormatter;
use crate::renderer::RenderOptions;
use crate::sanitize::{SanitizeMode, Sanitizer};
use crate::segment::{Segment, restore_literal_braces, split};
use crate::tree::{BlockquoteNode, CodeNode, MathNode, RenderNode, StructureNode, TableNode};
use crate::util::has_visible_text;

/// Code fence languages rendered by the remote structure service.
const STRUCTURE_LANGUAGES: [&str; 2] = ["smiles", "chem"];

/// Elements that are visible without any text.
const VOID_CONTENT: [&str; 3] = ["<img", "<hr", "<input"];

pub(crate) struct Resolver<'a> {
    pub(crate) components: &'a ComponentMap,
    pub(crate) options: &'a RenderOptions,
    pub(crate) formatter: &'a InlineFormatter,
    pub(crate) sanitizer: &'a Sanitizer,
}

impl Resolver<'_> {
    /// Split `html` on placeholders and build the top-level nodes.
    pub(crate) fn resolve(&self, html: &str) -> Vec<RenderNode> {
        let mut nodes = Vec::new();
        let mut pending = String::new();

        for segment in split(html) {
            match segment {
                Segment::Text(text) => pending.push_str(text),
                Segment::Placeholder(placeholder) => match self.components.resolve(&placeholder) {
                    Some(ComponentPayload::Math(math)) if math.is_inline => {
                        pending.push_str(&self.inline_math_html(math));
                    }
                    Some(payload) => {
                        flush_html(&mut pending, &mut nodes);
                        nodes.push(self.node_for(payload));
                    }
                    None => {
                        tracing::warn!(%placeholder, "placeholder has no payload, skipping");
                    }
                },
            }
        }
        flush_html(&mut pending, &mut nodes);

        nodes
    }

    fn node_for(&self, payload: &ComponentPayload) -> RenderNode {
        match payload {
            ComponentPayload::Table(table) => RenderNode::Table(self.table_node(table)),
            ComponentPayload::CodeBlock(code) => self.code_node(code),
            ComponentPayload::Math(math) => RenderNode::Math(self.math_node(math)),
            ComponentPayload::Blockquote(quote) => RenderNode::Blockquote(self.quote_node(quote)),
        }
    }

    fn table_node(&self, table: &TablePayload) -> TableNode {
        TableNode {
            headers: self.cells(&table.headers),
            rows: table.rows.iter().map(|row| self.cells(row)).collect(),
            alignments: table.alignments.clone(),
        }
    }

    fn cells(&self, row: &[String]) -> Vec<String> {
        row.iter().map(|cell| self.fragment(cell)).collect()
    }

    fn code_node(&self, code: &CodeBlockPayload) -> RenderNode {
        let is_structure = code.language.as_deref().is_some_and(|language| {
            STRUCTURE_LANGUAGES
                .iter()
                .any(|s| language.eq_ignore_ascii_case(s))
        });
        if is_structure {
            return RenderNode::Structure(StructureNode::new(restore_literal_braces(&code.code)));
        }

        RenderNode::Code(CodeNode {
            lines: highlight_lines(
                self.options.highlighter.as_ref(),
                &restore_literal_braces(&code.code),
                code.language.as_deref(),
            ),
            language: code.language.clone(),
            filename: code
                .filename
                .as_deref()
                .map(|name| restore_literal_braces(name).into_owned()),
            show_line_numbers: code.show_line_numbers,
        })
    }

    fn math_renderer(&self) -> &dyn MathRenderer {
        self.options.math.as_deref().unwrap_or(&LiteralMath)
    }

    fn math_node(&self, math: &MathPayload) -> MathNode {
        let source = restore_literal_braces(&math.content).into_owned();
        MathNode {
            html: render_math(self.math_renderer(), &source, math.is_inline),
            source,
            inline: math.is_inline,
        }
    }

    fn inline_math_html(&self, math: &MathPayload) -> String {
        let source = restore_literal_braces(&math.content);
        let html = render_math(self.math_renderer(), &source, true);
        format!(r#"<span class="math math-inline">{html}</span>"#)
    }

    fn quote_node(&self, quote: &BlockquotePayload) -> BlockquoteNode {
        let children = quote
            .content
            .iter()
            .filter_map(|child| match child {
                QuoteNode::Text(html) => Some(RenderNode::Html(self.clean(html))),
                QuoteNode::Break => Some(RenderNode::Html("<br>".to_owned())),
                QuoteNode::Quote(nested) => Some(RenderNode::Blockquote(self.quote_node(nested))),
                QuoteNode::Component(id) => match self.components.get(*id) {
                    Some(payload) => Some(self.node_for(payload)),
                    None => {
                        tracing::warn!(?id, "quoted component has no payload, skipping");
                        None
                    }
                },
            })
            .collect();

        BlockquoteNode {
            nested: quote.nested,
            children,
        }
    }

    /// Inline-format and sanitize a standalone fragment such as a table cell.
    fn fragment(&self, text: &str) -> String {
        self.clean(&self.formatter.format(text))
    }

    fn clean(&self, html: &str) -> String {
        let html = match self.options.sanitize {
            SanitizeMode::Sanitized => self.sanitizer.clean(html),
            SanitizeMode::Trusted => html.to_owned(),
        };
        restore_literal_braces(&html).into_owned()
    }
}

/// Emit the collected markup as a node unless it has no visible text.
fn flush_html(pending: &mut String, nodes: &mut Vec<RenderNode>) {
    let html = pending.trim();
    if has_visible_text(html) || VOID_CONTENT.iter().any(|tag| html.contains(tag)) {
        nodes.push(RenderNode::Html(restore_literal_braces(html).into_owned()));
    }
    pending.clear();
}
