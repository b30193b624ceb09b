//! Renderable tree produced by the resolver.

use crate::component::Alignment;
use crate::util::{escape_attr, escape_html};

/// Color theme of the rendered output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Result of rendering one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RenderTree {
    pub nodes: Vec<RenderNode>,
}

/// One renderable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", content = "value", rename_all = "snake_case")
)]
pub enum RenderNode {
    /// Markup fragment, sanitized unless rendering in trusted mode.
    Html(String),
    Table(TableNode),
    Code(CodeNode),
    Math(MathNode),
    Blockquote(BlockquoteNode),
    Structure(StructureNode),
}

/// Table with inline-formatted cell markup.
///
/// Rows may be shorter or longer than the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableNode {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub alignments: Vec<Alignment>,
}

/// Code block with one highlighted markup string per source line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CodeNode {
    pub lines: Vec<String>,
    pub language: Option<String>,
    pub filename: Option<String>,
    pub show_line_numbers: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MathNode {
    /// Original source including delimiters.
    pub source: String,
    pub inline: bool,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BlockquoteNode {
    /// Nested quotes render without the accent decoration.
    pub nested: bool,
    pub children: Vec<RenderNode>,
}

/// Chemical structure rendered by a remote service.
///
/// Starts without a URL; hydration fills in `url` or `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StructureNode {
    pub content: String,
    pub url: Option<String>,
    pub error: Option<String>,
}

impl StructureNode {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            url: None,
            error: None,
        }
    }
}

impl RenderTree {
    /// Serialize the tree to an HTML fragment wrapped in a themed container.
    #[must_use]
    pub fn to_html(&self, theme: Theme) -> String {
        let mut html = format!(r#"<div class="lumen lumen-{}">"#, theme.as_str());
        html.push('\n');
        for node in &self.nodes {
            node.write_html(&mut html);
            html.push('\n');
        }
        html.push_str("</div>");
        html
    }

    /// Visit every structure node, including those inside blockquotes.
    pub fn for_each_structure(&self, f: &mut impl FnMut(&StructureNode)) {
        visit_structures(&self.nodes, f);
    }

    /// Visit every structure node mutably.
    pub fn for_each_structure_mut(&mut self, f: &mut impl FnMut(&mut StructureNode)) {
        visit_structures_mut(&mut self.nodes, f);
    }
}

fn visit_structures(nodes: &[RenderNode], f: &mut impl FnMut(&StructureNode)) {
    for node in nodes {
        match node {
            RenderNode::Structure(structure) => f(structure),
            RenderNode::Blockquote(quote) => visit_structures(&quote.children, f),
            _ => {}
        }
    }
}

fn visit_structures_mut(nodes: &mut [RenderNode], f: &mut impl FnMut(&mut StructureNode)) {
    for node in nodes {
        match node {
            RenderNode::Structure(structure) => f(structure),
            RenderNode::Blockquote(quote) => visit_structures_mut(&mut quote.children, f),
            _ => {}
        }
    }
}

impl RenderNode {
    fn write_html(&self, out: &mut String) {
        match self {
            Self::Html(html) => out.push_str(html),
            Self::Table(table) => table.write_html(out),
            Self::Code(code) => code.write_html(out),
            Self::Math(math) => math.write_html(out),
            Self::Blockquote(quote) => quote.write_html(out),
            Self::Structure(structure) => structure.write_html(out),
        }
    }
}

impl TableNode {
    fn column_count(&self) -> usize {
        if self.headers.is_empty() {
            self.rows.iter().map(Vec::len).max().unwrap_or(0)
        } else {
            self.headers.len()
        }
    }

    fn align_attr(&self, column: usize) -> &'static str {
        match self.alignments.get(column).copied().unwrap_or_default() {
            Alignment::Left => "",
            Alignment::Center => r#" style="text-align: center""#,
            Alignment::Right => r#" style="text-align: right""#,
        }
    }

    fn write_html(&self, out: &mut String) {
        let columns = self.column_count();
        out.push_str("<table>\n");

        if !self.headers.is_empty() {
            out.push_str("<thead>\n<tr>");
            for (column, header) in self.headers.iter().enumerate() {
                out.push_str(&format!("<th{}>{header}</th>", self.align_attr(column)));
            }
            out.push_str("</tr>\n</thead>\n");
        }

        out.push_str("<tbody>\n");
        for row in &self.rows {
            out.push_str("<tr>");
            for column in 0..columns {
                let cell = row.get(column).map_or("", String::as_str);
                out.push_str(&format!("<td{}>{cell}</td>", self.align_attr(column)));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n</table>");
    }
}

impl CodeNode {
    fn write_html(&self, out: &mut String) {
        out.push_str(r#"<figure class="code-block">"#);
        if let Some(filename) = &self.filename {
            out.push_str(&format!("<figcaption>{}</figcaption>", escape_html(filename)));
        }
        match &self.language {
            Some(language) => out.push_str(&format!(
                r#"<pre><code class="language-{}">"#,
                escape_attr(language)
            )),
            None => out.push_str("<pre><code>"),
        }

        if self.show_line_numbers {
            for (idx, line) in self.lines.iter().enumerate() {
                out.push_str(&format!(
                    r#"<span class="line" data-line="{}">{line}</span>"#,
                    idx + 1
                ));
                out.push('\n');
            }
        } else {
            out.push_str(&self.lines.join("\n"));
        }
        out.push_str("</code></pre></figure>");
    }
}

impl MathNode {
    fn write_html(&self, out: &mut String) {
        if self.inline {
            out.push_str(&format!(r#"<span class="math math-inline">{}</span>"#, self.html));
        } else {
            out.push_str(&format!(r#"<div class="math math-display">{}</div>"#, self.html));
        }
    }
}

impl BlockquoteNode {
    fn write_html(&self, out: &mut String) {
        out.push_str(if self.nested {
            "<blockquote>"
        } else {
            r#"<blockquote class="accent">"#
        });
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</blockquote>");
    }
}

impl StructureNode {
    fn write_html(&self, out: &mut String) {
        let content = escape_attr(&self.content);
        match (&self.url, &self.error) {
            (Some(url), _) => out.push_str(&format!(
                r#"<img class="structure" src="{}" alt="{content}">"#,
                escape_attr(url)
            )),
            (None, Some(error)) => out.push_str(&format!(
                r#"<code class="structure structure-error" title="{}">{}</code>"#,
                escape_attr(error),
                escape_html(&self.content)
            )),
            (None, None) => out.push_str(&format!(
                r#"<code class="structure structure-pending">{}</code>"#,
                escape_html(&self.content)
            )),
        }
    }
}
