//! Collaborator seams for syntax highlighting and math rendering.
//!
//! Both collaborators may fail; the pipeline catches every failure per unit
//! and falls back to the escaped source text, so one bad fragment never
//! breaks the document.

use crate::util::escape_html;

/// Error returned by a [`Highlighter`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum HighlightError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("highlighting failed: {0}")]
    Failed(String),
}

/// Error returned by a [`MathRenderer`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum MathError {
    #[error("invalid math: {0}")]
    Invalid(String),
    #[error("math rendering failed: {0}")]
    Failed(String),
}

/// Syntax highlighter used for fenced code blocks.
///
/// Implementations are called once per line and return markup for that line.
/// `language` is the fence's info string language. When it is `None`, or
/// names a language the highlighter does not know, implementations should
/// make a best guess rather than fail.
pub trait Highlighter: Send + Sync {
    fn highlight_line(&self, line: &str, language: Option<&str>) -> Result<String, HighlightError>;
}

/// Highlighter that only escapes the line.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeHighlighter;

impl Highlighter for EscapeHighlighter {
    fn highlight_line(&self, line: &str, _language: Option<&str>) -> Result<String, HighlightError> {
        Ok(escape_html(line))
    }
}

/// Renders LaTeX source, including its delimiters, to markup.
pub trait MathRenderer: Send + Sync {
    fn render(&self, source: &str, inline: bool) -> Result<String, MathError>;
}

/// Math renderer that emits the original delimited source as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralMath;

impl MathRenderer for LiteralMath {
    fn render(&self, source: &str, _inline: bool) -> Result<String, MathError> {
        Ok(escape_html(source))
    }
}

/// Highlight every line of `code`, escaping any line the highlighter fails on.
pub(crate) fn highlight_lines(
    highlighter: &dyn Highlighter,
    code: &str,
    language: Option<&str>,
) -> Vec<String> {
    code.split('\n')
        .map(|line| {
            highlighter
                .highlight_line(line, language)
                .unwrap_or_else(|error| {
                    tracing::warn!(%error, ?language, "highlighter failed, using plain text");
                    escape_html(line)
                })
        })
        .collect()
}

/// Render math, falling back to the escaped source on failure.
pub(crate) fn render_math(renderer: &dyn MathRenderer, source: &str, inline: bool) -> String {
    renderer.render(source, inline).unwrap_or_else(|error| {
        tracing::warn!(%error, "math renderer failed, using source text");
        escape_html(source)
    })
}
