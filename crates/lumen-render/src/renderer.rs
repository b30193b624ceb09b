//! Render entry point and options.

use std::sync::Arc;

use crate::block::transform_blocks;
use crate::collab::{EscapeHighlighter, Highlighter, MathRenderer};
use crate::component::ComponentMap;
use crate::extract::{extract_blockquotes, extract_code_blocks, extract_math, extract_tables};
use crate::inline::InlineFormatter;
use crate::resolve::Resolver;
use crate::sanitize::{SanitizeMode, Sanitizer};
use crate::segment::escape_literal_placeholders;
use crate::tree::{RenderTree, Theme};

/// Options for a [`Renderer`].
///
/// Math extraction runs only when a math renderer is configured.
#[derive(Clone)]
pub struct RenderOptions {
    pub theme: Theme,
    pub math: Option<Arc<dyn MathRenderer>>,
    pub highlighter: Arc<dyn Highlighter>,
    pub sanitize: SanitizeMode,
    /// Host of the site the output is served from, for external link
    /// detection.
    pub current_host: Option<String>,
    /// Show line numbers on code blocks that do not ask for them.
    pub line_numbers_default: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            math: None,
            highlighter: Arc::new(EscapeHighlighter),
            sanitize: SanitizeMode::default(),
            current_host: None,
            line_numbers_default: false,
        }
    }
}

impl std::fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOptions")
            .field("theme", &self.theme)
            .field("math", &self.math.is_some())
            .field("sanitize", &self.sanitize)
            .field("current_host", &self.current_host)
            .field("line_numbers_default", &self.line_numbers_default)
            .finish_non_exhaustive()
    }
}

impl RenderOptions {
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Enable math extraction with the given renderer.
    #[must_use]
    pub fn with_math(mut self, math: impl MathRenderer + 'static) -> Self {
        self.math = Some(Arc::new(math));
        self
    }

    #[must_use]
    pub fn with_highlighter(mut self, highlighter: impl Highlighter + 'static) -> Self {
        self.highlighter = Arc::new(highlighter);
        self
    }

    #[must_use]
    pub fn with_sanitize(mut self, sanitize: SanitizeMode) -> Self {
        self.sanitize = sanitize;
        self
    }

    #[must_use]
    pub fn with_current_host(mut self, host: impl Into<String>) -> Self {
        self.current_host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_line_numbers(mut self, enabled: bool) -> Self {
        self.line_numbers_default = enabled;
        self
    }
}

/// Markdown renderer.
///
/// Holds the options and the sanitizer so both are built once and reused
/// across documents.
///
/// # Example
///
/// ```
/// use lumen_render::{RenderNode, RenderOptions, Renderer};
///
/// let renderer = Renderer::new(RenderOptions::default());
/// let tree = renderer.render("Hello **world**").unwrap();
///
/// assert_eq!(
///     tree.nodes,
///     vec![RenderNode::Html("<p>Hello <strong>world</strong></p>".to_owned())]
/// );
/// ```
pub struct Renderer {
    options: RenderOptions,
    formatter: InlineFormatter,
    sanitizer: Sanitizer,
}

impl Renderer {
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        let formatter = match &options.current_host {
            Some(host) => InlineFormatter::new().with_current_host(host.clone()),
            None => InlineFormatter::new(),
        };
        Self {
            options,
            formatter,
            sanitizer: Sanitizer::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render a document, or return `None` when it has no content.
    ///
    /// Never fails: malformed constructs stay literal text and collaborator
    /// failures fall back to escaped source.
    #[must_use]
    pub fn render(&self, content: &str) -> Option<RenderTree> {
        if content.trim().is_empty() {
            return None;
        }
        let content = content.replace("\r\n", "\n");
        let content = escape_literal_placeholders(&content);

        let mut components = ComponentMap::new();
        let text = extract_tables(&content, &mut components);
        let text = extract_code_blocks(&text, &mut components, self.options.line_numbers_default);
        let text = if self.options.math.is_some() {
            extract_math(&text, &mut components)
        } else {
            text
        };
        let text = extract_blockquotes(&text, &mut components, &self.formatter);

        let html = transform_blocks(&text, &components, &self.formatter);
        let html = match self.options.sanitize {
            SanitizeMode::Sanitized => self.sanitizer.clean(&html),
            SanitizeMode::Trusted => html,
        };

        let resolver = Resolver {
            components: &components,
            options: &self.options,
            formatter: &self.formatter,
            sanitizer: &self.sanitizer,
        };
        let nodes = resolver.resolve(&html);
        tracing::debug!(
            components = components.len(),
            nodes = nodes.len(),
            "rendered document"
        );

        Some(RenderTree { nodes })
    }

    /// Render straight to HTML using the configured theme.
    #[must_use]
    pub fn render_html(&self, content: &str) -> Option<String> {
        self.render(content)
            .map(|tree| tree.to_html(self.options.theme))
    }
}
