//! Markdown rendering into a structured render tree.
//!
//! Block constructs (tables, fenced code, math and blockquotes) are extracted
//! into typed payloads behind `{{KIND<N>}}` placeholders, the remaining text
//! is transformed block by block, sanitized, and finally split on the
//! placeholders to build a [`RenderTree`].
//!
//! ```
//! use lumen_render::{RenderOptions, Renderer};
//!
//! let renderer = Renderer::new(RenderOptions::default());
//! assert!(renderer.render("").is_none());
//! ```

mod block;
mod collab;
mod component;
mod extract;
mod inline;
mod lines;
mod renderer;
mod resolve;
mod sanitize;
mod segment;
mod tree;
mod util;

pub use collab::{EscapeHighlighter, HighlightError, Highlighter, LiteralMath, MathError, MathRenderer};
pub use component::{
    Alignment, BlockquotePayload, CodeBlockPayload, ComponentId, ComponentKind, ComponentMap,
    ComponentPayload, MathPayload, Placeholder, QuoteNode, TablePayload,
};
pub use inline::InlineFormatter;
pub use renderer::{RenderOptions, Renderer};
pub use sanitize::{SanitizeMode, Sanitizer};
pub use tree::{
    BlockquoteNode, CodeNode, MathNode, RenderNode, RenderTree, StructureNode, TableNode, Theme,
};
pub use util::{escape_html, slugify};
