//! Placeholder tokens and the typed component arena.
//!
//! Every extractor replaces the construct it recognizes with a placeholder
//! token of the form `{{KIND<N>}}` and stores the structured payload in a
//! [`ComponentMap`]. A single map is threaded through all passes of one
//! render call, so by the time the resolver runs it already holds the merged
//! payloads of every extractor.

use std::collections::HashMap;
use std::fmt;

/// Kind of an extracted component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ComponentKind {
    Table,
    Code,
    Math,
    Quote,
}

impl ComponentKind {
    const ALL: [Self; 4] = [Self::Table, Self::Code, Self::Math, Self::Quote];

    /// Token name used inside the placeholder braces.
    #[must_use]
    pub fn token_name(self) -> &'static str {
        match self {
            Self::Table => "TABLE",
            Self::Code => "CODE",
            Self::Math => "MATH",
            Self::Quote => "QUOTE",
        }
    }

    /// Parse a token name back into a kind.
    #[must_use]
    pub fn from_token_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.token_name() == name)
    }

    fn slot(self) -> usize {
        match self {
            Self::Table => 0,
            Self::Code => 1,
            Self::Math => 2,
            Self::Quote => 3,
        }
    }
}

/// A placeholder token standing in for an extracted component.
///
/// Displays as `{{KIND<N>}}`, e.g. `{{TABLE0}}`. The sequence number is
/// unique per kind within one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placeholder {
    pub kind: ComponentKind,
    pub seq: usize,
}

impl Placeholder {
    /// Try to parse a placeholder at the very start of `text`.
    ///
    /// Returns the placeholder and the number of bytes it spans.
    #[must_use]
    pub fn parse_prefix(text: &str) -> Option<(Self, usize)> {
        let rest = text.strip_prefix("{{")?;
        let name_len = rest.bytes().take_while(u8::is_ascii_uppercase).count();
        let kind = ComponentKind::from_token_name(&rest[..name_len])?;

        let digits = &rest[name_len..];
        let digit_len = digits.bytes().take_while(u8::is_ascii_digit).count();
        if digit_len == 0 {
            return None;
        }
        let seq = digits[..digit_len].parse().ok()?;

        if !digits[digit_len..].starts_with("}}") {
            return None;
        }

        Some((Self { kind, seq }, 2 + name_len + digit_len + 2))
    }

    /// Parse a string that consists of exactly one placeholder.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match Self::parse_prefix(text) {
            Some((placeholder, len)) if len == text.len() => Some(placeholder),
            _ => None,
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{{{}{}}}}}", self.kind.token_name(), self.seq)
    }
}

/// Stable index of a payload inside a [`ComponentMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ComponentId(usize);

/// Column alignment of a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// CSS `text-align` value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Extracted table.
///
/// `alignments` always has the same length as `headers`. Rows are raw cell
/// text and may be longer or shorter than the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePayload {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub alignments: Vec<Alignment>,
}

/// Extracted fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockPayload {
    pub code: String,
    pub language: Option<String>,
    pub filename: Option<String>,
    pub show_line_numbers: bool,
}

/// Extracted math span; `content` keeps its original delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathPayload {
    pub content: String,
    pub is_inline: bool,
}

/// One child of a quoted region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteNode {
    /// Inline-formatted markup for a span of quoted text.
    Text(String),
    /// Hard line break.
    Break,
    /// A component that was already extracted before the quote was scanned.
    Component(ComponentId),
    /// A deeper quote level.
    Quote(BlockquotePayload),
}

/// Extracted blockquote subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockquotePayload {
    /// `false` only for the outermost quote of a region.
    pub nested: bool,
    pub content: Vec<QuoteNode>,
}

/// Structured payload stored behind a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentPayload {
    Blockquote(BlockquotePayload),
    CodeBlock(CodeBlockPayload),
    Table(TablePayload),
    Math(MathPayload),
}

impl ComponentPayload {
    /// Kind of placeholder this payload is stored under.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Blockquote(_) => ComponentKind::Quote,
            Self::CodeBlock(_) => ComponentKind::Code,
            Self::Table(_) => ComponentKind::Table,
            Self::Math(_) => ComponentKind::Math,
        }
    }
}

/// Arena of extracted components for one render call.
#[derive(Debug, Default)]
pub struct ComponentMap {
    arena: Vec<ComponentPayload>,
    index: HashMap<Placeholder, ComponentId>,
    counters: [usize; 4],
}

impl ComponentMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a payload and return the placeholder that now stands for it.
    pub fn insert(&mut self, payload: ComponentPayload) -> Placeholder {
        let kind = payload.kind();
        let counter = &mut self.counters[kind.slot()];
        let placeholder = Placeholder {
            kind,
            seq: *counter,
        };
        *counter += 1;

        let id = ComponentId(self.arena.len());
        self.arena.push(payload);
        self.index.insert(placeholder, id);
        placeholder
    }

    /// Look up the id registered for a placeholder.
    #[must_use]
    pub fn id_of(&self, placeholder: &Placeholder) -> Option<ComponentId> {
        self.index.get(placeholder).copied()
    }

    /// Look up a payload by id.
    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<&ComponentPayload> {
        self.arena.get(id.0)
    }

    /// Look up a payload by placeholder.
    #[must_use]
    pub fn resolve(&self, placeholder: &Placeholder) -> Option<&ComponentPayload> {
        self.id_of(placeholder).and_then(|id| self.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}
