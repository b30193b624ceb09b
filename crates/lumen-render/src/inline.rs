//! Inline formatting of single lines and fragments.
//!
//! Escaped characters and code spans are swapped for private-use tokens
//! before any rule runs, so nothing inside them is ever reinterpreted. Link
//! and image targets are protected the same way, which keeps `_` and `*` in
//! URLs away from the emphasis rules. Tokens are restored after all rules.
//!
//! Plain text is not escaped here; the sanitizer owns that. Attribute values
//! and code span contents are escaped because they are emitted as markup.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::sanitize::is_safe_url;
use crate::util::{escape_attr, escape_html};

const TOKEN_START: char = '\u{E000}';
const TOKEN_END: char = '\u{E001}';

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E000}(\d+)\x{E001}").unwrap());

/// Backslash followed by ASCII punctuation.
static ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([!-/:-@\[-`{-~])").unwrap());

static DOUBLE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"``(.+?)``").unwrap());
static SINGLE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());

/// `](target "title")` right after a bracketed label.
static TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\]\((?P<url>[^()\s]*)(?:\s+"(?P<title>[^"\n]*)")?\)"#).unwrap()
});

static BOLD_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(\S(?:.*?\S)?)\*\*").unwrap());
static BOLD_UNDERSCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(\S(?:.*?\S)?)__").unwrap());
static ITALIC_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(\S(?:[^*\n]*?\S)?)\*").unwrap());
static ITALIC_UNDERSCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_(\S(?:[^_\n]*?\S)?)_\b").unwrap());
static STRIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~(\S(?:.*?\S)?)~~").unwrap());
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[(?P<alt>[^\[\]\n]*)\]\(\x{E000}(?P<idx>\d+)\x{E001}\)").unwrap()
});
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?P<text>[^\[\]\n]+)\]\(\x{E000}(?P<idx>\d+)\x{E001}\)").unwrap()
});
static KBD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[([^\[\]\n]+)\]\]").unwrap());

/// Parsed link or image target.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LinkTarget {
    url: String,
    title: Option<String>,
}

#[derive(Debug)]
struct Protection {
    /// Markup emitted when the token is restored.
    html: String,
    /// Source text, used when the token ends up inside a code span.
    raw: String,
    /// Plain value, used inside URLs and titles.
    literal: String,
    target: Option<LinkTarget>,
}

/// Spans swapped out of the text while inline rules run.
#[derive(Debug, Default)]
pub(crate) struct Protected {
    entries: Vec<Protection>,
}

impl Protected {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, protection: Protection) -> String {
        let idx = self.entries.len();
        self.entries.push(protection);
        format!("{TOKEN_START}{idx}{TOKEN_END}")
    }

    /// Replace every backslash-escaped punctuation character with a token.
    pub(crate) fn protect_escapes(&mut self, text: &str) -> String {
        ESCAPE_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let c = &caps[1];
                self.push(Protection {
                    html: escape_html(c),
                    raw: caps[0].to_owned(),
                    literal: c.to_owned(),
                    target: None,
                })
            })
            .into_owned()
    }

    /// Replace every inline code span with a token holding its `<code>` markup.
    pub(crate) fn protect_code_spans(&mut self, text: &str) -> String {
        let text = DOUBLE_CODE_RE
            .replace_all(text, |caps: &Captures<'_>| self.code_span(caps))
            .into_owned();
        SINGLE_CODE_RE
            .replace_all(&text, |caps: &Captures<'_>| self.code_span(caps))
            .into_owned()
    }

    fn code_span(&mut self, caps: &Captures<'_>) -> String {
        let content = self.restore_raw(&caps[1]);
        let content = match content.strip_prefix(' ').and_then(|c| c.strip_suffix(' ')) {
            Some(inner) if !inner.trim().is_empty() => inner.to_owned(),
            _ => content,
        };
        let raw = self.restore_raw(&caps[0]);
        self.push(Protection {
            html: format!("<code>{}</code>", escape_html(&content)),
            literal: raw.clone(),
            raw,
            target: None,
        })
    }

    /// Protect a finished markup fragment from all later rules.
    pub(crate) fn protect_html(&mut self, html: String) -> String {
        let raw = html.clone();
        self.push(Protection {
            literal: raw.clone(),
            html,
            raw,
            target: None,
        })
    }

    fn protect_targets(&mut self, text: &str) -> String {
        TARGET_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let inner = &caps[0][2..caps[0].len() - 1];
                let target = LinkTarget {
                    url: self.restore_literal(caps.name("url").map_or("", |m| m.as_str())),
                    title: caps.name("title").map(|m| self.restore_literal(m.as_str())),
                };
                let token = self.push(Protection {
                    html: inner.to_owned(),
                    raw: inner.to_owned(),
                    literal: inner.to_owned(),
                    target: Some(target),
                });
                format!("]({token})")
            })
            .into_owned()
    }

    fn target(&self, idx: &str) -> Option<&LinkTarget> {
        let idx: usize = idx.parse().ok()?;
        self.entries.get(idx)?.target.as_ref()
    }

    /// Put back the markup of every token.
    pub(crate) fn restore(&self, text: &str) -> String {
        self.restore_with(text, |p| &p.html)
    }

    fn restore_raw(&self, text: &str) -> String {
        self.restore_with(text, |p| &p.raw)
    }

    fn restore_literal(&self, text: &str) -> String {
        self.restore_with(text, |p| &p.literal)
    }

    fn restore_with(&self, text: &str, pick: impl Fn(&Protection) -> &str) -> String {
        let mut current = text.to_owned();
        // Protected spans can hold tokens of earlier spans; each round peels
        // one layer.
        for _ in 0..=self.entries.len() {
            if !current.contains(TOKEN_START) {
                break;
            }
            current = TOKEN_RE
                .replace_all(&current, |caps: &Captures<'_>| {
                    caps[1]
                        .parse::<usize>()
                        .ok()
                        .and_then(|idx| self.entries.get(idx))
                        .map_or_else(|| caps[0].to_owned(), |p| pick(p).to_owned())
                })
                .into_owned();
        }
        current
    }
}

/// Converts inline markdown into markup fragments.
#[derive(Debug, Clone, Default)]
pub struct InlineFormatter {
    current_host: Option<String>,
}

impl InlineFormatter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Links to any other host are treated as external.
    #[must_use]
    pub fn with_current_host(mut self, host: impl Into<String>) -> Self {
        self.current_host = Some(host.into());
        self
    }

    /// Format one fragment of inline markdown.
    #[must_use]
    pub fn format(&self, text: &str) -> String {
        let mut protected = Protected::new();
        let text = protected.protect_escapes(text);
        let text = protected.protect_code_spans(&text);
        let text = self.format_protected(&text, &mut protected);
        protected.restore(&text)
    }

    /// Apply the inline rules to text whose escapes and code spans are
    /// already protected. Tokens are left in place for the caller to restore.
    pub(crate) fn format_protected(&self, text: &str, protected: &mut Protected) -> String {
        let text = protected.protect_targets(text);

        let text = BOLD_STAR_RE.replace_all(&text, "<strong>$1</strong>");
        let text = BOLD_UNDERSCORE_RE.replace_all(&text, "<strong>$1</strong>");
        let text = ITALIC_STAR_RE.replace_all(&text, "<em>$1</em>");
        let text = ITALIC_UNDERSCORE_RE.replace_all(&text, "<em>$1</em>");
        let text = STRIKE_RE.replace_all(&text, "<del>$1</del>");

        let protected = &*protected;
        let text = IMAGE_RE.replace_all(&text, |caps: &Captures<'_>| {
            match protected.target(&caps["idx"]) {
                Some(target) if is_safe_url(&target.url) => format!(
                    r#"<img src="{}" alt="{}"{}>"#,
                    escape_attr(&target.url),
                    escape_attr(&caps["alt"]),
                    title_attr(target.title.as_deref()),
                ),
                _ => caps[0].to_owned(),
            }
        });
        let text = LINK_RE.replace_all(&text, |caps: &Captures<'_>| {
            match protected.target(&caps["idx"]) {
                Some(target) if is_safe_url(&target.url) => {
                    let external = if self.is_external(&target.url) {
                        r#" target="_blank" rel="noopener noreferrer""#
                    } else {
                        ""
                    };
                    format!(
                        r#"<a href="{}"{}{external}>{}</a>"#,
                        escape_attr(&target.url),
                        title_attr(target.title.as_deref()),
                        &caps["text"],
                    )
                }
                _ => caps[0].to_owned(),
            }
        });

        KBD_RE
            .replace_all(&text, |caps: &Captures<'_>| {
                caps[1]
                    .split('+')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(|key| format!("<kbd>{key}</kbd>"))
                    .collect::<Vec<_>>()
                    .join("+")
            })
            .into_owned()
    }

    /// Absolute `http(s)` or protocol-relative URL pointing at another host.
    fn is_external(&self, url: &str) -> bool {
        let Some(rest) = strip_prefix_ignore_case(url, "https://")
            .or_else(|| strip_prefix_ignore_case(url, "http://"))
            .or_else(|| url.strip_prefix("//"))
        else {
            return false;
        };

        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let host = host_without_port(authority.rsplit('@').next().unwrap_or(authority));

        self.current_host
            .as_deref()
            .is_none_or(|current| !host.eq_ignore_ascii_case(host_without_port(current)))
    }
}

fn title_attr(title: Option<&str>) -> String {
    title.map_or_else(String::new, |t| format!(r#" title="{}""#, escape_attr(t)))
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

fn host_without_port(authority: &str) -> &str {
    authority.split(':').next().unwrap_or(authority)
}
