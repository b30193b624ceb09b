//! Allow-list HTML sanitization.
//!
//! Built on `ammonia`. Only the tags, attributes and URL schemes the pipeline
//! itself emits survive; everything else the author wrote as raw HTML is
//! stripped. Placeholder tokens are plain text and pass through untouched.

use std::collections::{HashMap, HashSet};

use ammonia::{Builder, UrlRelative};

/// Whether rendered markup is passed through the sanitizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SanitizeMode {
    /// Strip everything outside the allow-lists.
    #[default]
    Sanitized,
    /// Emit markup as produced; the caller sanitizes further downstream.
    Trusted,
}

/// URL schemes links and images may use. Relative URLs are always allowed.
const URL_SCHEMES: [&str; 4] = ["http", "https", "mailto", "tel"];

const TAGS: [&str; 32] = [
    "a",
    "blockquote",
    "br",
    "code",
    "del",
    "div",
    "em",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "img",
    "input",
    "kbd",
    "li",
    "ol",
    "p",
    "pre",
    "s",
    "section",
    "span",
    "strong",
    "sub",
    "sup",
    "table",
    "tbody",
    "td",
    "th",
    "ul",
];

/// Allow-list sanitizer for rendered fragments.
pub struct Sanitizer {
    builder: Builder<'static>,
}

impl Sanitizer {
    #[must_use]
    pub fn new() -> Self {
        let mut tag_attributes: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
        tag_attributes.insert("a", HashSet::from(["href", "title", "target", "rel"]));
        tag_attributes.insert("img", HashSet::from(["src", "alt", "title", "width", "height"]));
        tag_attributes.insert("input", HashSet::from(["type", "checked", "disabled"]));
        tag_attributes.insert("ol", HashSet::from(["start"]));

        let mut builder = Builder::empty();
        builder
            .tags(TAGS.into_iter().collect())
            .tag_attributes(tag_attributes)
            .generic_attributes(HashSet::from(["class", "id"]))
            .url_schemes(URL_SCHEMES.into_iter().collect())
            .url_relative(UrlRelative::PassThrough)
            .link_rel(None)
            .clean_content_tags(HashSet::from(["script", "style"]));

        Self { builder }
    }

    /// Strip everything outside the allow-lists from an HTML fragment.
    #[must_use]
    pub fn clean(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a link or image target uses an allowed scheme.
///
/// URLs without a scheme (relative paths, fragments, protocol-relative
/// URLs) are allowed.
pub(crate) fn is_safe_url(url: &str) -> bool {
    let url = url.trim();
    let Some(colon) = url.find(':') else {
        return true;
    };

    let scheme = &url[..colon];
    let looks_like_scheme = scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !looks_like_scheme {
        return true;
    }

    URL_SCHEMES
        .iter()
        .any(|allowed| scheme.eq_ignore_ascii_case(allowed))
}
