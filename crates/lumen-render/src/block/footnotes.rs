//! Footnote collection and numbering.
//!
//! Numbers are assigned in first-reference order. A reference to an id
//! without a definition is not numbered and stays literal.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::inline::{InlineFormatter, Protected};

static DEFINITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\[\^([^\]\s]+)\]:[ \t]*(.*)$").unwrap());

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\^([^\]\s]+)\]").unwrap());

#[derive(Debug, Default)]
pub(super) struct Footnotes {
    definitions: HashMap<String, String>,
    /// Referenced ids, in the order they were first referenced.
    order: Vec<String>,
    numbers: HashMap<String, usize>,
    /// References seen so far per footnote number.
    seen: HashMap<usize, usize>,
}

impl Footnotes {
    /// Remove definition lines from `text` and remember their content.
    ///
    /// When an id is defined twice the first definition wins.
    pub(super) fn collect(text: &str) -> (Self, String) {
        let mut footnotes = Self::default();
        let text = DEFINITION_RE
            .replace_all(text, |caps: &Captures<'_>| {
                footnotes
                    .definitions
                    .entry(caps[1].to_owned())
                    .or_insert_with(|| caps[2].trim().to_owned());
                ""
            })
            .into_owned();
        (footnotes, text)
    }

    /// Replace every reference to a defined footnote with a numbered,
    /// protected superscript link.
    pub(super) fn link_references(&mut self, text: &str, protected: &mut Protected) -> String {
        REFERENCE_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let id = &caps[1];
                if !self.definitions.contains_key(id) {
                    return caps[0].to_owned();
                }

                let number = self.number_for(id);
                let count = self.seen.entry(number).or_insert(0);
                *count += 1;
                let anchor = if *count == 1 {
                    format!("fnref-{number}")
                } else {
                    format!("fnref-{number}-{count}")
                };

                protected.protect_html(format!(
                    r##"<sup class="footnote-ref"><a href="#fn-{number}" id="{anchor}">{number}</a></sup>"##
                ))
            })
            .into_owned()
    }

    fn number_for(&mut self, id: &str) -> usize {
        if let Some(&number) = self.numbers.get(id) {
            return number;
        }
        self.order.push(id.to_owned());
        let number = self.order.len();
        self.numbers.insert(id.to_owned(), number);
        number
    }

    /// Render the footnotes section, or `None` when nothing was referenced.
    pub(super) fn render(
        &self,
        formatter: &InlineFormatter,
        protected: &mut Protected,
    ) -> Option<String> {
        if self.order.is_empty() {
            return None;
        }

        let mut html = String::from("<section class=\"footnotes\">\n<ol>\n");
        for (idx, id) in self.order.iter().enumerate() {
            let number = idx + 1;
            let definition = self.definitions.get(id).map_or("", String::as_str);
            let body = protected.protect_code_spans(definition);
            let body = formatter.format_protected(&body, protected);
            html.push_str(&format!(
                r##"<li id="fn-{number}">{body} <a href="#fnref-{number}" class="footnote-backref">↩</a></li>"##
            ));
            html.push('\n');
        }
        html.push_str("</ol>\n</section>");
        Some(html)
    }
}
