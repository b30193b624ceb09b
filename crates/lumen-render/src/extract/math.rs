//! LaTeX delimiter extraction.
//!
//! Only delimiter boundaries are detected; the content is never parsed. The
//! four delimiter styles run in a fixed order so that `$$` is consumed before
//! the single-dollar rule can see it.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::component::{ComponentMap, ComponentPayload, MathPayload};

static BLOCK_DOLLAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$(?s:.+?)\$\$").unwrap());

/// Single `$…$` not preceded by a backslash. The leading character is
/// captured so it can be written back.
static INLINE_DOLLAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<lead>^|[^\\])(?P<math>\$[^$\n]+?\$)").unwrap());

static BLOCK_BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\[(?s:.+?)\\\]").unwrap());

static INLINE_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\((?s:.+?)\\\)").unwrap());

static CODE_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`\n]+`").unwrap());

/// Replace every math span in `text` with a `{{MATH<N>}}` placeholder.
pub(crate) fn extract_math(text: &str, components: &mut ComponentMap) -> String {
    let text = replace_math(text, &BLOCK_DOLLAR_RE, false, components);
    let text = replace_math(&text, &INLINE_DOLLAR_RE, true, components);
    let text = replace_math(&text, &BLOCK_BRACKET_RE, false, components);
    replace_math(&text, &INLINE_PAREN_RE, true, components)
}

fn replace_math(
    text: &str,
    re: &Regex,
    is_inline: bool,
    components: &mut ComponentMap,
) -> String {
    let code_spans: Vec<Range<usize>> = CODE_SPAN_RE.find_iter(text).map(|m| m.range()).collect();
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for caps in re.captures_iter(text) {
        let Some(math) = caps.name("math").or_else(|| caps.get(0)) else {
            continue;
        };
        if code_spans
            .iter()
            .any(|span| span.start < math.end() && math.start() < span.end)
        {
            continue;
        }

        output.push_str(&text[last..math.start()]);
        let placeholder = components.insert(ComponentPayload::Math(MathPayload {
            content: math.as_str().to_owned(),
            is_inline,
        }));
        output.push_str(&placeholder.to_string());
        last = math.end();
    }

    output.push_str(&text[last..]);
    output
}
