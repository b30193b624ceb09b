//! Fenced code block extraction.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::component::{CodeBlockPayload, ComponentMap, ComponentPayload};
use crate::lines::split_quote_prefix;

/// Opening fence at a line start (optionally quoted), language, optional
/// `filename="…"`, remaining info string, body, and the first closing fence
/// made of the same character.
fn fence_regex(fence: &str) -> Regex {
    Regex::new(&format!(
        r#"(?m)^(?P<prefix>[ \t]*(?:>[ \t]?)*){fence}(?P<lang>[\w+#.-]+)?(?:[ \t]+filename="(?P<filename>[^"\n]*)")?(?P<info>[^\n]*)\n(?P<body>(?s:.*?))^[ \t]*(?:>[ \t]?)*{fence}[ \t]*$"#
    ))
    .unwrap()
}

static BACKTICK_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| fence_regex("```"));
static TILDE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| fence_regex("~~~"));

/// Replace every fenced code block in `text` with a `{{CODE<N>}}` placeholder.
///
/// Backtick and tilde fences are both recognized; whichever opens first wins,
/// so a fence of one kind nested in the other stays part of its body.
/// `line_numbers_default` applies when the info string does not request
/// line numbers explicitly.
pub(crate) fn extract_code_blocks(
    text: &str,
    components: &mut ComponentMap,
    line_numbers_default: bool,
) -> String {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(caps) = next_fence(text, cursor) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        output.push_str(&text[cursor..whole.start()]);
        output.push_str(&replace_fence(&caps, components, line_numbers_default));
        cursor = whole.end();
    }

    output.push_str(&text[cursor..]);
    output
}

fn next_fence(text: &str, start: usize) -> Option<Captures<'_>> {
    [&*BACKTICK_FENCE_RE, &*TILDE_FENCE_RE]
        .into_iter()
        .filter_map(|re| re.captures_at(text, start))
        .min_by_key(|caps| caps.get(0).map_or(usize::MAX, |m| m.start()))
}

fn replace_fence(
    caps: &Captures<'_>,
    components: &mut ComponentMap,
    line_numbers_default: bool,
) -> String {
    let prefix = caps.name("prefix").map_or("", |m| m.as_str());
    let body = caps.name("body").map_or("", |m| m.as_str());
    let info = caps.name("info").map_or("", |m| m.as_str());

    let code = if prefix.contains('>') {
        unquote_body(body)
    } else {
        body.to_owned()
    };

    let payload = CodeBlockPayload {
        code: code.trim().to_owned(),
        language: caps.name("lang").map(|m| m.as_str().to_owned()),
        filename: caps.name("filename").map(|m| m.as_str().to_owned()),
        show_line_numbers: line_numbers_default || wants_line_numbers(info),
    };
    let placeholder = components.insert(ComponentPayload::CodeBlock(payload));
    format!("{prefix}{placeholder}")
}

fn unquote_body(body: &str) -> String {
    body.split('\n')
        .map(|line| split_quote_prefix(line).1)
        .collect::<Vec<_>>()
        .join("\n")
}

fn wants_line_numbers(info: &str) -> bool {
    info.split_whitespace()
        .any(|flag| matches!(flag, "showLineNumbers" | "{linenos}" | "linenos"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Placeholder;
    use pretty_assertions::assert_eq;

    fn code_at(components: &ComponentMap, token: &str) -> CodeBlockPayload {
        match components.resolve(&Placeholder::parse(token).unwrap()) {
            Some(ComponentPayload::CodeBlock(code)) => code.clone(),
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn test_basic_fence() {
        let mut components = ComponentMap::new();
        let output = extract_code_blocks(
            "intro\n```rust\nfn main() {}\n```\noutro",
            &mut components,
            false,
        );

        assert_eq!(output, "intro\n{{CODE0}}\noutro");
        let code = code_at(&components, "{{CODE0}}");
        assert_eq!(code.code, "fn main() {}");
        assert_eq!(code.language.as_deref(), Some("rust"));
        assert_eq!(code.filename, None);
        assert!(!code.show_line_numbers);
    }

    #[test]
    fn test_filename_and_line_numbers() {
        let mut components = ComponentMap::new();
        extract_code_blocks(
            "```python filename=\"calc.py\" showLineNumbers\nprint(1)\n```",
            &mut components,
            false,
        );
        let code = code_at(&components, "{{CODE0}}");
        assert_eq!(code.language.as_deref(), Some("python"));
        assert_eq!(code.filename.as_deref(), Some("calc.py"));
        assert!(code.show_line_numbers);
    }

    #[test]
    fn test_no_language() {
        let mut components = ComponentMap::new();
        extract_code_blocks("```\n  plain\n```", &mut components, true);
        let code = code_at(&components, "{{CODE0}}");
        assert_eq!(code.language, None);
        assert_eq!(code.code, "plain");
        assert!(code.show_line_numbers);
    }

    #[test]
    fn test_first_closing_fence_wins() {
        let mut components = ComponentMap::new();
        let output = extract_code_blocks("```\na\n```\nmiddle\n```\nb\n```", &mut components, false);
        assert_eq!(output, "{{CODE0}}\nmiddle\n{{CODE1}}");
        assert_eq!(code_at(&components, "{{CODE0}}").code, "a");
        assert_eq!(code_at(&components, "{{CODE1}}").code, "b");
    }

    #[test]
    fn test_unterminated_fence_left_alone() {
        let mut components = ComponentMap::new();
        let text = "```rust\nfn main() {}";
        assert_eq!(extract_code_blocks(text, &mut components, false), text);
        assert!(components.is_empty());
    }

    #[test]
    fn test_pipes_inside_code_stay_code() {
        let mut components = ComponentMap::new();
        extract_code_blocks("```\n| a | b |\n|---|---|\n```", &mut components, false);
        assert_eq!(code_at(&components, "{{CODE0}}").code, "| a | b |\n|---|---|");
    }

    #[test]
    fn test_quoted_fence() {
        let mut components = ComponentMap::new();
        let output = extract_code_blocks("> ```js\n> let x = 1;\n> ```", &mut components, false);
        assert_eq!(output, "> {{CODE0}}");
        assert_eq!(code_at(&components, "{{CODE0}}").code, "let x = 1;");
    }

    #[test]
    fn test_tilde_fence() {
        let mut components = ComponentMap::new();
        let output = extract_code_blocks(
            "~~~toml\n# comment\n| a |\n~~~\nafter",
            &mut components,
            false,
        );
        assert_eq!(output, "{{CODE0}}\nafter");
        let code = code_at(&components, "{{CODE0}}");
        assert_eq!(code.code, "# comment\n| a |");
        assert_eq!(code.language.as_deref(), Some("toml"));
    }

    #[test]
    fn test_backticks_inside_tilde_fence_are_body() {
        let mut components = ComponentMap::new();
        let output = extract_code_blocks(
            "~~~markdown\n```rust\nlet x = 1;\n```\n~~~",
            &mut components,
            false,
        );
        assert_eq!(output, "{{CODE0}}");
        assert_eq!(components.len(), 1);
        assert_eq!(
            code_at(&components, "{{CODE0}}").code,
            "```rust\nlet x = 1;\n```"
        );
    }

    #[test]
    fn test_tilde_fence_not_closed_by_backticks() {
        let mut components = ComponentMap::new();
        let text = "~~~\ncode\n```";
        assert_eq!(extract_code_blocks(text, &mut components, false), text);
        assert!(components.is_empty());
    }

    #[test]
    fn test_idempotent_on_placeholders() {
        let mut components = ComponentMap::new();
        let once = extract_code_blocks("a\n```\nx\n```\nb", &mut components, false);
        let twice = extract_code_blocks(&once, &mut components, false);

        assert_eq!(twice, once);
        assert_eq!(components.len(), 1);
    }

    #[test]
    fn test_empty_body() {
        let mut components = ComponentMap::new();
        let output = extract_code_blocks("```\n```", &mut components, false);
        assert_eq!(output, "{{CODE0}}");
        assert_eq!(code_at(&components, "{{CODE0}}").code, "");
    }
}
