//! Pipe table extraction.
//!
//! A table starts at a line containing `|` that is immediately followed by a
//! separator line (`|`, `:`, `-` and whitespace only). Body rows continue for
//! as long as lines keep containing `|`. Lines inside fenced code blocks are
//! never considered, so pipe-heavy code keeps its fence intact for the
//! code-fence pass.

use crate::component::{Alignment, ComponentMap, ComponentPayload, TablePayload};
use crate::lines::{FenceTracker, quote_depth, split_quote_prefix};

/// Replace every table in `text` with a `{{TABLE<N>}}` placeholder.
pub(crate) fn extract_tables(text: &str, components: &mut ComponentMap) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut output: Vec<String> = Vec::with_capacity(lines.len());
    let mut fence = FenceTracker::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let is_fence_marker = fence.update(line);
        if is_fence_marker || fence.in_fence() {
            output.push(line.to_owned());
            i += 1;
            continue;
        }

        if let Some(table) = parse_table(&lines[i..]) {
            let placeholder = components.insert(ComponentPayload::Table(table.payload));
            output.push(format!("{}{placeholder}", table.prefix));
            i += table.consumed;
        } else {
            output.push(line.to_owned());
            i += 1;
        }
    }

    output.join("\n")
}

struct ParsedTable<'a> {
    payload: TablePayload,
    /// Quote prefix of the header line, re-emitted before the placeholder.
    prefix: &'a str,
    /// Number of lines consumed, including skipped empty rows.
    consumed: usize,
}

fn parse_table<'a>(lines: &[&'a str]) -> Option<ParsedTable<'a>> {
    let (prefix, header_line) = split_quote_prefix(strip_cr(lines.first()?));
    if !has_delimiter(header_line) {
        return None;
    }

    let depth = quote_depth(prefix);
    let (separator_prefix, separator_line) = split_quote_prefix(strip_cr(lines.get(1)?));
    if quote_depth(separator_prefix) != depth || !is_separator(separator_line) {
        return None;
    }

    let headers = split_cells(header_line);
    if headers.iter().all(String::is_empty) {
        return None;
    }

    let mut alignments: Vec<Alignment> = split_cells(separator_line)
        .iter()
        .map(|token| parse_alignment(token))
        .collect();
    alignments.resize(headers.len(), Alignment::Left);

    let mut rows = Vec::new();
    let mut consumed = 2;
    for line in &lines[2..] {
        let (row_prefix, row_line) = split_quote_prefix(strip_cr(line));
        if quote_depth(row_prefix) != depth || !has_delimiter(row_line) {
            break;
        }
        consumed += 1;

        let cells = split_cells(row_line);
        if cells.iter().any(|cell| !cell.is_empty()) {
            rows.push(cells);
        }
    }

    Some(ParsedTable {
        payload: TablePayload {
            headers,
            rows,
            alignments,
        },
        prefix,
        consumed,
    })
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// Whether the line contains an unescaped `|`.
fn has_delimiter(line: &str) -> bool {
    let mut escaped = false;
    for c in line.chars() {
        match c {
            '\\' if !escaped => escaped = true,
            '|' if !escaped => return true,
            _ => escaped = false,
        }
    }
    false
}

fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.contains('|')
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| matches!(c, '|' | ':' | '-' | ' ' | '\t'))
}

/// Split a row into trimmed cells.
///
/// One leading and one trailing pipe are treated as row borders. `\|` is a
/// literal pipe inside a cell, and so is any pipe inside a closed code span.
fn split_cells(line: &str) -> Vec<String> {
    let mut body = line.trim();
    body = body.strip_prefix('|').unwrap_or(body);
    if body.ends_with('|') && !body.ends_with("\\|") {
        body = &body[..body.len() - 1];
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_code = false;
    let mut chars = body.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' if chars.peek().is_some_and(|&(_, next)| next == '|') => {
                current.push('|');
                chars.next();
            }
            '`' => {
                in_code = !in_code && body[idx + 1..].contains('`');
                current.push(c);
            }
            '|' if !in_code => cells.push(std::mem::take(&mut current).trim().to_owned()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_owned());

    if cells.len() == 1 && cells[0].is_empty() {
        cells.clear();
    }
    cells
}

fn parse_alignment(token: &str) -> Alignment {
    let starts = token.starts_with(':');
    let ends = token.ends_with(':') && token.len() > 1;
    match (starts, ends) {
        (true, true) => Alignment::Center,
        (false, true) => Alignment::Right,
        _ => Alignment::Left,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Placeholder;
    use pretty_assertions::assert_eq;

    fn table_at(components: &ComponentMap, token: &str) -> TablePayload {
        match components.resolve(&Placeholder::parse(token).unwrap()) {
            Some(ComponentPayload::Table(table)) => table.clone(),
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_basic_table() {
        let mut components = ComponentMap::new();
        let text = "before\n| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\nafter";
        let output = extract_tables(text, &mut components);

        assert_eq!(output, "before\n{{TABLE0}}\nafter");
        let table = table_at(&components, "{{TABLE0}}");
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_alignments() {
        let mut components = ComponentMap::new();
        extract_tables("| a | b | c |\n|:---|:---:|---:|", &mut components);
        let table = table_at(&components, "{{TABLE0}}");
        assert_eq!(
            table.alignments,
            vec![Alignment::Left, Alignment::Center, Alignment::Right]
        );
    }

    #[test]
    fn test_alignments_follow_header_length() {
        let mut components = ComponentMap::new();
        extract_tables(
            "| a | b |\n|:---|:---:|---:|\n\n| x | y | z | w |\n|---:|---|",
            &mut components,
        );

        let short = table_at(&components, "{{TABLE0}}");
        assert_eq!(short.alignments, vec![Alignment::Left, Alignment::Center]);

        let long = table_at(&components, "{{TABLE1}}");
        assert_eq!(
            long.alignments,
            vec![
                Alignment::Right,
                Alignment::Left,
                Alignment::Left,
                Alignment::Left
            ]
        );
    }

    #[test]
    fn test_empty_rows_skipped_but_consumed() {
        let mut components = ComponentMap::new();
        let output = extract_tables("| a |\n|---|\n|  |\n| 1 |\ntail", &mut components);
        assert_eq!(output, "{{TABLE0}}\ntail");
        assert_eq!(table_at(&components, "{{TABLE0}}").rows, vec![vec!["1"]]);
    }

    #[test]
    fn test_ragged_rows_kept() {
        let mut components = ComponentMap::new();
        extract_tables("| a | b |\n|---|---|\n| 1 |\n| 1 | 2 | 3 |", &mut components);
        let table = table_at(&components, "{{TABLE0}}");
        assert_eq!(table.rows, vec![vec!["1"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_escaped_pipe_in_cell() {
        let mut components = ComponentMap::new();
        extract_tables("| expr |\n|---|\n| a \\| b |", &mut components);
        assert_eq!(
            table_at(&components, "{{TABLE0}}").rows,
            vec![vec!["a | b"]]
        );
    }

    #[test]
    fn test_pipe_inside_code_span_stays_in_cell() {
        let mut components = ComponentMap::new();
        extract_tables(
            "| expr | note |\n|---|---|\n| `x|y` | or |\n| a` | b |",
            &mut components,
        );
        assert_eq!(
            table_at(&components, "{{TABLE0}}").rows,
            vec![vec!["`x|y`", "or"], vec!["a`", "b"]]
        );
    }

    #[test]
    fn test_pipe_without_separator_is_text() {
        let mut components = ComponentMap::new();
        let text = "a | b\nc | d";
        assert_eq!(extract_tables(text, &mut components), text);
        assert!(components.is_empty());
    }

    #[test]
    fn test_table_inside_fence_untouched() {
        let mut components = ComponentMap::new();
        let text = "```\n| a | b |\n|---|---|\n| 1 | 2 |\n```";
        assert_eq!(extract_tables(text, &mut components), text);
        assert!(components.is_empty());
    }

    #[test]
    fn test_quoted_table_keeps_prefix() {
        let mut components = ComponentMap::new();
        let output = extract_tables("> | a |\n> |---|\n> | 1 |\n> after", &mut components);
        assert_eq!(output, "> {{TABLE0}}\n> after");
        assert_eq!(table_at(&components, "{{TABLE0}}").rows, vec![vec!["1"]]);
    }

    #[test]
    fn test_idempotent_on_placeholders() {
        let mut components = ComponentMap::new();
        let first = extract_tables("| a |\n|---|\n| 1 |", &mut components);
        let second = extract_tables(&first, &mut components);
        assert_eq!(first, second);
        assert_eq!(components.len(), 1);
    }
}
