//! Flat list aggregation.

use std::sync::LazyLock;

use regex::Regex;

static TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*[-*+][ \t]+\[([ xX])\][ \t]+(.*)$").unwrap());
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*[-*+][ \t]+(.*)$").unwrap());
static ORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*(\d{1,9})[.)][ \t]+(.*)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

#[derive(Debug, PartialEq, Eq)]
struct ListItem {
    kind: ListKind,
    /// Number of an ordered item.
    number: u32,
    html: String,
}

#[derive(Debug)]
struct OpenList {
    kind: ListKind,
    start: u32,
    items: Vec<String>,
}

impl OpenList {
    fn render(&self) -> String {
        let open = match self.kind {
            ListKind::Unordered => "<ul>".to_owned(),
            ListKind::Ordered if self.start == 1 => "<ol>".to_owned(),
            ListKind::Ordered => format!(r#"<ol start="{}">"#, self.start),
        };
        let close = match self.kind {
            ListKind::Unordered => "</ul>",
            ListKind::Ordered => "</ol>",
        };

        let mut lines = Vec::with_capacity(self.items.len() + 2);
        lines.push(open);
        lines.extend(self.items.iter().cloned());
        lines.push(close.to_owned());
        lines.join("\n")
    }
}

/// Group consecutive list item lines into `<ul>`/`<ol>` blocks.
///
/// Any non-item line ends the current list, and so does an item of the other
/// kind.
pub(super) fn aggregate_lists(text: &str) -> String {
    let mut output: Vec<String> = Vec::new();
    let mut current: Option<OpenList> = None;

    for line in text.split('\n') {
        let Some(item) = parse_item(line) else {
            if let Some(list) = current.take() {
                output.push(list.render());
            }
            output.push(line.to_owned());
            continue;
        };

        match current.as_mut() {
            Some(list) if list.kind == item.kind => list.items.push(item.html),
            _ => {
                if let Some(list) = current.take() {
                    output.push(list.render());
                }
                current = Some(OpenList {
                    kind: item.kind,
                    start: item.number,
                    items: vec![item.html],
                });
            }
        }
    }

    if let Some(list) = current {
        output.push(list.render());
    }
    output.join("\n")
}

fn parse_item(line: &str) -> Option<ListItem> {
    if let Some(caps) = TASK_RE.captures(line) {
        let checked = if &caps[1] == " " { "" } else { " checked" };
        return Some(ListItem {
            kind: ListKind::Unordered,
            number: 0,
            html: format!(
                r#"<li class="task-list-item"><input type="checkbox" disabled{checked}> {}</li>"#,
                caps[2].trim_end()
            ),
        });
    }
    if let Some(caps) = BULLET_RE.captures(line) {
        return Some(ListItem {
            kind: ListKind::Unordered,
            number: 0,
            html: format!("<li>{}</li>", caps[1].trim_end()),
        });
    }
    let caps = ORDERED_RE.captures(line)?;
    Some(ListItem {
        kind: ListKind::Ordered,
        number: caps[1].parse().unwrap_or(1),
        html: format!("<li>{}</li>", caps[2].trim_end()),
    })
}
