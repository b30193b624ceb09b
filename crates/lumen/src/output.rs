//! Terminal output utilities.

use console::{Style, Term};

/// Terminal output formatter.
///
/// Rendered documents go to stdout; messages go to stderr.
pub(crate) struct Output {
    out: Term,
    err: Term,
    red: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            red: Style::new().red(),
        }
    }

    /// Write a rendered document to stdout.
    pub(crate) fn document(&self, content: &str) -> std::io::Result<()> {
        self.out.write_line(content)
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.err.write_line(&self.red.apply_to(msg).to_string());
    }
}
