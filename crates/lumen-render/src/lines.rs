//! Line-level helpers shared by the line-oriented extractors.

/// Tracks code fence state during line-by-line scanning.
///
/// Fences use backticks or tildes (three or more). The closing fence must use
/// the same character and be at least as long as the opening fence. Quote
/// markers in front of a fence are ignored so fences inside blockquotes are
/// tracked as well.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    fence_char: Option<char>,
    fence_len: usize,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.fence_char.is_some()
    }

    /// Update fence state for a line. Returns `true` if the line opened or
    /// closed a fence.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let (_, body) = split_quote_prefix(line);
        let trimmed = body.trim_start();

        if let Some(fence_char) = self.fence_char {
            if is_closing_fence(trimmed, fence_char, self.fence_len) {
                self.fence_char = None;
                self.fence_len = 0;
                return true;
            }
            false
        } else if let Some((ch, len)) = detect_fence(trimmed) {
            self.fence_char = Some(ch);
            self.fence_len = len;
            true
        } else {
            false
        }
    }
}

fn detect_fence(trimmed: &str) -> Option<(char, usize)> {
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }

    let count = trimmed.chars().take_while(|&c| c == first).count();
    (count >= 3).then_some((first, count))
}

fn is_closing_fence(trimmed: &str, expected: char, min_len: usize) -> bool {
    if !trimmed.starts_with(expected) {
        return false;
    }

    let count = trimmed.chars().take_while(|&c| c == expected).count();
    count >= min_len && trimmed[count..].chars().all(char::is_whitespace)
}

/// Split a line into its leading quote markers and the remaining body.
///
/// The prefix covers leading whitespace, every `>` marker and the whitespace
/// between markers, plus at most one space after the last marker. Lines
/// without markers return an empty prefix.
pub(crate) fn split_quote_prefix(line: &str) -> (&str, &str) {
    let bytes = line.as_bytes();
    let mut end = 0;
    let mut pos = 0;

    loop {
        while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b'\t') {
            pos += 1;
        }
        if pos < bytes.len() && bytes[pos] == b'>' {
            pos += 1;
            end = pos;
        } else {
            break;
        }
    }

    if end == 0 {
        return ("", line);
    }
    if bytes.get(end) == Some(&b' ') {
        end += 1;
    }
    line.split_at(end)
}

/// Number of `>` markers in a quote prefix.
pub(crate) fn quote_depth(prefix: &str) -> usize {
    prefix.bytes().filter(|&b| b == b'>').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_backtick_fence() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.update("```rust"));
        assert!(tracker.in_fence());
        assert!(!tracker.update("| a | b |"));
        assert!(tracker.in_fence());
        assert!(tracker.update("```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_shorter_fence_does_not_close() {
        let mut tracker = FenceTracker::new();
        tracker.update("````");
        assert!(!tracker.update("```"));
        assert!(tracker.in_fence());
        assert!(tracker.update("`````"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_mixed_fence_chars() {
        let mut tracker = FenceTracker::new();
        tracker.update("~~~");
        assert!(!tracker.update("```"));
        assert!(tracker.update("~~~"));
    }

    #[test]
    fn test_inline_backticks_not_fence() {
        let mut tracker = FenceTracker::new();
        assert!(!tracker.update("``inline``"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_quoted_fence() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.update("> ```"));
        assert!(tracker.in_fence());
        assert!(tracker.update("> ```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_split_quote_prefix() {
        assert_eq!(split_quote_prefix("plain"), ("", "plain"));
        assert_eq!(split_quote_prefix("> text"), ("> ", "text"));
        assert_eq!(split_quote_prefix(">> text"), (">> ", "text"));
        assert_eq!(split_quote_prefix("> > text"), ("> > ", "text"));
        assert_eq!(split_quote_prefix(">"), (">", ""));
        assert_eq!(split_quote_prefix("  >text"), ("  >", "text"));
    }

    #[test]
    fn test_quote_depth() {
        assert_eq!(quote_depth(""), 0);
        assert_eq!(quote_depth("> > "), 2);
        assert_eq!(quote_depth(">>>"), 3);
    }
}
