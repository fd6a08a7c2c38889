//! Code fence tracking for line-based scanning.
//!
//! Note-split markers are found by scanning lines before the markdown
//! parser runs. A marker inside a fenced code block is example content and
//! must not split the document.

/// An open fence: its character and run length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Fence {
    ch: char,
    len: usize,
}

/// Tracks whether the scan is inside a fenced code block.
///
/// Fences use three or more backticks or tildes. A closing fence uses the
/// opening character, is at least as long and has nothing after it but
/// whitespace.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<Fence>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Feed the next line. Returns `true` if it opened or closed a fence.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let Some(run) = fence_run(trimmed) else {
            return false;
        };

        match self.open {
            Some(open) => {
                let closes = run.ch == open.ch
                    && run.len >= open.len
                    && trimmed[run.len..].trim().is_empty();
                if closes {
                    self.open = None;
                }
                closes
            }
            None => {
                self.open = Some(run);
                true
            }
        }
    }
}

/// Leading run of three or more fence characters.
fn fence_run(trimmed: &str) -> Option<Fence> {
    let ch = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = trimmed.chars().take_while(|&c| c == ch).count();
    (len >= 3).then_some(Fence { ch, len })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(lines: &[&str]) -> Vec<bool> {
        let mut tracker = FenceTracker::new();
        lines
            .iter()
            .map(|line| {
                tracker.update(line);
                tracker.in_fence()
            })
            .collect()
    }

    #[test]
    fn test_marker_inside_backtick_fence() {
        assert_eq!(
            feed(&["```markdown", "<!-- note:split -->", "```", "<!-- note:split -->"]),
            vec![true, true, false, false]
        );
    }

    #[test]
    fn test_tilde_fence_ignores_backticks() {
        assert_eq!(
            feed(&["~~~", "```", "still code", "~~~~"]),
            vec![true, true, true, false]
        );
    }

    #[test]
    fn test_shorter_fence_does_not_close() {
        assert_eq!(feed(&["````", "```", "````"]), vec![true, true, false]);
    }

    #[test]
    fn test_closing_fence_with_info_string_does_not_close() {
        assert_eq!(feed(&["```", "```rust", "```  "]), vec![true, true, false]);
    }

    #[test]
    fn test_indented_fence_and_return_value() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.update("  ```rust\n"));
        assert!(!tracker.update("let x = 1;\n"));
        assert!(tracker.update("   ```\n"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_inline_code_is_not_a_fence() {
        assert_eq!(feed(&["``inline``", "plain"]), vec![false, false]);
    }
}
