//! Console line formatting.
//!
//! Stateless: whether to emit ANSI colors is a parameter, never global state.

use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Unchanged,
    Skipped,
    Failure,
    Info,
}

impl Tone {
    fn marker(self) -> &'static str {
        match self {
            Tone::Success => "✓",
            Tone::Unchanged => "⊙",
            Tone::Skipped => "⊘",
            Tone::Failure => "✗",
            Tone::Info => "•",
        }
    }
}

/// Render one status line: a colored marker followed by `message`.
pub fn format_line(tone: Tone, message: &str, color: bool) -> String {
    let marker = tone.marker();
    if !color {
        return format!("{marker} {message}");
    }
    let marker = match tone {
        Tone::Success => marker.green(),
        Tone::Unchanged => marker.yellow(),
        Tone::Skipped => marker.cyan(),
        Tone::Failure => marker.red(),
        Tone::Info => marker.dimmed(),
    };
    format!("{marker} {message}")
}

/// Color a unified diff line by line.
pub fn format_diff(diff: &str, color: bool) -> String {
    if !color {
        return diff.to_string();
    }
    diff.lines()
        .map(|line| {
            if line.starts_with("+++") || line.starts_with("---") {
                line.bold().to_string()
            } else if line.starts_with('+') {
                line.green().to_string()
            } else if line.starts_with('-') {
                line.red().to_string()
            } else if line.starts_with("@@") {
                line.cyan().to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_has_no_escape_codes() {
        let line = format_line(Tone::Failure, "manifest: boom", false);
        assert_eq!(line, "✗ manifest: boom");
        assert!(!line.contains('\u{1b}'));
    }

    #[test]
    fn test_plain_diff_is_untouched() {
        let diff = "--- a\n+++ b\n-x\n+y\n";
        assert_eq!(format_diff(diff, false), diff);
    }
}
