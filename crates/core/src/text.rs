//! Small text helpers shared by the parser, classifier and tree labels.

use regex::Regex;
use std::sync::LazyLock;

/// Assign `source` to `target` if `target` is still `None` (first-wins semantics).
pub fn set_first<T>(target: &mut Option<T>, source: Option<T>) {
    if target.is_none() {
        *target = source;
    }
}

/// Like [`set_first`], but treats empty or whitespace-only strings as absent.
pub fn set_first_non_empty(target: &mut Option<String>, source: Option<&str>) {
    if target.is_none() {
        *target = source
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
    }
}

static SYSTEM_REMINDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<system-reminder>.*?</system-reminder>").expect("valid reminder regex")
});

/// Strip <system-reminder> blocks from text
pub fn strip_system_reminders(text: &str) -> String {
    SYSTEM_REMINDER_RE.replace_all(text, "").trim().to_string()
}

/// Detect assistant CLI continuation/resume preamble messages
pub fn is_continuation_preamble(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with("This session is")
        || trimmed.starts_with("Here is the conversation so far")
        || trimmed.starts_with("Here's the conversation so far")
}

/// Truncate to `max_chars` characters, ending with `...` when shortened.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars < 3 {
        return text.chars().take(max_chars).collect();
    }
    let truncated: String = text.chars().take(max_chars - 3).collect();
    format!("{truncated}...")
}

/// First non-blank line, trimmed.
pub fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

/// Line count as a renderer sees it: a trailing newline does not open a new line.
pub fn line_count(text: &str) -> usize {
    text.lines().count()
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_first_keeps_earliest() {
        let mut value = None;
        set_first(&mut value, Some(1));
        set_first(&mut value, Some(2));
        assert_eq!(value, Some(1));
    }

    #[test]
    fn test_set_first_non_empty_skips_blank() {
        let mut value = None;
        set_first_non_empty(&mut value, Some("  "));
        set_first_non_empty(&mut value, Some("/repo"));
        set_first_non_empty(&mut value, Some("/other"));
        assert_eq!(value.as_deref(), Some("/repo"));
    }

    #[test]
    fn test_strip_system_reminders() {
        let input = "hello\n<system-reminder>\nsome reminder\n</system-reminder>\nworld";
        assert_eq!(strip_system_reminders(input), "hello\n\nworld");
    }

    #[test]
    fn test_strip_system_reminders_multiple() {
        let input =
            "<system-reminder>first</system-reminder>text<system-reminder>second</system-reminder>";
        assert_eq!(strip_system_reminders(input), "text");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghij", 8), "abcde...");
        assert_eq!(truncate_chars("ünïcödé-text", 6), "ünï...");
    }

    #[test]
    fn test_truncate_chars_below_ellipsis_width() {
        assert_eq!(truncate_chars("abcdef", 3), "...");
        assert_eq!(truncate_chars("abcdef", 2), "ab");
        assert_eq!(truncate_chars("abcdef", 0), "");
        assert_eq!(truncate_chars("ab", 2), "ab");
    }

    #[test]
    fn test_line_and_char_counts() {
        assert_eq!(line_count("test.txt\nscript.js\n"), 2);
        assert_eq!(line_count(""), 0);
        assert_eq!(char_count("héllo"), 5);
        assert_eq!(first_line("\n\n  first  \nsecond"), "first");
    }

    #[test]
    fn test_continuation_preamble() {
        assert!(is_continuation_preamble(
            "This session is being continued from a previous conversation"
        ));
        assert!(!is_continuation_preamble("Fix the failing test"));
    }
}
