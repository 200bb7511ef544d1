//! Notification text sanitization.
//!
//! Notification text ends up in OS notifiers that are often driven through a
//! command line, so anything non-printing is removed and `;` is neutralized
//! before display. Lengths are counted in `char`s.

use std::sync::LazyLock;

use regex::Regex;

const ELLIPSIS: char = '…';

/// Unicode control (Cc) and format (Cf) characters, e.g. BEL, ESC, bidi marks
/// and zero-width joiners.
static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    // Regex is a hard-coded literal; abort if it ever fails to compile.
    Regex::new(r"[\p{Cc}\p{Cf}]").unwrap_or_else(|_| std::process::abort())
});

/// Truncates `input` to at most `max_length` chars, ending in an ellipsis.
///
/// Input that already fits is returned unchanged. A `max_length` of 0 or 1
/// yields a lone ellipsis.
#[must_use]
pub fn truncate_text(input: &str, max_length: usize) -> String {
    if input.chars().count() <= max_length {
        return input.to_string();
    }

    if max_length <= 1 {
        return ELLIPSIS.to_string();
    }

    let mut truncated: String = input.chars().take(max_length - 1).collect();
    truncated.push(ELLIPSIS);
    truncated
}

/// Makes `input` safe and bounded for display in a notification.
///
/// Control and format characters and semicolons become spaces, whitespace
/// runs collapse to one space, and the result is trimmed. Falls back to
/// `fallback` when nothing printable is left. Both paths are truncated to
/// `max_length`.
#[must_use]
pub fn sanitize_notification_text(input: &str, fallback: &str, max_length: usize) -> String {
    let stripped = CONTROL_CHARS.replace_all(input, " ").replace(';', " ");
    let sanitized = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if sanitized.is_empty() {
        return truncate_text(fallback, max_length);
    }

    truncate_text(&sanitized, max_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_control_characters_and_semicolons() {
        let value = sanitize_notification_text("Pi;\u{0007}\u{001b}[31m Ready", "fallback", 100);
        assert_eq!(value, "Pi [31m Ready");
    }

    #[test]
    fn test_normalizes_whitespace() {
        let value = sanitize_notification_text("  Turn\n\ncomplete\t now  ", "fallback", 100);
        assert_eq!(value, "Turn complete now");
    }

    #[test]
    fn test_falls_back_when_empty() {
        let value = sanitize_notification_text("\u{0007}\u{001b}", "fallback text", 100);
        assert_eq!(value, "fallback text");

        let value = sanitize_notification_text(" ; ;\n", "fallback text", 8);
        assert_eq!(value, "fallbac…");
    }

    #[test]
    fn test_strips_format_characters() {
        // zero-width joiner, right-to-left override, byte order mark
        let value = sanitize_notification_text("a\u{200d}b\u{202e}c\u{feff}", "fallback", 100);
        assert_eq!(value, "a b c");

        let value = sanitize_notification_text("\u{0085}next\u{009b}line", "fallback", 100);
        assert_eq!(value, "next line");
    }

    #[test]
    fn test_truncates_long_values() {
        let value = sanitize_notification_text("abcdefghij", "fallback", 6);
        assert_eq!(value, "abcde…");
    }

    #[test]
    fn test_truncate_text_tiny_limits() {
        assert_eq!(truncate_text("abcdef", 1), "…");
        assert_eq!(truncate_text("abcdef", 0), "…");
        assert_eq!(truncate_text("", 0), "");
    }

    #[test]
    fn test_truncate_text_fits() {
        assert_eq!(truncate_text("abcdef", 6), "abcdef");
        assert_eq!(truncate_text("abcdef", 100), "abcdef");
    }

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("héllo wörld", 5), "héll…");
        assert_eq!(truncate_text("日本語テキスト", 4).chars().count(), 4);
    }
}
