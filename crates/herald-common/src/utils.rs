//! Shared formatting helpers for chat output.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Maximum length of a single Discord message.
pub const MESSAGE_LIMIT: usize = 2000;

/// Formats a UTC timestamp in the given zone, e.g. `2024-01-01 13:00 Europe/Berlin`.
pub fn format_local(timestamp: DateTime<Utc>, tz: Tz) -> String {
    format!("{} {}", timestamp.with_timezone(&tz).format("%Y-%m-%d %H:%M"), tz.name())
}

/// Truncates a string to at most `max_chars` characters, ending with an ellipsis.
pub fn truncate_string(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        input.to_string()
    } else {
        let kept: String = input.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Packs lines into chunks that each fit within `limit` characters.
///
/// Every line keeps its trailing newline. A single line longer than `limit`
/// is truncated so that no chunk ever exceeds the limit.
pub fn chunk_lines<I, S>(lines: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in lines {
        let mut line = line.as_ref().to_string();
        if line.chars().count() + 1 > limit {
            line = truncate_string(&line, limit.saturating_sub(1));
        }
        let line_len = line.chars().count() + 1;

        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(&line);
        current.push('\n');
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_local_applies_offset() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(
            format_local(timestamp, chrono_tz::Europe::Berlin),
            "2024-01-01 13:00 Europe/Berlin"
        );
    }

    #[test]
    fn test_truncate_string() {
        let input = "This is a very long string that should be truncated";
        assert_eq!(truncate_string(input, 20), "This is a very lo...");
        assert_eq!(truncate_string("Short", 20), "Short");
    }

    #[test]
    fn test_truncate_string_multibyte() {
        assert_eq!(truncate_string("äöüäöüäöü", 6), "äöü...");
    }

    #[test]
    fn test_chunk_lines_splits_at_limit() {
        let lines = vec!["a".repeat(9), "b".repeat(9), "c".repeat(9)];
        let chunks = chunk_lines(&lines, 20);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], format!("{}\n{}\n", "a".repeat(9), "b".repeat(9)));
        assert_eq!(chunks[1], format!("{}\n", "c".repeat(9)));
    }

    #[test]
    fn test_chunk_lines_empty() {
        let lines: Vec<String> = Vec::new();
        assert!(chunk_lines(lines, 2000).is_empty());
    }

    #[test]
    fn test_chunk_lines_oversized_line() {
        let chunks = chunk_lines(["x".repeat(50)], 10);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].chars().count() <= 10);
    }
}
