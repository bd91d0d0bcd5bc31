//! Text helpers for log lines.

/// Single-line preview of `text` for diagnostics.
///
/// Runs of whitespace (including newlines in raw oracle JSON) collapse to
/// one space. Output longer than `max_bytes` is cut on a character boundary
/// and marked with `...`.
pub fn preview(text: &str, max_bytes: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.len() <= max_bytes {
        return flat;
    }
    let mut end = max_bytes;
    while end > 0 && !flat.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &flat[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_flattened_only() {
        assert_eq!(preview("{\n  \"followup\": \"Hi\"\n}", 100), "{ \"followup\": \"Hi\" }");
    }

    #[test]
    fn test_long_text_is_marked() {
        assert_eq!(preview("I sleep about five hours", 7), "I sleep...");
    }

    #[test]
    fn test_cut_respects_char_boundary() {
        // 'ö' is two bytes; byte 2 falls inside it
        assert_eq!(preview("uöu", 2), "u...");
        assert_eq!(preview("uöu", 3), "uö...");
    }

    #[test]
    fn test_empty() {
        assert_eq!(preview("  \n ", 10), "");
    }
}
