// Text Processing Service
// Line-ending normalization, paragraph segmentation and boundary search helpers

use regex::Regex;
use std::sync::OnceLock;

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{2,}").expect("blank line regex"))
}

// Start of a list item: "1. ", "a) ", or a bullet glyph followed by whitespace.
fn list_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\n\s*(?:\d+\.|[a-z]\)|•|–|—|\*)\s").expect("list item regex")
    })
}

fn page_artifact_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\d\s\-\.]+$").expect("page artifact regex"))
}

/// Collapse `\r\n` and bare `\r` into `\n`
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split raw document text into paragraph units.
///
/// Boundaries are runs of two or more newlines and the start of a line that
/// opens a numbered, lettered or bulleted list item. Fragments shorter than
/// `min_chars` characters and page-number artifacts (digits, whitespace,
/// hyphens and periods only) are dropped.
pub fn split_paragraphs(text: &str, min_chars: usize) -> Vec<String> {
    let normalized = normalize_line_endings(text);
    let mut paragraphs = Vec::new();

    for block in blank_run_re().split(&normalized) {
        let mut cursor = 0;
        // Resume one byte past each match start: the trailing whitespace of one
        // marker may be the newline that opens the next.
        let mut search = 0;
        while let Some(m) = list_item_re().find_at(block, search) {
            push_fragment(&mut paragraphs, &block[cursor..m.start()], min_chars);
            cursor = m.start();
            search = m.start() + 1;
        }
        push_fragment(&mut paragraphs, &block[cursor..], min_chars);
    }

    paragraphs
}

fn push_fragment(out: &mut Vec<String>, fragment: &str, min_chars: usize) {
    let trimmed = fragment.trim();
    if char_len(trimmed) < min_chars {
        return;
    }
    if page_artifact_re().is_match(trimmed) {
        return;
    }
    out.push(trimmed.to_string());
}

/// Byte offset of the `char_idx`-th character (clamped to the end of `text`)
pub fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Occurrence of `needle` closest to `center`, searched inside the character
/// window `[center - radius, center + radius)`. Returns a byte offset.
fn nearest_in_window(text: &str, needle: &str, center: usize, radius: usize) -> Option<usize> {
    let start = byte_offset(text, center.saturating_sub(radius));
    let end = byte_offset(text, center + radius);
    let center_byte = byte_offset(text, center);

    text[start..end]
        .match_indices(needle)
        .map(|(i, _)| start + i)
        .min_by_key(|pos| pos.abs_diff(center_byte))
}

/// Split `text` into two halves at the paragraph boundary nearest its midpoint.
///
/// Looks for a blank line within `paragraph_window` characters of the middle,
/// then for a single newline within `line_window`, and finally cuts at the
/// exact midpoint. Both halves are trimmed.
pub fn split_near_midpoint(
    text: &str,
    paragraph_window: usize,
    line_window: usize,
) -> (&str, &str) {
    let mid = char_len(text) / 2;
    let split_at = nearest_in_window(text, "\n\n", mid, paragraph_window)
        .or_else(|| nearest_in_window(text, "\n", mid, line_window))
        .unwrap_or_else(|| byte_offset(text, mid));

    (text[..split_at].trim(), text[split_at..].trim())
}

/// Single-line preview for logs and CLI output
pub fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if char_len(s) > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_A: &str = "The policy covers in-patient hospitalization for at least 24 hours.";
    const LONG_B: &str = "Pre-existing diseases are covered after the applicable waiting period.";

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn test_split_on_blank_lines() {
        let text = format!("{}\n\n\n{}", LONG_A, LONG_B);
        let paras = split_paragraphs(&text, 30);
        assert_eq!(paras, vec![LONG_A.to_string(), LONG_B.to_string()]);
    }

    #[test]
    fn test_split_before_list_items() {
        let text = format!(
            "Exclusions listed below apply to all plans:\n1. {}\n2. {}\n• {}\na) {}",
            LONG_A, LONG_B, LONG_A, LONG_B
        );
        let paras = split_paragraphs(&text, 30);
        assert_eq!(paras.len(), 5);
        assert_eq!(paras[0], "Exclusions listed below apply to all plans:");
        assert!(paras[1].starts_with("1. "));
        assert!(paras[3].starts_with("• "));
        assert!(paras[4].starts_with("a) "));
    }

    #[test]
    fn test_bare_marker_line_does_not_swallow_next_item() {
        let text = format!("Exclusions listed below apply to all plans:\n1.\n2. {}", LONG_A);
        let paras = split_paragraphs(&text, 30);
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[1], format!("2. {}", LONG_A));
    }

    #[test]
    fn test_crlf_input_is_segmented() {
        let text = format!("{}\r\n\r\n{}", LONG_A, LONG_B);
        assert_eq!(split_paragraphs(&text, 30).len(), 2);
    }

    #[test]
    fn test_drops_short_and_numeric_fragments() {
        let text = format!(
            "Page 3 of 40\n\n{}\n\n12 - 13 - 14 . 15 . 16 - 17 - 18 - 19 . 20\n\n{}",
            LONG_A, LONG_B
        );
        let paras = split_paragraphs(&text, 30);
        assert_eq!(paras, vec![LONG_A.to_string(), LONG_B.to_string()]);
    }

    #[test]
    fn test_empty_input_has_no_paragraphs() {
        assert!(split_paragraphs("", 30).is_empty());
        assert!(split_paragraphs("   \n\n \t \n", 30).is_empty());
    }

    #[test]
    fn test_split_near_midpoint_prefers_blank_line() {
        let left = "a".repeat(1000);
        let right = "b".repeat(1000);
        let text = format!("{}\n\n{}\nccc", left, right);
        let (a, b) = split_near_midpoint(&text, 500, 200);
        assert_eq!(a, left);
        assert!(b.starts_with('b'));
    }

    #[test]
    fn test_split_near_midpoint_falls_back_to_line_then_midpoint() {
        let text = format!("{}\n{}", "a".repeat(1000), "b".repeat(1000));
        let (a, b) = split_near_midpoint(&text, 500, 200);
        assert_eq!(a.len(), 1000);
        assert_eq!(b.len(), 1000);

        let text = "x".repeat(2000);
        let (a, b) = split_near_midpoint(&text, 500, 200);
        assert_eq!(a.len(), 1000);
        assert_eq!(b.len(), 1000);
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("abc\ndef", 3), "abc...");
        assert_eq!(preview("ab", 3), "ab");
    }
}
