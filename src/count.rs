//! Abbreviated count parsing
//!
//! Turns accessible labels like "1.2K upvotes" or "34 comments" into integers.

use regex::Regex;
use std::sync::LazyLock;

/// A digit run with at most one decimal point, then an optional K/M/B suffix.
/// The suffix must end a word so "3 books" reads as 3, not 3 billion.
static COUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+\.?\d*)\s*(?:([KMB])\b)?").unwrap());

/// Parse the first abbreviated number found in `label`.
///
/// Returns 0 when the label holds no digits. Thousands separators are not
/// understood: "1,234 points" parses as 1, since only the first contiguous
/// digit run is read.
pub fn parse_count(label: &str) -> u64 {
    let caps = match COUNT_PATTERN.captures(label) {
        Some(c) => c,
        None => return 0,
    };

    let value: f64 = match caps.get(1).and_then(|m| m.as_str().parse().ok()) {
        Some(v) => v,
        None => return 0,
    };

    let factor = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(s) if s == "K" => 1_000.0,
        Some(s) if s == "M" => 1_000_000.0,
        Some(s) if s == "B" => 1_000_000_000.0,
        _ => 1.0,
    };

    // Non-negative, so round() is round-half-up here
    (value * factor).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_count("240"), 240);
        assert_eq!(parse_count("240 points"), 240);
        assert_eq!(parse_count("0 comments"), 0);
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(parse_count("1.5K"), 1500);
        assert_eq!(parse_count("1.2K upvotes"), 1200);
        assert_eq!(parse_count("2M"), 2_000_000);
        assert_eq!(parse_count("3B"), 3_000_000_000);
        assert_eq!(parse_count("3.4k"), 3400);
        assert_eq!(parse_count("12 K"), 12_000);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(parse_count("1.2346K"), 1235);
        assert_eq!(parse_count("2.5"), 3);
        assert_eq!(parse_count("2.4"), 2);
    }

    #[test]
    fn test_no_digits() {
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("no data"), 0);
        assert_eq!(parse_count("Upvote"), 0);
    }

    #[test]
    fn test_thousands_separator_reads_first_group() {
        assert_eq!(parse_count("1,234 points"), 1);
    }

    #[test]
    fn test_suffix_needs_word_end() {
        assert_eq!(parse_count("3 books"), 3);
        assert_eq!(parse_count("5 members"), 5);
    }

    #[test]
    fn test_suffix_glued_to_word_is_ignored() {
        // A K/M/B run into following letters is not a magnitude
        assert_eq!(parse_count("1.5Kupvotes"), 2);
        assert_eq!(parse_count("2Mviews"), 2);
        assert_eq!(parse_count("1.5K-upvotes"), 1500);
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(parse_count("Item 7 of 1.5K"), 7);
    }
}
