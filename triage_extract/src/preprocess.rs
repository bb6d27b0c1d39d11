//! Clean-up applied to recognizer output before extraction.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// A number the recognizer split in two, e.g. "one-twenty" heard as `1 20`.
static SPLIT_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|\s)([0-9]+)\s([0-9]+)")
        .unwrap_or_else(|e| panic!("split number pattern is invalid: {e}"))
});

/// Join digit runs separated by a single space: `"bp 1 20 over 80"` becomes
/// `"bp 120 over 80"`.
///
/// Single left-to-right pass, so `"1 2 3"` becomes `"12 3"`.
#[must_use]
pub fn join_split_numbers(text: &str) -> Cow<'_, str> {
    SPLIT_NUMBER.replace_all(text, "$1$2$3")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_split_number() {
        assert_eq!(
            join_split_numbers("blood pressure 1 20 over 80"),
            "blood pressure 120 over 80"
        );
    }

    #[test]
    fn joins_at_start_of_text() {
        assert_eq!(join_split_numbers("1 40 systolic"), "140 systolic");
    }

    #[test]
    fn leaves_other_text_borrowed() {
        let text = "pulse 88 and steady";
        assert!(matches!(join_split_numbers(text), Cow::Borrowed(_)));
    }

    #[test]
    fn single_pass_does_not_rejoin() {
        assert_eq!(join_split_numbers("1 2 3"), "12 3");
    }

    #[test]
    fn requires_whitespace_before_first_number() {
        assert_eq!(join_split_numbers("a1 20"), "a1 20");
    }

    #[test]
    fn ignores_non_ascii_digits() {
        assert_eq!(join_split_numbers("pulse ١ ٢٠"), "pulse ١ ٢٠");
    }
}
