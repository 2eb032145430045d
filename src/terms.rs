//! Term normalization shared by chunk indexing and query parsing.

use std::collections::BTreeSet;

/// Terms of this many characters or fewer are dropped.
const MIN_TERM_CHARS: usize = 2;

fn is_term_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, 'å' | 'ä' | 'ö' | '_' | ':' | '-')
}

/// Lower-case `text`, blank out every character that is not a Latin
/// letter, digit, Swedish vowel, `_`, `:` or `-`, and return the remaining
/// words longer than two characters, in order and with repeats.
pub fn normalize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if is_term_char(c) { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() > MIN_TERM_CHARS)
        .map(str::to_string)
        .collect()
}

/// The distinct terms of `text`.
pub fn term_set(text: &str) -> BTreeSet<String> {
    normalize(text).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(
            normalize("Logiska satser: OMM, FAL & NAR!"),
            vec!["logiska", "satser:", "omm", "fal", "nar"]
        );
    }

    #[test]
    fn test_short_tokens_dropped() {
        assert!(normalize("a an of 7.6 to").is_empty());
        assert_eq!(normalize("7.6.2 text"), vec!["text"]);
    }

    #[test]
    fn test_swedish_and_joiners_kept() {
        assert_eq!(
            normalize("FÖR MÅNGA DAA-UTF start_abc"),
            vec!["för", "många", "daa-utf", "start_abc"]
        );
    }

    #[test]
    fn test_other_letters_split_words() {
        assert_eq!(normalize("caféteria"), vec!["caf", "teria"]);
    }

    #[test]
    fn test_term_set_dedups() {
        let set = term_set("signal SIGNAL Signal route");
        assert_eq!(set.len(), 2);
        assert!(set.contains("signal"));
        assert!(set.contains("route"));
    }
}
