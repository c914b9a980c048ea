//! Word-order-insensitive string similarity.
//!
//! Scores are integers in `0..=100` derived from the normalized Levenshtein
//! distance.  [`token_sort_ratio`] sorts the words of both strings first, so
//! `"The Beatles"` and `"Beatles, The"` compare as equal.

/// Lowercase `s`, turn every non-alphanumeric character into a word break
/// and join the remaining words with single spaces.
pub fn full_process(s: &str) -> String {
    let cleaned: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Levenshtein similarity of two strings as a percentage.
///
/// Empty input scores 0: there is nothing to be similar to.
pub fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    (strsim::normalized_levenshtein(a, b) * 100.0).round() as u8
}

/// Words of `s` after [`full_process`], sorted and rejoined.
fn sorted_tokens(s: &str) -> String {
    let processed = full_process(s);
    let mut tokens: Vec<&str> = processed.split(' ').filter(|t| !t.is_empty()).collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Similarity of `a` and `b` ignoring case, punctuation and word order.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Similarity of `a` and `b` ignoring case and punctuation, but not order.
pub fn processed_ratio(a: &str, b: &str) -> u8 {
    ratio(&full_process(a), &full_process(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_process() {
        assert_eq!(full_process("  The Beatles - Yesterday.mp3 "), "the beatles yesterday mp3");
        assert_eq!(full_process("AC/DC"), "ac dc");
        assert_eq!(full_process("Björk"), "björk");
        assert_eq!(full_process("--"), "");
    }

    #[test]
    fn test_ratio_bounds() {
        assert_eq!(ratio("yesterday", "yesterday"), 100);
        assert_eq!(ratio("abc", "xyz"), 0);
        assert_eq!(ratio("", "abc"), 0);
        assert_eq!(ratio("", ""), 0);

        // one substitution in four characters
        assert_eq!(ratio("abcd", "abcx"), 75);
    }

    #[test]
    fn test_token_sort_ratio_ignores_word_order() {
        assert_eq!(token_sort_ratio("The Beatles", "Beatles, The"), 100);
        assert_eq!(token_sort_ratio("new york mets", "mets NEW YORK"), 100);
        assert!(token_sort_ratio("The Beatles", "Yesterday") < 50);
    }

    #[test]
    fn test_processed_ratio_keeps_word_order() {
        let reference = "Beatles The - Yesterday.mp3";
        assert!(processed_ratio("Beatles The", reference) > processed_ratio("The Beatles", reference));
        assert_eq!(
            token_sort_ratio("Beatles The", reference),
            token_sort_ratio("The Beatles", reference)
        );
    }

    #[test]
    fn test_punctuation_only_scores_zero() {
        assert_eq!(token_sort_ratio("!!!", "The Beatles"), 0);
    }
}
