//! Tokenization and Jaccard similarity, used by the organizer for stop-word
//! filtering and related-document scoring.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("static regex"));

/// Split `text` into lowercase `\w+` tokens.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

/// Tokenize and drop anything in `stop_words`.
#[must_use]
pub fn extract_terms(text: &str, stop_words: &HashSet<String>) -> Vec<String> {
    tokenize(text).into_iter().filter(|t| !stop_words.contains(t)).collect()
}

/// `|A ∩ B| / |A ∪ B|`, zero when either set is empty.
#[must_use]
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_and_lowercases() {
        assert_eq!(tokenize("Hello, World!"), vec!["hello", "world"]);
    }

    #[test]
    fn removes_stop_words() {
        let stop = ["the", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(extract_terms("the quick fox", &stop), vec!["quick", "fox"]);
    }

    #[test]
    fn jaccard_of_identical_sets_is_one() {
        let a: HashSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(jaccard_similarity(&a, &a.clone()), 1.0);
    }

    #[test]
    fn jaccard_of_disjoint_sets_is_zero() {
        let a: HashSet<String> = ["a"].iter().map(|s| s.to_string()).collect();
        let b: HashSet<String> = ["b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(jaccard_similarity(&a, &b), 0.0);
    }

    #[test]
    fn jaccard_with_empty_set_is_zero() {
        let a: HashSet<String> = ["a"].iter().map(|s| s.to_string()).collect();
        let empty = HashSet::new();
        assert_eq!(jaccard_similarity(&a, &empty), 0.0);
    }
}
