//! Title tokenization: split on ASCII space and fold ASCII case.
//!
//! The analysis is deliberately fixed: no stemming, no stopwords, non-ASCII
//! bytes pass through unchanged. Word positions are 0-based indices into the
//! token list and are what the proximity scorer operates on.

use std::collections::HashMap;

/// Split `text` on ASCII spaces, dropping empty fragments, lowercasing
/// ASCII characters in each token.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(' ')
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| fragment.to_ascii_lowercase())
        .collect()
}

/// Map each token of `text` to the ascending list of word positions where
/// it occurs.
pub fn token_positions(text: &str) -> HashMap<String, Vec<u32>> {
    let mut positions: HashMap<String, Vec<u32>> = HashMap::new();
    for (index, token) in tokenize(text).into_iter().enumerate() {
        positions.entry(token).or_default().push(index as u32);
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokenization() {
        let tokens = tokenize("Hello World");
        assert_eq!(tokens, vec!["hello", "world"]);
    }

    #[test]
    fn test_empty_fragments_dropped() {
        let tokens = tokenize("  red   blue ");
        assert_eq!(tokens, vec!["red", "blue"]);
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_ascii_only_case_folding() {
        let tokens = tokenize("Grün ÉTÉ ABC");
        // Only ASCII letters fold; other bytes pass through untouched.
        assert_eq!(tokens, vec!["grün", "ÉtÉ", "abc"]);
    }

    #[test]
    fn test_token_positions() {
        let positions = token_positions("red blue red green red");
        assert_eq!(positions.get("red"), Some(&vec![0, 2, 4]));
        assert_eq!(positions.get("blue"), Some(&vec![1]));
        assert_eq!(positions.get("green"), Some(&vec![3]));
        assert_eq!(positions.len(), 3);
    }

    #[test]
    fn test_positions_count_nonempty_tokens() {
        // Consecutive spaces do not advance the word index.
        let positions = token_positions("a  b");
        assert_eq!(positions.get("b"), Some(&vec![1]));
    }
}
