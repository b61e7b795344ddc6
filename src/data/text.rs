// ============================================================
// Layer 4 — Prompt Text Helpers
// ============================================================
// Splits a prompt into candidate words and applies the cheap
// suffix heuristics that settle most words without a model call.
//
//   "#!promptskeeper The pilot is deploying a strategic plan"
//        │ prepare_prompt
//        ▼
//   "The pilot is deploying a strategic plan"
//        │ split_words
//        ▼
//   [The, pilot, is, deploying, a, strategic, plan]
//        │ is_exception_word drops: The, is, a
//        ▼
//   pilot → ?   deploying → action (-ing)   strategic → ?   plan → ?

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::labels::Category;
use crate::domain::prediction::{CategorizedWords, WordCategory};

/// Marks a prompt block for categorisation.
pub const MARKER: &str = "#!promptskeeper";

const MIN_WORD_LENGTH: usize = 3;

const EXCEPTION_WORDS: &[&str] = &[
    "the", "and", "for", "but", "not", "was", "are", "has", "had", "can",
    "with", "who", "how", "why", "its", "per", "via", "did", "does", "yet",
    "nor", "etc", "from", "this", "that", "these", "those", "been", "just",
    "also", "than", "then", "over", "about", "into", "off", "even", "still",
    "some", "may",
];

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['’-][\p{L}\p{N}]+)*").expect("valid word regex")
});

// Checked in this order; the first matching suffix wins.
static SUFFIX_RULES: LazyLock<[(Category, Regex); 4]> = LazyLock::new(|| {
    let rule = |pattern: &str| Regex::new(pattern).expect("valid suffix regex");
    [
        (Category::Subject,    rule(r"(?i)(or|ian|eer|ster|ist|ite|ee)$")),
        (Category::Action,     rule(r"(?i)(ing|ize|ify|ate|ish|ect)$")),
        (Category::Object,     rule(r"(?i)(tion|sion|ment|ity|ism|ness|hood|age|ance|ence|ery|dom|ship)$")),
        (Category::Descriptor, rule(r"(?i)(ful|ous|ible|able|less|ive|ward|wise|ways|fold|most)$")),
    ]
});

/// Strip the marker and return the text to classify plus empty buckets.
pub fn prepare_prompt(prompt: &str) -> (String, CategorizedWords) {
    let text = prompt.replacen(MARKER, "", 1).trim().to_string();
    (text, CategorizedWords::with_marker(MARKER))
}

/// Letters and digits, with inner apostrophes or hyphens allowed.
pub fn split_words(text: &str) -> Vec<&str> {
    WORD_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Short words, words without any ASCII letter, and stop words are skipped.
pub fn is_exception_word(word: &str) -> bool {
    word.chars().count() < MIN_WORD_LENGTH
        || !word.chars().any(|c| c.is_ascii_alphabetic())
        || EXCEPTION_WORDS.contains(&word.to_lowercase().as_str())
}

/// Classify by suffix alone. Unmatched words are unclassified.
pub fn classify_by_suffix(word: &str) -> WordCategory {
    let lower = word.to_lowercase();
    SUFFIX_RULES
        .iter()
        .find(|(_, re)| re.is_match(&lower))
        .map(|(category, _)| WordCategory::certain(*category))
        .unwrap_or_else(WordCategory::unclassified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_prompt_removes_marker_and_trims() {
        let (text, words) = prepare_prompt("  #!promptskeeper This is a test prompt.  ");
        assert_eq!(text, "This is a test prompt.");
        assert_eq!(words.marker, vec![MARKER]);
    }

    #[test]
    fn test_split_words_keeps_inner_joiners() {
        assert_eq!(
            split_words("Don't re-run the état, 42 times!"),
            vec!["Don't", "re-run", "the", "état", "42", "times"]
        );
    }

    #[test]
    fn test_split_words_empty() {
        assert!(split_words("  ... !!").is_empty());
    }

    #[test]
    fn test_exception_words() {
        assert!(is_exception_word("an"));
        assert!(is_exception_word("The"));
        assert!(is_exception_word("1234"));
        assert!(is_exception_word("αβγδ"));
        assert!(!is_exception_word("über"));
        assert!(!is_exception_word("über-cool"));
        assert!(!is_exception_word("banana"));
    }

    #[test]
    fn test_suffix_heuristics() {
        assert_eq!(classify_by_suffix("Doctor").category, Some(Category::Subject));
        assert_eq!(classify_by_suffix("running").category, Some(Category::Action));
        assert_eq!(classify_by_suffix("deployment").category, Some(Category::Object));
        assert_eq!(classify_by_suffix("faithful").category, Some(Category::Descriptor));
        assert_eq!(classify_by_suffix("faithful").confidence, 1.0);
    }

    #[test]
    fn test_suffix_match_ignores_case() {
        assert_eq!(classify_by_suffix("CREATOR").category, Some(Category::Subject));
        assert_eq!(classify_by_suffix("Generate").category, Some(Category::Action));
    }

    #[test]
    fn test_unmatched_word_is_unclassified() {
        let result = classify_by_suffix("banana");
        assert_eq!(result, WordCategory::unclassified());
        assert!(!result.is_classified());
    }
}
