//! Word segmentation and stemming strategies.
//!
//! Both are collaborators injected into the index builder and the query
//! engine so the core stays decoupled from locale-specific text handling.
//! The defaults here cover plain English text.

/// Splits a verse's text into the words that get indexed.
pub trait WordTokenizer: Send + Sync {
    /// Extract normalized (lowercased, punctuation-stripped) words.
    fn words(&self, text: &str) -> Vec<String>;
}

/// Reduces a word to a root for grammar (inflection) expansion.
pub trait Stemmer: Send + Sync {
    fn root<'a>(&self, word: &'a str) -> &'a str;
}

/// Default tokenizer: alphanumeric runs, apostrophes kept word-internal.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleTokenizer;

impl WordTokenizer for SimpleTokenizer {
    fn words(&self, text: &str) -> Vec<String> {
        let mut words = Vec::new();
        let mut current = String::new();

        for ch in text.chars() {
            if ch.is_alphanumeric() || ch == '\'' {
                for lower in ch.to_lowercase() {
                    current.push(lower);
                }
            } else if !current.is_empty() {
                push_word(&mut words, &current);
                current.clear();
            }
        }
        if !current.is_empty() {
            push_word(&mut words, &current);
        }

        words
    }
}

fn push_word(words: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim_matches('\'');
    if !trimmed.is_empty() {
        words.push(trimmed.to_string());
    }
}

/// Normalize a single query term the same way indexed words are normalized.
pub fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Suffixes stripped by the default stemmer, tried in order.
/// "es" must come before "s" or it will never match.
const ENDINGS: [&str; 7] = ["es", "'s", "s", "ing", "ed", "er", "ly"];

/// Default stemmer: strips one common English suffix.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuffixStemmer;

impl Stemmer for SuffixStemmer {
    fn root<'a>(&self, word: &'a str) -> &'a str {
        for ending in ENDINGS {
            if word.len() > ending.len() {
                if let Some(stripped) = word.strip_suffix(ending) {
                    return stripped;
                }
            }
        }
        word
    }
}
