//! Text cleaning and tokenization.
//!
//! Cleaning lowercases the input, removes punctuation and (by default) strips
//! combining accents, so `"¿Qué hora es?"` becomes `"que hora es"`.
//! Tokenization then splits the cleaned text on word boundaries.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Anything that is neither a word character nor whitespace.
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

/// A run of word characters.
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

/// How accented letters are treated during cleaning.
///
/// Stripping makes `"acción"` and `"accion"` the same token; keeping them
/// leaves accented and unaccented spellings distinct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum AccentPolicy {
    /// Remove combining marks after NFD decomposition (default).
    #[default]
    Strip,
    /// Keep accents, normalized to NFC.
    Keep,
}

impl AccentPolicy {
    /// Returns the policy name as used in configuration files.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strip => "strip",
            Self::Keep => "keep",
        }
    }
}

/// Lowercase, drop punctuation and apply the accent policy.
pub fn clean(text: &str, accents: AccentPolicy) -> String {
    PUNCTUATION
        .replace_all(&clean_word(text, accents), "")
        .into_owned()
}

/// Lowercase and apply the accent policy to a single word.
///
/// Unlike [`clean`], punctuation inside the word is left alone.
pub fn clean_word(word: &str, accents: AccentPolicy) -> String {
    let lower = word.to_lowercase();
    match accents {
        AccentPolicy::Strip => lower.nfd().filter(|c| !is_combining_mark(*c)).collect(),
        AccentPolicy::Keep => lower.nfc().collect(),
    }
}

/// Split cleaned text into word tokens.
pub fn tokenize(cleaned: &str) -> Vec<String> {
    WORD.find_iter(cleaned)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Clean then tokenize in one step.
#[tracing::instrument(level = "trace", skip(text), fields(text_len = text.len()))]
pub fn clean_tokens(text: &str, accents: AccentPolicy) -> Vec<String> {
    tokenize(&clean(text, accents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_punctuation() {
        assert_eq!(clean("Árbol, café!", AccentPolicy::Strip), "arbol cafe");
    }

    #[test]
    fn strips_inverted_punctuation() {
        assert_eq!(clean("¿Qué hora es?", AccentPolicy::Strip), "que hora es");
    }

    #[test]
    fn clean_word_folds_tilde() {
        assert_eq!(clean_word("niño", AccentPolicy::Strip), "nino");
        assert_eq!(clean_word("acción", AccentPolicy::Strip), "accion");
    }

    #[test]
    fn keep_policy_preserves_accents() {
        assert_eq!(clean("¡Qué café!", AccentPolicy::Keep), "qué café");
        assert_eq!(clean_word("Niño", AccentPolicy::Keep), "niño");
    }

    #[test]
    fn tokenize_splits_on_word_boundaries() {
        assert_eq!(
            tokenize("bailar  con\nel presidente"),
            vec!["bailar", "con", "el", "presidente"]
        );
    }

    #[test]
    fn empty_text_has_no_tokens() {
        assert!(clean_tokens("", AccentPolicy::Strip).is_empty());
        assert!(clean_tokens("¡¿...?!", AccentPolicy::Strip).is_empty());
    }
}
