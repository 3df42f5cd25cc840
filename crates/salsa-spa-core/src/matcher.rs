//! Longest-match-first expression matcher.
//!
//! Walks the token stream left to right. At each position it tries the
//! longest window the vocabulary could contain first and shrinks it one word
//! at a time, so a fixed phrase like "tener en cuenta" is never split into
//! "tener" + two unknowns. Within one window length, levels are tried in
//! [`MATCH_PRIORITY`] order, so an expression listed at several levels
//! resolves to the highest one.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::LemmaResult;
use crate::lemma::Lemmatizer;
use crate::level::{CefrLevel, MATCH_PRIORITY};
use crate::vocab::VocabularyIndex;

/// Label used for tokens that match no vocabulary level.
pub const UNKNOWN_LABEL: &str = "unknown";

/// One contiguous run of tokens and the level it matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WordMatch {
    /// Surface text of the run, tokens joined by single spaces.
    pub text: String,
    /// Matched level, `None` when the token is in no list.
    pub level: Option<CefrLevel>,
}

impl WordMatch {
    /// Level code, or `"unknown"`.
    pub fn label(&self) -> &'static str {
        self.level.as_ref().map_or(UNKNOWN_LABEL, CefrLevel::as_str)
    }

    /// Number of tokens covered by this run.
    pub fn token_count(&self) -> usize {
        self.text.split(' ').count()
    }
}

/// Ordered matches partitioning the input tokens.
pub type MatchResult = Vec<WordMatch>;

/// Match `tokens` against `index`.
///
/// Every token is covered by exactly one [`WordMatch`]. Lemmatizer errors
/// propagate unchanged.
#[tracing::instrument(skip_all, fields(tokens = tokens.len()))]
pub fn match_tokens<S, L>(
    tokens: &[S],
    index: &VocabularyIndex,
    lemmatizer: &L,
) -> LemmaResult<MatchResult>
where
    S: AsRef<str>,
    L: Lemmatizer + ?Sized,
{
    let max_len = index.max_len();
    let mut matches = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let longest = max_len.min(tokens.len() - i);
        let mut hit = None;

        for n in (1..=longest).rev() {
            let phrase = join(&tokens[i..i + n]);
            let lemma = lemmatizer.lemmatize(&phrase)?;
            if let Some(level) = level_of(index, n, &lemma) {
                hit = Some((phrase, level, n));
                break;
            }
        }

        match hit {
            Some((text, level, n)) => {
                tracing::trace!(%text, %level, n, "matched");
                matches.push(WordMatch {
                    text,
                    level: Some(level),
                });
                i += n;
            }
            None => {
                matches.push(WordMatch {
                    text: tokens[i].as_ref().to_string(),
                    level: None,
                });
                i += 1;
            }
        }
    }

    Ok(matches)
}

/// Highest-priority level listing `lemma` among `n`-word expressions.
fn level_of(index: &VocabularyIndex, n: usize, lemma: &str) -> Option<CefrLevel> {
    MATCH_PRIORITY
        .into_iter()
        .find(|level| index.contains(*level, n, lemma))
}

fn join<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::lemma::IdentityLemmatizer;
    use crate::level::KNOWN_LEVELS;
    use crate::vocab::VocabEntry;
    use proptest::prelude::*;

    const ALPHABET: [&str; 4] = ["a", "de", "la", "casa"];

    fn token() -> impl Strategy<Value = String> {
        proptest::sample::select(ALPHABET.to_vec()).prop_map(str::to_string)
    }

    fn entry() -> impl Strategy<Value = VocabEntry> {
        (
            proptest::collection::vec(token(), 1..=4),
            proptest::sample::select(KNOWN_LEVELS.to_vec()),
        )
            .prop_map(|(words, level)| VocabEntry {
                expression: words.join(" "),
                level,
            })
    }

    proptest! {
        /// Concatenating the matched runs gives back the input tokens.
        #[test]
        fn matches_partition_any_token_sequence(
            tokens in proptest::collection::vec(token(), 0..60),
            entries in proptest::collection::vec(entry(), 0..12),
        ) {
            let index = VocabularyIndex::from_entries(entries);
            let result = match_tokens(&tokens, &index, &IdentityLemmatizer).unwrap();

            let rebuilt: Vec<String> = result
                .iter()
                .flat_map(|m| m.text.split(' ').map(str::to_string))
                .collect();
            prop_assert_eq!(&rebuilt, &tokens);

            for m in &result {
                prop_assert!(m.token_count() >= 1);
                prop_assert!(m.token_count() <= index.max_len().max(1));
                // Multi-token runs only come from the vocabulary
                if m.token_count() > 1 {
                    prop_assert!(m.level.is_some());
                }
                if let Some(level) = m.level {
                    prop_assert!(index.contains(level, m.token_count(), &m.text));
                }
            }
        }
    }
}
