//! Level-tagged vocabulary, indexed by level and expression length.
//!
//! Every `(word, level)` row is cleaned and lemmatized on load with the same
//! cleaner and lemmatizer used for matching, then stored under its level and
//! its word count. The matcher only ever asks "is this lemmatized `n`-word
//! phrase listed at this level?".

use std::collections::{BTreeMap, HashSet};
use std::io::Read;

use camino::Utf8Path;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{VocabError, VocabResult};
use crate::lemma::Lemmatizer;
use crate::level::CefrLevel;
use crate::text::{self, AccentPolicy};

/// Built-in Spanish CEFR word list (`word,level`).
const BUILTIN_VOCAB: &str = include_str!("../data/cefr_vocab.csv");

/// A lemmatized expression tagged with its level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VocabEntry {
    /// One or more space-joined lemmas.
    pub expression: String,
    /// Level the expression is listed at (never `A0`).
    pub level: CefrLevel,
}

impl VocabEntry {
    /// Number of words in the expression.
    pub fn word_count(&self) -> usize {
        self.expression.split(' ').count()
    }
}

#[derive(Debug, Deserialize)]
struct VocabRow {
    word: String,
    level: String,
}

/// Level → word count → lemmatized expressions.
///
/// Immutable once built; share it by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyIndex {
    levels: BTreeMap<CefrLevel, BTreeMap<usize, HashSet<String>>>,
}

impl VocabularyIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-lemmatized entries.
    pub fn from_entries<I: IntoIterator<Item = VocabEntry>>(entries: I) -> Self {
        let mut index = Self::new();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    /// Read a `word,level` CSV, lemmatizing each word.
    ///
    /// Rows whose level is not one of `A1`..`C2` are rejected with the
    /// offending line number.
    pub fn from_reader<R, L>(reader: R, lemmatizer: &L, accents: AccentPolicy) -> VocabResult<Self>
    where
        R: Read,
        L: Lemmatizer + ?Sized,
    {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let mut index = Self::new();
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map_or(0, csv::Position::line);
            let row: VocabRow = record.deserialize(Some(&headers))?;
            let level = match row.level.parse::<CefrLevel>() {
                Ok(level) if level.is_known() => level,
                _ => {
                    return Err(VocabError::UnknownLevel {
                        word: row.word,
                        level: row.level,
                        line,
                    });
                }
            };
            let cleaned = text::clean_tokens(&row.word, accents).join(" ");
            let expression = lemmatizer.lemmatize(&cleaned)?;
            if expression.is_empty() {
                return Err(VocabError::EmptyExpression { line });
            }
            index.insert(VocabEntry { expression, level });
        }
        Ok(index)
    }

    /// Load a vocabulary CSV from disk.
    #[tracing::instrument(skip(lemmatizer, accents))]
    pub fn from_path<L: Lemmatizer + ?Sized>(
        path: &Utf8Path,
        lemmatizer: &L,
        accents: AccentPolicy,
    ) -> VocabResult<Self> {
        let file = std::fs::File::open(path.as_std_path()).map_err(|source| VocabError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_reader(file, lemmatizer, accents)?;
        tracing::info!(entries = index.len(), max_len = index.max_len(), "vocabulary loaded");
        Ok(index)
    }

    /// Build from the word list embedded in the crate.
    pub fn builtin<L: Lemmatizer + ?Sized>(
        lemmatizer: &L,
        accents: AccentPolicy,
    ) -> VocabResult<Self> {
        Self::from_reader(BUILTIN_VOCAB.as_bytes(), lemmatizer, accents)
    }

    /// Add an entry. Returns `false` for `A0` entries and duplicates.
    pub fn insert(&mut self, entry: VocabEntry) -> bool {
        if !entry.level.is_known() {
            return false;
        }
        let n = entry.word_count();
        self.levels
            .entry(entry.level)
            .or_default()
            .entry(n)
            .or_default()
            .insert(entry.expression)
    }

    /// Whether `expression` is listed at `level` among `n`-word expressions.
    pub fn contains(&self, level: CefrLevel, n: usize, expression: &str) -> bool {
        self.levels
            .get(&level)
            .and_then(|by_len| by_len.get(&n))
            .is_some_and(|set| set.contains(expression))
    }

    /// Largest expression length in the index, or 1 when empty.
    pub fn max_len(&self) -> usize {
        self.levels
            .values()
            .filter_map(|by_len| by_len.keys().next_back().copied())
            .max()
            .unwrap_or(1)
    }

    /// Total number of `(level, expression)` entries.
    pub fn len(&self) -> usize {
        self.levels
            .values()
            .flat_map(BTreeMap::values)
            .map(HashSet::len)
            .sum()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry counts per level and length.
    pub fn stats(&self) -> VocabStats {
        let levels = self
            .levels
            .iter()
            .map(|(level, by_len)| {
                let by_length: BTreeMap<usize, usize> =
                    by_len.iter().map(|(n, set)| (*n, set.len())).collect();
                let total = by_length.values().sum();
                (*level, LevelStats { total, by_length })
            })
            .collect();
        VocabStats {
            total: self.len(),
            max_len: self.max_len(),
            levels,
        }
    }
}

/// Summary of a [`VocabularyIndex`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VocabStats {
    /// Total entries across all levels.
    pub total: usize,
    /// Longest expression, in words.
    pub max_len: usize,
    /// Per-level breakdown.
    pub levels: BTreeMap<CefrLevel, LevelStats>,
}

/// Entry counts for one level.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LevelStats {
    /// Entries at this level.
    pub total: usize,
    /// Entries keyed by word count.
    pub by_length: BTreeMap<usize, usize>,
}
