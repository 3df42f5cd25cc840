//! Grading facade: clean, tokenize, match, aggregate.

use std::sync::Arc;

use crate::cache::{CacheStatus, IndexCache};
use crate::config::Config;
use crate::error::{GradeError, GradeResult};
use crate::grade::{self, GradeReport, GradingParams};
use crate::lemma::{self, Lemmatizer};
use crate::matcher::{self, MatchResult};
use crate::text::{self, AccentPolicy};
use crate::vocab::{VocabStats, VocabularyIndex};

/// Grades Spanish text against a loaded vocabulary.
///
/// The index is read-only once built, so a `Grader` can be shared across
/// threads behind an `Arc` and called concurrently.
pub struct Grader {
    index: VocabularyIndex,
    lemmatizer: Arc<dyn Lemmatizer>,
    accents: AccentPolicy,
    params: GradingParams,
}

impl std::fmt::Debug for Grader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grader")
            .field("entries", &self.index.len())
            .field("lemmatizer", &self.lemmatizer.fingerprint())
            .field("accents", &self.accents)
            .field("params", &self.params)
            .finish()
    }
}

impl Grader {
    /// Assemble a grader from already-loaded parts.
    ///
    /// `index` must have been built with the same lemmatizer and accent
    /// policy, or lookups will silently miss.
    pub fn new(
        index: VocabularyIndex,
        lemmatizer: Arc<dyn Lemmatizer>,
        accents: AccentPolicy,
        params: GradingParams,
    ) -> GradeResult<Self> {
        if !params.weight_exponent.is_finite() {
            return Err(GradeError::InvalidWeightExponent(params.weight_exponent));
        }
        Ok(Self {
            index,
            lemmatizer,
            accents,
            params,
        })
    }

    /// Initialize the lemmatizer and load the vocabulary named by `config`.
    ///
    /// A configured `vocab_path` goes through the index cache unless caching
    /// is disabled; otherwise the embedded word list is used.
    #[tracing::instrument(skip_all)]
    pub fn from_config(config: &Config) -> GradeResult<(Self, CacheStatus)> {
        let params = config.grading_params();
        let lemmatizer = lemma::initialize(
            config.lemmatizer,
            config.lemma_table.as_deref(),
            config.accents,
            config.lemma_cache_size(),
        )?;

        let (index, status) = match config.vocab_path.as_deref() {
            None => (
                VocabularyIndex::builtin(lemmatizer.as_ref(), config.accents)?,
                CacheStatus::Embedded,
            ),
            Some(path) => match IndexCache::from_config(config) {
                Some(cache) => cache.load_or_build(path, lemmatizer.as_ref(), config.accents)?,
                None => (
                    VocabularyIndex::from_path(path, lemmatizer.as_ref(), config.accents)?,
                    CacheStatus::Disabled,
                ),
            },
        };
        tracing::info!(entries = index.len(), status = ?status, "grader ready");

        let grader = Self::new(index, lemmatizer, config.accents, params)?;
        Ok((grader, status))
    }

    /// Per-expression levels for `text`, in input order.
    pub fn word_levels(&self, text: &str) -> GradeResult<MatchResult> {
        let tokens = text::clean_tokens(text, self.accents);
        Ok(matcher::match_tokens(
            &tokens,
            &self.index,
            self.lemmatizer.as_ref(),
        )?)
    }

    /// Grade `text`.
    #[tracing::instrument(skip_all, fields(chars = text.chars().count()))]
    pub fn grade(&self, text: &str) -> GradeResult<GradeReport> {
        let input_length = text.chars().count();
        let matches = self.word_levels(text)?;
        let report = grade::aggregate(&matches, input_length, &self.params);
        tracing::debug!(
            grade = report.grade,
            level = %report.predicted_level,
            confidence = report.confidence,
            "graded"
        );
        Ok(report)
    }

    /// The vocabulary index in use.
    pub fn index(&self) -> &VocabularyIndex {
        &self.index
    }

    /// Entry counts per level and expression length.
    pub fn vocab_stats(&self) -> VocabStats {
        self.index.stats()
    }

    /// Accent policy applied to input and vocabulary.
    pub const fn accents(&self) -> AccentPolicy {
        self.accents
    }

    /// Grading parameters in use.
    pub const fn params(&self) -> &GradingParams {
        &self.params
    }

    /// Fingerprint of the active lemmatizer.
    pub fn lemmatizer_fingerprint(&self) -> String {
        self.lemmatizer.fingerprint()
    }
}
