//! Error types for salsa-spa-core.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised by a lemmatizer.
#[derive(Error, Debug)]
pub enum LemmaError {
    /// The lemma model could not be loaded during initialization.
    #[error("lemmatizer model unavailable at {path}: {source}")]
    ModelUnavailable {
        /// Path of the lemma table that was requested.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The lemma table could not be parsed.
    #[error("malformed lemma table at line {line}: {message}")]
    MalformedTable {
        /// 1-based line number of the offending record.
        line: u64,
        /// What was wrong with it.
        message: String,
    },

    /// A lemmatization call failed.
    #[error("failed to lemmatize {input:?}: {message}")]
    Failed {
        /// The text that was being lemmatized.
        input: String,
        /// What went wrong.
        message: String,
    },
}

/// Result type alias using [`LemmaError`].
pub type LemmaResult<T> = Result<T, LemmaError>;

/// Errors that can occur while loading a vocabulary list.
#[derive(Error, Debug)]
pub enum VocabError {
    /// The vocabulary source could not be opened.
    #[error("failed to read vocabulary {path}: {source}")]
    Io {
        /// Path of the vocabulary source.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The CSV could not be decoded.
    #[error("malformed vocabulary CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A row named a level outside `A1`..`C2`.
    #[error("unknown level {level:?} for {word:?} at line {line}")]
    UnknownLevel {
        /// The word on the offending row.
        word: String,
        /// The level string as written.
        level: String,
        /// 1-based line number.
        line: u64,
    },

    /// A row whose word was empty after lemmatization.
    #[error("empty expression at line {line}")]
    EmptyExpression {
        /// 1-based line number.
        line: u64,
    },

    /// Lemmatizing a vocabulary entry failed.
    #[error(transparent)]
    Lemma(#[from] LemmaError),
}

/// Result type alias using [`VocabError`].
pub type VocabResult<T> = Result<T, VocabError>;

/// Errors from the on-disk index cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reading or writing the cache file failed.
    #[error("cache I/O failed for {path}: {source}")]
    Io {
        /// Cache file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The cache entry could not be encoded or decoded.
    #[error("invalid cache data in {path}: {source}")]
    Json {
        /// Cache file path.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias using [`CacheError`].
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur while grading text.
#[derive(Error, Debug)]
pub enum GradeError {
    /// The vocabulary could not be loaded.
    #[error(transparent)]
    Vocab(#[from] VocabError),

    /// The lemmatizer failed.
    #[error(transparent)]
    Lemma(#[from] LemmaError),

    /// The configured weight exponent is not a finite number.
    #[error("weight exponent must be finite, got {0}")]
    InvalidWeightExponent(f64),
}

/// Result type alias using [`GradeError`].
pub type GradeResult<T> = Result<T, GradeError>;
