//! Core library for salsa-spa.
//!
//! Grades Spanish text on the CEFR scale (A1 to C2, with A0 for text made of
//! unlisted words) by matching words and fixed expressions against
//! level-tagged vocabulary lists.
//!
//! # Modules
//!
//! - [`text`] - Cleaning and tokenization
//! - [`lemma`] - Lemmatizer trait and implementations
//! - [`vocab`] - Length-indexed vocabulary
//! - [`cache`] - On-disk cache of built vocabularies
//! - [`matcher`] - Longest-match-first expression matching
//! - [`grade`] - Aggregation of per-word levels into a grade
//! - [`grader`] - Clean, match and grade in one call
//! - [`export`] - CSV output of per-word levels
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```no_run
//! use salsa_spa_core::{ConfigLoader, Grader};
//!
//! let (config, _sources) = ConfigLoader::new()
//!     .with_user_config(true)
//!     .load()
//!     .expect("Failed to load configuration");
//!
//! let (grader, _status) = Grader::from_config(&config).expect("Failed to load vocabulary");
//! let report = grader.grade("Bailar con el presidente").expect("Failed to grade");
//! println!("{} ({:.2})", report.predicted_level, report.grade);
//! ```
#![deny(unsafe_code)]

pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod grade;
pub mod grader;
pub mod lemma;
pub mod level;
pub mod matcher;
pub mod text;
pub mod vocab;

pub use cache::{CacheStatus, IndexCache};
pub use config::{Config, ConfigLoader, ConfigSources, LogLevel};
pub use error::{
    CacheError, ConfigError, ConfigResult, GradeError, GradeResult, LemmaError, LemmaResult,
    VocabError, VocabResult,
};
pub use grade::{GradeReport, GradeStats, GradingParams};
pub use grader::Grader;
pub use lemma::{Lemmatizer, LemmatizerKind};
pub use level::CefrLevel;
pub use matcher::{MatchResult, WordMatch};
pub use text::AccentPolicy;
pub use vocab::{VocabStats, VocabularyIndex};

/// Default maximum input size: 5 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;
