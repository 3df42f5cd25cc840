//! Command implementations.

use std::time::Duration;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use salsa_spa_core::{AccentPolicy, CacheStatus, Config, Grader, LemmatizerKind};

pub mod grade_file;
pub mod grade_text;
pub mod info;
#[cfg(feature = "mcp")]
pub mod serve;
pub mod vocab;

/// Per-invocation overrides of the grading configuration.
#[derive(Args, Debug, Default, Clone)]
pub struct GradingOverrides {
    /// Vocabulary CSV with `word,level` rows (overrides config)
    #[arg(long, value_name = "CSV")]
    pub vocab: Option<Utf8PathBuf>,

    /// Lemmatizer backend (overrides config)
    #[arg(long, value_enum)]
    pub lemmatizer: Option<LemmatizerKind>,

    /// Accent handling (overrides config)
    #[arg(long, value_enum)]
    pub accents: Option<AccentPolicy>,
}

impl GradingOverrides {
    /// `config` with these overrides applied.
    pub fn apply(&self, config: &Config) -> Config {
        let mut config = config.clone();
        if let Some(ref vocab) = self.vocab {
            config.vocab_path = Some(vocab.clone());
        }
        if let Some(lemmatizer) = self.lemmatizer {
            config.lemmatizer = lemmatizer;
        }
        if let Some(accents) = self.accents {
            config.accents = accents;
        }
        config
    }
}

/// Process exit code for an input file that cannot be read.
pub const EXIT_INPUT_UNREADABLE: i32 = 2;

/// The input file could not be opened or decoded.
#[derive(Debug, thiserror::Error)]
#[error("failed to read {path}")]
pub struct InputUnreadable {
    /// File that failed.
    pub path: Utf8PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: std::io::Error,
}

/// Read a file and validate its size against the configured limit.
///
/// I/O failures are reported as [`InputUnreadable`].
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    let unreadable = |source| InputUnreadable {
        path: path.to_path_buf(),
        source,
    };
    // Preflight: check file size via metadata before reading into memory.
    let metadata = std::fs::metadata(path.as_std_path()).map_err(unreadable)?;
    if let Some(max) = max_bytes {
        let size = metadata.len() as usize;
        if size > max {
            anyhow::bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
        }
    }

    let content = std::fs::read_to_string(path.as_std_path()).map_err(unreadable)?;
    Ok(content)
}

/// Reject inline text larger than the configured limit.
pub fn check_input_size(text: &str, max_bytes: Option<usize>) -> anyhow::Result<()> {
    if let Some(max) = max_bytes
        && text.len() > max
    {
        anyhow::bail!(
            "input too large: {} bytes (limit: {max} bytes)",
            text.len()
        );
    }
    Ok(())
}

/// Load the grader for `config`, with a spinner while the vocabulary builds.
///
/// The spinner draws to stderr and hides itself when stderr is not a terminal.
pub fn load_grader(config: &Config) -> anyhow::Result<(Grader, CacheStatus)> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("loading vocabulary");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = Grader::from_config(config).context("failed to load grader");
    spinner.finish_and_clear();
    result
}
