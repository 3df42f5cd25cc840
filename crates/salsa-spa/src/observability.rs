//! Logging setup: human-readable logs on stderr, optional JSONL file.
//!
//! The file layer is enabled by, in order of precedence:
//! `SALSA_SPA_LOG_PATH` (exact file), `SALSA_SPA_LOG_DIR` (daily-rotated
//! files in a directory), or `log_dir` from the configuration.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_PATH_ENV: &str = "SALSA_SPA_LOG_PATH";
const LOG_DIR_ENV: &str = "SALSA_SPA_LOG_DIR";
const LOG_FILE_PREFIX: &str = "salsa-spa.jsonl";

/// Where (if anywhere) to write the JSONL log file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Write to exactly this file.
    pub log_path: Option<PathBuf>,
    /// Write daily-rotated files into this directory.
    pub log_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Read the environment, falling back to the configured log directory.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        Self::resolve(
            std::env::var_os(LOG_PATH_ENV).map(PathBuf::from),
            std::env::var_os(LOG_DIR_ENV).map(PathBuf::from),
            config_log_dir,
        )
    }

    fn resolve(
        env_path: Option<PathBuf>,
        env_dir: Option<PathBuf>,
        config_dir: Option<PathBuf>,
    ) -> Self {
        match (env_path, env_dir) {
            (Some(path), _) => Self {
                log_path: Some(path),
                log_dir: None,
            },
            (None, dir) => Self {
                log_path: None,
                log_dir: dir.or(config_dir),
            },
        }
    }
}

/// Holds the file writer's worker; logs are flushed when it drops.
#[derive(Debug)]
pub struct ObservabilityGuard {
    _file: Option<WorkerGuard>,
}

/// Build the log filter.
///
/// `RUST_LOG` wins when set. Otherwise `-q` gives `error`, `-v` gives
/// `debug`, `-vv` gives `trace`, and the configured level applies.
pub fn env_filter(quiet: bool, verbose: u8, config_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(filter_level(quiet, verbose, config_level))
}

fn filter_level(quiet: bool, verbose: u8, config_level: &str) -> &str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => config_level,
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<ObservabilityGuard> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let (file_layer, guard) = match file_appender(config)? {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(ObservabilityGuard { _file: guard })
}

fn file_appender(
    config: &ObservabilityConfig,
) -> anyhow::Result<Option<tracing_appender::rolling::RollingFileAppender>> {
    if let Some(ref path) = config.log_path {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .with_context(|| format!("log path has no file name: {}", path.display()))?;
        create_dir(dir)?;
        return Ok(Some(tracing_appender::rolling::never(dir, name)));
    }
    if let Some(ref dir) = config.log_dir {
        create_dir(dir)?;
        return Ok(Some(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX)));
    }
    Ok(None)
}

fn create_dir(dir: &Path) -> anyhow::Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_beats_directories() {
        let config = ObservabilityConfig::resolve(
            Some(PathBuf::from("/tmp/salsa.jsonl")),
            Some(PathBuf::from("/tmp/env")),
            Some(PathBuf::from("/tmp/config")),
        );
        assert_eq!(config.log_path, Some(PathBuf::from("/tmp/salsa.jsonl")));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn env_dir_beats_config_dir() {
        let config = ObservabilityConfig::resolve(
            None,
            Some(PathBuf::from("/tmp/env")),
            Some(PathBuf::from("/tmp/config")),
        );
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/env")));
    }

    #[test]
    fn config_dir_is_the_fallback() {
        let config = ObservabilityConfig::resolve(None, None, Some(PathBuf::from("/tmp/config")));
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/config")));
        assert_eq!(
            ObservabilityConfig::resolve(None, None, None),
            ObservabilityConfig::default()
        );
    }

    #[test]
    fn flags_adjust_level() {
        assert_eq!(filter_level(false, 0, "warn"), "warn");
        assert_eq!(filter_level(false, 1, "warn"), "debug");
        assert_eq!(filter_level(false, 3, "warn"), "trace");
        assert_eq!(filter_level(true, 2, "warn"), "error");
    }
}
