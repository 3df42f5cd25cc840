//! Vocab command: statistics for the loaded vocabulary.

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use salsa_spa_core::{CacheStatus, CefrLevel, Config, IndexCache, VocabStats};

use super::grade_file::paint_level;
use super::{GradingOverrides, load_grader};

/// Arguments for the `vocab` subcommand.
#[derive(Args, Debug, Default)]
pub struct VocabArgs {
    /// Discard the cached index and rebuild it from the vocabulary file.
    #[arg(long)]
    pub rebuild_cache: bool,

    #[command(flatten)]
    pub grading: GradingOverrides,
}

#[derive(Serialize)]
struct VocabInfo {
    source: String,
    status: CacheStatus,
    lemmatizer: String,
    #[serde(flatten)]
    stats: VocabStats,
}

/// Print entry counts per level and expression length.
#[instrument(name = "cmd_vocab", skip_all, fields(rebuild = args.rebuild_cache))]
pub fn cmd_vocab(args: VocabArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    let config = &args.grading.apply(config);
    debug!(vocab = ?config.vocab_path, "executing vocab command");

    if args.rebuild_cache
        && let (Some(source), Some(cache)) =
            (config.vocab_path.as_deref(), IndexCache::from_config(config))
    {
        let removed = cache
            .invalidate(source)
            .with_context(|| format!("failed to clear cache in {}", cache.dir()))?;
        debug!(removed, "index cache invalidated");
    }

    let (grader, status) = load_grader(config)?;
    let info = VocabInfo {
        source: config
            .vocab_path
            .as_ref()
            .map_or_else(|| "built-in".to_string(), ToString::to_string),
        status,
        lemmatizer: grader.lemmatizer_fingerprint(),
        stats: grader.vocab_stats(),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}: {}", "Source".dimmed(), info.source.cyan());
    println!("{}: {:?}", "Index".dimmed(), info.status);
    println!("{}: {}", "Lemmatizer".dimmed(), info.lemmatizer);
    println!(
        "{}: {} (longest expression: {} words)",
        "Entries".dimmed(),
        info.stats.total,
        info.stats.max_len
    );
    println!();
    for (level, stats) in &info.stats.levels {
        let lengths = stats
            .by_length
            .iter()
            .map(|(n, count)| format!("{n}w={count}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{}", level_row(*level, stats.total, &lengths));
    }

    Ok(())
}

/// One aligned row of the per-level table.
fn level_row(level: CefrLevel, total: usize, lengths: &str) -> String {
    let code = paint_level(level, &format!("{:>4}", level.as_str()));
    format!("{code}  {total:>6}  {}", lengths.dimmed())
}
