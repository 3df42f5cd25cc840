//! Grade-text command: full JSON report for a string.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use tracing::{debug, instrument};

use salsa_spa_core::Config;

use super::{GradingOverrides, check_input_size, load_grader};

/// Arguments for the `grade-text` subcommand.
#[derive(Args, Debug)]
pub struct GradeTextArgs {
    /// Text to grade.
    #[arg(short, long)]
    pub text: String,

    /// Write the JSON report to this file instead of stdout.
    #[arg(short, long, value_name = "JSON")]
    pub output: Option<Utf8PathBuf>,

    #[command(flatten)]
    pub grading: GradingOverrides,
}

/// Grade a string and emit the report as JSON.
///
/// The report is always JSON, so the global `--json` flag changes nothing here.
#[instrument(name = "cmd_grade_text", skip_all, fields(chars = args.text.chars().count()))]
pub fn cmd_grade_text(
    args: GradeTextArgs,
    config: &Config,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(output = ?args.output, "executing grade-text command");

    check_input_size(&args.text, max_input_bytes)?;
    let (grader, _status) = load_grader(&args.grading.apply(config))?;
    let report = grader.grade(&args.text).context("failed to grade text")?;
    let json = serde_json::to_string_pretty(&report)?;

    match args.output {
        Some(path) => {
            std::fs::write(path.as_std_path(), json + "\n")
                .with_context(|| format!("failed to write {path}"))?;
            debug!(path = %path, "report written");
        }
        None => println!("{json}"),
    }

    Ok(())
}
