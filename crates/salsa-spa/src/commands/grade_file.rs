//! Grade-file command: per-word levels for a text file.

use std::fs::File;
use std::io::BufWriter;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use salsa_spa_core::export::write_word_levels_csv;
use salsa_spa_core::{CefrLevel, Config, GradeReport, WordMatch, grade};

use super::{GradingOverrides, load_grader, read_input_file};

/// Arguments for the `grade-file` subcommand.
#[derive(Args, Debug)]
pub struct GradeFileArgs {
    /// Text file to grade.
    pub file: Utf8PathBuf,

    /// Write per-word levels to this CSV file (`Word,CEFR Level`).
    #[arg(short, long, value_name = "CSV")]
    pub output: Option<Utf8PathBuf>,

    #[command(flatten)]
    pub grading: GradingOverrides,
}

#[derive(Serialize)]
struct FileGrade<'a> {
    file: &'a Utf8Path,
    report: GradeReport,
    words: &'a [WordMatch],
}

/// Grade a file, print the level of every word, and optionally export CSV.
#[instrument(name = "cmd_grade_file", skip_all, fields(file = %args.file))]
pub fn cmd_grade_file(
    args: GradeFileArgs,
    global_json: bool,
    config: &Config,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(file = %args.file, output = ?args.output, "executing grade-file command");

    let content = read_input_file(&args.file, max_input_bytes)?;
    let (grader, _status) = load_grader(&args.grading.apply(config))?;

    let words = grader
        .word_levels(&content)
        .with_context(|| format!("failed to grade {}", args.file))?;
    let report = grade::aggregate(&words, content.chars().count(), grader.params());

    if let Some(ref output) = args.output {
        export_csv(&words, output)?;
    }

    if global_json {
        let out = FileGrade {
            file: &args.file,
            report,
            words: &words,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_words(&words);
    println!();
    println!(
        "{} {} (grade {:.3}, confidence {:.3})",
        "Level:".bold(),
        colored_level(report.predicted_level),
        report.grade,
        report.confidence,
    );
    if let Some(ref output) = args.output {
        println!("{} {}", "Saved:".green(), output);
    }

    Ok(())
}

fn export_csv(words: &[WordMatch], output: &Utf8Path) -> anyhow::Result<()> {
    let file =
        File::create(output.as_std_path()).with_context(|| format!("failed to create {output}"))?;
    write_word_levels_csv(words, BufWriter::new(file))
        .with_context(|| format!("failed to write {output}"))?;
    debug!(path = %output, rows = words.len(), "word levels exported");
    Ok(())
}

fn print_words(words: &[WordMatch]) {
    for m in words {
        match m.level {
            Some(level) => println!("{}: {}", m.text, colored_level(level)),
            None => println!("{}: {}", m.text, m.label().dimmed()),
        }
    }
}

/// Level code colored by band.
fn colored_level(level: CefrLevel) -> String {
    paint_level(level, level.as_str())
}

/// `text` in the color of `level`'s band.
///
/// Pad before painting: escape codes would otherwise count toward the width.
pub(crate) fn paint_level(level: CefrLevel, text: &str) -> String {
    match level {
        CefrLevel::A0 => text.dimmed().to_string(),
        CefrLevel::A1 | CefrLevel::A2 => text.green().to_string(),
        CefrLevel::B1 | CefrLevel::B2 => text.yellow().to_string(),
        CefrLevel::C1 | CefrLevel::C2 => text.red().to_string(),
    }
}
