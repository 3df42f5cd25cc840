//! Configuration integration tests.
//!
//! These tests verify config discovery, format parsing, and precedence
//! from an end-to-end perspective using the compiled binary. Tests use
//! `info --json` to assert the effective grading setup, and `grade-text`
//! to check that configuration actually changes grading.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// Run `args` from `dir` and parse stdout as JSON.
fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = cmd()
        .args(["-C", dir.to_str().unwrap()])
        .args(args)
        .output()
        .expect("failed to run command");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("invalid JSON output")
}

/// Effective configuration as reported by `info --json`.
fn config_json(dir: &Path) -> Value {
    run_json(dir, &["info", "--json"])["config"].clone()
}

// =============================================================================
// Config File Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = config_json(tmp.path());

    assert_eq!(config["accents"], "strip");
    assert_eq!(config["lemmatizer"], "lookup");
    assert_eq!(config["vocabulary"], "built-in");
    assert_eq!(config["lemma_cache_size"], 16384);
    assert!(
        config["config_file"].is_null(),
        "no config file should be reported"
    );
}

#[test]
fn discovers_dotfile_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".salsa-spa.toml"), "accents = \"keep\"\n").unwrap();

    let config = config_json(tmp.path());

    assert_eq!(config["accents"], "keep");
    let reported = config["config_file"].as_str().unwrap();
    assert!(
        reported.ends_with(".salsa-spa.toml"),
        "should report dotfile: {reported}"
    );
}

#[test]
fn discovers_short_name_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("salsa.toml"), "lemmatizer = \"identity\"\n").unwrap();

    let config = config_json(tmp.path());
    assert_eq!(config["lemmatizer"], "identity");
}

#[test]
fn discovers_config_in_parent_directory() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("corpus").join("capitulo-1");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(tmp.path().join(".salsa-spa.toml"), "weight_exponent = 1.5\n").unwrap();

    let config = config_json(&sub_dir);

    assert_eq!(config["weight_exponent"], 1.5);
    assert!(config["config_file"].as_str().is_some());
}

#[test]
fn regular_name_overrides_dotfile() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".salsa-spa.toml"), "accents = \"keep\"\n").unwrap();
    fs::write(tmp.path().join("salsa-spa.toml"), "accents = \"strip\"\n").unwrap();

    let config = config_json(tmp.path());
    assert_eq!(config["accents"], "strip");
}

// =============================================================================
// Config Format Parsing
// =============================================================================

#[test]
fn parses_yaml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".salsa-spa.yaml"),
        "accents: keep\nlog_level: warn\n",
    )
    .unwrap();

    let config = config_json(tmp.path());
    assert_eq!(config["accents"], "keep");
    assert_eq!(config["log_level"], "warn");
}

#[test]
fn parses_json_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".salsa-spa.json"),
        r#"{"disable_index_cache": true, "disable_input_limit": true, "lemma_cache_size": 0}"#,
    )
    .unwrap();

    let config = config_json(tmp.path());
    assert_eq!(config["index_cache"], "disabled");
    assert_eq!(config["lemma_cache_size"], 0);
    assert!(config["max_input_bytes"].is_null());
}

// =============================================================================
// Config Precedence
// =============================================================================

#[test]
fn closer_config_takes_precedence() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("project");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(tmp.path().join(".salsa-spa.toml"), "accents = \"keep\"\n").unwrap();
    fs::write(sub_dir.join(".salsa-spa.toml"), "lemmatizer = \"identity\"\n").unwrap();

    let config = config_json(&sub_dir);

    // Only the closest directory contributes
    assert_eq!(config["lemmatizer"], "identity");
    assert_eq!(config["accents"], "strip");
}

#[test]
fn explicit_config_overrides_discovered() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".salsa-spa.toml"), "weight_exponent = 1.5\n").unwrap();
    let explicit = tmp.path().join("override.toml");
    fs::write(&explicit, "weight_exponent = 2.0\n").unwrap();

    let json = run_json(
        tmp.path(),
        &["--config", explicit.to_str().unwrap(), "info", "--json"],
    );

    assert_eq!(json["config"]["weight_exponent"], 2.0);
    let reported = json["config"]["config_file"].as_str().unwrap();
    assert!(
        reported.ends_with("override.toml"),
        "--config path should be reported: {reported}"
    );
}

#[test]
fn env_var_overrides_config_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".salsa-spa.toml"), "accents = \"strip\"\n").unwrap();

    let output = cmd()
        .env("SALSA_SPA_ACCENTS", "keep")
        .args(["-C", tmp.path().to_str().unwrap(), "info", "--json"])
        .output()
        .expect("failed to run command");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["config"]["accents"], "keep");
}

// =============================================================================
// Configuration Changes Grading
// =============================================================================

#[test]
fn keeping_accents_changes_matches() {
    let tmp = TempDir::new().unwrap();
    let vocab = tmp.path().join("vocab.csv");
    fs::write(&vocab, "word,level\ncafé,A1\n").unwrap();
    fs::write(
        tmp.path().join(".salsa-spa.toml"),
        format!(
            "vocab_path = {:?}\naccents = \"keep\"\ndisable_index_cache = true\n",
            vocab.to_str().unwrap()
        ),
    )
    .unwrap();

    let report = run_json(tmp.path(), &["grade-text", "--text", "café cafe"]);

    assert_eq!(report["stats"]["unknown_words"], 1);
    assert_eq!(report["found_expressions"]["A1"][0], "café");
}

#[test]
fn custom_lemma_table_is_used() {
    let tmp = TempDir::new().unwrap();
    let vocab = tmp.path().join("vocab.csv");
    let lemmas = tmp.path().join("lemmas.csv");
    fs::write(&vocab, "word,level\nrecopilar,B2\n").unwrap();
    fs::write(&lemmas, "form,lemma\nrecopilamos,recopilar\n").unwrap();
    fs::write(
        tmp.path().join(".salsa-spa.toml"),
        format!(
            "vocab_path = {:?}\nlemma_table = {:?}\ndisable_index_cache = true\n",
            vocab.to_str().unwrap(),
            lemmas.to_str().unwrap()
        ),
    )
    .unwrap();

    let report = run_json(tmp.path(), &["grade-text", "--text", "Recopilamos"]);
    assert_eq!(report["predicted_level"], "B2");
}

#[test]
fn missing_lemma_table_fails_at_startup() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".salsa-spa.toml"),
        "lemma_table = \"/no/such/lemmas.csv\"\n",
    )
    .unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "grade-text", "--text", "hola"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lemmatizer model unavailable"));
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn invalid_toml_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".salsa-spa.toml"),
        "this is not valid toml [[[",
    )
    .unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn invalid_enum_value_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".salsa-spa.toml"), "lemmatizer = \"spacy\"\n").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure();
}

#[test]
fn unknown_config_field_is_ignored() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".salsa-spa.toml"),
        "accents = \"keep\"\nunknown_field = \"ignored\"\n",
    )
    .unwrap();

    let config = config_json(tmp.path());
    assert_eq!(config["accents"], "keep");
}

// =============================================================================
// Boundary Marker Tests
// =============================================================================

#[test]
fn git_boundary_stops_config_search() {
    let tmp = TempDir::new().unwrap();
    let parent = tmp.path().join("parent");
    let repo = parent.join("repo");
    let texts = repo.join("textos");
    fs::create_dir_all(&texts).unwrap();

    fs::write(parent.join(".salsa-spa.toml"), "accents = \"keep\"\n").unwrap();
    fs::create_dir(repo.join(".git")).unwrap();

    let config = config_json(&texts);

    assert_eq!(config["accents"], "strip");
    assert!(config["config_file"].is_null());
}

#[test]
fn config_in_same_dir_as_git_is_found() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    let texts = repo.join("textos");
    fs::create_dir_all(&texts).unwrap();

    fs::create_dir(repo.join(".git")).unwrap();
    fs::write(repo.join(".salsa-spa.toml"), "accents = \"keep\"\n").unwrap();

    let config = config_json(&texts);
    assert_eq!(config["accents"], "keep");
}
