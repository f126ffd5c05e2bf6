//! Command-line tests
//!
//! Run the `ingr-merge` binary against script-backed parsers configured
//! through a temp config file.

#![cfg(unix)]

use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const TAGGER: &str = r#"
printf '['
sep=''
while IFS= read -r line || [ -n "$line" ]; do
    set -- $line
    printf '%s{"input": "%s", "qty": "%s", "unit": "%s", "name": "%s"}' "$sep" "$line" "$1" "$2" "$3"
    sep=','
done
printf ']'
"#;

const GRAMMAR: &str = r#"printf '{"error": {"message": "unsupported"}}'
exit 1
"#;

fn write_config(dir: &TempDir, tag: &str) -> PathBuf {
    let tagger = dir.path().join("tagger.sh");
    let grammar = dir.path().join("grammar.sh");
    std::fs::write(&tagger, TAGGER).unwrap();
    std::fs::write(&grammar, GRAMMAR).unwrap();

    let config = format!(
        r#"
[statistical]
program = "/bin/sh"
args = ["{}"]
parser_name = "nyt"

[statistical.env]
PATH = "/usr/bin:/bin"

[grammar]
program = "/bin/sh"
args = ["{}"]
parser_name = "ingreedypy"

[normalizer]
tag = "{tag}"
"#,
        tagger.display(),
        grammar.display()
    );
    let path = dir.path().join("config.toml");
    std::fs::write(&path, config).unwrap();
    path
}

fn run(config: &Path, extra: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_ingr-merge"))
        .arg("--config")
        .arg(config)
        .args(extra)
        .env_remove("INGR_CONFIG")
        .env("RUST_LOG", "error")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // The binary may exit before reading stdin (e.g. bad config)
    let _ = child.stdin.take().unwrap().write_all(stdin.as_bytes());
    child.wait_with_output().unwrap()
}

#[test]
fn test_stdin_to_json_array() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "pint");

    let output = run(&config, &[], "1 cup flour\n\n2 lb beef\n");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let records: Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0]["description"], "1 cup flour");
    assert_eq!(records[0]["product"]["product"], "flour");
    assert_eq!(records[0]["product"]["product_parser"], "nyt");
    assert_eq!(records[0]["units"], "ml");
    assert_eq!(records[0]["units_parser"], "nyt+pint");

    assert_eq!(records[1]["units"], "g");
    assert!((records[1]["quantity"].as_f64().unwrap() - 907.184_74).abs() < 1e-9);
}

#[test]
fn test_input_file_argument() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "normalizer");
    let input = dir.path().join("ingredients.txt");
    std::fs::write(&input, "3 tbsp oil\n").unwrap();

    let output = run(&config, &[input.to_str().unwrap()], "");
    assert!(output.status.success());

    let records: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records[0]["quantity_parser"], "nyt+normalizer");
}

#[test]
fn test_hard_failure_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "pint");

    let output = run(&config, &[], "1 cup flour\n2 whole eggs\n");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("2 whole eggs"));
}

#[test]
fn test_keep_going_reports_failure_inline() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "pint");

    let output = run(&config, &["--keep-going"], "1 cup flour\n2 whole eggs\n");
    assert!(output.status.success());

    let records: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records[0]["units"], "ml");
    assert_eq!(records[1]["description"], "2 whole eggs");
    assert!(records[1]["error"]
        .as_str()
        .unwrap()
        .contains("could not find base units"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir.path().join("absent.toml"), &[], "1 cup flour\n");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Config file not found"));
}
