//! Integration tests for the CLI interface
//!
//! Everything here stays offline: commands either fail before any lookup
//! client exists or run the sweeper against a temporary directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_cli_requires_subcommand() {
    let mut cmd = Command::cargo_bin("matriz").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_help_lists_commands() {
    let mut cmd = Command::cargo_bin("matriz").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("enrich"))
        .stdout(predicate::str::contains("lookup"))
        .stdout(predicate::str::contains("sweep"));
}

#[test]
fn test_enrich_help() {
    let mut cmd = Command::cargo_bin("matriz").unwrap();
    cmd.arg("enrich")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Enrich every row"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("matriz").unwrap();
    cmd.arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_enrich_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("matriz").unwrap();
    cmd.env("FILES_DIR", dir.path())
        .arg("enrich")
        .arg(dir.path().join("missing.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_enrich_rejects_missing_cnpj_column() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.csv");
    std::fs::write(&input, "id,name\n1,ACME\n").unwrap();

    let mut cmd = Command::cargo_bin("matriz").unwrap();
    cmd.env("FILES_DIR", dir.path())
        .arg("enrich")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("input has no 'cnpj' column"));
}

#[test]
fn test_enrich_rejects_oversized_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.csv");
    std::fs::write(&input, "cnpj\n11222333000181\n").unwrap();

    let mut cmd = Command::cargo_bin("matriz").unwrap();
    cmd.env("FILES_DIR", dir.path())
        .env("MAX_FILE_SIZE_MB", "0")
        .arg("enrich")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("the limit is 0 MB"));
}

#[test]
fn test_lookup_rejects_digit_free_input() {
    let mut cmd = Command::cargo_bin("matriz").unwrap();
    cmd.arg("lookup")
        .arg("no-digits")
        .assert()
        .failure()
        .stderr(predicate::str::contains("contains no identifier digits"));
}

#[test]
fn test_sweep_once_reports_stats() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("matriz").unwrap();
    cmd.env("FILES_DIR", dir.path())
        .arg("sweep")
        .arg("--once")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 scanned, 0 removed"));
}

#[test]
fn test_sweep_once_removes_aged_artifacts() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("old.csv"), "cnpj\n").unwrap();
    std::fs::write(dir.path().join("keep.txt"), "not an artifact").unwrap();

    let mut cmd = Command::cargo_bin("matriz").unwrap();
    cmd.env("FILES_DIR", dir.path())
        .env("MAX_FILE_AGE_HOURS", "0")
        .arg("sweep")
        .arg("--once")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 scanned, 1 removed"));

    assert!(!dir.path().join("old.csv").exists());
    assert!(dir.path().join("keep.txt").exists());
}
