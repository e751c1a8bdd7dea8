//! End-to-end tests of the dockerfile-audit binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("dockerfile-audit").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn policy() -> PathBuf {
    fixtures().join("policy.yaml")
}

#[test]
fn test_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dockerfile"))
        .stdout(predicate::str::contains("--fail-on-findings"));
}

#[test]
fn test_dockerfile_argument_is_required() {
    cmd().assert().failure().code(2);
}

#[test]
fn test_audit_single_file() {
    cmd()
        .arg("-d")
        .arg(fixtures().join("dockerfiles").join("02-root.Dockerfile"))
        .arg("-p")
        .arg(policy())
        .arg("--no-color")
        .assert()
        .success()
        .stdout(predicate::str::contains("FAIL 02-root.Dockerfile"))
        .stdout(predicate::str::contains("FORBID_ROOT"))
        .stdout(predicate::str::contains("> USER root"));
}

#[test]
fn test_fail_on_findings_exit_code() {
    cmd()
        .arg("-d")
        .arg(fixtures().join("dockerfiles"))
        .arg("-p")
        .arg(policy())
        .arg("--fail-on-findings")
        .assert()
        .code(3)
        .stdout(predicate::str::contains("1 passed, 3 failed, 2 skipped"));

    cmd()
        .arg("-d")
        .arg(fixtures().join("dockerfiles").join("01-compliant.Dockerfile"))
        .arg("-p")
        .arg(policy())
        .arg("--fail-on-findings")
        .assert()
        .success();
}

#[test]
fn test_missing_policy_is_fatal() {
    let dir = TempDir::new().unwrap();
    cmd()
        .current_dir(dir.path())
        .arg("-d")
        .arg(fixtures().join("dockerfiles"))
        .arg("-p")
        .arg(dir.path().join("nope.yaml"))
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_invalid_policy_is_fatal() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("policy.yaml");
    fs::write(&bad, "policy: [unterminated").unwrap();
    cmd()
        .arg("-d")
        .arg(fixtures().join("dockerfiles"))
        .arg("-p")
        .arg(&bad)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid policy configuration"));
}

#[test]
fn test_default_policy_from_working_directory() {
    let dir = TempDir::new().unwrap();
    fs::copy(policy(), dir.path().join("policy.yaml")).unwrap();
    cmd()
        .current_dir(dir.path())
        .arg("-d")
        .arg(fixtures().join("dockerfiles").join("01-compliant.Dockerfile"))
        .arg("--no-color")
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS 01-compliant.Dockerfile"));
}

#[test]
fn test_nothing_processed_skips_reports() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("out.json");
    cmd()
        .arg("-d")
        .arg(fixtures().join("dockerfiles").join("05-empty.Dockerfile"))
        .arg("-p")
        .arg(policy())
        .arg("-j")
        .arg("-o")
        .arg(&json)
        .assert()
        .success()
        .stderr(predicate::str::contains("No files were processed, reports will be skipped."));
    assert!(!json.exists());
}

#[test]
fn test_json_outfile() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("results.json");
    cmd()
        .arg("-d")
        .arg(fixtures().join("dockerfiles"))
        .arg("-p")
        .arg(policy())
        .arg("-q")
        .arg("-j")
        .arg("-o")
        .arg(&json)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    let results = value.as_array().unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(results[0]["filename"], "01-compliant.Dockerfile");
    assert_eq!(results[0]["outcome"], "pass");
    assert_eq!(results[1]["findings"][0]["type"], "FORBID_ROOT");
    assert_eq!(results[1]["findings"][0]["statement"], "USER root");
}

#[test]
fn test_json_console_format() {
    let output = cmd()
        .arg("-d")
        .arg(fixtures().join("dockerfiles").join("04-insecure.Dockerfile"))
        .arg("-p")
        .arg(policy())
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["findings"].as_array().unwrap().len(), 9);
}

#[test]
fn test_latex_report() {
    let dir = TempDir::new().unwrap();
    let report = dir.path().join("audit.tex");
    cmd()
        .arg("-d")
        .arg(fixtures().join("dockerfiles"))
        .arg("-p")
        .arg(policy())
        .arg("-q")
        .arg("-r")
        .arg("-n")
        .arg(&report)
        .assert()
        .success();

    let source = fs::read_to_string(&report).unwrap();
    assert!(source.contains("\\documentclass"));
    assert!(source.contains("FORBID\\_PACKAGES"));
    assert!(source.contains("04-insecure.Dockerfile"));
}

#[test]
fn test_custom_report_template() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("mini.tex");
    let report = dir.path().join("out.tex");
    fs::write(&template, "{% for r in results %}{{ r.filename }};{% endfor %}").unwrap();
    cmd()
        .arg("-d")
        .arg(fixtures().join("dockerfiles"))
        .arg("-p")
        .arg(policy())
        .arg("-q")
        .arg("-r")
        .arg("-n")
        .arg(&report)
        .arg("-t")
        .arg(&template)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&report).unwrap(),
        "01-compliant.Dockerfile;02-root.Dockerfile;03-multistage.Dockerfile;04-insecure.Dockerfile;"
    );
}
