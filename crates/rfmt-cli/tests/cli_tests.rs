//! Integration tests for the rfmt CLI
//!
//! These tests invoke the actual rfmt binary and verify:
//! - Exit codes (0 = success, 1 = check failure, 2 = error)
//! - stdout/stderr output
//! - JSON output format

use std::path::{Path, PathBuf};
use std::process::Command;

// ── Helpers ───────────────────────────────────────────────

fn rfmt_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rfmt"))
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(format!("../../tests/fixtures/{}", name))
}

fn run_rfmt(args: &[&str]) -> std::process::Output {
    run_rfmt_in(Path::new(env!("CARGO_MANIFEST_DIR")), args)
}

fn run_rfmt_in(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(rfmt_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute rfmt")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ── Version ───────────────────────────────────────────────

#[test]
fn test_version_command() {
    let output = run_rfmt(&["version"]);
    assert!(output.status.success(), "version should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("rfmt"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_flag() {
    let output = run_rfmt(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

// ── Fmt ───────────────────────────────────────────────────

#[test]
fn test_fmt_prints_formatted_source() {
    let messy = fixture("messy.R");
    let output = run_rfmt(&["fmt", path_str(&messy)]);
    assert_eq!(output.status.code(), Some(0));
    let expected = std::fs::read_to_string(fixture("messy.expected.R")).unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout), expected);
}

#[test]
fn test_fmt_clean_file_unchanged() {
    let clean = fixture("clean.R");
    let output = run_rfmt(&["fmt", path_str(&clean)]);
    assert_eq!(output.status.code(), Some(0));
    let original = std::fs::read_to_string(&clean).unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout), original);
}

#[test]
fn test_fmt_expected_output_is_stable() {
    let expected = fixture("messy.expected.R");
    let output = run_rfmt(&["fmt", "--check", path_str(&expected)]);
    assert_eq!(output.status.code(), Some(0), "formatted output must be a fixed point");
}

#[test]
fn test_fmt_check_reports_unformatted() {
    let messy = fixture("messy.R");
    let output = run_rfmt(&["fmt", "--check", path_str(&messy)]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Would reformat"));
    assert!(stdout.contains("messy.R"));
}

#[test]
fn test_fmt_write_rewrites_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("script.R");
    std::fs::copy(fixture("messy.R"), &path).unwrap();

    let output = run_rfmt_in(dir.path(), &["fmt", "--write", "script.R"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Formatted"));

    let written = std::fs::read_to_string(&path).unwrap();
    let expected = std::fs::read_to_string(fixture("messy.expected.R")).unwrap();
    assert_eq!(written, expected);

    // Second run has nothing to do
    let output = run_rfmt_in(dir.path(), &["fmt", "--write", "script.R"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_fmt_line_width_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("call.R");
    std::fs::write(
        &path,
        "result <- some_function(first_argument, second_argument, third)\n",
    )
    .unwrap();

    let output = run_rfmt_in(dir.path(), &["fmt", "--line-width", "40", "call.R"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 3);
    assert!(stdout.lines().all(|line| line.len() <= 40));
}

#[test]
fn test_fmt_invalid_line_width() {
    let clean = fixture("clean.R");
    let output = run_rfmt(&["fmt", "--line-width", "5", path_str(&clean)]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("line_width"));
}

#[test]
fn test_fmt_parse_error_exit_2() {
    let invalid = fixture("invalid/unclosed.R");
    let output = run_rfmt(&["fmt", path_str(&invalid)]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unclosed '{'"), "stderr: {}", stderr);
}

#[test]
fn test_fmt_missing_file_exit_2() {
    let output = run_rfmt(&["fmt", "does_not_exist.R"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does_not_exist.R"));
}

#[test]
fn test_fmt_uses_discovered_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("rfmt.toml"), "indent_width = 4\n").unwrap();
    std::fs::write(dir.path().join("block.R"), "if (a) {\nb\n}\n").unwrap();

    let output = run_rfmt_in(dir.path(), &["fmt", "block.R"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "if (a) {\n    b\n}\n");
}

#[test]
fn test_fmt_explicit_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "indent_width = 3\n").unwrap();
    std::fs::write(dir.path().join("block.R"), "{\nb\n}\n").unwrap();

    let output = run_rfmt_in(dir.path(), &["--config", path_str(&config), "fmt", "block.R"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "{\n   b\n}\n");
}

#[test]
fn test_bad_config_exit_2() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("rfmt.toml"), "indent = 4\n").unwrap();
    std::fs::write(dir.path().join("x.R"), "x\n").unwrap();

    let output = run_rfmt_in(dir.path(), &["fmt", "x.R"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Config error"));
}

// ── Check ─────────────────────────────────────────────────

#[test]
fn test_check_clean_exit_0() {
    let clean = fixture("clean.R");
    let output = run_rfmt(&["check", path_str(&clean)]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("already formatted"));
}

#[test]
fn test_check_quiet_prints_nothing() {
    let clean = fixture("clean.R");
    let output = run_rfmt(&["--quiet", "check", path_str(&clean)]);
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_check_json() {
    let clean = fixture("clean.R");
    let messy = fixture("messy.R");
    let output = run_rfmt(&["check", "--json", path_str(&clean), path_str(&messy)]);
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["unformatted"], 1);
    assert_eq!(json["errors"], 0);
    assert_eq!(json["files"][0]["formatted"], true);
    assert_eq!(json["files"][1]["formatted"], false);
}

#[test]
fn test_check_json_reports_errors() {
    let invalid = fixture("invalid/bad_string.R");
    let output = run_rfmt(&["check", "--json", path_str(&invalid)]);
    assert_eq!(output.status.code(), Some(2));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["errors"], 1);
    let error = json["files"][0]["error"].as_str().unwrap();
    assert!(error.contains("Unterminated string"));
}

// ── Tokens ────────────────────────────────────────────────

#[test]
fn test_tokens_human() {
    let clean = fixture("clean.R");
    let output = run_rfmt(&["tokens", path_str(&clean)]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SYMBOL_FUNCTION_CALL"));
    assert!(stdout.contains("SYMBOL_PACKAGE"));
    assert!(stdout.contains("COMMENT"));
}

#[test]
fn test_tokens_json() {
    let clean = fixture("clean.R");
    let output = run_rfmt(&["tokens", "--json", path_str(&clean)]);
    assert_eq!(output.status.code(), Some(0));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["token_type"], "PROGRAM");
    let items = json["items"].as_array().unwrap();
    assert_eq!(items[0]["token_type"], "COMMENT");
    assert_eq!(items[0]["span"]["line"], 1);
    assert!(items
        .iter()
        .any(|t| t["token_type"] == "SYMBOL_FORMALS" && t["value"] == "na.rm"));
}

#[test]
fn test_tokens_invalid_exit_2() {
    let invalid = fixture("invalid/unclosed.R");
    let output = run_rfmt(&["tokens", path_str(&invalid)]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Parse error"));
}

// ── Outline ───────────────────────────────────────────────

#[test]
fn test_outline_human() {
    let messy = fixture("messy.R");
    let output = run_rfmt(&["outline", path_str(&messy)]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("summarise_scores(df, group, min_n = 5)"));
    assert!(stdout.contains("dplyr"));
    assert!(stdout.contains("tidyr"));
}

#[test]
fn test_outline_json() {
    let clean = fixture("clean.R");
    let output = run_rfmt(&["outline", "--json", path_str(&clean)]);
    assert_eq!(output.status.code(), Some(0));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["functions"][0]["name"], "scale01");
    assert_eq!(json["functions"][0]["formals"]["items"][1]["name"], "na.rm");
    assert_eq!(json["functions"][0]["formals"]["items"][1]["value"]["value"], "FALSE");
    assert_eq!(json["packages"], serde_json::json!(["stats"]));
}

// ── Hash ──────────────────────────────────────────────────

#[test]
fn test_hash_ignores_layout() {
    let messy = run_rfmt(&["hash", path_str(&fixture("messy.R"))]);
    let expected = run_rfmt(&["hash", path_str(&fixture("messy.expected.R"))]);
    assert_eq!(messy.status.code(), Some(0));
    assert_eq!(expected.status.code(), Some(0));

    let hash = String::from_utf8_lossy(&messy.stdout).trim().to_string();
    assert_eq!(hash.len(), 64, "SHA-256 hex should be 64 chars");
    assert_eq!(hash, String::from_utf8_lossy(&expected.stdout).trim());
}

#[test]
fn test_hash_deterministic() {
    let clean = fixture("clean.R");
    let first = run_rfmt(&["hash", path_str(&clean)]);
    for _ in 0..5 {
        let again = run_rfmt(&["hash", path_str(&clean)]);
        assert_eq!(first.stdout, again.stdout);
    }
}

// ── Argument errors ───────────────────────────────────────

#[test]
fn test_no_command_fails() {
    let output = run_rfmt(&[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_write_and_check_conflict() {
    let clean = fixture("clean.R");
    let output = run_rfmt(&["fmt", "--write", "--check", path_str(&clean)]);
    assert_eq!(output.status.code(), Some(2));
}
