//! Integration tests for the tda CLI
//!
//! None of these reach a model: they cover argument handling and the
//! direct `--invoke` path through the diagnostics tools.

use std::str;

mod common;

use common::TestConfig;

#[test]
fn test_help_output() {
    let config = TestConfig::new();
    let output = config
        .tda_command()
        .arg("--help")
        .output()
        .expect("Failed to execute tda --help");

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("Technical Debt Agent"));
    assert!(stdout.contains("--cwd"));
    assert!(stdout.contains("--invoke"));
}

#[test]
fn test_version_output() {
    let config = TestConfig::new();
    let output = config
        .tda_command()
        .arg("--version")
        .output()
        .expect("Failed to execute tda --version");

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("tda"));
}

#[test]
fn test_error_without_query() {
    let config = TestConfig::new();
    let output = config
        .tda_command()
        .output()
        .expect("Failed to execute tda");

    assert!(!output.status.success());
    let stderr = str::from_utf8(&output.stderr).unwrap();
    assert!(stderr.contains("No query provided"));
}

#[test]
fn test_list_tools() {
    let config = TestConfig::new();
    let output = config
        .tda_command()
        .arg("--list-tools")
        .output()
        .expect("Failed to execute tda --list-tools");

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("extract_style_diagnostics"));
    assert!(stdout.contains("extract_analyzers_diagnostics"));
    assert!(stdout.contains("\"include\""));
}

#[test]
fn test_list_tools_with_disabled_tool() {
    let config = TestConfig::new();
    let output = config
        .tda_command()
        .args(["--list-tools", "--tool-disable", "extract_style_diagnostics"])
        .output()
        .expect("Failed to execute tda --list-tools");

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(!stdout.contains("extract_style_diagnostics"));
    assert!(stdout.contains("extract_analyzers_diagnostics"));
}

#[test]
fn test_invoke_invalid_severity() {
    let config = TestConfig::new();
    let output = config
        .tda_command()
        .args([
            "--invoke",
            "extract_analyzers_diagnostics",
            "--args",
            r#"{"severity":"bogus"}"#,
        ])
        .output()
        .expect("Failed to execute tda --invoke");

    assert_eq!(output.status.code(), Some(1));
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.starts_with("error: InvalidArgument: field 'severity'"));
}

#[test]
fn test_invoke_path_outside_cwd() {
    let config = TestConfig::new();
    let output = config
        .tda_command()
        .args([
            "--invoke",
            "extract_style_diagnostics",
            "--args",
            r#"{"path":"/"}"#,
        ])
        .output()
        .expect("Failed to execute tda --invoke");

    assert_eq!(output.status.code(), Some(1));
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("InvalidArgument: field 'path'"));
    assert!(stdout.contains("outside the allowed directories"));
}

#[test]
fn test_invoke_unknown_tool() {
    let config = TestConfig::new();
    let output = config
        .tda_command()
        .args(["--invoke", "extract_everything"])
        .output()
        .expect("Failed to execute tda --invoke");

    assert_eq!(output.status.code(), Some(1));
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.contains("UnknownTool"));
}

#[test]
fn test_invoke_missing_runner_program() {
    let config = TestConfig::new();
    let output = config
        .tda_command()
        .args([
            "--invoke",
            "extract_style_diagnostics",
            "--dotnet",
            "tda-test-no-such-dotnet",
        ])
        .output()
        .expect("Failed to execute tda --invoke");

    assert_eq!(output.status.code(), Some(1));
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.starts_with("error: RunnerFailure:"));
}

#[cfg(unix)]
#[test]
fn test_invoke_with_clean_runner() {
    // `true` ignores its arguments and exits 0 without writing a report
    let config = TestConfig::new();
    let output = config
        .tda_command()
        .args([
            "--invoke",
            "extract_analyzers_diagnostics",
            "--dotnet",
            "true",
            "--args",
            r#"{"severity":"all","include":"[]","diagnostics":"None"}"#,
        ])
        .output()
        .expect("Failed to execute tda --invoke");

    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert_eq!(stdout.trim(), "0 diagnostics");
}

#[test]
fn test_invoke_writes_log_file() {
    let config = TestConfig::new();
    let output = config
        .tda_command()
        .args(["--list-tools"])
        .output()
        .expect("Failed to execute tda");

    assert!(output.status.success());
    assert!(config.temp_path().join("tda.log").exists());
}

#[test]
fn test_invoke_rejects_option_like_entries() {
    // `true` would accept anything, so only normalization can stop the call
    let config = TestConfig::new();
    let output = config
        .tda_command()
        .args([
            "--invoke",
            "extract_analyzers_diagnostics",
            "--dotnet",
            "true",
            "--args",
            r#"{"diagnostics":["--binarylog","out.binlog"]}"#,
        ])
        .output()
        .expect("Failed to execute tda --invoke");

    assert_eq!(output.status.code(), Some(1));
    let stdout = str::from_utf8(&output.stdout).unwrap();
    assert!(stdout.starts_with("error: InvalidArgument: field 'diagnostics': entry 0"));
    assert!(!config.temp_path().join("out.binlog").exists());
}
