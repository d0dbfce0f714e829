//! CLI interaction tests
//!
//! Run the `lbm` binary the way a user would and check exit codes and the
//! rendered output.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Helper function to create a test command
fn create_test_cmd() -> Command {
    let mut cmd = Command::cargo_bin("lbm").unwrap();
    cmd.arg("--no-color").arg("--log-level").arg("error");
    cmd
}

/// Helper function to create a temporary environment file
fn create_temp_env(content: &str) -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let env_path = temp_dir.path().join("bench.env");
    fs::write(&env_path, content).unwrap();
    let env_path_str = env_path.to_str().unwrap().to_string();
    (temp_dir, env_path_str)
}

#[test]
fn test_simulate_prints_report() {
    create_test_cmd()
        .args(["simulate", "-n", "20", "-l", "16"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Link Benchmark Results"))
        .stdout(predicate::str::contains("Peers (1)"))
        .stdout(predicate::str::contains("PER:"));
}

#[test]
fn test_simulate_report_values() {
    let output = create_test_cmd()
        .args(["simulate", "--mode", "echo", "-n", "10", "--drop-seq", "2,4"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let per = Regex::new(r"(?m)^PER:\s+20\.00%").unwrap();
    assert!(per.is_match(&stdout), "unexpected report:\n{}", stdout);
    let latency = Regex::new(r"\d+\.\d{2}ms").unwrap();
    assert!(latency.is_match(&stdout));
}

#[test]
fn test_simulate_raw_dump() {
    create_test_cmd()
        .args(["simulate", "-n", "5", "--raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"configuration\""))
        .stdout(predicate::str::contains("\"rx_counters\""));
}

#[test]
fn test_config_json_reads_env_file() {
    let (_dir, env_path) = create_temp_env("BENCHMARK_PACKET_COUNT=77\nBENCHMARK_MODE=echo\n");

    let output = create_test_cmd()
        .args(["--env-file", &env_path, "config", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let config: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["test"]["packet_count"], 77);
    assert_eq!(config["test"]["mode"], "echo");
}

#[test]
fn test_cli_overrides_env_file() {
    let (_dir, env_path) = create_temp_env("BENCHMARK_PACKET_COUNT=77\n");

    create_test_cmd()
        .args(["--env-file", &env_path, "--address", "00a1", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Node address: 00a1"))
        .stdout(predicate::str::contains("Packet count: 77"));
}

#[test]
fn test_debug_prints_build_and_session_info() {
    let output = create_test_cmd().args(["--debug", "config"]).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let session = Regex::new(r"(?m)^Session: [0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap();
    assert!(session.is_match(&stdout), "unexpected output:\n{}", stdout);
    assert!(stdout.contains("Configuration Summary:"));
}

#[test]
fn test_invalid_env_file_value() {
    let (_dir, env_path) = create_temp_env("BENCHMARK_PAYLOAD_LENGTH=0\n");

    create_test_cmd()
        .args(["--env-file", &env_path, "config"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration help"));
}

#[test]
fn test_missing_env_file() {
    create_test_cmd()
        .args(["--env-file", "/nonexistent/bench.env", "config"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_invalid_arguments() {
    create_test_cmd().args(["simulate", "--mode", "burst"]).assert().failure();
    create_test_cmd().args(["run", "--role", "observer"]).assert().failure();
    create_test_cmd()
        .args(["--color", "config"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--color"));
}

#[test]
fn test_version_and_help() {
    create_test_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lbm"));

    create_test_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("run"));
}
