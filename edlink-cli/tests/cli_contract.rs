//! Integration tests for core CLI contract behavior.

use {predicates::prelude::*, tempfile::tempdir};

fn cli_cmd() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("edlink").expect("binary should build")
}

#[test]
fn help_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("edlink"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn version_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("edlink"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn upload_help_mentions_destination() {
    let mut cmd = cli_cmd();
    cmd.args(["upload", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DESTINATION"));
}

#[test]
fn upload_missing_source_fails_before_touching_hardware() {
    let dir = tempdir().expect("tempdir should be created");
    let missing = dir.path().join("missing.nes");

    let mut cmd = cli_cmd();
    cmd.arg("upload")
        .arg(missing.as_os_str())
        .arg("games/missing.nes")
        .arg("--port")
        .arg("/dev/nonexistent-edlink-port")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn upload_without_arguments_fails_with_usage() {
    let mut cmd = cli_cmd();
    cmd.arg("upload")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn list_ports_json_returns_valid_json() {
    // In environments without serial ports this still exercises the JSON
    // path; the output must parse as an array either way.
    let mut cmd = cli_cmd();
    let output = cmd
        .args(["list-ports", "--json"])
        .output()
        .expect("command should execute");

    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: serde_json::Value =
            serde_json::from_str(&stdout).expect("stdout should be valid JSON");
        assert!(parsed.is_array(), "should be a JSON array");
    }
}

#[test]
fn unknown_subcommand_fails() {
    let mut cmd = cli_cmd();
    cmd.arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}
