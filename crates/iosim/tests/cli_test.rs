//! Integration tests for the `iosim` CLI binary.
//!
//! Every test runs offline against snapshot files in a temp directory,
//! with config lookup pointed at a path that does not exist.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `iosim` binary with env isolation.
fn iosim_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("iosim");
    cmd.env("HOME", "/tmp/iosim-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/iosim-cli-test-nonexistent")
        .env("IOSIM_FALLBACK__ENABLED", "false")
        .env_remove("IOSIM_OUTPUT")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn new_router(dir: &Path, hostname: &str) -> PathBuf {
    let path = dir.join(format!("{}.json", hostname.to_lowercase()));
    iosim_cmd()
        .args(["device", "new", hostname, "-f"])
        .arg(&path)
        .assert()
        .success();
    path
}

/// Two RIP routers on a /30; B also owns 192.168.2.0/24 on a loopback.
fn lab_topology(dir: &Path) -> PathBuf {
    write_json(
        dir,
        "lab.json",
        &json!({
            "devices": {
                "a": {
                    "hostname": "A",
                    "mode": {"kind": "privileged"},
                    "interfaces": {"GigabitEthernet0/0": {"address": "10.0.0.1/30"}},
                    "routing": [{
                        "protocol": {"name": "rip"},
                        "networks": [{"address": "10.0.0.0"}]
                    }]
                },
                "b": {
                    "hostname": "B",
                    "interfaces": {
                        "GigabitEthernet0/1": {"address": "10.0.0.2/30"},
                        "Loopback0": {"address": "192.168.2.1/24"}
                    },
                    "routing": [{
                        "protocol": {"name": "rip"},
                        "networks": [{"address": "10.0.0.0"}, {"address": "192.168.2.0"}]
                    }]
                }
            },
            "links": [{
                "a": {"device": "a", "interface": "Gi0/0"},
                "b": {"device": "b", "interface": "Gi0/1"}
            }]
        }),
    )
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = iosim_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    iosim_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("exec")
            .and(predicate::str::contains("shell"))
            .and(predicate::str::contains("converge"))
            .and(predicate::str::contains("--no-fallback")),
    );
}

#[test]
fn test_version_flag() {
    iosim_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("iosim"));
}

#[test]
fn test_completions_bash() {
    iosim_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_exec_requires_a_target() {
    iosim_cmd()
        .args(["exec", "enable"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--device"));
}

// ── Device snapshots ────────────────────────────────────────────────

#[test]
fn test_device_new_prints_router_snapshot() {
    let output = iosim_cmd().args(["device", "new", "R1"]).output().unwrap();
    assert!(output.status.success());
    let device: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(device["hostname"], "R1");
    assert_eq!(device["mode"]["kind"], "user");
    assert_eq!(
        device["interfaces"]["GigabitEthernet0/0"]["shutdown"],
        Value::Bool(true)
    );
}

#[test]
fn test_device_new_switch_yaml() {
    iosim_cmd()
        .args(["device", "new", "SW1", "--kind", "switch", "-o", "yaml"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("hostname: SW1")
                .and(predicate::str::contains("FastEthernet0/24")),
        );
}

#[test]
fn test_device_new_rejects_bad_hostname() {
    iosim_cmd()
        .args(["device", "new", "9lives"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("hostname"));
}

// ── exec ────────────────────────────────────────────────────────────

#[test]
fn test_exec_enable_writes_back() {
    let dir = tempfile::tempdir().unwrap();
    let r1 = new_router(dir.path(), "R1");

    let output = iosim_cmd()
        .args(["exec", "enable", "--write", "-o", "json", "--device"])
        .arg(&r1)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let outcome: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["prompt"], "R1#");
    assert_eq!(outcome["result"]["valid"], Value::Bool(true));
    assert_eq!(read_json(&r1)["mode"]["kind"], "privileged");
}

#[test]
fn test_exec_show_version_text() {
    let dir = tempfile::tempdir().unwrap();
    let r1 = new_router(dir.path(), "R1");

    iosim_cmd()
        .args(["exec", "show version", "--device"])
        .arg(&r1)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Cisco IOS Software")
                .and(predicate::str::contains("R1 uptime")),
        );
}

#[test]
fn test_exec_rejection_prints_caret_and_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    let r1 = new_router(dir.path(), "R1");
    let before = std::fs::read_to_string(&r1).unwrap();

    iosim_cmd()
        .args(["exec", "enable now", "--write", "--device"])
        .arg(&r1)
        .assert()
        .code(3)
        .stdout(predicate::str::contains(
            "% Invalid input detected at '^' marker.",
        ));
    assert_eq!(std::fs::read_to_string(&r1).unwrap(), before);
}

#[test]
fn test_exec_unknown_command_offline_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let r1 = new_router(dir.path(), "R1");

    iosim_cmd()
        .args(["--no-fallback", "exec", "frobnicate the uplink", "--device"])
        .arg(&r1)
        .assert()
        .code(3)
        .stdout(predicate::str::contains("^"));
}

#[test]
fn test_exec_missing_device_file() {
    iosim_cmd()
        .args(["exec", "enable", "--device", "/nonexistent/r1.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("/nonexistent/r1.json"));
}

#[test]
fn test_exec_in_topology_sees_learned_routes() {
    let dir = tempfile::tempdir().unwrap();
    let lab = lab_topology(dir.path());
    iosim_cmd()
        .args(["converge", "--write", "-q"])
        .arg(&lab)
        .assert()
        .success();

    iosim_cmd()
        .args(["exec", "show ip route", "--device-id", "a", "--topology"])
        .arg(&lab)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("10.0.0.0/30 is directly connected, GigabitEthernet0/0")
                .and(predicate::str::contains(
                    "192.168.2.0/24 [120/1] via 10.0.0.2, GigabitEthernet0/0",
                )),
        );
}

#[test]
fn test_exec_unknown_device_id() {
    let dir = tempfile::tempdir().unwrap();
    let lab = lab_topology(dir.path());

    iosim_cmd()
        .args(["exec", "enable", "--device-id", "z9", "--topology"])
        .arg(&lab)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("z9"));
}

// ── shell ───────────────────────────────────────────────────────────

#[test]
fn test_shell_session_renames_device() {
    let dir = tempfile::tempdir().unwrap();
    let r1 = new_router(dir.path(), "R1");

    iosim_cmd()
        .args(["shell", "--write", "--device"])
        .arg(&r1)
        .write_stdin("enable\nconfigure terminal\nhostname Core\nend\nexit\nshow version\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("R1>")
                .and(predicate::str::contains("R1(config)#"))
                .and(predicate::str::contains("Core#"))
                .and(predicate::str::contains("Cisco IOS Software").not()),
        );

    let saved = read_json(&r1);
    assert_eq!(saved["hostname"], "Core");
    assert_eq!(saved["mode"]["kind"], "privileged");
}

#[test]
fn test_shell_without_write_leaves_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let r1 = new_router(dir.path(), "R1");
    let before = std::fs::read_to_string(&r1).unwrap();

    iosim_cmd()
        .args(["shell", "--device"])
        .arg(&r1)
        .write_stdin("enable\nconfigure terminal\nhostname Edge\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Edge(config)#"));
    assert_eq!(std::fs::read_to_string(&r1).unwrap(), before);
}

// ── converge ────────────────────────────────────────────────────────

#[test]
fn test_converge_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let lab = lab_topology(dir.path());

    let output = iosim_cmd()
        .args(["converge", "-o", "json"])
        .arg(&lab)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let view: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["report"]["converged"], Value::Bool(true));
    assert_eq!(view["report"]["links_up"], 1);
    assert_eq!(view["topology"]["links"][0]["status"], "up");
}

#[test]
fn test_converge_text_and_write() {
    let dir = tempfile::tempdir().unwrap();
    let lab = lab_topology(dir.path());

    iosim_cmd()
        .args(["converge", "--write"])
        .arg(&lab)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("192.168.2.0/24")
                .and(predicate::str::contains("Converged in")),
        );

    let saved = read_json(&lab);
    assert_eq!(saved["links"][0]["status"], "up");
    let routes = saved["devices"]["a"]["routes"].as_array().unwrap();
    assert!(
        routes
            .iter()
            .any(|r| r["destination"] == "192.168.2.0/24" && r["source"] == "dynamic")
    );
}

// ── config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path() {
    iosim_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_reflects_env_overrides() {
    let output = iosim_cmd()
        .args(["config", "show", "-o", "json"])
        .env("IOSIM_CONVERGENCE__MAX_HOPS", "7")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let cfg: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(cfg["fallback"]["enabled"], Value::Bool(false));
    assert_eq!(cfg["convergence"]["max_hops"], 7);
}

#[test]
fn test_invalid_convergence_setting_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let lab = lab_topology(dir.path());

    iosim_cmd()
        .args(["converge"])
        .arg(&lab)
        .env("IOSIM_CONVERGENCE__MAX_HOPS", "0")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("max_hops"));
}
