//! Error handling and edge cases for the operator CLI: missing instances,
//! invalid config files, and an unreachable agent.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_config_show_missing_instance_fails() {
    let temp = TempDir::new().unwrap();

    Command::cargo_bin("agent")
        .unwrap()
        .env("HOME", temp.path())
        .args(["config", "nonexistent-skill", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_config_get_missing_key_fails() {
    let temp = TempDir::new().unwrap();
    std::env::set_var("HOME", temp.path());

    // `config set` creates the instance on first use, then we ask for a key
    // that was never set on it.
    Command::cargo_bin("agent")
        .unwrap()
        .env("HOME", temp.path())
        .args(["config", "demo-skill", "set", "region=us-east-1"])
        .assert()
        .success();

    Command::cargo_bin("agent")
        .unwrap()
        .env("HOME", temp.path())
        .args(["config", "demo-skill", "get", "missing-key"])
        .assert()
        .failure();
}

#[test]
fn test_health_against_unreachable_agent_fails() {
    Command::cargo_bin("agent")
        .unwrap()
        .args(["--port", "1", "health"])
        .assert()
        .failure();
}

#[test]
fn test_version_against_unreachable_agent_fails() {
    Command::cargo_bin("agent")
        .unwrap()
        .args(["--port", "1", "version"])
        .assert()
        .failure();
}

#[test]
fn test_reload_against_unreachable_agent_fails() {
    Command::cargo_bin("agent")
        .unwrap()
        .args(["--port", "1", "reload", "some-skill"])
        .assert()
        .failure();
}

#[test]
fn test_serve_rejects_invalid_template_dir() {
    let temp = TempDir::new().unwrap();
    let bogus_dir = temp.path().join("does-not-exist");

    Command::cargo_bin("agent")
        .unwrap()
        .args(["serve", "--template-dir", bogus_dir.to_str().unwrap(), "--port", "0"])
        .assert()
        .failure();
}
