//! CLI surface smoke tests: help text stays coherent for every subcommand.

use assert_cmd::Command;

#[test]
fn test_main_help_lists_subcommands() {
    let result = Command::cargo_bin("agent").unwrap().arg("--help").assert().success();
    let output = String::from_utf8_lossy(&result.get_output().stdout);

    for subcommand in ["serve", "config", "health", "version", "reload"] {
        assert!(output.contains(subcommand), "main help missing subcommand '{}'", subcommand);
    }
}

#[test]
fn test_serve_help_documents_template_flags() {
    let result = Command::cargo_bin("agent").unwrap().args(["serve", "--help"]).assert().success();
    let output = String::from_utf8_lossy(&result.get_output().stdout);

    for flag in ["--template-dir", "--template-name", "--agent-name"] {
        assert!(output.contains(flag), "serve help missing flag '{}'", flag);
    }
}

#[test]
fn test_config_help_documents_actions() {
    let result = Command::cargo_bin("agent").unwrap().args(["config", "--help"]).assert().success();
    let output = String::from_utf8_lossy(&result.get_output().stdout);
    assert!(output.contains("instance"), "config help should document --instance");
}

#[test]
fn test_reload_help_documents_token_flag() {
    let result = Command::cargo_bin("agent").unwrap().args(["reload", "--help"]).assert().success();
    let output = String::from_utf8_lossy(&result.get_output().stdout);
    assert!(output.contains("--token"), "reload help should document --token");
}
