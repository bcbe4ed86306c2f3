//! Integration tests for the dockhand command surface
//!
//! These tests verify the command tree and argument parsing without touching
//! the cloud.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn dockhand() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dockhand"));
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("AZURE_SUBSCRIPTION_ID");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    dockhand().assert().code(2).stderr(predicate::str::contains(
        "Provision, secure and inventory remote Docker hosts",
    ));
}

#[test]
fn test_cli_help_flag_shows_help() {
    dockhand()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    dockhand()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dockhand"));
}

#[test]
fn test_version_command_shows_version() {
    dockhand()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dockhand 0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let out = dockhand()
        .args(["version", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).expect("valid json");
    assert_eq!(value["version"], "0.1.0");
}

// --- Command hierarchy tests ---

#[test]
fn test_help_lists_every_top_level_command() {
    let assert = dockhand().arg("--help").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    for cmd in [
        "create", "list", "show", "configure", "delete", "ps", "images", "container", "deploy",
        "keys", "vault", "config", "version",
    ] {
        assert!(stdout.contains(cmd), "help is missing `{cmd}`:\n{stdout}");
    }
}

#[test]
fn test_container_help_lists_lifecycle_subcommands() {
    dockhand()
        .args(["container", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("stop"))
        .stdout(predicate::str::contains("rm"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_create_help_documents_tls_and_vault_flags() {
    dockhand()
        .args(["create", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-tls"))
        .stdout(predicate::str::contains("--local-certs"))
        .stdout(predicate::str::contains("--vault"))
        .stdout(predicate::str::contains("--teardown-on-failure"));
}

// --- Argument validation (rejected before any cloud call) ---

#[test]
fn test_create_requires_a_name() {
    dockhand().arg("create").assert().code(2);
}

#[test]
fn test_create_rejects_generate_key_with_key_dir() {
    dockhand()
        .args(["create", "web1", "--generate-ssh-key", "--ssh-key-dir", "/tmp/keys"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_create_rejects_local_certs_without_tls() {
    dockhand()
        .args(["create", "web1", "--no-tls", "--local-certs"])
        .assert()
        .code(2);
}

#[test]
fn test_container_run_rejects_malformed_port_mapping() {
    dockhand()
        .args(["container", "run", "web1", "nginx", "-p", "eighty"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_command_fails() {
    dockhand().arg("frobnicate").assert().code(2);
}
