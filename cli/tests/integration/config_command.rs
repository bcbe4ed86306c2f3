//! Integration tests for `dockhand config` command.
//!
//! All filesystem-touching tests set `DOCKHAND_CONFIG` to a temp path and
//! `HOME` to a temp directory so they never read or write
//! `~/.dockhand/config.yaml`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A temp home directory with the config file path inside it.
struct Sandbox {
    home: TempDir,
    config: String,
}

impl Sandbox {
    fn new() -> Self {
        let home = TempDir::new().expect("temp dir");
        let config = home
            .path()
            .join("config.yaml")
            .to_string_lossy()
            .into_owned();
        Self { home, config }
    }

    fn dockhand(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dockhand"));
        cmd.env("NO_COLOR", "1")
            .env("HOME", self.home.path())
            .env("DOCKHAND_CONFIG", &self.config)
            .env_remove("AZURE_SUBSCRIPTION_ID");
        cmd
    }

    fn config_exists(&self) -> bool {
        std::path::Path::new(&self.config).exists()
    }
}

// ---------------------------------------------------------------------------
// Subcommand registration
// ---------------------------------------------------------------------------

#[test]
fn test_config_help_shows_subcommands() {
    Sandbox::new()
        .dockhand()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("set"));
}

// ---------------------------------------------------------------------------
// `dockhand config show`
// ---------------------------------------------------------------------------

#[test]
fn test_config_show_without_file_prints_defaults() {
    Sandbox::new()
        .dockhand()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("defaults.region"))
        .stdout(predicate::str::contains("westus"))
        .stdout(predicate::str::contains("2376"));
}

#[test]
fn test_config_show_displays_env_var_label() {
    Sandbox::new()
        .dockhand()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DOCKHAND_CONFIG"));
}

#[test]
fn test_config_show_does_not_create_file() {
    let sandbox = Sandbox::new();
    sandbox.dockhand().args(["config", "show"]).assert().success();
    assert!(!sandbox.config_exists(), "show must not create the config file");
}

#[test]
fn test_config_show_json_is_the_config_document() {
    let sandbox = Sandbox::new();
    let out = sandbox
        .dockhand()
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).expect("valid json");
    assert_eq!(value["defaults"]["region"], "westus");
    assert_eq!(value["defaults"]["docker_port"], 2376);
}

// ---------------------------------------------------------------------------
// `dockhand config set` / `get`
// ---------------------------------------------------------------------------

#[test]
fn test_config_set_creates_file_at_env_path() {
    let sandbox = Sandbox::new();
    sandbox
        .dockhand()
        .args(["config", "set", "defaults.region", "northeurope"])
        .assert()
        .success()
        .stdout(predicate::str::contains("defaults.region"));
    assert!(sandbox.config_exists(), "config file should be created at DOCKHAND_CONFIG");
}

#[test]
fn test_config_set_then_get_prints_bare_value() {
    let sandbox = Sandbox::new();
    sandbox
        .dockhand()
        .args(["config", "set", "defaults.os", "centos-7"])
        .assert()
        .success();
    sandbox
        .dockhand()
        .args(["config", "get", "defaults.os"])
        .assert()
        .success()
        .stdout("centos-7\n");
}

#[test]
fn test_config_set_persists_value_readable_by_show() {
    let sandbox = Sandbox::new();
    sandbox
        .dockhand()
        .args(["config", "set", "defaults.vm_size", "Standard_D2_v2"])
        .assert()
        .success();
    sandbox
        .dockhand()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Standard_D2_v2"));
}

#[test]
fn test_config_get_json_names_key_and_value() {
    let sandbox = Sandbox::new();
    let out = sandbox
        .dockhand()
        .args(["config", "get", "defaults.ssh_port", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).expect("valid json");
    assert_eq!(value["key"], "defaults.ssh_port");
    assert_eq!(value["value"], "22");
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[test]
fn test_config_set_unknown_key_lists_valid_keys() {
    let sandbox = Sandbox::new();
    sandbox
        .dockhand()
        .args(["config", "set", "security.level", "strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("defaults.region"));
    assert!(!sandbox.config_exists());
}

#[test]
fn test_config_set_invalid_port_is_rejected() {
    Sandbox::new()
        .dockhand()
        .args(["config", "set", "defaults.docker_port", "70000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1-65535"));
}

#[test]
fn test_config_set_unknown_os_lists_supported_ones() {
    Sandbox::new()
        .dockhand()
        .args(["config", "set", "defaults.os", "windows"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ubuntu-16.04"));
}

#[test]
fn test_config_error_in_json_mode_has_code() {
    let out = Sandbox::new()
        .dockhand()
        .args(["config", "get", "nope.key", "--json"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).expect("valid json");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "CONFIG_ERROR");
}

// ---------------------------------------------------------------------------
// File permissions
// ---------------------------------------------------------------------------

#[test]
#[cfg(unix)]
fn test_config_set_creates_file_with_0o600_permissions() {
    use std::os::unix::fs::PermissionsExt;
    let sandbox = Sandbox::new();
    sandbox
        .dockhand()
        .args(["config", "set", "defaults.admin_user", "ops"])
        .assert()
        .success();
    let mode = std::fs::metadata(&sandbox.config)
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}
