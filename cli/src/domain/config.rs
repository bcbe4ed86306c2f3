//! Domain types and validators for dockhand configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::os::OsVariant;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "defaults.region",
    "defaults.vm_size",
    "defaults.os",
    "defaults.admin_user",
    "defaults.docker_port",
    "defaults.ssh_port",
    "azure.subscription",
];

pub const DEFAULT_REGION: &str = "westus";
pub const DEFAULT_VM_SIZE: &str = "Standard_D1_v2";
pub const DEFAULT_ADMIN_USER: &str = "dockeruser";
pub const DEFAULT_DOCKER_PORT: u16 = 2376;
pub const DEFAULT_SSH_PORT: u16 = 22;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.dockhand/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DockhandConfig {
    /// Defaults applied to `dockhand create` when flags are omitted.
    pub defaults: Defaults,
    /// Cloud account selection.
    pub azure: AzureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Defaults {
    pub region: String,
    pub vm_size: String,
    pub os: OsVariant,
    pub admin_user: String,
    pub docker_port: u16,
    pub ssh_port: u16,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            vm_size: DEFAULT_VM_SIZE.to_string(),
            os: OsVariant::Ubuntu16_04,
            admin_user: DEFAULT_ADMIN_USER.to_string(),
            docker_port: DEFAULT_DOCKER_PORT,
            ssh_port: DEFAULT_SSH_PORT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AzureConfig {
    /// Subscription passed as `--subscription`; the CLI default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
}

impl DockhandConfig {
    /// Read one whitelisted key as a display string.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let d = &self.defaults;
        match key {
            "defaults.region" => Some(d.region.clone()),
            "defaults.vm_size" => Some(d.vm_size.clone()),
            "defaults.os" => Some(d.os.to_string()),
            "defaults.admin_user" => Some(d.admin_user.clone()),
            "defaults.docker_port" => Some(d.docker_port.to_string()),
            "defaults.ssh_port" => Some(d.ssh_port.to_string()),
            "azure.subscription" => Some(self.azure.subscription.clone().unwrap_or_default()),
            _ => None,
        }
    }

    /// Apply a key/value pair. Both must already have passed
    /// [`validate_config_key`] and [`validate_config_value`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        let d = &mut self.defaults;
        match key {
            "defaults.region" => d.region = value.to_string(),
            "defaults.vm_size" => d.vm_size = value.to_string(),
            "defaults.os" => d.os = value.parse()?,
            "defaults.admin_user" => d.admin_user = value.to_string(),
            "defaults.docker_port" => d.docker_port = value.parse()?,
            "defaults.ssh_port" => d.ssh_port = value.parse()?,
            "azure.subscription" => {
                self.azure.subscription = (!value.is_empty()).then(|| value.to_string());
            }
            _ => {}
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |valid: String| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        valid,
    };
    match key {
        "defaults.region" | "defaults.vm_size" | "defaults.admin_user"
            if value.trim().is_empty() =>
        {
            Err(invalid("any non-empty string".to_string()).into())
        }
        "defaults.os" if value.parse::<OsVariant>().is_err() => {
            let valid: Vec<_> = OsVariant::SUPPORTED.iter().map(|v| v.as_str()).collect();
            Err(invalid(valid.join(", ")).into())
        }
        "defaults.docker_port" | "defaults.ssh_port"
            if !value.parse::<u16>().is_ok_and(|p| p > 0) =>
        {
            Err(invalid("1-65535".to_string()).into())
        }
        _ => Ok(()),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
