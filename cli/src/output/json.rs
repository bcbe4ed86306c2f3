//! JSON output: the renderer used under `--json` and the error object
//! printed when a command fails.

use anyhow::{Context, Result};
use serde::Serialize;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable error code for the JSON error object.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    use crate::domain::error::{
        ConfigError, CredentialError, ProvisionError, RemoteError, ValidationError, VaultError,
    };

    if let Some(e) = err.downcast_ref::<ProvisionError>() {
        return match e {
            ProvisionError::Provision(_) => "PROVISION_FAILED",
            ProvisionError::UnsupportedPlatform(_) => "UNSUPPORTED_PLATFORM",
            ProvisionError::Configuration { .. } => "CONFIGURATION_FAILED",
            ProvisionError::TimedOut { .. } => "TIMED_OUT",
            ProvisionError::Cancelled { .. } => "CANCELLED",
        };
    }
    if let Some(e) = err.downcast_ref::<RemoteError>() {
        return match e {
            RemoteError::Authentication { .. } => "AUTHENTICATION_FAILED",
            RemoteError::Connect { .. } => "CONNECT_FAILED",
            RemoteError::Transfer { .. } => "TRANSFER_FAILED",
        };
    }
    if err.downcast_ref::<VaultError>().is_some() {
        return "VAULT_ERROR";
    }
    if err.downcast_ref::<CredentialError>().is_some() {
        return "CREDENTIAL_ERROR";
    }
    if err.downcast_ref::<ValidationError>().is_some() {
        return "INVALID_INPUT";
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return "CONFIG_ERROR";
    }
    "COMMAND_FAILED"
}

/// Prints every value as pretty JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// Print `value` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn print<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let out = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
        println!("{out}");
        Ok(())
    }
}
