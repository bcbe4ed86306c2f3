//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Remote session errors ─────────────────────────────────────────────────────

/// Errors raised while talking to a provisioned host over SSH/SFTP.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Authentication failed for {user}@{host}: {reason}")]
    Authentication {
        user: String,
        host: String,
        reason: String,
    },

    #[error("Cannot connect to {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("File transfer failed for {path}: {reason}")]
    Transfer { path: String, reason: String },
}

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Errors raised by the VM lifecycle manager and the host configuration
/// orchestrator.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Provisioning failed: {0}")]
    Provision(String),

    #[error("Unsupported platform '{0}'. Supported: Ubuntu 14.04/16.04, Debian 8, CentOS 7, RHEL 7, CoreOS.")]
    UnsupportedPlatform(String),

    #[error("Step '{step}' failed on the remote host.\n{output}")]
    Configuration { step: String, output: String },

    #[error("Timed out after {waited_secs}s waiting for {what}.")]
    TimedOut { what: String, waited_secs: u64 },

    #[error("Cancelled during '{phase}'. Resources created so far were left in place.")]
    Cancelled { phase: String },
}

// ── Vault errors ──────────────────────────────────────────────────────────────

/// Errors raised while persisting credentials to the secret vault.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Cannot write credentials to vault '{vault}': {reason}")]
    Write { vault: String, reason: String },

    #[error("Vault '{0}' not found.")]
    NotFound(String),
}

// ── Credential errors ─────────────────────────────────────────────────────────

/// Errors raised while generating or importing key material.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Required credential file not found: {0}")]
    NotFound(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Cannot generate {what}: {reason}")]
    Generation { what: String, reason: String },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}

// ── Input validation errors ───────────────────────────────────────────────────

/// Errors raised when user-supplied names or secrets break cloud naming rules.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid {kind} '{value}': {rule}")]
    InvalidName {
        kind: &'static str,
        value: String,
        rule: &'static str,
    },

    #[error("Password does not meet complexity requirements: {0}")]
    WeakPassword(&'static str),

    #[error("Invalid port {0}: must be between 1 and 65535")]
    InvalidPort(u32),
}
