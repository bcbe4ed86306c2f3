//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod cloud;
pub mod config;
pub mod credentials;
pub mod error;
pub mod host;
pub mod os;
pub mod phase;
pub mod registry;
pub mod remote;
pub mod resource;
pub mod script;
pub mod validate;
pub mod workload;

pub use config::{DockhandConfig, validate_config_key, validate_config_value};
pub use credentials::{CredentialBundle, SshKeyPair, TlsBundle};
pub use error::{
    ConfigError, CredentialError, ProvisionError, RemoteError, ValidationError, VaultError,
};
pub use host::HostDescriptor;
pub use os::OsVariant;
pub use phase::ConfigPhase;
pub use remote::CommandResult;
pub use resource::ResourceRef;
