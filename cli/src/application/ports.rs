//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`: never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;

use crate::domain::cloud::{
    NetworkInterface, PowerState, ResourceGroup, StorageAccount, VaultInfo, VirtualNetwork, VmInfo,
};
use crate::domain::registry::HostRegistry;
use crate::domain::{CommandResult, DockhandConfig, HostDescriptor, SshKeyPair, TlsBundle};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Parameters for creating one VM inside existing network and storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmCreateSpec {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub size: String,
    /// Marketplace image URN (`publisher:offer:sku:version`).
    pub image_urn: String,
    pub admin_user: String,
    pub password: Option<String>,
    pub ssh_public_key: Option<String>,
    /// Public DNS label; the provider appends the regional suffix.
    pub dns_label: String,
    pub storage_account: String,
    pub vnet: String,
    pub subnet: String,
    pub tags: BTreeMap<String, String>,
}

// ── Cloud Port Traits ─────────────────────────────────────────────────────────

/// Resource group lookup and creation.
#[allow(async_fn_in_trait)]
pub trait ResourceGroups {
    /// `None` when the group does not exist.
    async fn find_group(&self, name: &str) -> Result<Option<ResourceGroup>>;
    async fn create_group(&self, name: &str, location: &str) -> Result<ResourceGroup>;
}

/// Virtual network, subnet and NIC operations.
#[allow(async_fn_in_trait)]
pub trait Networks {
    /// `None` when the network does not exist.
    async fn find_vnet(&self, group: &str, name: &str) -> Result<Option<VirtualNetwork>>;
    /// Create a network with a single subnet.
    async fn create_vnet(
        &self,
        group: &str,
        name: &str,
        location: &str,
        subnet: &str,
    ) -> Result<VirtualNetwork>;
    async fn vnet_by_id(&self, id: &str) -> Result<VirtualNetwork>;
    async fn nic_by_id(&self, id: &str) -> Result<NetworkInterface>;
    /// Delete any resource by its full ID.
    async fn delete_by_id(&self, id: &str) -> Result<()>;
}

/// Storage accounts holding unmanaged VM disks.
#[allow(async_fn_in_trait)]
pub trait StorageAccounts {
    async fn find_storage_account(&self, group: &str, name: &str)
    -> Result<Option<StorageAccount>>;
    async fn create_storage_account(
        &self,
        group: &str,
        name: &str,
        location: &str,
    ) -> Result<StorageAccount>;
}

/// VM create, inspect and delete.
#[allow(async_fn_in_trait)]
pub trait VirtualMachines {
    async fn create_vm(&self, spec: &VmCreateSpec) -> Result<VmInfo>;
    /// `None` when the VM does not exist.
    async fn show_vm(&self, group: &str, name: &str) -> Result<Option<VmInfo>>;
    async fn power_state(&self, group: &str, name: &str) -> Result<PowerState>;
    async fn delete_vm(&self, group: &str, name: &str) -> Result<()>;
    /// All VMs, optionally restricted to one group.
    async fn list_vms(&self, group: Option<&str>) -> Result<Vec<VmInfo>>;
}

/// Composite trait: any type implementing all four cloud sub-traits.
pub trait CloudProvisioner: ResourceGroups + Networks + StorageAccounts + VirtualMachines {}

/// Blanket implementation: any type implementing all four sub-traits is a `CloudProvisioner`.
impl<T> CloudProvisioner for T where T: ResourceGroups + Networks + StorageAccounts + VirtualMachines
{}

// ── Secret Vault Port ─────────────────────────────────────────────────────────

/// Named secret store in the cloud account.
#[allow(async_fn_in_trait)]
pub trait SecretStore {
    /// `None` when the vault does not exist.
    async fn find_vault(&self, name: &str) -> Result<Option<VaultInfo>>;
    async fn create_vault(&self, name: &str, group: &str, location: &str) -> Result<VaultInfo>;
    /// Object ID of the principal the CLI is signed in as.
    async fn signed_in_principal(&self) -> Result<String>;
    /// Grant get/list/set/delete/purge on secrets to `object_id`.
    async fn grant_secret_access(&self, vault: &str, object_id: &str) -> Result<()>;
    async fn set_secret(&self, vault: &str, key: &str, value: &str) -> Result<()>;
    /// Remove a secret for good. Deleting an absent secret succeeds.
    async fn delete_secret(&self, vault: &str, key: &str) -> Result<()>;
    /// `None` when the secret does not exist.
    async fn get_secret(&self, vault: &str, key: &str) -> Result<Option<String>>;
    async fn list_secret_names(&self, vault: &str) -> Result<Vec<String>>;
}

// ── Key Material Port ─────────────────────────────────────────────────────────

/// Generates login keys and TLS certificates.
pub trait CredentialGenerator {
    /// OpenSSH key pair; the private key is encrypted when `passphrase` is set.
    fn ssh_key_pair(&self, passphrase: Option<&str>, comment: &str) -> Result<SshKeyPair>;
    /// Fails unless `private_key` decodes, with `passphrase` when encrypted.
    fn check_private_key(&self, private_key: &str, passphrase: Option<&str>) -> Result<()>;
    /// CA, server and client certificates. `subject_names` become server
    /// SANs; entries that parse as IP addresses become IP SANs.
    fn tls_bundle(&self, subject_names: &[String]) -> Result<TlsBundle>;
}

// ── Remote Session Ports ──────────────────────────────────────────────────────

/// An authenticated session to one host. Consumed by `close`.
#[allow(async_fn_in_trait)]
pub trait RemoteSession {
    /// Run a command to completion and capture both streams and the exit code.
    async fn exec(&self, command: &str) -> Result<CommandResult>;
    /// Write `content` to `dest_dir/file_name`, creating `dest_dir` first.
    async fn upload_text(
        &self,
        content: &str,
        file_name: &str,
        dest_dir: &str,
        mode: Option<u32>,
    ) -> Result<()>;
    /// Copy a local file to `dest_dir/file_name`, creating `dest_dir` first.
    async fn upload_file(
        &self,
        local: &Path,
        file_name: &str,
        dest_dir: &str,
        mode: Option<u32>,
    ) -> Result<()>;
    async fn download_text(&self, remote_path: &str) -> Result<String>;
    async fn close(self) -> Result<()>;
}

/// Opens sessions to hosts.
#[allow(async_fn_in_trait)]
pub trait RemoteConnector {
    type Session: RemoteSession;

    /// Connect and authenticate with the host's key pair, else its password.
    async fn connect(&self, host: &HostDescriptor) -> Result<Self::Session>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait: no async needed.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Local Filesystem, Config and Registry Ports ──────────────────────────────

/// Local file access for credential import and export.
#[allow(async_fn_in_trait)]
pub trait LocalFs {
    /// `None` when the file does not exist.
    async fn read_optional(&self, path: &Path) -> Result<Option<String>>;
    /// Write a file with the given unix mode, creating parent directories.
    async fn write_private(&self, path: &Path, content: &str, mode: u32) -> Result<()>;
}

/// Configuration persistence.
pub trait ConfigStore {
    /// Load configuration, returning defaults if the file does not exist.
    fn load(&self) -> Result<DockhandConfig>;
    /// Persist configuration.
    fn save(&self, config: &DockhandConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}

/// Persistence of the local host registry.
#[allow(async_fn_in_trait)]
pub trait HostRegistryStore {
    async fn load_async(&self) -> Result<HostRegistry>;
    async fn save_async(&self, registry: &HostRegistry) -> Result<()>;
}

// ── URL Probe Port ────────────────────────────────────────────────────────────

/// HTTP reachability check for derived workload URLs.
#[allow(async_fn_in_trait)]
pub trait UrlProbe {
    /// `true` when the URL answers with a non-error status.
    async fn is_reachable(&self, url: &str) -> bool;
}
