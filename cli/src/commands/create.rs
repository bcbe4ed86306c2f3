//! `dockhand create`: provision a VM and turn it into a Docker host.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::credentials::export_to_local_directory;
use crate::application::services::provision::{
    CertSource, ProvisionOptions, ProvisionPorts, SshKeySource, provision_host,
};
use crate::application::services::vm::HostSpec;
use crate::commands::PASSWORD_ENV;
use crate::domain::{OsVariant, ResourceRef};

/// Arguments for the create command.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Host (VM) name: 3-15 letters, digits or hyphens
    pub name: String,

    /// Resource group: NAME or new:NAME creates it, existing:NAME reuses it
    #[arg(short = 'g', long, value_name = "REF")]
    pub resource_group: Option<ResourceRef>,

    /// Region [default: from config]
    #[arg(long)]
    pub region: Option<String>,

    /// VM size [default: from config]
    #[arg(long)]
    pub size: Option<String>,

    /// Operating system [default: from config]
    #[arg(long)]
    pub os: Option<OsVariant>,

    /// Virtual network reference [default: new:<name>-vnet]
    #[arg(long, value_name = "REF")]
    pub vnet: Option<ResourceRef>,

    /// Subnet name inside the virtual network
    #[arg(long, default_value = "default")]
    pub subnet: String,

    /// Storage account for the OS disk [default: new:<name>store]
    #[arg(long, value_name = "REF")]
    pub storage_account: Option<ResourceRef>,

    /// Admin user name [default: from config]
    #[arg(long)]
    pub admin_user: Option<String>,

    /// Admin password (enables password login)
    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: Option<String>,

    /// Generate an SSH key pair for login
    #[arg(long, conflicts_with = "ssh_key_dir")]
    pub generate_ssh_key: bool,

    /// Use id_rsa / id_rsa.pub from this directory for login
    #[arg(long, value_name = "DIR")]
    pub ssh_key_dir: Option<PathBuf>,

    /// Expose the Docker daemon without TLS
    #[arg(long)]
    pub no_tls: bool,

    /// Issue TLS certificates locally instead of on the host
    #[arg(long, conflicts_with_all = ["cert_dir", "no_tls"])]
    pub local_certs: bool,

    /// Use the six TLS PEM files from this directory
    #[arg(long, value_name = "DIR", conflicts_with = "no_tls")]
    pub cert_dir: Option<PathBuf>,

    /// Docker daemon port [default: from config]
    #[arg(long)]
    pub docker_port: Option<u16>,

    /// SSH port [default: from config]
    #[arg(long)]
    pub ssh_port: Option<u16>,

    /// Save the host's credentials to this key vault
    #[arg(long, value_name = "NAME")]
    pub vault: Option<String>,

    /// Write keys and certificates here [default: ~/.dockhand/hosts/<name>]
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Delete created resources if provisioning fails
    #[arg(long)]
    pub teardown_on_failure: bool,

    /// Seconds to wait for the VM to accept SSH
    #[arg(long, default_value_t = 600, value_name = "SECS")]
    pub max_wait: u64,
}

/// Default storage account name: lowercase alphanumerics of the host name.
fn default_storage_account(name: &str) -> String {
    let mut account: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    account.push_str("store");
    account
}

fn build_options(app: &AppContext, args: &CreateArgs, out_dir: PathBuf) -> ProvisionOptions {
    let defaults = &app.config.defaults;
    let name = args.name.clone();
    let spec = HostSpec {
        resource_group: args
            .resource_group
            .clone()
            .unwrap_or_else(|| ResourceRef::New(format!("{name}-rg"))),
        region: args.region.clone().unwrap_or_else(|| defaults.region.clone()),
        vm_size: args.size.clone().unwrap_or_else(|| defaults.vm_size.clone()),
        os: args.os.unwrap_or(defaults.os),
        vnet: args
            .vnet
            .clone()
            .unwrap_or_else(|| ResourceRef::New(format!("{name}-vnet"))),
        subnet: args.subnet.clone(),
        storage_account: args
            .storage_account
            .clone()
            .unwrap_or_else(|| ResourceRef::New(default_storage_account(&name))),
        admin_user: args
            .admin_user
            .clone()
            .unwrap_or_else(|| defaults.admin_user.clone()),
        password: args.password.clone(),
        ssh_public_key: None,
        docker_port: args.docker_port.unwrap_or(defaults.docker_port),
        ssh_port: args.ssh_port.unwrap_or(defaults.ssh_port),
        tls: !args.no_tls,
        vault: args.vault.clone(),
        name,
    };

    let mut options = ProvisionOptions::new(spec);
    options.ssh_key = match (&args.ssh_key_dir, args.generate_ssh_key) {
        (Some(dir), _) => SshKeySource::Directory(dir.clone()),
        (None, true) => SshKeySource::Generate,
        (None, false) => SshKeySource::None,
    };
    options.certs = match (&args.cert_dir, args.local_certs) {
        (Some(dir), _) => CertSource::Directory(dir.clone()),
        (None, true) => CertSource::Local,
        (None, false) => CertSource::OnHost,
    };
    options.teardown_on_failure = args.teardown_on_failure;
    options.key_passphrase.clone_from(&app.key_passphrase);
    options.credentials_dir = Some(out_dir);
    options.max_wait = Duration::from_secs(args.max_wait);
    options
}

/// Run `dockhand create`.
///
/// # Errors
///
/// Returns the first failing provisioning phase's error.
pub async fn run(app: &AppContext, args: &CreateArgs) -> Result<()> {
    let dir = match &args.out {
        Some(dir) => dir.clone(),
        None => AppContext::credentials_dir(&args.name)?,
    };
    let options = build_options(app, args, dir.clone());
    let ports = ProvisionPorts {
        cloud: &app.cloud,
        connector: &app.connector,
        vault: &app.cloud,
        keys: &app.keys,
        fs: &app.fs,
        registry: &app.registry,
    };
    let reporter = app.reporter();
    let outcome = provision_host(&ports, &options, &reporter, &app.cancel).await?;

    let written = export_to_local_directory(&app.fs, &dir, &outcome.host.credentials)
        .await
        .with_context(|| format!("writing credentials to {}", dir.display()))?;
    if !written.is_empty() {
        reporter.success(&format!("keys and certificates written to {}", dir.display()));
    }
    drop(reporter);

    app.renderer().render_provisioned(&outcome)
}
