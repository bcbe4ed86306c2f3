//! Command implementations

pub mod config;
pub mod configure;
pub mod container;
pub mod create;
pub mod delete;
pub mod deploy;
pub mod inventory;
pub mod keys;
pub mod list;
pub mod show;
pub mod vault;
pub mod version;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::debug;

use crate::app::AppContext;
use crate::application::services::credentials::{load_from_local_directory, load_from_vault};
use crate::application::services::registry::resolve_group;
use crate::application::services::vm;
use crate::domain::error::CredentialError;
use crate::domain::{CredentialBundle, HostDescriptor};

/// Env var holding the VM admin password.
pub const PASSWORD_ENV: &str = "DOCKHAND_ADMIN_PASSWORD";

/// Locates an existing host and the credentials to log in to it.
#[derive(Args, Debug, Clone)]
pub struct HostArgs {
    /// Host (VM) name
    pub name: String,

    /// Resource group (defaults to the one recorded at create)
    #[arg(short = 'g', long)]
    pub resource_group: Option<String>,

    /// Directory holding id_rsa / id_rsa.pub and TLS certificates
    #[arg(long, value_name = "DIR")]
    pub key_dir: Option<PathBuf>,

    /// Admin password
    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: Option<String>,

    /// Admin user name (defaults to the VM's)
    #[arg(long)]
    pub user: Option<String>,
}

impl HostArgs {
    async fn group(&self, app: &AppContext) -> Result<String> {
        resolve_group(&app.registry, &self.name, self.resource_group.as_deref()).await
    }
}

/// Rebuild a host from cloud metadata, without credentials.
///
/// # Errors
///
/// Returns an error if the group cannot be resolved or the VM is missing.
pub async fn locate_host(app: &AppContext, args: &HostArgs) -> Result<HostDescriptor> {
    let group = args.group(app).await?;
    vm::get_host(&app.cloud, &group, &args.name).await
}

/// Locate a host and attach login credentials.
///
/// Sources, first match wins: `--key-dir`, the host's vault, then the
/// default local directory written by `create`. `--password` and `--user`
/// apply on top.
///
/// # Errors
///
/// Returns an error if the host is missing, a source cannot be read, or no
/// login credential is found.
pub async fn resolve_host(app: &AppContext, args: &HostArgs) -> Result<HostDescriptor> {
    let mut host = locate_host(app, args).await?;
    let mut bundle = CredentialBundle::new(host.credentials.username.clone());

    if let Some(dir) = &args.key_dir {
        let local = load_from_local_directory(&app.fs, dir).await?;
        bundle.ssh = local.ssh;
        bundle.tls = local.tls;
    } else if let Some(vault) = host.vault.clone()
        && let Some(stored) = load_from_vault(&app.cloud, &vault).await?
    {
        debug!(vault, "using credentials from vault");
        bundle = stored.bundle;
        if bundle.username.is_empty() {
            bundle.username.clone_from(&host.credentials.username);
        }
    } else {
        let dir = AppContext::credentials_dir(host.name())?;
        match load_from_local_directory(&app.fs, &dir).await {
            Ok(local) => {
                bundle.ssh = local.ssh;
                bundle.tls = local.tls;
            }
            Err(e) if e.downcast_ref::<CredentialError>().is_some() => {
                debug!(dir = %dir.display(), "no local credentials");
            }
            Err(e) => return Err(e),
        }
    }

    if let Some(password) = &args.password {
        bundle.password = Some(password.clone());
    }
    if let Some(user) = &args.user {
        bundle.username.clone_from(user);
    }
    if !bundle.has_login() {
        return Err(CredentialError::NotFound(format!(
            "login credentials for '{}'; pass --key-dir or --password",
            host.name()
        ))
        .into());
    }
    host.credentials = bundle;
    Ok(host)
}
