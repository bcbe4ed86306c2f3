//! `dockhand configure`: install and configure Docker on an existing VM.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{CredentialGenerator, ProgressReporter, RemoteConnector, RemoteSession};
use crate::application::services::credentials::{
    VAULT_READY_POLL, VaultTarget, export_to_local_directory, load_from_local_directory,
    save_to_vault,
};
use crate::application::services::host_config::{DAEMON_POLL, configure_host};
use crate::commands::{HostArgs, resolve_host};
use crate::domain::error::CredentialError;
use crate::domain::phase::PhaseTracker;
use crate::domain::validate::validate_vault_name;
use crate::domain::{ConfigPhase, HostDescriptor};

/// Arguments for the configure command.
#[derive(Args, Debug)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub host: HostArgs,

    /// Expose the Docker daemon without TLS
    #[arg(long)]
    pub no_tls: bool,

    /// Issue TLS certificates locally instead of on the host
    #[arg(long, conflicts_with_all = ["cert_dir", "no_tls"])]
    pub local_certs: bool,

    /// Use the six TLS PEM files from this directory
    #[arg(long, value_name = "DIR", conflicts_with = "no_tls")]
    pub cert_dir: Option<PathBuf>,

    /// Save the host's credentials to this key vault afterwards
    #[arg(long, value_name = "NAME")]
    pub vault: Option<String>,

    /// Write keys and certificates here [default: ~/.dockhand/hosts/<name>]
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

async fn prepare_tls(app: &AppContext, args: &ConfigureArgs, host: &mut HostDescriptor) -> Result<()> {
    host.tls_enabled = !args.no_tls;
    if args.no_tls {
        return Ok(());
    }
    if let Some(dir) = &args.cert_dir {
        let local = load_from_local_directory(&app.fs, dir).await?;
        host.credentials.tls = Some(local.tls.ok_or_else(|| {
            CredentialError::NotFound(dir.join("ca.pem").display().to_string())
        })?);
    } else if args.local_certs {
        host.credentials.tls = Some(app.keys.tls_bundle(&host.host_names())?);
    } else {
        // Generated on the host.
        host.credentials.tls = None;
    }
    Ok(())
}

/// Run `dockhand configure`.
///
/// # Errors
///
/// Returns an error if the host cannot be reached or a configuration step
/// fails.
pub async fn run(app: &AppContext, args: &ConfigureArgs) -> Result<()> {
    if let Some(vault) = &args.vault {
        validate_vault_name(vault)?;
    }
    let mut host = resolve_host(app, &args.host).await?;
    prepare_tls(app, args, &mut host).await?;
    anyhow::ensure!(
        host.docker_port != host.ssh_port,
        "docker port and ssh port must differ"
    );

    let reporter = app.reporter();
    let mut tracker = PhaseTracker::new(ConfigPhase::Running);
    let session = app.connector.connect(&host).await?;
    let configured = configure_host(
        &session,
        &mut host,
        &mut tracker,
        &reporter,
        &app.cancel,
        DAEMON_POLL,
    )
    .await;
    let closed = session.close().await;
    let outcome = configured?;
    closed?;

    if let Some(vault) = &args.vault {
        reporter.step(&format!("saving credentials to vault {vault}..."));
        let target = VaultTarget {
            name: vault.clone(),
            region: host.region.clone(),
            resource_group: host.resource_group.clone(),
        };
        save_to_vault(
            &app.cloud,
            &target,
            &host.host_names(),
            &host.credentials,
            VAULT_READY_POLL,
        )
        .await?;
        reporter.success("credentials saved");
    }

    let dir = match &args.out {
        Some(dir) => dir.clone(),
        None => AppContext::credentials_dir(host.name())?,
    };
    let written = export_to_local_directory(&app.fs, &dir, &host.credentials).await?;
    if !written.is_empty() {
        reporter.success(&format!("keys and certificates written to {}", dir.display()));
    }
    drop(reporter);

    app.renderer().render_configured(&host, &outcome)
}
