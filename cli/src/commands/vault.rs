//! `dockhand vault`: store and fetch host credentials in a key vault.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::credentials::{
    VAULT_READY_POLL, VaultTarget, export_to_local_directory, load_from_vault, save_to_vault,
};
use crate::commands::{HostArgs, resolve_host};
use crate::domain::error::VaultError;
use crate::domain::validate::validate_vault_name;
use crate::output::JsonRenderer;

/// Vault subcommands.
#[derive(Subcommand, Debug)]
pub enum VaultCommand {
    /// Save a host's credentials to a vault, creating the vault if needed
    Save(SaveArgs),
    /// Fetch credentials from a vault into a local directory
    Load(LoadArgs),
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    #[command(flatten)]
    pub host: HostArgs,

    /// Vault name
    #[arg(long = "vault", value_name = "NAME")]
    pub vault: String,
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Vault name
    pub vault: String,

    /// Output directory
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,
}

/// Run a vault subcommand.
///
/// # Errors
///
/// Returns an error if the vault cannot be read or written.
pub async fn run(app: &AppContext, cmd: &VaultCommand) -> Result<()> {
    match cmd {
        VaultCommand::Save(args) => save(app, args).await,
        VaultCommand::Load(args) => load(app, args).await,
    }
}

async fn save(app: &AppContext, args: &SaveArgs) -> Result<()> {
    validate_vault_name(&args.vault)?;
    let host = resolve_host(app, &args.host).await?;
    let target = VaultTarget {
        name: args.vault.clone(),
        region: host.region.clone(),
        resource_group: host.resource_group.clone(),
    };
    let reporter = app.reporter();
    reporter.step(&format!("saving credentials to vault {}...", args.vault));
    save_to_vault(
        &app.cloud,
        &target,
        &host.host_names(),
        &host.credentials,
        VAULT_READY_POLL,
    )
    .await?;
    reporter.success(&format!("credentials for {} saved", host.name()));
    if app.is_json() {
        JsonRenderer.print(&serde_json::json!({
            "vault": args.vault,
            "host": host.name(),
            "host_names": host.host_names(),
        }))?;
    }
    Ok(())
}

async fn load(app: &AppContext, args: &LoadArgs) -> Result<()> {
    validate_vault_name(&args.vault)?;
    let stored = load_from_vault(&app.cloud, &args.vault)
        .await?
        .ok_or_else(|| VaultError::NotFound(args.vault.clone()))?;
    let written = export_to_local_directory(&app.fs, &args.out, &stored.bundle).await?;
    if !app.is_json() {
        app.output
            .info(&format!("host names: {}", stored.host_names.join(", ")));
    }
    app.renderer()
        .render_files("credentials loaded", &args.out, &written)
}
