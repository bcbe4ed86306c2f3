//! `dockhand ps` and `dockhand images`: what the host's daemon is running.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{LocalFs, RemoteConnector, RemoteSession};
use crate::application::services::inventory::{list_images, list_workloads, reconcile_with_catalog};
use crate::commands::{HostArgs, resolve_host};
use crate::domain::workload::CatalogEntry;

/// Arguments for the ps command.
#[derive(Args, Debug)]
pub struct PsArgs {
    #[command(flatten)]
    pub host: HostArgs,

    /// JSON list of {"name", "path"} entries used to derive workload URLs
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
}

async fn load_catalog(app: &AppContext, path: Option<&PathBuf>) -> Result<Vec<CatalogEntry>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = app
        .fs
        .read_optional(path)
        .await?
        .with_context(|| format!("catalog {} not found", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

/// Run `dockhand ps`.
///
/// # Errors
///
/// Returns an error if the host cannot be reached or the listing fails.
pub async fn run_ps(app: &AppContext, args: &PsArgs) -> Result<()> {
    let catalog = load_catalog(app, args.catalog.as_ref()).await?;
    let host = resolve_host(app, &args.host).await?;
    let session = app.connector.connect(&host).await?;
    let scan = list_workloads(&session).await;
    session.close().await?;
    let mut scan = scan?;
    reconcile_with_catalog(&host, &mut scan.workloads, &catalog, &app.probe).await;
    app.renderer().render_inventory("containers", &scan)
}

/// Run `dockhand images`.
///
/// # Errors
///
/// Returns an error if the host cannot be reached or the listing fails.
pub async fn run_images(app: &AppContext, args: &HostArgs) -> Result<()> {
    let host = resolve_host(app, args).await?;
    let session = app.connector.connect(&host).await?;
    let scan = list_images(&session).await;
    session.close().await?;
    app.renderer().render_inventory("images", &scan?)
}
