//! `dockhand list`: Docker hosts in the subscription.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::HostRegistryStore;
use crate::application::services::vm;

/// Arguments for the list command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only hosts in this resource group
    #[arg(short = 'g', long)]
    pub resource_group: Option<String>,
}

/// Run `dockhand list`.
///
/// # Errors
///
/// Returns an error if the cloud listing or the local registry fails.
pub async fn run(app: &AppContext, args: &ListArgs) -> Result<()> {
    let hosts = vm::list_hosts(&app.cloud, args.resource_group.as_deref()).await?;
    let registry = app.registry.load_async().await?;
    app.renderer().render_hosts(&hosts, &registry)
}
