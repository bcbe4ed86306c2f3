//! `dockhand delete`: remove a host, optionally with its dependencies.

use anyhow::Result;
use clap::Args;
use tracing::warn;

use crate::app::AppContext;
use crate::application::services::registry::{forget_host, resolve_group};
use crate::application::services::vm;

/// Arguments for the delete command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Host (VM) name
    pub name: String,

    /// Resource group (defaults to the one recorded at create)
    #[arg(short = 'g', long)]
    pub resource_group: Option<String>,

    /// Also delete the NIC, public IP, network and disk the VM used alone
    #[arg(long)]
    pub with_dependencies: bool,
}

/// Run `dockhand delete`.
///
/// # Errors
///
/// Returns an error if the VM cannot be deleted.
pub async fn run(app: &AppContext, args: &DeleteArgs) -> Result<()> {
    let group = resolve_group(&app.registry, &args.name, args.resource_group.as_deref()).await?;

    if !app.is_json() && !app.output.quiet {
        println!();
        println!("This will delete VM '{}' in resource group '{group}'.", args.name);
        if args.with_dependencies {
            println!("Network resources and disks used only by this VM are deleted too.");
        }
        println!();
    }
    if !app.confirm("Continue?", true)? {
        app.output.info("Cancelled.");
        return Ok(());
    }

    let report = if args.with_dependencies {
        Some(vm::delete_host_and_dependencies(&app.cloud, &group, &args.name).await?)
    } else {
        vm::delete_host(&app.cloud, &group, &args.name).await?;
        None
    };

    if let Err(e) = forget_host(&app.registry, &args.name).await {
        warn!(error = %e, "could not update local host registry");
    }
    app.renderer().render_deleted(&args.name, report.as_ref())
}
