//! `dockhand show`: one host's live details.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::VirtualMachines;
use crate::commands::{HostArgs, locate_host};

/// Run `dockhand show`.
///
/// # Errors
///
/// Returns an error if the host cannot be found.
pub async fn run(app: &AppContext, args: &HostArgs) -> Result<()> {
    let host = locate_host(app, args).await?;
    let power = app
        .cloud
        .power_state(&host.resource_group, host.name())
        .await?;
    app.renderer().render_host(&host, power)
}
