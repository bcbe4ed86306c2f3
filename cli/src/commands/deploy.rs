//! `dockhand deploy`: build an image from a Dockerfile on the host and run it.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{RemoteConnector, RemoteSession};
use crate::application::services::containers::{DeployDefinition, PortMapping, deploy_image};
use crate::commands::{HostArgs, resolve_host};

/// Arguments for the deploy command.
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub host: HostArgs,

    /// Image name; the container is named <image>-container
    #[arg(long)]
    pub image: String,

    /// Dockerfile to build
    #[arg(long, value_name = "FILE")]
    pub dockerfile: PathBuf,

    /// Extra file copied next to the Dockerfile (e.g. an application archive)
    #[arg(long, value_name = "FILE")]
    pub artifact: Option<PathBuf>,

    /// Published port, HOST:CONTAINER
    #[arg(short = 'p', long = "publish", value_name = "HOST:CONTAINER", default_value = "80:80")]
    pub port: PortMapping,
}

/// Run `dockhand deploy`.
///
/// # Errors
///
/// Returns an error if the upload, build or run fails.
pub async fn run(app: &AppContext, args: &DeployArgs) -> Result<()> {
    anyhow::ensure!(
        args.dockerfile.is_file(),
        "Dockerfile {} not found",
        args.dockerfile.display()
    );
    let definition = DeployDefinition {
        name: args.image.clone(),
        dockerfile: args.dockerfile.clone(),
        artifact: args.artifact.clone(),
        port: args.port,
    };
    let host = resolve_host(app, &args.host).await?;
    let reporter = app.reporter();
    let session = app.connector.connect(&host).await?;
    let result = deploy_image(&session, &reporter, &definition).await;
    session.close().await?;
    result?;
    drop(reporter);
    let container = format!("{}-container", args.image.to_ascii_lowercase());
    app.renderer().render_container("deployed", &container)
}
