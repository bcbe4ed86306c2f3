//! `dockhand container`: start, stop, remove and run containers.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::ports::{RemoteConnector, RemoteSession};
use crate::application::services::containers::{
    ContainerAction, PortMapping, RunSpec, container_action, run_container,
};
use crate::commands::{HostArgs, resolve_host};

/// Container subcommands.
#[derive(Subcommand, Debug)]
pub enum ContainerCommand {
    /// Start a stopped container
    Start(TargetArgs),
    /// Stop a running container
    Stop(TargetArgs),
    /// Remove a container
    Rm(TargetArgs),
    /// Run a container from an image
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    #[command(flatten)]
    pub host: HostArgs,

    /// Container name
    pub container: String,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub host: HostArgs,

    /// Image reference
    pub image: String,

    /// Container name
    #[arg(long = "container-name")]
    pub container_name: Option<String>,

    /// Published port, HOST:CONTAINER (repeatable)
    #[arg(short = 'p', long = "publish", value_name = "HOST:CONTAINER")]
    pub ports: Vec<PortMapping>,
}

/// Run a container subcommand.
///
/// # Errors
///
/// Returns an error for invalid names, an unreachable host or a failing
/// docker command.
pub async fn run(app: &AppContext, cmd: &ContainerCommand) -> Result<()> {
    match cmd {
        ContainerCommand::Start(target) => act(app, ContainerAction::Start, target).await,
        ContainerCommand::Stop(target) => act(app, ContainerAction::Stop, target).await,
        ContainerCommand::Rm(target) => act(app, ContainerAction::Remove, target).await,
        ContainerCommand::Run(args) => run_image(app, args).await,
    }
}

async fn act(app: &AppContext, action: ContainerAction, target: &TargetArgs) -> Result<()> {
    let host = resolve_host(app, &target.host).await?;
    let session = app.connector.connect(&host).await?;
    let result = container_action(&session, action, &target.container).await;
    session.close().await?;
    result?;
    app.renderer()
        .render_container(past_tense(action), &target.container)
}

async fn run_image(app: &AppContext, args: &RunArgs) -> Result<()> {
    let host = resolve_host(app, &args.host).await?;
    let session = app.connector.connect(&host).await?;
    let spec = RunSpec {
        image: args.image.clone(),
        name: args.container_name.clone(),
        ports: args.ports.clone(),
    };
    let result = run_container(&session, &spec).await;
    session.close().await?;
    let id = result?;
    let container = args.container_name.clone().unwrap_or(id);
    app.renderer().render_container("started", &container)
}

fn past_tense(action: ContainerAction) -> &'static str {
    match action {
        ContainerAction::Start => "started",
        ContainerAction::Stop => "stopped",
        ContainerAction::Remove => "removed",
    }
}
