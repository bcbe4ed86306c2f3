//! Container and image operations on a configured host.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::application::ports::{ProgressReporter, RemoteSession};
use crate::application::services::host_config::run_step;
use crate::domain::CommandResult;
use crate::domain::script::remote_image_dir;
use crate::domain::validate::{validate_container_name, validate_image_ref};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    Start,
    Stop,
    Remove,
}

impl ContainerAction {
    fn verb(self) -> &'static str {
        match self {
            ContainerAction::Start => "start",
            ContainerAction::Stop => "stop",
            ContainerAction::Remove => "rm",
        }
    }
}

/// Published port, `host:container`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

impl std::str::FromStr for PortMapping {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (host, container) = s.split_once(':').unwrap_or((s, s));
        Ok(Self {
            host: host.parse().with_context(|| format!("invalid host port in '{s}'"))?,
            container: container
                .parse()
                .with_context(|| format!("invalid container port in '{s}'"))?,
        })
    }
}

/// `docker run -d` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub name: Option<String>,
    pub ports: Vec<PortMapping>,
}

/// A Dockerfile (and optional artifact) to build and run on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployDefinition {
    /// Image name; the container is named `<name>-container`.
    pub name: String,
    pub dockerfile: PathBuf,
    pub artifact: Option<PathBuf>,
    pub port: PortMapping,
}

/// Start, stop or remove a container.
///
/// # Errors
///
/// Returns an error for an invalid name or a failing command.
pub async fn container_action(
    session: &impl RemoteSession,
    action: ContainerAction,
    container: &str,
) -> Result<CommandResult> {
    validate_container_name(container)?;
    info!(container, action = action.verb(), "container action");
    run_step(
        session,
        &format!("{} container", action.verb()),
        &format!("sudo docker {} {container}", action.verb()),
    )
    .await
}

fn run_command(spec: &RunSpec) -> String {
    let mut cmd = String::from("sudo docker run -d");
    if let Some(name) = &spec.name {
        cmd.push_str(&format!(" --name {name}"));
    }
    for p in &spec.ports {
        cmd.push_str(&format!(" -p {}:{}", p.host, p.container));
    }
    cmd.push(' ');
    cmd.push_str(&spec.image);
    cmd
}

/// Run a detached container; returns its ID.
///
/// # Errors
///
/// Returns an error for invalid names or a failing command.
pub async fn run_container(session: &impl RemoteSession, spec: &RunSpec) -> Result<String> {
    validate_image_ref(&spec.image)?;
    if let Some(name) = &spec.name {
        validate_container_name(name)?;
    }
    let out = run_step(session, "run container", &run_command(spec)).await?;
    Ok(out.stdout.trim().to_string())
}

/// Upload a build context, build the image and run it.
///
/// Returns the new container's ID.
///
/// # Errors
///
/// Returns an error for invalid names, a failed upload, build or run.
pub async fn deploy_image(
    session: &impl RemoteSession,
    reporter: &impl ProgressReporter,
    definition: &DeployDefinition,
) -> Result<String> {
    let name = definition.name.to_ascii_lowercase();
    validate_container_name(&name)?;
    let dir = remote_image_dir(&name);

    reporter.step("uploading build context...");
    session
        .upload_file(&definition.dockerfile, "Dockerfile", &dir, Some(0o644))
        .await?;
    if let Some(artifact) = &definition.artifact {
        let file_name = artifact
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("invalid artifact path {}", artifact.display()))?;
        session
            .upload_file(artifact, file_name, &dir, Some(0o644))
            .await?;
    }

    reporter.step(&format!("building image {name}..."));
    run_step(
        session,
        "build image",
        &format!("cd {dir} && sudo docker build -t {name} ."),
    )
    .await?;
    reporter.success(&format!("image {name} built"));

    let container = format!("{name}-container");
    // Replacing a previous deployment; absence is fine.
    session
        .exec(&format!("sudo docker rm -f {container}"))
        .await?;
    let id = run_container(
        session,
        &RunSpec {
            image: name.clone(),
            name: Some(container.clone()),
            ports: vec![definition.port],
        },
    )
    .await?;
    reporter.success(&format!("{container} running"));
    Ok(id)
}
