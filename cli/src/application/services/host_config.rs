//! Host configuration: install Docker, provision TLS, configure the daemon.
//!
//! Runs over an open remote session on a host that is already running.
//! Any failing command halts the sequence with
//! [`ProvisionError::Configuration`]; nothing is rolled back.

use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::ports::{ProgressReporter, RemoteSession};
use crate::application::services::PollPolicy;
use crate::domain::credentials::TLS_FILE_NAMES;
use crate::domain::error::ProvisionError;
use crate::domain::phase::PhaseTracker;
use crate::domain::script::{
    REMOTE_SCRIPTS_DIR, REMOTE_TLS_DIR, ScriptKind, daemon_tls_opts, render_script,
};
use crate::domain::{CommandResult, ConfigPhase, HostDescriptor, OsVariant, TlsBundle};

/// Budget for the Docker daemon to answer after installation.
pub const DAEMON_POLL: PollPolicy = PollPolicy {
    interval: Duration::from_secs(5),
    attempts: 24,
};

/// How TLS material reached the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsSource {
    Uploaded,
    GeneratedOnHost,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ConfigureOutcome {
    pub tls: TlsSource,
    pub phases: Vec<ConfigPhase>,
}

fn check_cancelled(cancel: &CancellationToken, tracker: &PhaseTracker) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(ProvisionError::Cancelled {
            phase: tracker.current().label().to_string(),
        }
        .into());
    }
    Ok(())
}

/// Run `command`, turning a non-zero exit into a configuration error.
///
/// # Errors
///
/// Returns [`ProvisionError::Configuration`] carrying the command output.
pub async fn run_step(
    session: &impl RemoteSession,
    step: &str,
    command: &str,
) -> Result<CommandResult> {
    debug!(step, command, "remote step");
    let result = session.exec(command).await?;
    if !result.success() {
        return Err(ProvisionError::Configuration {
            step: step.to_string(),
            output: result.render(true, true),
        }
        .into());
    }
    Ok(result)
}

async fn run_script(
    session: &impl RemoteSession,
    kind: ScriptKind,
    vars: &[(&str, &str)],
    file_name: &str,
) -> Result<CommandResult> {
    let script = render_script(kind, vars)?;
    session
        .upload_text(&script, file_name, REMOTE_SCRIPTS_DIR, Some(0o755))
        .await?;
    run_step(session, kind.step(), &format!("bash {REMOTE_SCRIPTS_DIR}/{file_name}")).await
}

fn distro(os: OsVariant) -> &'static str {
    match os {
        OsVariant::Debian8 => "debian",
        _ => "ubuntu",
    }
}

/// Poll `docker version` until the daemon answers.
///
/// # Errors
///
/// Returns [`ProvisionError::TimedOut`] when the budget is exhausted.
pub async fn wait_for_daemon(session: &impl RemoteSession, poll: PollPolicy) -> Result<()> {
    for attempt in 1..=poll.attempts {
        let result = session.exec("sudo docker version").await?;
        if result.success() {
            return Ok(());
        }
        debug!(attempt, output = %result.combined_output(), "docker daemon not ready");
        if attempt < poll.attempts {
            tokio::time::sleep(poll.interval).await;
        }
    }
    Err(ProvisionError::TimedOut {
        what: "the docker daemon".to_string(),
        waited_secs: poll.budget().as_secs(),
    }
    .into())
}

/// `rm -f` of the six TLS files, so uploads never hit a read-only leftover.
fn clear_tls_command() -> String {
    let paths: Vec<String> = TLS_FILE_NAMES
        .iter()
        .map(|name| format!("{REMOTE_TLS_DIR}/{name}"))
        .collect();
    format!("rm -f {}", paths.join(" "))
}

async fn upload_tls(session: &impl RemoteSession, tls: &TlsBundle) -> Result<()> {
    run_step(session, "clear previous TLS files", &clear_tls_command()).await?;
    for (name, content) in tls.files() {
        let mode = if name.ends_with("key.pem") { 0o600 } else { 0o644 };
        session
            .upload_text(content, name, REMOTE_TLS_DIR, Some(mode))
            .await?;
    }
    run_script(
        session,
        ScriptKind::InstallTlsCerts,
        &[("TLS_DIR", REMOTE_TLS_DIR)],
        "install-tls-certs.sh",
    )
    .await?;
    Ok(())
}

async fn generate_tls_on_host(
    session: &impl RemoteSession,
    host: &HostDescriptor,
) -> Result<TlsBundle> {
    let dns = host.address().to_string();
    let ip = if host.public_ip.is_empty() {
        "127.0.0.1"
    } else {
        host.public_ip.as_str()
    };
    run_script(
        session,
        ScriptKind::CreateTlsCerts,
        &[
            ("TLS_DIR", REMOTE_TLS_DIR),
            ("HOST_NAME", host.name()),
            ("DNS_NAME", dns.as_str()),
            ("PUBLIC_IP", ip),
        ],
        "create-tls-certs.sh",
    )
    .await?;

    let mut files = Vec::with_capacity(TLS_FILE_NAMES.len());
    for name in TLS_FILE_NAMES {
        let content = session
            .download_text(&format!("{REMOTE_TLS_DIR}/{name}"))
            .await?;
        files.push((name, content));
    }
    let bundle = TlsBundle::from_files(|name| {
        files
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| c.as_str())
    });
    if !bundle.is_complete() {
        return Err(ProvisionError::Configuration {
            step: ScriptKind::CreateTlsCerts.step().to_string(),
            output: format!("empty certificate files: {}", bundle.missing().join(", ")),
        }
        .into());
    }
    Ok(bundle)
}

/// Configure a running host, advancing `tracker` from `Running` to `Done`.
///
/// With TLS enabled a complete bundle on the descriptor is uploaded;
/// otherwise certificates are generated on the host and the descriptor's
/// bundle is replaced with the downloaded set.
///
/// # Errors
///
/// Returns [`ProvisionError::UnsupportedPlatform`] for an OS without
/// scripts, [`ProvisionError::Configuration`] for a failing step,
/// [`ProvisionError::TimedOut`] if the daemon never answers and
/// [`ProvisionError::Cancelled`] when `cancel` fires between phases.
pub async fn configure_host(
    session: &impl RemoteSession,
    host: &mut HostDescriptor,
    tracker: &mut PhaseTracker,
    reporter: &impl ProgressReporter,
    cancel: &CancellationToken,
    daemon_poll: PollPolicy,
) -> Result<ConfigureOutcome> {
    anyhow::ensure!(
        tracker.current() == ConfigPhase::Running,
        "host configuration starts from '{}', not '{}'",
        ConfigPhase::Running,
        tracker.current()
    );
    let os = host.os;
    ScriptKind::InstallDocker(os).template_name()?;

    check_cancelled(cancel, tracker)?;
    reporter.step("installing docker...");
    let user = host.credentials.username.clone();
    run_script(
        session,
        ScriptKind::InstallDocker(os),
        &[("ADMIN_USER", user.as_str()), ("DISTRO", distro(os))],
        "install-docker.sh",
    )
    .await?;
    wait_for_daemon(session, daemon_poll).await?;
    tracker.advance(ConfigPhase::ServiceInstalled)?;
    reporter.success("docker installed");

    check_cancelled(cancel, tracker)?;
    let tls = if host.tls_enabled {
        let source = if let Some(bundle) = host.credentials.complete_tls().cloned() {
            reporter.step("uploading tls certificates...");
            upload_tls(session, &bundle).await?;
            TlsSource::Uploaded
        } else {
            reporter.step("generating tls certificates on host...");
            let bundle = generate_tls_on_host(session, host).await?;
            host.credentials.tls = Some(bundle);
            TlsSource::GeneratedOnHost
        };
        tracker.advance(ConfigPhase::TlsProvisioned)?;
        reporter.success("tls certificates installed");
        source
    } else {
        tracker.advance(ConfigPhase::NoTls)?;
        TlsSource::Disabled
    };

    check_cancelled(cancel, tracker)?;
    if host.tls_enabled && host.credentials.complete_tls().is_none() {
        return Err(ProvisionError::Configuration {
            step: ScriptKind::ConfigureDaemon(os).step().to_string(),
            output: "tls is enabled but the certificate bundle is incomplete".to_string(),
        }
        .into());
    }
    reporter.step("configuring docker daemon...");
    let port = host.docker_port.to_string();
    run_script(
        session,
        ScriptKind::ConfigureDaemon(os),
        &[("DOCKER_PORT", port.as_str()), ("TLS_OPTS", daemon_tls_opts(host.tls_enabled))],
        "configure-docker.sh",
    )
    .await?;
    tracker.advance(ConfigPhase::ConfigWritten)?;
    wait_for_daemon(session, daemon_poll).await?;
    tracker.advance(ConfigPhase::Done)?;
    reporter.success(&format!("docker listening on {}", host.docker_endpoint()));
    info!(host = host.name(), tls = ?tls, "host configured");

    Ok(ConfigureOutcome {
        tls,
        phases: tracker.history().to_vec(),
    })
}
