//! End-to-end provisioning workflow for one Docker host.
//!
//! validate input → credentials → infrastructure → wait until running →
//! configure host → save vault → record locally.
//!
//! Cancellation is checked between phases. Once any cloud resource exists, a
//! failed or cancelled run leaves it in place unless `teardown_on_failure`
//! is set. Login keys are written locally before the first cloud call so a
//! host left behind stays reachable.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::ports::{
    CloudProvisioner, CredentialGenerator, HostRegistryStore, LocalFs, ProgressReporter,
    RemoteConnector, RemoteSession, SecretStore,
};
use crate::application::services::PollPolicy;
use crate::application::services::credentials::{
    VAULT_READY_POLL, VaultTarget, export_to_local_directory, load_from_local_directory,
    save_to_vault,
};
use crate::application::services::host_config::{DAEMON_POLL, TlsSource, configure_host};
use crate::application::services::registry::record_host;
use crate::application::services::vm::{
    CreatedResources, DEFAULT_MAX_WAIT, HostSpec, TeardownReport, create_host_recording,
    delete_host_and_dependencies, wait_until_running,
};
use crate::domain::error::{CredentialError, ProvisionError};
use crate::domain::phase::PhaseTracker;
use crate::domain::validate::{
    validate_admin_user, validate_host_name, validate_password, validate_storage_account_name,
    validate_vault_name,
};
use crate::domain::{ConfigPhase, CredentialBundle, HostDescriptor, ResourceRef};

/// Where the SSH login key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshKeySource {
    /// Password login only.
    None,
    Generate,
    /// `id_rsa` / `id_rsa.pub` in a local directory.
    Directory(PathBuf),
}

/// Where TLS certificates come from when TLS is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertSource {
    /// Generated by a script on the host and downloaded.
    OnHost,
    /// Issued locally once the host's DNS name and IP are known.
    Local,
    /// Six PEM files in a local directory.
    Directory(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    pub spec: HostSpec,
    pub ssh_key: SshKeySource,
    pub certs: CertSource,
    pub teardown_on_failure: bool,
    /// Unlocks an encrypted key from [`SshKeySource::Directory`].
    pub key_passphrase: Option<String>,
    /// Local directory receiving the login key before any cloud call.
    pub credentials_dir: Option<PathBuf>,
    pub max_wait: Duration,
    pub daemon_poll: PollPolicy,
    pub vault_poll: PollPolicy,
}

impl ProvisionOptions {
    #[must_use]
    pub fn new(spec: HostSpec) -> Self {
        Self {
            spec,
            ssh_key: SshKeySource::None,
            certs: CertSource::OnHost,
            teardown_on_failure: false,
            key_passphrase: None,
            credentials_dir: None,
            max_wait: DEFAULT_MAX_WAIT,
            daemon_poll: DAEMON_POLL,
            vault_poll: VAULT_READY_POLL,
        }
    }
}

/// The ports the workflow drives.
pub struct ProvisionPorts<'a, C, K, V, G, F, H> {
    pub cloud: &'a C,
    pub connector: &'a K,
    pub vault: &'a V,
    pub keys: &'a G,
    pub fs: &'a F,
    pub registry: &'a H,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ProvisionOutcome {
    pub host: HostDescriptor,
    pub phases: Vec<ConfigPhase>,
    pub tls: TlsSource,
    pub vault_saved: bool,
}

/// Reject bad input before any resource is touched.
///
/// # Errors
///
/// Returns the first validation failure.
pub fn validate_spec(spec: &HostSpec) -> Result<()> {
    validate_host_name(&spec.name)?;
    validate_admin_user(&spec.admin_user)?;
    if let Some(password) = &spec.password {
        validate_password(password)?;
    }
    if let Some(vault) = &spec.vault {
        validate_vault_name(vault)?;
    }
    if let ResourceRef::New(account) = &spec.storage_account {
        validate_storage_account_name(account)?;
    }
    anyhow::ensure!(
        spec.docker_port != spec.ssh_port,
        "docker port and ssh port must differ"
    );
    Ok(())
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

async fn prepare_credentials(
    keys: &impl CredentialGenerator,
    fs: &impl LocalFs,
    options: &ProvisionOptions,
) -> Result<CredentialBundle> {
    let spec = &options.spec;
    let mut bundle = CredentialBundle::new(spec.admin_user.clone());
    bundle.password.clone_from(&spec.password);
    bundle.ssh = match &options.ssh_key {
        SshKeySource::None => None,
        SshKeySource::Generate => Some(
            keys.ssh_key_pair(None, &format!("{}@{}", spec.admin_user, spec.name))
                .context("generating ssh key pair")?,
        ),
        SshKeySource::Directory(dir) => {
            let local = load_from_local_directory(fs, dir).await?;
            let pair = local.ssh.ok_or_else(|| {
                CredentialError::NotFound(dir.join("id_rsa").display().to_string())
            })?;
            keys.check_private_key(&pair.private_key, options.key_passphrase.as_deref())
                .with_context(|| format!("checking {}", dir.join("id_rsa").display()))?;
            Some(pair)
        }
    };
    if spec.tls
        && let CertSource::Directory(dir) = &options.certs
    {
        let local = load_from_local_directory(fs, dir).await?;
        bundle.tls = Some(local.tls.ok_or_else(|| {
            CredentialError::NotFound(dir.join("ca.pem").display().to_string())
        })?);
    }
    Ok(bundle)
}

/// Provision, configure and record one host.
///
/// # Errors
///
/// Returns the first failing phase's error. With `teardown_on_failure` the
/// host and its exclusive dependencies are deleted first.
pub async fn provision_host<C, K, V, G, F, H>(
    ports: &ProvisionPorts<'_, C, K, V, G, F, H>,
    options: &ProvisionOptions,
    reporter: &impl ProgressReporter,
    cancel: &CancellationToken,
) -> Result<ProvisionOutcome>
where
    C: CloudProvisioner,
    K: RemoteConnector,
    V: SecretStore,
    G: CredentialGenerator,
    F: LocalFs,
    H: HostRegistryStore,
{
    let mut tracker = PhaseTracker::new(ConfigPhase::Created);
    validate_spec(&options.spec)?;
    let credentials = prepare_credentials(ports.keys, ports.fs, options).await?;
    if let Some(dir) = &options.credentials_dir
        && credentials.ssh.is_some()
    {
        export_to_local_directory(ports.fs, dir, &credentials)
            .await
            .with_context(|| format!("writing login key to {}", dir.display()))?;
        reporter.success(&format!("login key written to {}", dir.display()));
    }

    let mut spec = options.spec.clone();
    spec.ssh_public_key = credentials.ssh.as_ref().map(|k| k.public_key.clone());

    check_cancelled(cancel, &tracker)?;
    let mut created = CreatedResources::default();
    let vm = match create_host_recording(ports.cloud, reporter, &spec, &mut created).await {
        Ok(vm) => vm,
        Err(e) => {
            if !created.is_empty() {
                after_failure(ports.cloud, options, &created, reporter).await;
            }
            return Err(e);
        }
    };

    let result =
        finish_provisioning(ports, options, credentials, &vm, &mut tracker, reporter, cancel)
            .await;
    if result.is_err() {
        after_failure(ports.cloud, options, &created, reporter).await;
    }
    result
}

/// Tear down or report what a failed run left in the cloud.
async fn after_failure(
    cloud: &impl CloudProvisioner,
    options: &ProvisionOptions,
    created: &CreatedResources,
    reporter: &impl ProgressReporter,
) {
    let name = &options.spec.name;
    let group = options.spec.resource_group.name();
    let leftovers = created.describe();
    if options.teardown_on_failure && created.vm_requested {
        reporter.warn("provisioning failed, removing created resources...");
        match delete_host_and_dependencies(cloud, group, name).await {
            Ok(report) => report_teardown(reporter, &report),
            Err(te) => warn!(error = %te, "teardown failed"),
        }
        if created.group.is_some() {
            reporter.warn(&format!(
                "resource group {group} was created for this host and is kept"
            ));
        }
    } else if created.vm_requested {
        reporter.warn(&format!(
            "resources were left in place; remove them with: dockhand delete {name} --resource-group {group} --with-dependencies"
        ));
    } else {
        reporter.warn(&format!(
            "no VM was created; left in place: {}",
            leftovers.join(", ")
        ));
    }
}

fn report_teardown(reporter: &impl ProgressReporter, report: &TeardownReport) {
    for id in &report.deleted {
        reporter.success(&format!("deleted {id}"));
    }
    for (what, reason) in &report.kept {
        reporter.warn(&format!("kept {what}: {reason}"));
    }
}

async fn finish_provisioning<C, K, V, G, F, H>(
    ports: &ProvisionPorts<'_, C, K, V, G, F, H>,
    options: &ProvisionOptions,
    credentials: CredentialBundle,
    vm: &crate::domain::cloud::VmInfo,
    tracker: &mut PhaseTracker,
    reporter: &impl ProgressReporter,
    cancel: &CancellationToken,
) -> Result<ProvisionOutcome>
where
    C: CloudProvisioner,
    K: RemoteConnector,
    V: SecretStore,
    G: CredentialGenerator,
    F: LocalFs,
    H: HostRegistryStore,
{
    let spec = &options.spec;
    tracker.advance(ConfigPhase::NetworkReady)?;

    let mut host = HostDescriptor::from_vm(vm);
    host.os = spec.os;
    host.tls_enabled = spec.tls;
    host.vault.clone_from(&spec.vault);
    host.credentials = credentials;

    if spec.tls && options.certs == CertSource::Local {
        host.credentials.tls = Some(
            ports
                .keys
                .tls_bundle(&host.host_names())
                .context("issuing tls certificates")?,
        );
    }

    check_cancelled(cancel, tracker)?;
    reporter.step(&format!("waiting for {} to accept ssh...", host.name()));
    tokio::select! {
        ready = wait_until_running(ports.cloud, ports.connector, &host, options.max_wait) => { ready?; }
        () = cancel.cancelled() => {
            return Err(ProvisionError::Cancelled { phase: tracker.current().label().to_string() }.into());
        }
    }
    tracker.advance(ConfigPhase::Running)?;
    reporter.success(&format!("{} is running", host.name()));

    let session = ports.connector.connect(&host).await?;
    let configured =
        configure_host(&session, &mut host, tracker, reporter, cancel, options.daemon_poll).await;
    let closed = session.close().await;
    let configured = configured?;
    closed?;

    let mut vault_saved = false;
    if let Some(vault) = &spec.vault {
        check_cancelled(cancel, tracker)?;
        reporter.step(&format!("saving credentials to vault {vault}..."));
        let target = VaultTarget {
            name: vault.clone(),
            region: host.region.clone(),
            resource_group: host.resource_group.clone(),
        };
        save_to_vault(
            ports.vault,
            &target,
            &host.host_names(),
            &host.credentials,
            options.vault_poll,
        )
        .await?;
        reporter.success("credentials saved");
        vault_saved = true;
    }

    if let Err(e) = record_host(ports.registry, &host).await {
        warn!(error = %e, "could not update local host registry");
        reporter.warn("host created but the local registry could not be updated");
    }
    info!(host = host.name(), "provisioning complete");

    Ok(ProvisionOutcome {
        host,
        phases: configured.phases,
        tls: configured.tls,
        vault_saved,
    })
}
