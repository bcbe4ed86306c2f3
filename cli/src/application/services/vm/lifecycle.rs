//! VM lifecycle operations: create, wait, inspect, list, delete.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::ports::{
    CloudProvisioner, Networks, ProgressReporter, RemoteConnector, RemoteSession, VmCreateSpec,
};
use crate::application::services::PollPolicy;
use crate::domain::cloud::{
    PowerState, TAG_DOCKER_HOST, TAG_DOCKER_PORT, TAG_DOCKER_TLS, TAG_SSH_PORT, TAG_VAULT,
    VirtualNetwork, VmInfo,
};
use crate::domain::error::ProvisionError;
use crate::domain::{HostDescriptor, OsVariant, ResourceRef};

/// Interval between power-state probes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default budget for a VM to come up and accept SSH.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

/// Everything needed to create the infrastructure for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSpec {
    pub name: String,
    pub resource_group: ResourceRef,
    pub region: String,
    pub vm_size: String,
    pub os: OsVariant,
    pub vnet: ResourceRef,
    pub subnet: String,
    pub storage_account: ResourceRef,
    pub admin_user: String,
    pub password: Option<String>,
    pub ssh_public_key: Option<String>,
    pub docker_port: u16,
    pub ssh_port: u16,
    pub tls: bool,
    pub vault: Option<String>,
}

impl HostSpec {
    fn tags(&self) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::from([
            (TAG_DOCKER_HOST.to_string(), "true".to_string()),
            (TAG_DOCKER_PORT.to_string(), self.docker_port.to_string()),
            (TAG_DOCKER_TLS.to_string(), self.tls.to_string()),
            (TAG_SSH_PORT.to_string(), self.ssh_port.to_string()),
        ]);
        if let Some(vault) = &self.vault {
            tags.insert(TAG_VAULT.to_string(), vault.clone());
        }
        tags
    }
}

/// Outcome of [`wait_until_running`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    /// Probes made, including the successful one.
    pub probes: u32,
}

/// Outcome of [`delete_host_and_dependencies`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub vm_deleted: bool,
    /// Resource IDs deleted after the VM.
    pub deleted: Vec<String>,
    /// Resources left in place, with the reason.
    pub kept: Vec<(String, String)>,
}

/// Resources a [`create_host_recording`] call created, even when it failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedResources {
    pub group: Option<String>,
    pub vnet: Option<String>,
    pub storage_account: Option<String>,
    /// `create_vm` was issued, so the VM may exist even if the call failed.
    pub vm_requested: bool,
}

impl CreatedResources {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.group.is_none()
            && self.vnet.is_none()
            && self.storage_account.is_none()
            && !self.vm_requested
    }

    /// `kind name` for every resource created before the VM.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        [
            ("resource group", &self.group),
            ("virtual network", &self.vnet),
            ("storage account", &self.storage_account),
        ]
        .into_iter()
        .filter_map(|(kind, name)| name.as_ref().map(|n| format!("{kind} {n}")))
        .collect()
    }
}

fn missing(kind: &str, name: &str, group: &str) -> ProvisionError {
    ProvisionError::Provision(format!("{kind} '{name}' not found in resource group '{group}'"))
}

async fn ensure_group(
    cloud: &impl CloudProvisioner,
    spec: &HostSpec,
    created: &mut CreatedResources,
) -> Result<String> {
    match &spec.resource_group {
        ResourceRef::New(name) => {
            info!(group = %name, "creating resource group");
            cloud.create_group(name, &spec.region).await?;
            created.group = Some(name.clone());
            Ok(name.clone())
        }
        ResourceRef::Existing(name) => {
            cloud
                .find_group(name)
                .await?
                .ok_or_else(|| ProvisionError::Provision(format!("resource group '{name}' not found")))?;
            Ok(name.clone())
        }
    }
}

async fn ensure_vnet(
    cloud: &impl CloudProvisioner,
    group: &str,
    spec: &HostSpec,
    created: &mut CreatedResources,
) -> Result<VirtualNetwork> {
    match &spec.vnet {
        ResourceRef::New(name) => {
            info!(vnet = %name, subnet = %spec.subnet, "creating virtual network");
            let vnet = cloud.create_vnet(group, name, &spec.region, &spec.subnet).await?;
            created.vnet = Some(name.clone());
            Ok(vnet)
        }
        ResourceRef::Existing(name) => {
            let vnet = cloud
                .find_vnet(group, name)
                .await?
                .ok_or_else(|| missing("virtual network", name, group))?;
            if vnet.subnet(&spec.subnet).is_none() {
                return Err(ProvisionError::Provision(format!(
                    "virtual network '{name}' has no subnet '{}'",
                    spec.subnet
                ))
                .into());
            }
            Ok(vnet)
        }
    }
}

async fn ensure_storage(
    cloud: &impl CloudProvisioner,
    group: &str,
    spec: &HostSpec,
    created: &mut CreatedResources,
) -> Result<String> {
    match &spec.storage_account {
        ResourceRef::New(name) => {
            info!(account = %name, "creating storage account");
            cloud.create_storage_account(group, name, &spec.region).await?;
            created.storage_account = Some(name.clone());
            Ok(name.clone())
        }
        ResourceRef::Existing(name) => {
            cloud
                .find_storage_account(group, name)
                .await?
                .ok_or_else(|| missing("storage account", name, group))?;
            Ok(name.clone())
        }
    }
}

/// Create the resource group, network, storage and VM for a host.
///
/// `Existing` references are looked up and never created.
///
/// # Errors
///
/// Returns [`ProvisionError::Provision`] when an existing resource is
/// missing or no login credential is given, and
/// [`ProvisionError::UnsupportedPlatform`] for an OS without an image.
pub async fn create_host(
    cloud: &impl CloudProvisioner,
    reporter: &impl ProgressReporter,
    spec: &HostSpec,
) -> Result<VmInfo> {
    create_host_recording(cloud, reporter, spec, &mut CreatedResources::default()).await
}

/// [`create_host`], noting in `created` each resource as it comes into
/// existence so a failed run knows what it left behind.
///
/// # Errors
///
/// Same as [`create_host`].
pub async fn create_host_recording(
    cloud: &impl CloudProvisioner,
    reporter: &impl ProgressReporter,
    spec: &HostSpec,
    created: &mut CreatedResources,
) -> Result<VmInfo> {
    let has_password = spec.password.as_deref().is_some_and(|p| !p.is_empty());
    let has_key = spec.ssh_public_key.as_deref().is_some_and(|k| !k.is_empty());
    if !has_password && !has_key {
        return Err(ProvisionError::Provision(
            "a password or an SSH public key is required to create a host".to_string(),
        )
        .into());
    }
    let image_urn = spec
        .os
        .image_urn()
        .ok_or_else(|| ProvisionError::UnsupportedPlatform(spec.os.to_string()))?;

    reporter.step("preparing resource group...");
    let group = ensure_group(cloud, spec, created).await?;
    reporter.step("preparing network...");
    let vnet = ensure_vnet(cloud, &group, spec, created).await?;
    reporter.step("preparing storage...");
    let storage = ensure_storage(cloud, &group, spec, created).await?;
    reporter.success("network and storage ready");

    reporter.step(&format!("creating VM {}...", spec.name));
    created.vm_requested = true;
    let vm = cloud
        .create_vm(&VmCreateSpec {
            name: spec.name.clone(),
            resource_group: group,
            location: spec.region.clone(),
            size: spec.vm_size.clone(),
            image_urn: image_urn.to_string(),
            admin_user: spec.admin_user.clone(),
            password: spec.password.clone().filter(|_| has_password),
            ssh_public_key: spec.ssh_public_key.clone().filter(|_| has_key),
            dns_label: spec.name.to_ascii_lowercase(),
            storage_account: storage,
            vnet: vnet.name,
            subnet: spec.subnet.clone(),
            tags: spec.tags(),
        })
        .await
        .with_context(|| format!("creating VM {}", spec.name))?;
    reporter.success(&format!("VM {} created", vm.name));
    Ok(vm)
}

/// Poll until the VM is running and accepts a remote session.
///
/// An already running, reachable host returns on the first probe without
/// sleeping.
///
/// # Errors
///
/// Returns [`ProvisionError::TimedOut`] when `max_wait` is exhausted.
pub async fn wait_until_running(
    cloud: &impl CloudProvisioner,
    connector: &impl RemoteConnector,
    host: &HostDescriptor,
    max_wait: Duration,
) -> Result<Readiness> {
    let poll = PollPolicy::within(max_wait, POLL_INTERVAL);
    for probe in 1..=poll.attempts {
        match cloud.power_state(&host.resource_group, host.name()).await {
            Ok(PowerState::Running) => match connector.connect(host).await {
                Ok(session) => {
                    session.close().await?;
                    debug!(host = host.name(), probe, "host reachable");
                    return Ok(Readiness { probes: probe });
                }
                Err(e) => debug!(host = host.name(), probe, error = %e, "running but not reachable"),
            },
            Ok(state) => debug!(host = host.name(), probe, ?state, "not running yet"),
            Err(e) => debug!(host = host.name(), probe, error = %e, "power state query failed"),
        }
        if probe < poll.attempts {
            tokio::time::sleep(poll.interval).await;
        }
    }
    Err(ProvisionError::TimedOut {
        what: format!("{} to accept SSH", host.name()),
        waited_secs: poll.budget().as_secs(),
    }
    .into())
}

/// Rebuild a descriptor from live metadata.
///
/// # Errors
///
/// Returns [`ProvisionError::Provision`] when the VM does not exist.
pub async fn get_host(
    cloud: &impl CloudProvisioner,
    group: &str,
    name: &str,
) -> Result<HostDescriptor> {
    let vm = cloud
        .show_vm(group, name)
        .await?
        .ok_or_else(|| missing("VM", name, group))?;
    Ok(HostDescriptor::from_vm(&vm))
}

/// Hosts created by this tool (VMs tagged `dockerHost=true`).
///
/// # Errors
///
/// Returns an error if the listing fails.
pub async fn list_hosts(
    cloud: &impl CloudProvisioner,
    group: Option<&str>,
) -> Result<Vec<HostDescriptor>> {
    let vms = cloud.list_vms(group).await?;
    Ok(vms
        .iter()
        .filter(|vm| vm.is_docker_host())
        .map(HostDescriptor::from_vm)
        .collect())
}

/// Delete the VM only.
///
/// # Errors
///
/// Returns an error if the delete call fails.
pub async fn delete_host(cloud: &impl CloudProvisioner, group: &str, name: &str) -> Result<()> {
    info!(group, name, "deleting VM");
    cloud.delete_vm(group, name).await
}

/// Network resources owned by exactly one VM.
struct ExclusiveNetwork {
    nic_id: String,
    public_ip_id: Option<String>,
    vnet_id: String,
}

fn vnet_id_of_subnet(subnet_id: &str) -> Option<&str> {
    let idx = subnet_id.to_ascii_lowercase().find("/subnets/")?;
    Some(&subnet_id[..idx])
}

/// Prove the VM is the only user of its NIC, IP and network.
async fn check_exclusive_ownership(
    cloud: &impl Networks,
    vm: &VmInfo,
) -> Result<ExclusiveNetwork, String> {
    let [nic_id] = vm.nic_ids.as_slice() else {
        return Err(format!("VM has {} network interfaces", vm.nic_ids.len()));
    };
    let nic = cloud
        .nic_by_id(nic_id)
        .await
        .map_err(|e| format!("cannot inspect network interface: {e:#}"))?;
    let [config] = nic.ip_configurations.as_slice() else {
        return Err(format!(
            "network interface has {} IP configurations",
            nic.ip_configurations.len()
        ));
    };
    let subnet_id = config
        .subnet_id
        .as_deref()
        .ok_or_else(|| "IP configuration has no subnet".to_string())?;
    let vnet_id = vnet_id_of_subnet(subnet_id)
        .ok_or_else(|| format!("cannot parse subnet id {subnet_id}"))?;
    let vnet = cloud
        .vnet_by_id(vnet_id)
        .await
        .map_err(|e| format!("cannot inspect virtual network: {e:#}"))?;
    let [subnet] = vnet.subnets.as_slice() else {
        return Err(format!("virtual network has {} subnets", vnet.subnets.len()));
    };
    let shared = subnet
        .ip_configuration_ids
        .iter()
        .any(|id| !id.eq_ignore_ascii_case(&config.id));
    if shared {
        return Err(format!(
            "subnet '{}' is shared with other network interfaces",
            subnet.name
        ));
    }
    Ok(ExclusiveNetwork {
        nic_id: nic.id,
        public_ip_id: config.public_ip_id.clone(),
        vnet_id: vnet.id,
    })
}

/// Delete the VM, then its NIC, public IP and virtual network when the VM
/// provably owns them exclusively.
///
/// Any failure while checking ownership keeps every shared resource and
/// records why.
///
/// # Errors
///
/// Returns an error if the VM does not exist or cannot be deleted.
pub async fn delete_host_and_dependencies(
    cloud: &impl CloudProvisioner,
    group: &str,
    name: &str,
) -> Result<TeardownReport> {
    let vm = cloud
        .show_vm(group, name)
        .await?
        .ok_or_else(|| missing("VM", name, group))?;
    let ownership = check_exclusive_ownership(cloud, &vm).await;

    delete_host(cloud, group, name).await?;
    let mut report = TeardownReport {
        vm_deleted: true,
        ..TeardownReport::default()
    };

    match ownership {
        Ok(owned) => {
            let targets = std::iter::once(owned.nic_id)
                .chain(owned.public_ip_id)
                .chain(std::iter::once(owned.vnet_id));
            for id in targets {
                match cloud.delete_by_id(&id).await {
                    Ok(()) => report.deleted.push(id),
                    Err(e) => {
                        warn!(id = %id, error = %e, "dependency delete failed");
                        report.kept.push((id, format!("delete failed: {e:#}")));
                    }
                }
            }
        }
        Err(reason) => {
            info!(name, %reason, "keeping network resources");
            report.kept.push(("network resources".to_string(), reason));
        }
    }
    Ok(report)
}
