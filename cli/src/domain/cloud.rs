//! Cloud resource snapshots as returned by the management API.
//!
//! These are plain data; the infrastructure adapter fills them in from the
//! provider's JSON and the lifecycle service reasons over them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tag keys written on every VM the tool creates.
pub const TAG_DOCKER_HOST: &str = "dockerHost";
pub const TAG_DOCKER_PORT: &str = "dockerPort";
pub const TAG_DOCKER_TLS: &str = "dockerTls";
pub const TAG_SSH_PORT: &str = "sshPort";
pub const TAG_VAULT: &str = "dockerVault";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub address_prefix: String,
    /// IDs of the NIC IP configurations attached to this subnet.
    pub ip_configuration_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualNetwork {
    pub id: String,
    pub name: String,
    pub resource_group: String,
    pub address_space: Vec<String>,
    pub subnets: Vec<Subnet>,
}

impl VirtualNetwork {
    #[must_use]
    pub fn subnet(&self, name: &str) -> Option<&Subnet> {
        self.subnets.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConfiguration {
    pub id: String,
    pub subnet_id: Option<String>,
    pub public_ip_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub id: String,
    pub name: String,
    pub ip_configurations: Vec<IpConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAccount {
    pub name: String,
    pub resource_group: String,
    pub location: String,
}

/// VM power state, from the instance view's `PowerState/*` status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Deallocating,
    Deallocated,
    Unknown,
}

impl PowerState {
    /// Parse either `PowerState/running` or the display form `VM running`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let word = raw
            .rsplit(['/', ' '])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match word.as_str() {
            "starting" => PowerState::Starting,
            "running" => PowerState::Running,
            "stopping" => PowerState::Stopping,
            "stopped" => PowerState::Stopped,
            "deallocating" => PowerState::Deallocating,
            "deallocated" => PowerState::Deallocated,
            _ => PowerState::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PowerState::Starting => "starting",
            PowerState::Running => "running",
            PowerState::Stopping => "stopping",
            PowerState::Stopped => "stopped",
            PowerState::Deallocating => "deallocating",
            PowerState::Deallocated => "deallocated",
            PowerState::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
}

/// Live VM metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmInfo {
    pub id: String,
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub size: String,
    pub power_state: PowerState,
    pub admin_username: String,
    pub image: ImageReference,
    pub nic_ids: Vec<String>,
    pub public_ip: Option<String>,
    pub fqdn: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl VmInfo {
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn is_docker_host(&self) -> bool {
        self.tag(TAG_DOCKER_HOST).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

/// Secret vault metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultInfo {
    pub name: String,
    pub uri: String,
    pub resource_group: String,
    pub location: String,
}
