//! The Docker host descriptor and its derivation from live VM metadata.

use serde::{Deserialize, Serialize};

use crate::domain::cloud::{TAG_DOCKER_PORT, TAG_DOCKER_TLS, TAG_SSH_PORT, TAG_VAULT, VmInfo};
use crate::domain::config::{DEFAULT_DOCKER_PORT, DEFAULT_SSH_PORT};
use crate::domain::credentials::CredentialBundle;
use crate::domain::os::OsVariant;

/// One provisioned (or to-be-provisioned) Docker host.
///
/// `name` identifies the host and is never changed after construction.
/// `dns_name` and `public_ip` stay empty until the cloud assigns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDescriptor {
    name: String,
    pub resource_group: String,
    pub region: String,
    pub dns_name: String,
    pub public_ip: String,
    pub ssh_port: u16,
    pub docker_port: u16,
    pub os: OsVariant,
    #[serde(skip)]
    pub credentials: CredentialBundle,
    pub tls_enabled: bool,
    pub vault: Option<String>,
    pub vm_size: String,
}

impl HostDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, resource_group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_group: resource_group.into(),
            region: String::new(),
            dns_name: String::new(),
            public_ip: String::new(),
            ssh_port: DEFAULT_SSH_PORT,
            docker_port: DEFAULT_DOCKER_PORT,
            os: OsVariant::Ubuntu16_04,
            credentials: CredentialBundle::default(),
            tls_enabled: true,
            vault: None,
            vm_size: String::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address used for SSH and Docker: DNS name, else public IP.
    #[must_use]
    pub fn address(&self) -> &str {
        if self.dns_name.is_empty() {
            &self.public_ip
        } else {
            &self.dns_name
        }
    }

    /// Names the host answers to: the address, then the public IP when it
    /// differs. Used as certificate subject names and vault metadata.
    #[must_use]
    pub fn host_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(2);
        if !self.address().is_empty() {
            names.push(self.address().to_string());
        }
        if !self.public_ip.is_empty() && self.public_ip != self.address() {
            names.push(self.public_ip.clone());
        }
        names
    }

    /// `DOCKER_HOST` value for clients.
    #[must_use]
    pub fn docker_endpoint(&self) -> String {
        format!("tcp://{}:{}", self.address(), self.docker_port)
    }

    /// Rebuild a descriptor from live VM metadata.
    ///
    /// Credentials are not part of VM metadata; only the admin user name is
    /// carried over. Missing or unparsable tags fall back to defaults.
    #[must_use]
    pub fn from_vm(vm: &VmInfo) -> Self {
        let port_tag = |key: &str, default: u16| {
            vm.tag(key)
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(default)
        };
        let mut host = Self::new(vm.name.clone(), vm.resource_group.clone());
        host.region.clone_from(&vm.location);
        host.vm_size.clone_from(&vm.size);
        host.public_ip = vm.public_ip.clone().unwrap_or_default();
        host.dns_name = vm
            .fqdn
            .clone()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| host.public_ip.clone());
        host.os = OsVariant::classify(&vm.image.offer, &vm.image.sku);
        host.ssh_port = port_tag(TAG_SSH_PORT, DEFAULT_SSH_PORT);
        host.docker_port = port_tag(TAG_DOCKER_PORT, DEFAULT_DOCKER_PORT);
        host.tls_enabled = vm
            .tag(TAG_DOCKER_TLS)
            .is_none_or(|v| v.eq_ignore_ascii_case("true"));
        host.vault = vm
            .tag(TAG_VAULT)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        host.credentials = CredentialBundle::new(vm.admin_username.clone());
        host
    }
}
