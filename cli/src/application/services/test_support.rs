//! Shared fakes for service tests.
//!
//! Every fake records the calls it receives in a `Mutex` so tests can assert
//! on the exact sequence of port interactions.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::application::ports::{
    CredentialGenerator, HostRegistryStore, LocalFs, Networks, ProgressReporter, RemoteConnector,
    RemoteSession, ResourceGroups, SecretStore, StorageAccounts, UrlProbe, VirtualMachines,
    VmCreateSpec,
};
use crate::domain::cloud::{
    ImageReference, IpConfiguration, NetworkInterface, PowerState, ResourceGroup, StorageAccount,
    Subnet, VaultInfo, VirtualNetwork, VmInfo,
};
use crate::domain::error::CredentialError;
use crate::domain::registry::HostRegistry;
use crate::domain::{CommandResult, HostDescriptor, SshKeyPair, TlsBundle};

/// Build an `ExitStatus` from a logical exit code (cross-platform).
#[cfg(unix)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    std::process::ExitStatus::from_raw(code as u32)
}

pub fn ok_output(stdout: &[u8]) -> std::process::Output {
    std::process::Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn fail_output(stderr: &[u8]) -> std::process::Output {
    std::process::Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

pub fn sample_tls() -> TlsBundle {
    TlsBundle {
        ca_cert: "CA-CERT".into(),
        ca_key: "CA-KEY".into(),
        server_cert: "SERVER-CERT".into(),
        server_key: "SERVER-KEY".into(),
        client_cert: "CLIENT-CERT".into(),
        client_key: "CLIENT-KEY".into(),
    }
}

pub fn sample_host() -> HostDescriptor {
    let mut host = HostDescriptor::new("h1", "rg");
    host.region = "westus".into();
    host.dns_name = "h1.westus.cloudapp.azure.com".into();
    host.public_ip = "40.1.2.3".into();
    host.credentials.username = "dockeruser".into();
    host.credentials.password = Some("Secret#12345".into());
    host
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("step: {message}"));
    }
    fn success(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("ok: {message}"));
    }
    fn warn(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("warn: {message}"));
    }
}

// ── Cloud ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct CloudState {
    pub groups: Vec<ResourceGroup>,
    pub vnets: Vec<VirtualNetwork>,
    pub nics: Vec<NetworkInterface>,
    pub storage: Vec<StorageAccount>,
    pub vms: Vec<VmInfo>,
    /// Power states returned in order; the last one repeats.
    pub power_states: VecDeque<PowerState>,
    pub created_specs: Vec<VmCreateSpec>,
    pub deleted: Vec<String>,
    pub calls: Vec<String>,
    pub fail_nic_lookup: bool,
    pub fail_create_vm: bool,
}

#[derive(Default)]
pub struct FakeCloud {
    pub state: Mutex<CloudState>,
}

pub const VM_ID: &str = "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/h1";
pub const NIC_ID: &str = "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/networkInterfaces/h1-nic";
pub const IP_ID: &str = "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/publicIPAddresses/h1-ip";
pub const VNET_ID: &str = "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet1";

pub fn sample_vm(name: &str, group: &str) -> VmInfo {
    VmInfo {
        id: format!("/subscriptions/s/resourceGroups/{group}/providers/Microsoft.Compute/virtualMachines/{name}"),
        name: name.into(),
        resource_group: group.into(),
        location: "westus".into(),
        size: "Standard_D1_v2".into(),
        power_state: PowerState::Running,
        admin_username: "dockeruser".into(),
        image: ImageReference {
            publisher: "Canonical".into(),
            offer: "UbuntuServer".into(),
            sku: "16.04-LTS".into(),
        },
        nic_ids: vec![NIC_ID.into()],
        public_ip: Some("40.1.2.3".into()),
        fqdn: Some(format!("{name}.westus.cloudapp.azure.com")),
        tags: BTreeMap::from([("dockerHost".to_string(), "true".to_string())]),
    }
}

impl FakeCloud {
    pub fn with_group(self, name: &str) -> Self {
        self.state.lock().unwrap().groups.push(ResourceGroup {
            name: name.into(),
            location: "westus".into(),
        });
        self
    }

    /// A VM with one NIC on a vnet; `other_configs` extra IP configurations
    /// from other NICs share its subnet.
    pub fn with_vm_topology(self, other_configs: usize) -> Self {
        {
            let mut s = self.state.lock().unwrap();
            let own_config = format!("{NIC_ID}/ipConfigurations/ipconfig1");
            let mut subnet_configs = vec![own_config.clone()];
            for i in 0..other_configs {
                subnet_configs.push(format!("/other-nic-{i}/ipConfigurations/ipconfig1"));
            }
            s.vms.push(sample_vm("h1", "rg"));
            s.nics.push(NetworkInterface {
                id: NIC_ID.into(),
                name: "h1-nic".into(),
                ip_configurations: vec![IpConfiguration {
                    id: own_config,
                    subnet_id: Some(format!("{VNET_ID}/subnets/default")),
                    public_ip_id: Some(IP_ID.into()),
                }],
            });
            s.vnets.push(VirtualNetwork {
                id: VNET_ID.into(),
                name: "vnet1".into(),
                resource_group: "rg".into(),
                address_space: vec!["10.0.0.0/16".into()],
                subnets: vec![Subnet {
                    id: format!("{VNET_ID}/subnets/default"),
                    name: "default".into(),
                    address_prefix: "10.0.0.0/24".into(),
                    ip_configuration_ids: subnet_configs,
                }],
            });
        }
        self
    }

    pub fn push_power_states(&self, states: &[PowerState]) {
        self.state.lock().unwrap().power_states.extend(states.iter().copied());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl ResourceGroups for FakeCloud {
    async fn find_group(&self, name: &str) -> Result<Option<ResourceGroup>> {
        self.record(format!("find_group {name}"));
        Ok(self.state.lock().unwrap().groups.iter().find(|g| g.name == name).cloned())
    }

    async fn create_group(&self, name: &str, location: &str) -> Result<ResourceGroup> {
        self.record(format!("create_group {name}"));
        let group = ResourceGroup {
            name: name.into(),
            location: location.into(),
        };
        self.state.lock().unwrap().groups.push(group.clone());
        Ok(group)
    }
}

impl Networks for FakeCloud {
    async fn find_vnet(&self, group: &str, name: &str) -> Result<Option<VirtualNetwork>> {
        self.record(format!("find_vnet {group}/{name}"));
        Ok(self
            .state
            .lock()
            .unwrap()
            .vnets
            .iter()
            .find(|v| v.name == name && v.resource_group == group)
            .cloned())
    }

    async fn create_vnet(
        &self,
        group: &str,
        name: &str,
        _location: &str,
        subnet: &str,
    ) -> Result<VirtualNetwork> {
        self.record(format!("create_vnet {group}/{name}/{subnet}"));
        let id = format!("/subscriptions/s/resourceGroups/{group}/providers/Microsoft.Network/virtualNetworks/{name}");
        let vnet = VirtualNetwork {
            id: id.clone(),
            name: name.into(),
            resource_group: group.into(),
            address_space: vec!["10.0.0.0/16".into()],
            subnets: vec![Subnet {
                id: format!("{id}/subnets/{subnet}"),
                name: subnet.into(),
                address_prefix: "10.0.0.0/24".into(),
                ip_configuration_ids: vec![],
            }],
        };
        self.state.lock().unwrap().vnets.push(vnet.clone());
        Ok(vnet)
    }

    async fn vnet_by_id(&self, id: &str) -> Result<VirtualNetwork> {
        self.record(format!("vnet_by_id {id}"));
        self.state
            .lock()
            .unwrap()
            .vnets
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("vnet {id} not found"))
    }

    async fn nic_by_id(&self, id: &str) -> Result<NetworkInterface> {
        self.record(format!("nic_by_id {id}"));
        let s = self.state.lock().unwrap();
        if s.fail_nic_lookup {
            anyhow::bail!("nic lookup failed");
        }
        s.nics
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("nic {id} not found"))
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.record(format!("delete {id}"));
        self.state.lock().unwrap().deleted.push(id.to_string());
        Ok(())
    }
}

impl StorageAccounts for FakeCloud {
    async fn find_storage_account(&self, group: &str, name: &str) -> Result<Option<StorageAccount>> {
        self.record(format!("find_storage {group}/{name}"));
        Ok(self
            .state
            .lock()
            .unwrap()
            .storage
            .iter()
            .find(|a| a.name == name)
            .cloned())
    }

    async fn create_storage_account(
        &self,
        group: &str,
        name: &str,
        location: &str,
    ) -> Result<StorageAccount> {
        self.record(format!("create_storage {group}/{name}"));
        let account = StorageAccount {
            name: name.into(),
            resource_group: group.into(),
            location: location.into(),
        };
        self.state.lock().unwrap().storage.push(account.clone());
        Ok(account)
    }
}

impl VirtualMachines for FakeCloud {
    async fn create_vm(&self, spec: &VmCreateSpec) -> Result<VmInfo> {
        self.record(format!("create_vm {}/{}", spec.resource_group, spec.name));
        if self.state.lock().unwrap().fail_create_vm {
            anyhow::bail!("QuotaExceeded: cores quota reached in westus");
        }
        let mut vm = sample_vm(&spec.name, &spec.resource_group);
        vm.tags.clone_from(&spec.tags);
        vm.admin_username.clone_from(&spec.admin_user);
        let mut s = self.state.lock().unwrap();
        s.created_specs.push(spec.clone());
        s.vms.push(vm.clone());
        Ok(vm)
    }

    async fn show_vm(&self, group: &str, name: &str) -> Result<Option<VmInfo>> {
        self.record(format!("show_vm {group}/{name}"));
        Ok(self
            .state
            .lock()
            .unwrap()
            .vms
            .iter()
            .find(|v| v.name == name && v.resource_group == group)
            .cloned())
    }

    async fn power_state(&self, group: &str, name: &str) -> Result<PowerState> {
        self.record(format!("power_state {group}/{name}"));
        let mut s = self.state.lock().unwrap();
        let state = if s.power_states.len() > 1 {
            s.power_states.pop_front()
        } else {
            s.power_states.front().copied()
        };
        Ok(state.unwrap_or(PowerState::Running))
    }

    async fn delete_vm(&self, group: &str, name: &str) -> Result<()> {
        self.record(format!("delete_vm {group}/{name}"));
        let mut s = self.state.lock().unwrap();
        s.vms.retain(|v| !(v.name == name && v.resource_group == group));
        s.deleted.push(format!("vm:{group}/{name}"));
        Ok(())
    }

    async fn list_vms(&self, group: Option<&str>) -> Result<Vec<VmInfo>> {
        self.record(format!("list_vms {}", group.unwrap_or("*")));
        Ok(self
            .state
            .lock()
            .unwrap()
            .vms
            .iter()
            .filter(|v| group.is_none_or(|g| v.resource_group == g))
            .cloned()
            .collect())
    }
}

// ── Vault ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct VaultState {
    pub vaults: HashSet<String>,
    pub secrets: HashMap<(String, String), String>,
    pub writes: Vec<String>,
    pub deletes: Vec<String>,
    pub calls: Vec<String>,
    pub fail_writes: HashSet<String>,
    pub fail_reads: HashSet<String>,
    pub unreachable: bool,
    pub listing_empty: bool,
}

#[derive(Default)]
pub struct FakeVault {
    pub state: Mutex<VaultState>,
}

impl FakeVault {
    pub fn insert(&self, vault: &str, key: &str, value: &str) {
        let mut s = self.state.lock().unwrap();
        s.vaults.insert(vault.into());
        s.secrets.insert((vault.into(), key.into()), value.into());
    }
    pub fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }
    pub fn deletes(&self) -> Vec<String> {
        self.state.lock().unwrap().deletes.clone()
    }
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
    pub fn fail_writes_of(&self, key: &str) {
        self.state.lock().unwrap().fail_writes.insert(key.into());
    }
    pub fn fail_reads_of(&self, key: &str) {
        self.state.lock().unwrap().fail_reads.insert(key.into());
    }
    pub fn set_unreachable(&self, v: bool) {
        self.state.lock().unwrap().unreachable = v;
    }
    pub fn set_listing_empty(&self, v: bool) {
        self.state.lock().unwrap().listing_empty = v;
    }
}

impl SecretStore for FakeVault {
    async fn find_vault(&self, name: &str) -> Result<Option<VaultInfo>> {
        let s = self.state.lock().unwrap();
        Ok(s.vaults.contains(name).then(|| VaultInfo {
            name: name.into(),
            uri: format!("https://{name}.vault.azure.net/"),
            resource_group: "rg".into(),
            location: "westus".into(),
        }))
    }

    async fn create_vault(&self, name: &str, group: &str, location: &str) -> Result<VaultInfo> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(format!("create {name}"));
        s.vaults.insert(name.into());
        Ok(VaultInfo {
            name: name.into(),
            uri: format!("https://{name}.vault.azure.net/"),
            resource_group: group.into(),
            location: location.into(),
        })
    }

    async fn signed_in_principal(&self) -> Result<String> {
        Ok("principal-1".into())
    }

    async fn grant_secret_access(&self, vault: &str, object_id: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(format!("grant {vault} {object_id}"));
        Ok(())
    }

    async fn set_secret(&self, vault: &str, key: &str, value: &str) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        if s.fail_writes.contains(key) {
            anyhow::bail!("forbidden");
        }
        s.writes.push(key.into());
        s.secrets.insert((vault.into(), key.into()), value.into());
        Ok(())
    }

    async fn delete_secret(&self, vault: &str, key: &str) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        if s.fail_writes.contains(key) {
            anyhow::bail!("forbidden");
        }
        s.deletes.push(key.into());
        s.secrets.remove(&(vault.to_string(), key.to_string()));
        Ok(())
    }

    async fn get_secret(&self, vault: &str, key: &str) -> Result<Option<String>> {
        let s = self.state.lock().unwrap();
        if s.fail_reads.contains(key) {
            anyhow::bail!("throttled");
        }
        Ok(s.secrets.get(&(vault.to_string(), key.to_string())).cloned())
    }

    async fn list_secret_names(&self, vault: &str) -> Result<Vec<String>> {
        let s = self.state.lock().unwrap();
        if s.unreachable || !s.vaults.contains(vault) {
            anyhow::bail!("vault {vault} not reachable");
        }
        if s.listing_empty {
            return Ok(Vec::new());
        }
        Ok(s
            .secrets
            .keys()
            .filter(|(v, _)| v == vault)
            .map(|(_, k)| k.clone())
            .collect())
    }
}

// ── Remote sessions ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct SessionLog {
    /// Every command passed to `exec`, in order.
    pub commands: Vec<String>,
    /// `dest_dir/file_name` -> content for every upload.
    pub uploads: Vec<(String, String)>,
    pub downloads: Vec<String>,
    /// Responses by command prefix; first match wins, unmatched commands succeed.
    pub responses: Vec<(String, VecDeque<CommandResult>)>,
    pub files: HashMap<String, String>,
    /// Paths an upload cannot overwrite until `rm -f` removes them.
    pub read_only: HashSet<String>,
    pub connects: usize,
    pub closes: usize,
    pub fail_connects: usize,
}

/// Connector whose sessions share one log.
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub log: Arc<Mutex<SessionLog>>,
}

pub struct FakeSession {
    log: Arc<Mutex<SessionLog>>,
}

impl FakeConnector {
    /// Queue a result for commands starting with `prefix`. The last queued
    /// result for a prefix repeats.
    pub fn respond(&self, prefix: &str, result: CommandResult) {
        let mut log = self.log.lock().unwrap();
        if let Some((_, queue)) = log.responses.iter_mut().find(|(p, _)| p == prefix) {
            queue.push_back(result);
        } else {
            log.responses
                .push((prefix.to_string(), VecDeque::from([result])));
        }
    }
    pub fn put_file(&self, path: &str, content: &str) {
        self.log
            .lock()
            .unwrap()
            .files
            .insert(path.into(), content.into());
    }
    pub fn put_read_only(&self, path: &str, content: &str) {
        let mut log = self.log.lock().unwrap();
        log.files.insert(path.into(), content.into());
        log.read_only.insert(path.into());
    }
    pub fn fail_next_connects(&self, n: usize) {
        self.log.lock().unwrap().fail_connects = n;
    }
    pub fn commands(&self) -> Vec<String> {
        self.log.lock().unwrap().commands.clone()
    }
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().uploads.clone()
    }
    pub fn connects(&self) -> usize {
        self.log.lock().unwrap().connects
    }
    pub fn closes(&self) -> usize {
        self.log.lock().unwrap().closes
    }
    pub fn session(&self) -> FakeSession {
        FakeSession {
            log: Arc::clone(&self.log),
        }
    }
}

impl RemoteConnector for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self, _host: &HostDescriptor) -> Result<FakeSession> {
        let mut log = self.log.lock().unwrap();
        if log.fail_connects > 0 {
            log.fail_connects -= 1;
            anyhow::bail!("connection refused");
        }
        log.connects += 1;
        Ok(FakeSession {
            log: Arc::clone(&self.log),
        })
    }
}

impl RemoteSession for FakeSession {
    async fn exec(&self, command: &str) -> Result<CommandResult> {
        let mut log = self.log.lock().unwrap();
        log.commands.push(command.to_string());
        if let Some(paths) = command.strip_prefix("rm -f ") {
            for path in paths.split_whitespace() {
                log.files.remove(path);
                log.read_only.remove(path);
            }
        }
        let result = log
            .responses
            .iter_mut()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .and_then(|(_, queue)| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            });
        Ok(result.unwrap_or_else(|| CommandResult::new(0, "", "")))
    }

    async fn upload_text(
        &self,
        content: &str,
        file_name: &str,
        dest_dir: &str,
        _mode: Option<u32>,
    ) -> Result<()> {
        let path = format!("{dest_dir}/{file_name}");
        let mut log = self.log.lock().unwrap();
        if log.read_only.contains(&path) {
            anyhow::bail!("{path}: permission denied");
        }
        log.files.insert(path.clone(), content.to_string());
        log.uploads.push((path, content.to_string()));
        Ok(())
    }

    async fn upload_file(
        &self,
        local: &Path,
        file_name: &str,
        dest_dir: &str,
        _mode: Option<u32>,
    ) -> Result<()> {
        let path = format!("{dest_dir}/{file_name}");
        self.log
            .lock()
            .unwrap()
            .uploads
            .push((path, format!("<file {}>", local.display())));
        Ok(())
    }

    async fn download_text(&self, remote_path: &str) -> Result<String> {
        let mut log = self.log.lock().unwrap();
        log.downloads.push(remote_path.to_string());
        log.files
            .get(remote_path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such file {remote_path}"))
    }

    async fn close(self) -> Result<()> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}

// ── Key material ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeGenerator {
    pub tls_requests: Mutex<Vec<Vec<String>>>,
}

impl CredentialGenerator for FakeGenerator {
    fn ssh_key_pair(&self, passphrase: Option<&str>, comment: &str) -> Result<SshKeyPair> {
        Ok(SshKeyPair {
            private_key: format!("PRIVATE({})", passphrase.unwrap_or("")),
            public_key: format!("ssh-ed25519 AAAAFAKE {comment}"),
        })
    }

    /// Keys made with a passphrase decode only with that same passphrase.
    fn check_private_key(&self, private_key: &str, passphrase: Option<&str>) -> Result<()> {
        let expected = private_key
            .strip_prefix("PRIVATE(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or_default();
        if expected != passphrase.unwrap_or_default() {
            return Err(CredentialError::InvalidKey("bad passphrase".into()).into());
        }
        Ok(())
    }

    fn tls_bundle(&self, subject_names: &[String]) -> Result<TlsBundle> {
        self.tls_requests.lock().unwrap().push(subject_names.to_vec());
        Ok(sample_tls())
    }
}

// ── Local filesystem, registry, probe ────────────────────────────────────────

#[derive(Default)]
pub struct FakeFs {
    pub files: Mutex<HashMap<PathBuf, (String, u32)>>,
}

impl FakeFs {
    pub fn put(&self, path: PathBuf, content: &str) {
        self.files.lock().unwrap().insert(path, (content.into(), 0o644));
    }
    pub fn mode_of(&self, path: &Path) -> Option<u32> {
        self.files.lock().unwrap().get(path).map(|(_, m)| *m)
    }
}

impl LocalFs for FakeFs {
    async fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.files.lock().unwrap().get(path).map(|(c, _)| c.clone()))
    }

    async fn write_private(&self, path: &Path, content: &str, mode: u32) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), (content.into(), mode));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRegistry {
    pub registry: Mutex<HostRegistry>,
}

impl HostRegistryStore for FakeRegistry {
    async fn load_async(&self) -> Result<HostRegistry> {
        Ok(self.registry.lock().unwrap().clone())
    }
    async fn save_async(&self, registry: &HostRegistry) -> Result<()> {
        *self.registry.lock().unwrap() = registry.clone();
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeProbe {
    pub reachable: HashSet<String>,
    pub probed: Mutex<Vec<String>>,
}

impl UrlProbe for FakeProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        self.probed.lock().unwrap().push(url.to_string());
        self.reachable.contains(url)
    }
}
