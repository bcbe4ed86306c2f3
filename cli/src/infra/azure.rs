//! Azure adapter for the cloud and secret-store ports.
//!
//! `AzCli<R>` routes every management call through the `az` command line
//! client via a `CommandRunner` and decodes its JSON output into domain
//! snapshots. Generic over `R` so tests inject a scripted runner.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use crate::application::ports::{
    CommandRunner, Networks, ResourceGroups, SecretStore, StorageAccounts, VirtualMachines,
    VmCreateSpec,
};
use crate::domain::cloud::{
    ImageReference, IpConfiguration, NetworkInterface, PowerState, ResourceGroup, StorageAccount,
    Subnet, VaultInfo, VirtualNetwork, VmInfo,
};
use crate::infra::command_runner::TokioCommandRunner;

const AZ: &str = "az";
const VNET_ADDRESS_SPACE: &str = "10.0.0.0/16";
const SUBNET_PREFIX: &str = "10.0.0.0/24";
const PURGE_ATTEMPTS: u32 = 6;
const PURGE_RETRY: std::time::Duration = std::time::Duration::from_secs(2);

/// Flags whose following argument never reaches the logs.
const SECRET_FLAGS: &[&str] = &["--admin-password", "--value", "--password"];

pub struct AzCli<R: CommandRunner> {
    runner: R,
    subscription: Option<String>,
}

impl<R: CommandRunner> AzCli<R> {
    pub fn new(runner: R, subscription: Option<String>) -> Self {
        Self {
            runner,
            subscription,
        }
    }
}

impl AzCli<TokioCommandRunner> {
    #[must_use]
    pub fn default_runner(subscription: Option<String>) -> Self {
        Self::new(TokioCommandRunner::default(), subscription)
    }
}

/// Argument list with secret values masked.
pub(crate) fn redact(args: &[&str]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            out.push("***".to_string());
        } else {
            out.push((*arg).to_string());
        }
        mask_next = SECRET_FLAGS.contains(arg);
    }
    out
}

fn is_not_found(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("notfound") || lower.contains("not found") || lower.contains("could not be found")
}

enum Outcome {
    Json(Value),
    NotFound,
}

impl<R: CommandRunner> AzCli<R> {
    fn full_args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = args.to_vec();
        full.extend(["--output", "json"]);
        if let Some(sub) = &self.subscription {
            full.extend(["--subscription", sub.as_str()]);
        }
        full
    }

    async fn call(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<Outcome> {
        let full = self.full_args(args);
        debug!(program = AZ, args = ?redact(&full), "az call");
        let output = match stdin {
            Some(input) => self.runner.run_with_stdin(AZ, &full, input).await,
            None => self.runner.run(AZ, &full).await,
        }
        .with_context(|| format!("running az {}", args.first().copied().unwrap_or_default()))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            if is_not_found(&stderr) {
                return Ok(Outcome::NotFound);
            }
            anyhow::bail!(
                "az {} failed: {}",
                args.iter().take(3).copied().collect::<Vec<_>>().join(" "),
                stderr.trim()
            );
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Ok(Outcome::Json(Value::Null));
        }
        serde_json::from_str(&stdout)
            .map(Outcome::Json)
            .with_context(|| format!("parsing az {} output", args.join(" ")))
    }

    /// Call that must succeed; a missing resource is an error.
    async fn json(&self, args: &[&str]) -> Result<Value> {
        match self.call(args, None).await? {
            Outcome::Json(v) => Ok(v),
            Outcome::NotFound => anyhow::bail!("az {}: resource not found", args.join(" ")),
        }
    }

    /// Lookup where absence is an answer, not an error.
    async fn optional(&self, args: &[&str]) -> Result<Option<Value>> {
        match self.call(args, None).await? {
            Outcome::Json(Value::Null) | Outcome::NotFound => Ok(None),
            Outcome::Json(v) => Ok(Some(v)),
        }
    }
}

// ── JSON decoding ────────────────────────────────────────────────────────────

fn str_field(v: &Value, key: &str) -> String {
    v[key].as_str().unwrap_or_default().to_string()
}

fn non_empty(s: &str) -> Option<String> {
    let first = s.split(',').next().unwrap_or_default().trim();
    (!first.is_empty()).then(|| first.to_string())
}

pub(crate) fn parse_group(v: &Value) -> ResourceGroup {
    ResourceGroup {
        name: str_field(v, "name"),
        location: str_field(v, "location"),
    }
}

pub(crate) fn parse_vnet(v: &Value) -> VirtualNetwork {
    let subnets = v["subnets"]
        .as_array()
        .map(|subnets| {
            subnets
                .iter()
                .map(|s| Subnet {
                    id: str_field(s, "id"),
                    name: str_field(s, "name"),
                    address_prefix: str_field(s, "addressPrefix"),
                    ip_configuration_ids: s["ipConfigurations"]
                        .as_array()
                        .map(|c| c.iter().map(|c| str_field(c, "id")).collect())
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();
    VirtualNetwork {
        id: str_field(v, "id"),
        name: str_field(v, "name"),
        resource_group: str_field(v, "resourceGroup"),
        address_space: v["addressSpace"]["addressPrefixes"]
            .as_array()
            .map(|a| a.iter().filter_map(|p| p.as_str().map(str::to_string)).collect())
            .unwrap_or_default(),
        subnets,
    }
}

pub(crate) fn parse_nic(v: &Value) -> NetworkInterface {
    NetworkInterface {
        id: str_field(v, "id"),
        name: str_field(v, "name"),
        ip_configurations: v["ipConfigurations"]
            .as_array()
            .map(|configs| {
                configs
                    .iter()
                    .map(|c| IpConfiguration {
                        id: str_field(c, "id"),
                        subnet_id: c["subnet"]["id"].as_str().map(str::to_string),
                        public_ip_id: c["publicIPAddress"]["id"].as_str().map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

pub(crate) fn parse_storage(v: &Value) -> StorageAccount {
    let location = v["primaryLocation"]
        .as_str()
        .or_else(|| v["location"].as_str())
        .unwrap_or_default();
    StorageAccount {
        name: str_field(v, "name"),
        resource_group: str_field(v, "resourceGroup"),
        location: location.to_string(),
    }
}

/// Decode `az vm show -d` / `az vm list -d` entries.
pub(crate) fn parse_vm(v: &Value) -> VmInfo {
    let image = &v["storageProfile"]["imageReference"];
    let tags: BTreeMap<String, String> = v["tags"]
        .as_object()
        .map(|m| {
            m.iter()
                .map(|(k, val)| (k.clone(), val.as_str().unwrap_or_default().to_string()))
                .collect()
        })
        .unwrap_or_default();
    VmInfo {
        id: str_field(v, "id"),
        name: str_field(v, "name"),
        resource_group: str_field(v, "resourceGroup"),
        location: str_field(v, "location"),
        size: v["hardwareProfile"]["vmSize"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        power_state: PowerState::parse(v["powerState"].as_str().unwrap_or_default()),
        admin_username: v["osProfile"]["adminUsername"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        image: ImageReference {
            publisher: str_field(image, "publisher"),
            offer: str_field(image, "offer"),
            sku: str_field(image, "sku"),
        },
        nic_ids: v["networkProfile"]["networkInterfaces"]
            .as_array()
            .map(|n| n.iter().map(|n| str_field(n, "id")).collect())
            .unwrap_or_default(),
        public_ip: v["publicIps"].as_str().and_then(non_empty),
        fqdn: v["fqdns"].as_str().and_then(non_empty),
        tags,
    }
}

pub(crate) fn parse_vault(v: &Value) -> VaultInfo {
    VaultInfo {
        name: str_field(v, "name"),
        uri: v["properties"]["vaultUri"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        resource_group: str_field(v, "resourceGroup"),
        location: str_field(v, "location"),
    }
}

fn authentication_type(spec: &VmCreateSpec) -> &'static str {
    match (spec.password.is_some(), spec.ssh_public_key.is_some()) {
        (true, true) => "all",
        (true, false) => "password",
        _ => "ssh",
    }
}

// ── Cloud ports ──────────────────────────────────────────────────────────────

impl<R: CommandRunner> ResourceGroups for AzCli<R> {
    async fn find_group(&self, name: &str) -> Result<Option<ResourceGroup>> {
        Ok(self
            .optional(&["group", "show", "--name", name])
            .await?
            .map(|v| parse_group(&v)))
    }

    async fn create_group(&self, name: &str, location: &str) -> Result<ResourceGroup> {
        info!(group = name, location, "creating resource group");
        let v = self
            .json(&["group", "create", "--name", name, "--location", location])
            .await?;
        Ok(parse_group(&v))
    }
}

impl<R: CommandRunner> Networks for AzCli<R> {
    async fn find_vnet(&self, group: &str, name: &str) -> Result<Option<VirtualNetwork>> {
        Ok(self
            .optional(&["network", "vnet", "show", "--resource-group", group, "--name", name])
            .await?
            .map(|v| parse_vnet(&v)))
    }

    async fn create_vnet(
        &self,
        group: &str,
        name: &str,
        location: &str,
        subnet: &str,
    ) -> Result<VirtualNetwork> {
        info!(group, vnet = name, subnet, "creating virtual network");
        let v = self
            .json(&[
                "network",
                "vnet",
                "create",
                "--resource-group",
                group,
                "--name",
                name,
                "--location",
                location,
                "--address-prefixes",
                VNET_ADDRESS_SPACE,
                "--subnet-name",
                subnet,
                "--subnet-prefixes",
                SUBNET_PREFIX,
            ])
            .await?;
        Ok(parse_vnet(v.get("newVNet").unwrap_or(&v)))
    }

    async fn vnet_by_id(&self, id: &str) -> Result<VirtualNetwork> {
        let v = self.json(&["network", "vnet", "show", "--ids", id]).await?;
        Ok(parse_vnet(&v))
    }

    async fn nic_by_id(&self, id: &str) -> Result<NetworkInterface> {
        let v = self.json(&["network", "nic", "show", "--ids", id]).await?;
        Ok(parse_nic(&v))
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        info!(id, "deleting resource");
        self.json(&["resource", "delete", "--ids", id]).await?;
        Ok(())
    }
}

impl<R: CommandRunner> StorageAccounts for AzCli<R> {
    async fn find_storage_account(&self, group: &str, name: &str) -> Result<Option<StorageAccount>> {
        Ok(self
            .optional(&["storage", "account", "show", "--resource-group", group, "--name", name])
            .await?
            .map(|v| parse_storage(&v)))
    }

    async fn create_storage_account(
        &self,
        group: &str,
        name: &str,
        location: &str,
    ) -> Result<StorageAccount> {
        info!(group, account = name, "creating storage account");
        let v = self
            .json(&[
                "storage",
                "account",
                "create",
                "--resource-group",
                group,
                "--name",
                name,
                "--location",
                location,
                "--sku",
                "Standard_LRS",
            ])
            .await?;
        Ok(parse_storage(&v))
    }
}

impl<R: CommandRunner> VirtualMachines for AzCli<R> {
    async fn create_vm(&self, spec: &VmCreateSpec) -> Result<VmInfo> {
        let tags: Vec<String> = spec.tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let mut args = vec![
            "vm",
            "create",
            "--resource-group",
            spec.resource_group.as_str(),
            "--name",
            spec.name.as_str(),
            "--location",
            spec.location.as_str(),
            "--size",
            spec.size.as_str(),
            "--image",
            spec.image_urn.as_str(),
            "--admin-username",
            spec.admin_user.as_str(),
            "--authentication-type",
            authentication_type(spec),
            "--public-ip-address-dns-name",
            spec.dns_label.as_str(),
            "--vnet-name",
            spec.vnet.as_str(),
            "--subnet",
            spec.subnet.as_str(),
            "--use-unmanaged-disk",
            "--storage-account",
            spec.storage_account.as_str(),
        ];
        // `@file` makes az read the value itself, keeping the password off argv.
        if spec.password.is_some() {
            args.extend(["--admin-password", "@/dev/stdin"]);
        }
        if let Some(key) = &spec.ssh_public_key {
            args.extend(["--ssh-key-values", key.as_str()]);
        }
        if !tags.is_empty() {
            args.push("--tags");
            args.extend(tags.iter().map(String::as_str));
        }
        info!(group = %spec.resource_group, vm = %spec.name, size = %spec.size, "creating VM");
        let stdin = spec.password.as_deref().map(str::as_bytes);
        if let Outcome::NotFound = self.call(&args, stdin).await? {
            anyhow::bail!("resource group {} not found", spec.resource_group);
        }
        self.show_vm(&spec.resource_group, &spec.name)
            .await?
            .with_context(|| format!("VM {} not visible after creation", spec.name))
    }

    async fn show_vm(&self, group: &str, name: &str) -> Result<Option<VmInfo>> {
        Ok(self
            .optional(&["vm", "show", "--show-details", "--resource-group", group, "--name", name])
            .await?
            .map(|v| parse_vm(&v)))
    }

    async fn power_state(&self, group: &str, name: &str) -> Result<PowerState> {
        let v = self
            .json(&[
                "vm",
                "get-instance-view",
                "--resource-group",
                group,
                "--name",
                name,
                "--query",
                "instanceView.statuses[?starts_with(code, 'PowerState/')].code | [0]",
            ])
            .await?;
        Ok(PowerState::parse(v.as_str().unwrap_or_default()))
    }

    async fn delete_vm(&self, group: &str, name: &str) -> Result<()> {
        info!(group, vm = name, "deleting VM");
        self.json(&["vm", "delete", "--resource-group", group, "--name", name, "--yes"])
            .await?;
        Ok(())
    }

    async fn list_vms(&self, group: Option<&str>) -> Result<Vec<VmInfo>> {
        let mut args = vec!["vm", "list", "--show-details"];
        if let Some(g) = group {
            args.extend(["--resource-group", g]);
        }
        let v = self.json(&args).await?;
        Ok(v.as_array()
            .map(|vms| vms.iter().map(parse_vm).collect())
            .unwrap_or_default())
    }
}

// ── Secret store ─────────────────────────────────────────────────────────────

impl<R: CommandRunner> SecretStore for AzCli<R> {
    async fn find_vault(&self, name: &str) -> Result<Option<VaultInfo>> {
        Ok(self
            .optional(&["keyvault", "show", "--name", name])
            .await?
            .map(|v| parse_vault(&v)))
    }

    async fn create_vault(&self, name: &str, group: &str, location: &str) -> Result<VaultInfo> {
        info!(vault = name, group, location, "creating key vault");
        let v = self
            .json(&[
                "keyvault",
                "create",
                "--name",
                name,
                "--resource-group",
                group,
                "--location",
                location,
                "--enable-rbac-authorization",
                "false",
            ])
            .await?;
        Ok(parse_vault(&v))
    }

    async fn signed_in_principal(&self) -> Result<String> {
        let v = self
            .json(&["ad", "signed-in-user", "show", "--query", "id"])
            .await?;
        v.as_str()
            .map(str::to_string)
            .context("az returned no signed-in user id")
    }

    async fn grant_secret_access(&self, vault: &str, object_id: &str) -> Result<()> {
        self.json(&[
            "keyvault",
            "set-policy",
            "--name",
            vault,
            "--object-id",
            object_id,
            "--secret-permissions",
            "get",
            "list",
            "set",
            "delete",
            "purge",
        ])
        .await?;
        Ok(())
    }

    async fn set_secret(&self, vault: &str, key: &str, value: &str) -> Result<()> {
        debug!(vault, key, "setting secret");
        // Value via stdin keeps it out of the process table.
        let args = [
            "keyvault",
            "secret",
            "set",
            "--vault-name",
            vault,
            "--name",
            key,
            "--file",
            "/dev/stdin",
            "--encoding",
            "utf-8",
        ];
        match self.call(&args, Some(value.as_bytes())).await? {
            Outcome::Json(_) => Ok(()),
            Outcome::NotFound => anyhow::bail!("vault {vault} not found"),
        }
    }

    async fn delete_secret(&self, vault: &str, key: &str) -> Result<()> {
        debug!(vault, key, "deleting secret");
        let target = ["--vault-name", vault, "--name", key];
        let delete = [&["keyvault", "secret", "delete"][..], &target[..]].concat();
        if let Outcome::NotFound = self.call(&delete, None).await? {
            return Ok(());
        }
        // Soft-deleted names block a later `set` until purged; the purge is
        // refused while the delete is still in progress.
        let purge = [&["keyvault", "secret", "purge"][..], &target[..]].concat();
        for attempt in 1..=PURGE_ATTEMPTS {
            match self.call(&purge, None).await {
                Ok(_) => return Ok(()),
                Err(e) if attempt == PURGE_ATTEMPTS => {
                    return Err(e.context(format!("purging secret {key} from {vault}")));
                }
                Err(e) => debug!(vault, key, attempt, error = %e, "purge not ready"),
            }
            tokio::time::sleep(PURGE_RETRY).await;
        }
        Ok(())
    }

    async fn get_secret(&self, vault: &str, key: &str) -> Result<Option<String>> {
        let v = self
            .optional(&[
                "keyvault",
                "secret",
                "show",
                "--vault-name",
                vault,
                "--name",
                key,
                "--query",
                "value",
            ])
            .await?;
        Ok(v.and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn list_secret_names(&self, vault: &str) -> Result<Vec<String>> {
        let v = self
            .json(&["keyvault", "secret", "list", "--vault-name", vault, "--query", "[].name"])
            .await?;
        Ok(v.as_array()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }
}
