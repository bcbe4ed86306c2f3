//! Credential use-cases: local key directories and the secret vault.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::PollPolicy;
use crate::application::ports::{LocalFs, SecretStore};
use crate::domain::credentials::{SSH_PRIVATE_KEY_FILE, SSH_PUBLIC_KEY_FILE, TLS_FILE_NAMES};
use crate::domain::error::{CredentialError, VaultError};
use crate::domain::{CredentialBundle, SshKeyPair, TlsBundle};

// ── Vault layout ─────────────────────────────────────────────────────────────

pub const KEY_USERNAME: &str = "vmUsername";
pub const KEY_PASSWORD: &str = "vmPwd";
pub const KEY_SSH_PRIVATE: &str = "sshKey";
pub const KEY_SSH_PUBLIC: &str = "sshPubKey";
pub const KEY_TLS_CA_CERT: &str = "tlsCACert";
pub const KEY_TLS_CA_KEY: &str = "tlsCAKey";
pub const KEY_TLS_CLIENT_CERT: &str = "tlsClientCert";
pub const KEY_TLS_CLIENT_KEY: &str = "tlsClientKey";
pub const KEY_TLS_SERVER_CERT: &str = "tlsServerCert";
pub const KEY_TLS_SERVER_KEY: &str = "tlsServerKey";

/// Written last; its presence marks a complete record.
pub const SENTINEL_KEY: &str = "hostNames";

/// Every field key, in write order.
pub const FIELD_KEYS: [&str; 10] = [
    KEY_USERNAME,
    KEY_PASSWORD,
    KEY_SSH_PRIVATE,
    KEY_SSH_PUBLIC,
    KEY_TLS_CA_CERT,
    KEY_TLS_CA_KEY,
    KEY_TLS_CLIENT_CERT,
    KEY_TLS_CLIENT_KEY,
    KEY_TLS_SERVER_CERT,
    KEY_TLS_SERVER_KEY,
];

/// Concurrent secret reads while loading a record.
const READ_FAN_OUT: usize = 4;

/// Vault readiness polling after creation.
pub const VAULT_READY_POLL: PollPolicy = PollPolicy {
    interval: Duration::from_secs(5),
    attempts: 12,
};

/// Where a credential record is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultTarget {
    pub name: String,
    pub region: String,
    pub resource_group: String,
}

/// A record read back from the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultCredentials {
    pub host_names: Vec<String>,
    pub bundle: CredentialBundle,
}

/// Key material found in a local directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalCredentials {
    pub ssh: Option<SshKeyPair>,
    pub tls: Option<TlsBundle>,
}

fn bundle_fields(bundle: &CredentialBundle) -> Vec<(&'static str, &str)> {
    let mut fields = vec![(KEY_USERNAME, bundle.username.as_str())];
    if let Some(password) = &bundle.password {
        fields.push((KEY_PASSWORD, password));
    }
    if let Some(ssh) = &bundle.ssh {
        fields.push((KEY_SSH_PRIVATE, &ssh.private_key));
        fields.push((KEY_SSH_PUBLIC, &ssh.public_key));
    }
    if let Some(tls) = &bundle.tls {
        fields.extend([
            (KEY_TLS_CA_CERT, tls.ca_cert.as_str()),
            (KEY_TLS_CA_KEY, tls.ca_key.as_str()),
            (KEY_TLS_CLIENT_CERT, tls.client_cert.as_str()),
            (KEY_TLS_CLIENT_KEY, tls.client_key.as_str()),
            (KEY_TLS_SERVER_CERT, tls.server_cert.as_str()),
            (KEY_TLS_SERVER_KEY, tls.server_key.as_str()),
        ]);
    }
    fields.retain(|(_, v)| !v.is_empty());
    fields
}

// ── Vault use-cases ──────────────────────────────────────────────────────────

/// Persist a host's credentials, creating the vault when absent.
///
/// A record already in the vault is replaced wholesale: its sentinel goes
/// first, then every field the new bundle lacks. Non-empty fields are then
/// written under the fixed keys, followed by the host-name sentinel. A reader
/// never sees the sentinel next to fields from another bundle.
///
/// # Errors
///
/// Returns [`VaultError::Write`] wrapping the first failure, or when the
/// vault lists no secrets after writing.
pub async fn save_to_vault(
    store: &impl SecretStore,
    target: &VaultTarget,
    host_names: &[String],
    bundle: &CredentialBundle,
    poll: PollPolicy,
) -> Result<()> {
    let vault = target.name.as_str();
    let write_err = |reason: String| VaultError::Write {
        vault: vault.to_string(),
        reason,
    };

    let existing = store
        .find_vault(vault)
        .await
        .map_err(|e| write_err(format!("{e:#}")))?;
    if existing.is_none() {
        info!(vault, group = %target.resource_group, region = %target.region, "creating vault");
        store
            .create_vault(vault, &target.resource_group, &target.region)
            .await
            .map_err(|e| write_err(format!("{e:#}")))?;
        let principal = store
            .signed_in_principal()
            .await
            .map_err(|e| write_err(format!("{e:#}")))?;
        store
            .grant_secret_access(vault, &principal)
            .await
            .map_err(|e| write_err(format!("{e:#}")))?;
    }

    wait_until_queryable(store, vault, poll).await?;

    let fields = bundle_fields(bundle);
    if existing.is_some() {
        let stale = FIELD_KEYS
            .iter()
            .filter(|key| !fields.iter().any(|(k, _)| k == *key));
        for key in std::iter::once(&SENTINEL_KEY).chain(stale) {
            debug!(vault, key, "clearing previous secret");
            store
                .delete_secret(vault, key)
                .await
                .map_err(|e| write_err(format!("{key}: {e:#}")))?;
        }
    }

    for (key, value) in fields {
        debug!(vault, key, "writing secret");
        store
            .set_secret(vault, key, value)
            .await
            .map_err(|e| write_err(format!("{key}: {e:#}")))?;
    }
    store
        .set_secret(vault, SENTINEL_KEY, &host_names.join(","))
        .await
        .map_err(|e| write_err(format!("{SENTINEL_KEY}: {e:#}")))?;

    let names = store
        .list_secret_names(vault)
        .await
        .map_err(|e| write_err(format!("{e:#}")))?;
    if names.is_empty() {
        return Err(write_err("vault lists no secrets after writing".to_string()).into());
    }
    info!(vault, secrets = names.len(), "credentials saved");
    Ok(())
}

async fn wait_until_queryable(store: &impl SecretStore, vault: &str, poll: PollPolicy) -> Result<()> {
    for attempt in 1..=poll.attempts {
        match store.list_secret_names(vault).await {
            Ok(_) => return Ok(()),
            Err(e) => debug!(vault, attempt, error = %e, "vault not ready"),
        }
        if attempt < poll.attempts {
            tokio::time::sleep(poll.interval).await;
        }
    }
    Err(VaultError::Write {
        vault: vault.to_string(),
        reason: format!("not queryable after {}s", poll.budget().as_secs()),
    }
    .into())
}

/// Read a credential record back.
///
/// Returns `None` when the sentinel is absent. Fields are fetched with a
/// bounded fan-out; a field whose read fails is treated as absent.
///
/// # Errors
///
/// Returns an error only if the sentinel read itself fails.
pub async fn load_from_vault(
    store: &impl SecretStore,
    vault: &str,
) -> Result<Option<VaultCredentials>> {
    let Some(hosts) = store.get_secret(vault, SENTINEL_KEY).await? else {
        debug!(vault, "no sentinel, record absent");
        return Ok(None);
    };

    let fetched: Vec<(&str, Option<String>)> = stream::iter(FIELD_KEYS)
        .map(|key| async move {
            let value = match store.get_secret(vault, key).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(vault, key, error = %e, "secret read failed, treating as absent");
                    None
                }
            };
            (key, value)
        })
        .buffer_unordered(READ_FAN_OUT)
        .collect()
        .await;

    let get = |key: &str| {
        fetched
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v.clone())
            .filter(|v| !v.is_empty())
    };

    let mut bundle = CredentialBundle::new(get(KEY_USERNAME).unwrap_or_default());
    bundle.password = get(KEY_PASSWORD);
    if let (Some(private_key), Some(public_key)) = (get(KEY_SSH_PRIVATE), get(KEY_SSH_PUBLIC)) {
        bundle.ssh = Some(SshKeyPair {
            private_key,
            public_key,
        });
    }
    let tls = TlsBundle {
        ca_cert: get(KEY_TLS_CA_CERT).unwrap_or_default(),
        ca_key: get(KEY_TLS_CA_KEY).unwrap_or_default(),
        server_cert: get(KEY_TLS_SERVER_CERT).unwrap_or_default(),
        server_key: get(KEY_TLS_SERVER_KEY).unwrap_or_default(),
        client_cert: get(KEY_TLS_CLIENT_CERT).unwrap_or_default(),
        client_key: get(KEY_TLS_CLIENT_KEY).unwrap_or_default(),
    };
    if tls != TlsBundle::default() {
        bundle.tls = Some(tls);
    }

    let host_names = hosts
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect();
    Ok(Some(VaultCredentials { host_names, bundle }))
}

// ── Local directory use-cases ────────────────────────────────────────────────

/// Read a key pair and/or TLS set from `dir`.
///
/// # Errors
///
/// Returns [`CredentialError::NotFound`] naming the first missing file of a
/// partially present set, or when the directory holds neither set.
pub async fn load_from_local_directory(fs: &impl LocalFs, dir: &Path) -> Result<LocalCredentials> {
    let private_key = fs.read_optional(&dir.join(SSH_PRIVATE_KEY_FILE)).await?;
    let public_key = fs.read_optional(&dir.join(SSH_PUBLIC_KEY_FILE)).await?;
    let ssh = match (private_key, public_key) {
        (Some(private_key), Some(public_key)) => Some(SshKeyPair {
            private_key,
            public_key: public_key.trim().to_string(),
        }),
        (Some(_), None) => {
            return Err(CredentialError::NotFound(
                dir.join(SSH_PUBLIC_KEY_FILE).display().to_string(),
            )
            .into());
        }
        (None, Some(_)) => {
            return Err(CredentialError::NotFound(
                dir.join(SSH_PRIVATE_KEY_FILE).display().to_string(),
            )
            .into());
        }
        (None, None) => None,
    };

    let mut tls_files = Vec::with_capacity(TLS_FILE_NAMES.len());
    for name in TLS_FILE_NAMES {
        tls_files.push((name, fs.read_optional(&dir.join(name)).await?));
    }
    let present = tls_files.iter().filter(|(_, c)| c.is_some()).count();
    let tls = match present {
        0 => None,
        n if n == TLS_FILE_NAMES.len() => Some(TlsBundle::from_files(|name| {
            tls_files
                .iter()
                .find(|(n, _)| *n == name)
                .and_then(|(_, c)| c.as_deref())
        })),
        _ => {
            let missing = tls_files
                .iter()
                .find(|(_, c)| c.is_none())
                .map_or(TLS_FILE_NAMES[0], |(n, _)| *n);
            return Err(CredentialError::NotFound(dir.join(missing).display().to_string()).into());
        }
    };

    if ssh.is_none() && tls.is_none() {
        return Err(CredentialError::NotFound(format!(
            "{} (no {SSH_PRIVATE_KEY_FILE}/{SSH_PUBLIC_KEY_FILE} pair and no TLS certificate set)",
            dir.display()
        ))
        .into());
    }
    Ok(LocalCredentials { ssh, tls })
}

/// Write a bundle's key material into `dir` using the conventional names.
///
/// Private keys get mode 0600, public material 0644.
///
/// # Errors
///
/// Returns an error if any file cannot be written.
pub async fn export_to_local_directory(
    fs: &impl LocalFs,
    dir: &Path,
    bundle: &CredentialBundle,
) -> Result<Vec<String>> {
    let mut written = Vec::new();
    if let Some(ssh) = &bundle.ssh {
        fs.write_private(&dir.join(SSH_PRIVATE_KEY_FILE), &ssh.private_key, 0o600)
            .await?;
        fs.write_private(&dir.join(SSH_PUBLIC_KEY_FILE), &ssh.public_key, 0o644)
            .await?;
        written.extend([SSH_PRIVATE_KEY_FILE.to_string(), SSH_PUBLIC_KEY_FILE.to_string()]);
    }
    if let Some(tls) = &bundle.tls {
        for (name, content) in tls.files() {
            if content.is_empty() {
                continue;
            }
            let mode = if name.ends_with("key.pem") { 0o600 } else { 0o644 };
            fs.write_private(&dir.join(name), content, mode).await?;
            written.push(name.to_string());
        }
    }
    Ok(written)
}
