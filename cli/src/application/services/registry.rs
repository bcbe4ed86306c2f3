//! Local host registry use-cases.

use anyhow::Result;
use chrono::Utc;

use crate::application::ports::HostRegistryStore;
use crate::domain::HostDescriptor;
use crate::domain::registry::HostRecord;

/// Record a host after a successful create.
///
/// # Errors
///
/// Returns an error if the registry cannot be read or written.
pub async fn record_host(store: &impl HostRegistryStore, host: &HostDescriptor) -> Result<()> {
    let mut registry = store.load_async().await?;
    registry.upsert(HostRecord {
        name: host.name().to_string(),
        resource_group: host.resource_group.clone(),
        region: host.region.clone(),
        vault: host.vault.clone(),
        created_at: Utc::now(),
    });
    store.save_async(&registry).await
}

/// Drop a host from the registry; a missing entry is not an error.
///
/// # Errors
///
/// Returns an error if the registry cannot be read or written.
pub async fn forget_host(store: &impl HostRegistryStore, name: &str) -> Result<bool> {
    let mut registry = store.load_async().await?;
    let removed = registry.remove(name);
    if removed {
        store.save_async(&registry).await?;
    }
    Ok(removed)
}

/// Resource group for `name`: the explicit one, else the registry's.
///
/// # Errors
///
/// Returns an error when neither source knows the group.
pub async fn resolve_group(
    store: &impl HostRegistryStore,
    name: &str,
    explicit: Option<&str>,
) -> Result<String> {
    if let Some(group) = explicit {
        return Ok(group.to_string());
    }
    let registry = store.load_async().await?;
    registry
        .find(name)
        .map(|r| r.resource_group.clone())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Host '{name}' is not in the local registry.\n\nPass --resource-group to locate it."
            )
        })
}
