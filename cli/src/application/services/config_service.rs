//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::DockhandConfig;

/// Load configuration.
pub fn load_config(store: &impl ConfigStore) -> Result<DockhandConfig> {
    store.load()
}

/// Save configuration.
pub fn save_config(store: &impl ConfigStore, config: &DockhandConfig) -> Result<()> {
    store.save(config)
}

/// Validate and persist one key, returning the updated configuration.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the file cannot be
/// written.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<DockhandConfig> {
    let mut config = store.load()?;
    config.set(key, value)?;
    store.save(&config)?;
    Ok(config)
}
