//! Infrastructure implementation of the `HostRegistryStore` port.
//!
//! `RegistryFile` loads and saves `~/.dockhand/hosts.json` on the blocking
//! pool, writing through a temp file and rename.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::HostRegistryStore;
use crate::domain::registry::HostRegistry;

pub struct RegistryFile {
    path: PathBuf,
}

impl RegistryFile {
    /// Registry at the default path (`~/.dockhand/hosts.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_path(home.join(".dockhand").join("hosts.json")))
    }

    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn load_sync(&self) -> Result<HostRegistry> {
        if !self.path.exists() {
            return Ok(HostRegistry::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading host registry {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing host registry {}", self.path.display()))
    }

    fn save_sync(&self, registry: &HostRegistry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(registry).context("serializing host registry")?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing host registry {}", self.path.display()))
    }
}

impl HostRegistryStore for RegistryFile {
    async fn load_async(&self) -> Result<HostRegistry> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || RegistryFile::with_path(path).load_sync())
            .await
            .context("registry load task panicked")?
    }

    async fn save_async(&self, registry: &HostRegistry) -> Result<()> {
        let path = self.path.clone();
        let registry = registry.clone();
        tokio::task::spawn_blocking(move || RegistryFile::with_path(path).save_sync(&registry))
            .await
            .context("registry save task panicked")?
    }
}
