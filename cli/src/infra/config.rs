//! Infrastructure implementation of the `ConfigStore` port.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::application::ports::ConfigStore;
use crate::domain::config::DockhandConfig;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "DOCKHAND_CONFIG";

/// YAML settings file.
///
/// Resolved on every call: an explicit path, else `$DOCKHAND_CONFIG`, else
/// `~/.dockhand/config.yaml`. Saves go through a temp file and rename so a
/// crash never leaves half a document behind.
#[derive(Debug, Clone, Default)]
pub struct YamlConfigStore {
    explicit: Option<PathBuf>,
}

impl YamlConfigStore {
    /// Store pinned to `path`, ignoring the environment.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit: Some(path.into()),
        }
    }
}

fn parse(path: &Path, content: &str) -> Result<DockhandConfig> {
    if content.trim().is_empty() {
        return Ok(DockhandConfig::default());
    }
    serde_yaml::from_str(content).with_context(|| format!("cannot parse {}", path.display()))
}

fn write_atomically(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let temp = path.with_extension("yaml.tmp");
    std::fs::write(&temp, content).with_context(|| format!("cannot write {}", temp.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("cannot set permissions on {}", temp.display()))?;
    }

    std::fs::rename(&temp, path).with_context(|| format!("cannot replace {}", path.display()))
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<DockhandConfig> {
        let path = self.path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => parse(&path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(DockhandConfig::default())
            }
            Err(e) => Err(e).with_context(|| format!("cannot read {}", path.display())),
        }
    }

    fn save(&self, config: &DockhandConfig) -> Result<()> {
        let path = self.path()?;
        let content = serde_yaml::to_string(config).context("cannot serialize config")?;
        write_atomically(&path, &content)?;
        debug!(path = %path.display(), "config saved");
        Ok(())
    }

    fn path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.explicit {
            return Ok(path.clone());
        }
        if let Some(val) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(val));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".dockhand").join("config.yaml"))
    }
}
