//! Filesystem infrastructure: implements the `LocalFs` port.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::LocalFs;

/// Production filesystem. Blocking calls run on the blocking pool.
pub struct DiskFs;

impl LocalFs for DiskFs {
    async fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    async fn write_private(&self, path: &Path, content: &str, mode: u32) -> Result<()> {
        let path = path.to_path_buf();
        let content = content.to_string();
        tokio::task::spawn_blocking(move || write_with_mode(&path, &content, mode))
            .await
            .context("spawn_blocking for write_private")?
    }
}

fn write_with_mode(path: &Path, content: &str, mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("writing file {}", path.display()))?;
    set_mode(path, mode)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("setting permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
