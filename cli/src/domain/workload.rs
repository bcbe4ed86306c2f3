//! Containers and images reported by a host's Docker daemon.
//!
//! Listing output is one quasi-JSON object per line. Lines that do not
//! decode are skipped and counted; record order follows line order.

use serde::{Deserialize, Serialize};

/// `docker ps` format string producing one object per container.
pub const CONTAINER_FORMAT: &str = r#"{"id":"{{.ID}}","name":"{{.Names}}","image":"{{.Image}}","status":"{{.Status}}","ports":"{{.Ports}}","size":"{{.Size}}"}"#;

/// `docker images` format string producing one object per image.
pub const IMAGE_FORMAT: &str = r#"{"id":"{{.ID}}","name":"{{.Repository}}:{{.Tag}}","status":"{{.CreatedSince}}","size":"{{.Size}}"}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    Container,
    Image,
}

/// One container or image. Rebuilt on every scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadRecord {
    pub kind: WorkloadKind,
    pub name: String,
    pub id: String,
    pub status: String,
    pub ports: String,
    pub size: String,
    pub image: String,
    pub running: bool,
    pub url: Option<String>,
}

#[derive(Deserialize)]
struct RawLine {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    ports: String,
    #[serde(default)]
    size: String,
}

/// Result of decoding listing output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryScan {
    pub workloads: Vec<WorkloadRecord>,
    /// Number of non-blank lines that failed to decode.
    pub malformed: usize,
}

/// Decode listing output line by line, skipping malformed lines.
#[must_use]
pub fn decode_lines(kind: WorkloadKind, output: &str) -> InventoryScan {
    let mut scan = InventoryScan::default();
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<RawLine>(line) {
            Ok(raw) if !raw.id.is_empty() => scan.workloads.push(WorkloadRecord {
                kind,
                name: raw.name,
                id: raw.id,
                status: raw.status,
                ports: raw.ports,
                size: raw.size,
                image: raw.image,
                running: false,
                url: None,
            }),
            _ => scan.malformed += 1,
        }
    }
    scan
}

/// Mark records whose name appears in the running-name listing.
pub fn mark_running(workloads: &mut [WorkloadRecord], running_names: &str) {
    let running: Vec<&str> = running_names
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    for w in workloads.iter_mut() {
        w.running = running.contains(&w.name.as_str());
    }
}

/// First published host port in a `docker ps` ports column
/// (`0.0.0.0:8080->80/tcp, :::8080->80/tcp`).
#[must_use]
pub fn first_host_port(ports: &str) -> Option<u16> {
    ports.split(',').find_map(|mapping| {
        let (host, _) = mapping.trim().split_once("->")?;
        host.rsplit(':').next()?.parse().ok()
    })
}

/// A known application entry used to derive a browsable URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    /// Path appended to the base URL, without a leading slash.
    #[serde(default)]
    pub path: String,
}

/// `http://{dns}:{port}` for a published port.
#[must_use]
pub fn base_url(dns: &str, port: u16) -> String {
    format!("http://{dns}:{port}")
}

/// `http://{dns}:{port}/{path}` for a catalog path.
#[must_use]
pub fn catalog_url(dns: &str, port: u16, path: &str) -> String {
    format!("{}/{}", base_url(dns, port), path.trim_start_matches('/'))
}
