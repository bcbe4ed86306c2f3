//! Inventory of containers and images on a host.

use anyhow::Result;
use tracing::{debug, warn};

use crate::application::ports::{RemoteSession, UrlProbe};
use crate::application::services::host_config::run_step;
use crate::domain::HostDescriptor;
use crate::domain::workload::{
    CONTAINER_FORMAT, CatalogEntry, IMAGE_FORMAT, InventoryScan, WorkloadKind, WorkloadRecord,
    base_url, catalog_url, decode_lines, first_host_port, mark_running,
};

fn quoted(format: &str) -> String {
    format!("'{format}'")
}

/// All containers, with running ones marked.
///
/// # Errors
///
/// Returns an error if either listing command fails.
pub async fn list_workloads(session: &impl RemoteSession) -> Result<InventoryScan> {
    let all = run_step(
        session,
        "list containers",
        &format!("sudo docker ps -a --no-trunc --format {}", quoted(CONTAINER_FORMAT)),
    )
    .await?;
    let mut scan = decode_lines(WorkloadKind::Container, &all.stdout);
    if scan.malformed > 0 {
        warn!(skipped = scan.malformed, "skipped malformed container lines");
    }
    let running = run_step(
        session,
        "list running containers",
        "sudo docker ps --format '{{.Names}}'",
    )
    .await?;
    mark_running(&mut scan.workloads, &running.stdout);
    debug!(containers = scan.workloads.len(), "container scan complete");
    Ok(scan)
}

/// All images.
///
/// # Errors
///
/// Returns an error if the listing command fails.
pub async fn list_images(session: &impl RemoteSession) -> Result<InventoryScan> {
    let out = run_step(
        session,
        "list images",
        &format!("sudo docker images --format {}", quoted(IMAGE_FORMAT)),
    )
    .await?;
    let scan = decode_lines(WorkloadKind::Image, &out.stdout);
    if scan.malformed > 0 {
        warn!(skipped = scan.malformed, "skipped malformed image lines");
    }
    Ok(scan)
}

/// Attach browsable URLs to running containers.
///
/// A catalog match yields `http://{dns}:{port}/{path}` when the probe
/// answers; any other running container with a published port, or a catalog
/// URL that does not answer, gets `http://{dns}:{port}`. Probe failures never
/// fail the scan.
pub async fn reconcile_with_catalog(
    host: &HostDescriptor,
    workloads: &mut [WorkloadRecord],
    catalog: &[CatalogEntry],
    probe: &impl UrlProbe,
) {
    let dns = host.address();
    for w in workloads.iter_mut().filter(|w| w.running) {
        let Some(port) = first_host_port(&w.ports) else {
            continue;
        };
        let entry = catalog
            .iter()
            .find(|c| c.name == w.name || c.name == w.image);
        let mut url = None;
        if let Some(entry) = entry.filter(|e| !e.path.is_empty()) {
            let candidate = catalog_url(dns, port, &entry.path);
            if probe.is_reachable(&candidate).await {
                url = Some(candidate);
            } else {
                debug!(url = %candidate, "catalog url unreachable, using base url");
            }
        }
        w.url = Some(url.unwrap_or_else(|| base_url(dns, port)));
    }
}
