//! Human-readable terminal renderer.

use std::path::Path;

use owo_colors::OwoColorize as _;

use crate::application::services::host_config::{ConfigureOutcome, TlsSource};
use crate::application::services::provision::ProvisionOutcome;
use crate::application::services::vm::TeardownReport;
use crate::domain::cloud::PowerState;
use crate::domain::registry::HostRegistry;
use crate::domain::workload::{InventoryScan, WorkloadKind};
use crate::domain::{DockhandConfig, HostDescriptor};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn tls_label(tls: TlsSource) -> &'static str {
    match tls {
        TlsSource::Uploaded => "enabled (certificates uploaded)",
        TlsSource::GeneratedOnHost => "enabled (certificates generated on host)",
        TlsSource::Disabled => "disabled",
    }
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the hosts found in the subscription.
    pub fn render_hosts(&self, hosts: &[HostDescriptor], registry: &HostRegistry) {
        if hosts.is_empty() {
            if !self.ctx.quiet {
                println!("No Docker hosts found. Create one: dockhand create <name>");
            }
            return;
        }
        println!(
            "  {:<16} {:<20} {:<12} {:<5} {}",
            "NAME", "RESOURCE GROUP", "REGION", "TLS", "DOCKER_HOST"
        );
        for host in hosts {
            let marker = if registry.find(host.name()).is_some() {
                ""
            } else {
                "  (not created here)"
            };
            let tls = if host.tls_enabled { "yes" } else { "no" };
            println!(
                "  {:<16} {:<20} {:<12} {:<5} {}{}",
                host.name(),
                host.resource_group,
                host.region,
                tls,
                host.docker_endpoint(),
                marker.style(self.ctx.styles.dim)
            );
        }
    }

    /// Render one host's live details.
    pub fn render_host(&self, host: &HostDescriptor, power: PowerState) {
        println!();
        self.ctx.header(host.name());
        println!();
        self.ctx.kv("Resource group:", &host.resource_group);
        self.ctx.kv("Region:        ", or_dash(&host.region));
        self.ctx.kv("Size:          ", or_dash(&host.vm_size));
        self.ctx.kv("OS:            ", host.os.as_str());
        let state = power.as_str().style(self.ctx.styles.power(power)).to_string();
        self.ctx.kv("Power state:   ", &state);
        self.ctx.kv("DNS name:      ", or_dash(&host.dns_name));
        self.ctx.kv("Public IP:     ", or_dash(&host.public_ip));
        self.ctx.kv("SSH:           ", &format!(
            "{}@{}:{}",
            host.credentials.username,
            host.address(),
            host.ssh_port
        ));
        self.ctx.kv("Docker:        ", &host.docker_endpoint());
        self.ctx.kv("TLS:           ", if host.tls_enabled { "yes" } else { "no" });
        self.ctx.kv("Vault:         ", host.vault.as_deref().unwrap_or("-"));
        println!();
    }

    /// Render a container or image listing.
    pub fn render_inventory(&self, title: &str, scan: &InventoryScan) {
        if scan.workloads.is_empty() {
            if !self.ctx.quiet {
                println!("No {title} found.");
            }
        } else if scan
            .workloads
            .first()
            .is_some_and(|w| w.kind == WorkloadKind::Image)
        {
            println!("  {:<40} {:<14} {:<16} {}", "IMAGE", "ID", "CREATED", "SIZE");
            for w in &scan.workloads {
                println!(
                    "  {:<40} {:<14} {:<16} {}",
                    w.name,
                    w.id,
                    w.status,
                    or_dash(&w.size)
                );
            }
        } else {
            println!(
                "  {:<24} {:<28} {:<24} {:<24} {}",
                "NAME", "IMAGE", "STATUS", "PORTS", "URL"
            );
            for w in &scan.workloads {
                let status = w.status.style(self.ctx.styles.workload(w.running)).to_string();
                println!(
                    "  {:<24} {:<28} {:<24} {:<24} {}",
                    w.name,
                    w.image,
                    status,
                    or_dash(&w.ports),
                    w.url.as_deref().unwrap_or("-")
                );
            }
        }
        if scan.malformed > 0 {
            self.ctx.warn(&format!(
                "{} listing line(s) could not be read and were skipped",
                scan.malformed
            ));
        }
    }

    /// Render the current dockhand configuration.
    pub fn render_config(&self, config: &DockhandConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        for key in crate::domain::config::VALID_CONFIG_KEYS {
            let value = config.get(key).unwrap_or_default();
            println!("  {:<24} {}", format!("{key}:"), or_dash(&value));
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["DOCKHAND_CONFIG", "RUST_LOG", "NO_COLOR"] {
            println!(
                "    {:<22} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }

    /// Render the result of a full provisioning run.
    pub fn render_provisioned(&self, outcome: &ProvisionOutcome) {
        let host = &outcome.host;
        println!();
        self.ctx.success(&format!("Docker host {} is ready", host.name()));
        println!();
        self.ctx.kv("DOCKER_HOST:", &host.docker_endpoint());
        self.ctx.kv("SSH:        ", &format!(
            "ssh -p {} {}@{}",
            host.ssh_port,
            host.credentials.username,
            host.address()
        ));
        self.ctx.kv("TLS:        ", tls_label(outcome.tls));
        if let Some(vault) = host.vault.as_deref().filter(|_| outcome.vault_saved) {
            self.ctx.kv("Vault:      ", vault);
            println!();
            self.ctx.info(&format!(
                "Fetch the client certificates: dockhand vault load {vault} --out <dir>"
            ));
        }
        if outcome.tls != TlsSource::Disabled {
            self.ctx.info("Point docker at the host with DOCKER_TLS_VERIFY=1 and DOCKER_CERT_PATH=<dir>");
        }
        println!();
    }

    /// Render the result of configuring an existing host.
    pub fn render_configured(&self, host: &HostDescriptor, outcome: &ConfigureOutcome) {
        println!();
        self.ctx.success(&format!("Docker configured on {}", host.name()));
        self.ctx.kv("DOCKER_HOST:", &host.docker_endpoint());
        self.ctx.kv("TLS:        ", tls_label(outcome.tls));
        println!();
    }

    /// Render a deletion, with the dependency report when one exists.
    pub fn render_deleted(&self, name: &str, report: Option<&TeardownReport>) {
        let Some(report) = report else {
            self.ctx.success(&format!("VM {name} deleted"));
            return;
        };
        if report.vm_deleted {
            self.ctx.success(&format!("VM {name} deleted"));
        }
        for id in &report.deleted {
            self.ctx.success(&format!("deleted {id}"));
        }
        for (id, reason) in &report.kept {
            self.ctx.info(&format!("kept {id}: {reason}"));
        }
    }

    /// Render files written to a local directory.
    pub fn render_files(&self, title: &str, dir: &Path, files: &[String]) {
        if files.is_empty() {
            self.ctx.warn(&format!("{title}: nothing written to {}", dir.display()));
            return;
        }
        self.ctx.success(&format!("{title}: {} file(s) in {}", files.len(), dir.display()));
        for file in files {
            println!("    {}", file.style(self.ctx.styles.dim));
        }
    }

    /// Render a container operation.
    pub fn render_container(&self, action: &str, container: &str) {
        self.ctx.success(&format!("{action} {container}"));
    }
}
