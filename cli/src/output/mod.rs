//! Output formatting module

pub mod human;
pub mod json;
pub mod reporter;
pub mod styles;

use std::path::Path;

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;

pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

use crate::application::services::host_config::ConfigureOutcome;
use crate::application::services::provision::ProvisionOutcome;
use crate::application::services::vm::TeardownReport;
use crate::domain::cloud::PowerState;
use crate::domain::registry::HostRegistry;
use crate::domain::workload::InventoryScan;
use crate::domain::{DockhandConfig, HostDescriptor};

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        Self {
            styles: Styles::for_terminal(use_colors),
            is_tty,
            quiet,
        }
    }

    /// Check if progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Human or JSON rendering, chosen once per invocation.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_hosts(&self, hosts: &[HostDescriptor], registry: &HostRegistry) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_hosts(hosts, registry);
                Ok(())
            }
            Renderer::Json(r) => {
                let rows: Vec<_> = hosts
                    .iter()
                    .map(|h| {
                        serde_json::json!({
                            "host": h,
                            "docker_host": h.docker_endpoint(),
                            "registered": registry.find(h.name()).is_some(),
                        })
                    })
                    .collect();
                r.print(&rows)
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_host(&self, host: &HostDescriptor, power: PowerState) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_host(host, power);
                Ok(())
            }
            Renderer::Json(r) => r.print(&serde_json::json!({
                "host": host,
                "docker_host": host.docker_endpoint(),
                "power_state": power,
            })),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_inventory(&self, title: &str, scan: &InventoryScan) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_inventory(title, scan);
                Ok(())
            }
            Renderer::Json(r) => r.print(scan),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &DockhandConfig, path: &Path) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_config(config, path);
                Ok(())
            }
            Renderer::Json(r) => r.print(config),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config_value(&self, key: &str, value: &str) -> Result<()> {
        match self {
            Renderer::Human(_) => {
                println!("{value}");
                Ok(())
            }
            Renderer::Json(r) => r.print(&serde_json::json!({ "key": key, "value": value })),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_provisioned(&self, outcome: &ProvisionOutcome) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_provisioned(outcome);
                Ok(())
            }
            Renderer::Json(r) => r.print(outcome),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_configured(&self, host: &HostDescriptor, outcome: &ConfigureOutcome) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_configured(host, outcome);
                Ok(())
            }
            Renderer::Json(r) => r.print(&serde_json::json!({
                "host": host,
                "docker_host": host.docker_endpoint(),
                "tls": outcome.tls,
                "phases": outcome.phases,
            })),
        }
    }

    /// `report` is `None` when only the VM was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_deleted(&self, name: &str, report: Option<&TeardownReport>) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_deleted(name, report);
                Ok(())
            }
            Renderer::Json(r) => r.print(&serde_json::json!({
                "name": name,
                "vm_deleted": report.is_none_or(|t| t.vm_deleted),
                "dependencies": report,
            })),
        }
    }

    /// Files written to a local directory.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_files(&self, title: &str, dir: &Path, files: &[String]) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_files(title, dir, files);
                Ok(())
            }
            Renderer::Json(r) => r.print(&serde_json::json!({
                "directory": dir,
                "files": files,
            })),
        }
    }

    /// A container that was started, stopped, removed or created.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_container(&self, action: &str, container: &str) -> Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_container(action, container);
                Ok(())
            }
            Renderer::Json(r) => r.print(&serde_json::json!({
                "action": action,
                "container": container,
            })),
        }
    }
}
