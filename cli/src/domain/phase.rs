//! Host configuration phases.
//!
//! Phases only move forward. The TLS step branches into exactly one of
//! `TlsProvisioned` or `NoTls`.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigPhase {
    Created,
    NetworkReady,
    Running,
    ServiceInstalled,
    TlsProvisioned,
    NoTls,
    ConfigWritten,
    Done,
}

impl ConfigPhase {
    /// Legal successors of this phase.
    #[must_use]
    pub fn successors(self) -> &'static [ConfigPhase] {
        use ConfigPhase::{
            ConfigWritten, Created, Done, NetworkReady, NoTls, Running, ServiceInstalled,
            TlsProvisioned,
        };
        match self {
            Created => &[NetworkReady],
            NetworkReady => &[Running],
            Running => &[ServiceInstalled],
            ServiceInstalled => &[TlsProvisioned, NoTls],
            TlsProvisioned | NoTls => &[ConfigWritten],
            ConfigWritten => &[Done],
            Done => &[],
        }
    }

    #[must_use]
    pub fn can_advance_to(self, next: ConfigPhase) -> bool {
        self.successors().contains(&next)
    }

    /// Human label used in progress output and cancellation errors.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ConfigPhase::Created => "created",
            ConfigPhase::NetworkReady => "network ready",
            ConfigPhase::Running => "running",
            ConfigPhase::ServiceInstalled => "docker installed",
            ConfigPhase::TlsProvisioned => "tls provisioned",
            ConfigPhase::NoTls => "tls skipped",
            ConfigPhase::ConfigWritten => "daemon configured",
            ConfigPhase::Done => "done",
        }
    }
}

impl fmt::Display for ConfigPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tracks the current phase of one host and rejects illegal transitions.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    current: ConfigPhase,
    history: Vec<ConfigPhase>,
}

impl PhaseTracker {
    #[must_use]
    pub fn new(start: ConfigPhase) -> Self {
        Self {
            current: start,
            history: vec![start],
        }
    }

    #[must_use]
    pub fn current(&self) -> ConfigPhase {
        self.current
    }

    #[must_use]
    pub fn history(&self) -> &[ConfigPhase] {
        &self.history
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns an error if `next` is not a legal successor.
    pub fn advance(&mut self, next: ConfigPhase) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.current.can_advance_to(next),
            "illegal phase transition: {} -> {}",
            self.current,
            next
        );
        self.current = next;
        self.history.push(next);
        Ok(())
    }
}
