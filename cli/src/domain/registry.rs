//! Local record of hosts created by this tool (`~/.dockhand/hosts.json`).
//!
//! The registry only remembers where a host lives. Live details always come
//! from cloud metadata and credentials never land here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub name: String,
    pub resource_group: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRegistry {
    #[serde(default)]
    pub hosts: Vec<HostRecord>,
}

impl HostRegistry {
    /// Insert or replace the record with the same name.
    pub fn upsert(&mut self, record: HostRecord) {
        self.hosts.retain(|h| h.name != record.name);
        self.hosts.push(record);
        self.hosts.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Remove a record by name, returning whether one existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.hosts.len();
        self.hosts.retain(|h| h.name != name);
        before != self.hosts.len()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&HostRecord> {
        self.hosts.iter().find(|h| h.name == name)
    }
}
