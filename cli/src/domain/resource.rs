//! References to cloud resources that are either created or reused.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A cloud resource the workflow must create, or one that must already exist.
///
/// `Existing` resources are only ever looked up; a missing one is an error,
/// never a silent create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum ResourceRef {
    New(String),
    Existing(String),
}

impl ResourceRef {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ResourceRef::New(n) | ResourceRef::Existing(n) => n,
        }
    }

    #[must_use]
    pub fn is_existing(&self) -> bool {
        matches!(self, ResourceRef::Existing(_))
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::New(n) => write!(f, "new:{n}"),
            ResourceRef::Existing(n) => write!(f, "existing:{n}"),
        }
    }
}

/// Accepts `new:NAME`, `existing:NAME`, a bare `NAME` (new) and the legacy
/// `NAME@GROUP` picker form (existing; the group suffix is informational).
impl FromStr for ResourceRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = if let Some(name) = s.strip_prefix("new:") {
            ResourceRef::New(name.to_string())
        } else if let Some(name) = s.strip_prefix("existing:") {
            ResourceRef::Existing(name.to_string())
        } else if let Some((name, group)) = s.split_once('@') {
            let name = if name.is_empty() { group } else { name };
            ResourceRef::Existing(name.to_string())
        } else {
            ResourceRef::New(s.to_string())
        };
        anyhow::ensure!(!parsed.name().is_empty(), "resource name must not be empty");
        Ok(parsed)
    }
}
