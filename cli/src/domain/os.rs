//! Operating system variants supported for Docker hosts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Linux distribution running on a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OsVariant {
    Ubuntu16_04,
    Ubuntu14_04,
    Debian8,
    CentOs7,
    Rhel7,
    CoreOs,
    OtherLinux,
}

/// Offer strings published by the cloud image catalog, matched
/// case-insensitively against the VM's image reference.
const OFFER_TABLE: &[(&str, OsVariant)] = &[
    ("ubuntuserver", OsVariant::Ubuntu16_04),
    ("debian", OsVariant::Debian8),
    ("centos", OsVariant::CentOs7),
    ("rhel", OsVariant::Rhel7),
    ("coreos", OsVariant::CoreOs),
];

impl OsVariant {
    /// Every variant that has an install script.
    pub const SUPPORTED: [OsVariant; 6] = [
        OsVariant::Ubuntu16_04,
        OsVariant::Ubuntu14_04,
        OsVariant::Debian8,
        OsVariant::CentOs7,
        OsVariant::Rhel7,
        OsVariant::CoreOs,
    ];

    /// Short identifier used on the command line and in config files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OsVariant::Ubuntu16_04 => "ubuntu-16.04",
            OsVariant::Ubuntu14_04 => "ubuntu-14.04",
            OsVariant::Debian8 => "debian-8",
            OsVariant::CentOs7 => "centos-7",
            OsVariant::Rhel7 => "rhel-7",
            OsVariant::CoreOs => "coreos",
            OsVariant::OtherLinux => "other-linux",
        }
    }

    /// Marketplace image URN (`publisher:offer:sku:version`).
    #[must_use]
    pub fn image_urn(self) -> Option<&'static str> {
        match self {
            OsVariant::Ubuntu16_04 => Some("Canonical:UbuntuServer:16.04-LTS:latest"),
            OsVariant::Ubuntu14_04 => Some("Canonical:UbuntuServer:14.04.5-LTS:latest"),
            OsVariant::Debian8 => Some("credativ:Debian:8:latest"),
            OsVariant::CentOs7 => Some("OpenLogic:CentOS:7.2:latest"),
            OsVariant::Rhel7 => Some("RedHat:RHEL:7.2:latest"),
            OsVariant::CoreOs => Some("CoreOS:CoreOS:Stable:latest"),
            OsVariant::OtherLinux => None,
        }
    }

    /// Whether the distribution manages the Docker daemon with systemd.
    #[must_use]
    pub fn uses_systemd(self) -> bool {
        !matches!(self, OsVariant::Ubuntu14_04)
    }

    /// Classify a VM from its image reference.
    ///
    /// Unknown offers map to [`OsVariant::OtherLinux`]. Ubuntu is split on the
    /// SKU so 14.04 images get the upstart flavour of the scripts.
    #[must_use]
    pub fn classify(offer: &str, sku: &str) -> Self {
        let offer = offer.to_ascii_lowercase();
        let Some(&(_, variant)) = OFFER_TABLE.iter().find(|(name, _)| offer == *name) else {
            return OsVariant::OtherLinux;
        };
        if variant == OsVariant::Ubuntu16_04 && sku.starts_with("14.04") {
            return OsVariant::Ubuntu14_04;
        }
        variant
    }
}

impl fmt::Display for OsVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OsVariant::SUPPORTED
            .into_iter()
            .chain(std::iter::once(OsVariant::OtherLinux))
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let valid: Vec<_> = OsVariant::SUPPORTED.iter().map(|v| v.as_str()).collect();
                anyhow::anyhow!("unknown OS '{s}' (valid: {})", valid.join(", "))
            })
    }
}
