//! Embedded shell script templates and their rendering.
//!
//! Templates carry `$NAME$` placeholder tokens. Rendering substitutes every
//! token and refuses to return a script that still contains one.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use include_dir::{Dir, include_dir};
use regex::Regex;

use crate::domain::error::ProvisionError;
use crate::domain::os::OsVariant;

static SCRIPTS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/scripts");

#[allow(clippy::expect_used)] // literal pattern
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[A-Z][A-Z0-9_]*\$").expect("valid token regex"));

/// Remote directory conventions, relative to the admin user's home.
pub const REMOTE_ROOT: &str = "~/.azuredocker";
pub const REMOTE_SCRIPTS_DIR: &str = "~/.azuredocker/scripts";
pub const REMOTE_TLS_DIR: &str = "~/.azuredocker/tls";

/// Remote build directory for an image deployment.
#[must_use]
pub fn remote_image_dir(image: &str) -> String {
    format!("{REMOTE_ROOT}/images/{image}")
}

/// The scripts the host configuration sequence runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    InstallDocker(OsVariant),
    CreateTlsCerts,
    InstallTlsCerts,
    ConfigureDaemon(OsVariant),
}

impl ScriptKind {
    /// Template file name for this script.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::UnsupportedPlatform`] for an OS without an
    /// install path.
    pub fn template_name(self) -> Result<&'static str, ProvisionError> {
        match self {
            ScriptKind::InstallDocker(os) => match os {
                OsVariant::Ubuntu16_04 | OsVariant::Ubuntu14_04 | OsVariant::Debian8 => {
                    Ok("install-docker-apt.sh")
                }
                OsVariant::CentOs7 | OsVariant::Rhel7 => Ok("install-docker-yum.sh"),
                OsVariant::CoreOs => Ok("install-docker-coreos.sh"),
                OsVariant::OtherLinux => {
                    Err(ProvisionError::UnsupportedPlatform(os.to_string()))
                }
            },
            ScriptKind::CreateTlsCerts => Ok("create-tls-certs.sh"),
            ScriptKind::InstallTlsCerts => Ok("install-tls-certs.sh"),
            ScriptKind::ConfigureDaemon(OsVariant::OtherLinux) => Err(
                ProvisionError::UnsupportedPlatform(OsVariant::OtherLinux.to_string()),
            ),
            ScriptKind::ConfigureDaemon(os) if os.uses_systemd() => {
                Ok("configure-docker-systemd.sh")
            }
            ScriptKind::ConfigureDaemon(_) => Ok("configure-docker-upstart.sh"),
        }
    }

    /// Step name used in progress output and error reports.
    #[must_use]
    pub fn step(self) -> &'static str {
        match self {
            ScriptKind::InstallDocker(_) => "install docker",
            ScriptKind::CreateTlsCerts => "generate tls certificates",
            ScriptKind::InstallTlsCerts => "install tls certificates",
            ScriptKind::ConfigureDaemon(_) => "configure docker daemon",
        }
    }
}

/// Raw template text by file name.
///
/// # Errors
///
/// Returns an error if no template of that name is embedded.
pub fn template(name: &str) -> Result<&'static str> {
    SCRIPTS
        .get_file(name)
        .and_then(|f| f.contents_utf8())
        .with_context(|| format!("embedded script not found: {name}"))
}

/// Substitute `$NAME$` tokens from `vars`.
///
/// # Errors
///
/// Returns an error naming the first unresolved token.
pub fn render(template: &str, vars: &[(&str, &str)]) -> Result<String> {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("${name}$"), value);
    }
    if let Some(m) = TOKEN.find(&out) {
        anyhow::bail!("unresolved script token {}", m.as_str());
    }
    Ok(out)
}

/// Look up and render the template for `kind`.
///
/// # Errors
///
/// Returns an error for an unsupported OS, a missing template or an
/// unresolved token.
pub fn render_script(kind: ScriptKind, vars: &[(&str, &str)]) -> Result<String> {
    let name = kind.template_name()?;
    render(template(name)?, vars)
}

/// `dockerd` flags for the chosen TLS mode; certificates live in
/// `/etc/docker/tls`.
#[must_use]
pub fn daemon_tls_opts(tls: bool) -> &'static str {
    if tls {
        "--tlsverify --tlscacert=/etc/docker/tls/ca.pem --tlscert=/etc/docker/tls/server.pem --tlskey=/etc/docker/tls/server-key.pem"
    } else {
        ""
    }
}
