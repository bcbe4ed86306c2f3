//! Property-based tests for script rendering, name validation and resource
//! references.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used)]

use proptest::prelude::*;

use dockhand_cli::domain::script::{ScriptKind, daemon_tls_opts, render_script};
use dockhand_cli::domain::validate::{
    default_storage_account_name, validate_host_name, validate_password, validate_port,
    validate_storage_account_name,
};
use dockhand_cli::domain::{OsVariant, ResourceRef, validate_config_key};

fn supported_os() -> impl Strategy<Value = OsVariant> {
    proptest::sample::select(OsVariant::SUPPORTED.to_vec())
}

// ============================================================================
// Script rendering
// ============================================================================

proptest! {
    /// Every supported OS renders install and daemon scripts with no
    /// placeholder left behind.
    #[test]
    fn prop_supported_os_scripts_render_completely(
        os in supported_os(),
        user in "[a-z][a-z0-9_]{0,15}",
        port in 1u16..,
        tls in any::<bool>(),
    ) {
        let distro = if os == OsVariant::Debian8 { "debian" } else { "ubuntu" };
        let install = render_script(
            ScriptKind::InstallDocker(os),
            &[("ADMIN_USER", user.as_str()), ("DISTRO", distro)],
        ).expect("install script renders");
        prop_assert!(!install.trim().is_empty());
        prop_assert!(install.contains(&user));

        let port = port.to_string();
        let daemon = render_script(
            ScriptKind::ConfigureDaemon(os),
            &[("DOCKER_PORT", port.as_str()), ("TLS_OPTS", daemon_tls_opts(tls))],
        ).expect("daemon script renders");
        prop_assert!(daemon.contains(&port));
        prop_assert_eq!(daemon.contains("--tlsverify"), tls);
    }

    /// Leaving out a variable is always an error, never a half-rendered script.
    #[test]
    fn prop_missing_variable_is_rejected(os in supported_os()) {
        prop_assert!(render_script(ScriptKind::InstallDocker(os), &[]).is_err());
    }
}

#[test]
fn other_linux_has_no_install_script() {
    assert!(render_script(
        ScriptKind::InstallDocker(OsVariant::OtherLinux),
        &[("ADMIN_USER", "dockeruser"), ("DISTRO", "ubuntu")],
    )
    .is_err());
}

// ============================================================================
// Name validation
// ============================================================================

proptest! {
    /// Derived storage account names are always valid account names.
    #[test]
    fn prop_default_storage_account_is_valid(host in "[A-Za-z][A-Za-z0-9-]{2,40}") {
        let account = default_storage_account_name(&host);
        prop_assert!(validate_storage_account_name(&account).is_ok(), "{}", account);
    }

    /// Well-formed host names are accepted.
    #[test]
    fn prop_well_formed_host_names_accepted(name in "[a-z][a-z0-9-]{1,13}[a-z0-9]") {
        prop_assert!(validate_host_name(&name).is_ok(), "{}", name);
    }

    /// Names starting with a digit are rejected.
    #[test]
    fn prop_host_names_starting_with_digit_rejected(name in "[0-9][a-z0-9]{2,10}") {
        prop_assert!(validate_host_name(&name).is_err());
    }

    /// Passwords drawn from a single character class never pass.
    #[test]
    fn prop_single_class_passwords_rejected(password in "[a-z]{12,40}") {
        prop_assert!(validate_password(&password).is_err());
    }

    /// Ports outside 1-65535 are rejected; everything inside is kept.
    #[test]
    fn prop_port_range(port in any::<u32>()) {
        let ok = (1..=65535).contains(&port);
        prop_assert_eq!(validate_port(port).is_ok(), ok);
    }

    /// Arbitrary keys outside the whitelist are rejected.
    #[test]
    fn prop_unknown_config_keys_rejected(key in "[a-z]{1,10}\\.[a-z]{1,10}") {
        prop_assume!(key != "defaults.region" && key != "defaults.os");
        prop_assert!(validate_config_key(&key).is_err(), "accepted {}", key);
    }
}

// ============================================================================
// Resource references
// ============================================================================

proptest! {
    /// `Display` output parses back to the same reference.
    #[test]
    fn prop_resource_ref_display_parses_back(name in "[a-z][a-z0-9-]{0,20}", existing in any::<bool>()) {
        let r = if existing { ResourceRef::Existing(name) } else { ResourceRef::New(name) };
        let parsed: ResourceRef = r.to_string().parse().expect("parses");
        prop_assert_eq!(parsed, r);
    }

    /// The picker form `NAME@GROUP` always refers to an existing resource.
    #[test]
    fn prop_picker_form_is_existing(name in "[a-z]{1,10}", group in "[a-z]{1,10}") {
        let parsed: ResourceRef = format!("{name}@{group}").parse().expect("parses");
        prop_assert_eq!(parsed, ResourceRef::Existing(name));
    }
}

#[test]
fn empty_resource_name_is_rejected() {
    assert!("new:".parse::<ResourceRef>().is_err());
    assert!("".parse::<ResourceRef>().is_err());
}
