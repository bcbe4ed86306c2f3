//! Validators for user-supplied names and secrets.
//!
//! Rules follow the cloud provider's naming constraints so bad input is
//! rejected before any resource is created.

use crate::domain::error::ValidationError;

/// Admin names the VM image refuses.
const RESERVED_USERS: &[&str] = &[
    "admin", "administrator", "root", "guest", "user", "test", "sys", "support", "owner",
    "console", "backup",
];

fn is_alnum_hyphen(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn starts_with_letter(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Host names become VM names and DNS labels.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidName`] when the name breaks the rule.
pub fn validate_host_name(name: &str) -> Result<(), ValidationError> {
    if (3..=15).contains(&name.len())
        && starts_with_letter(name)
        && is_alnum_hyphen(name)
        && !name.ends_with('-')
    {
        return Ok(());
    }
    Err(ValidationError::InvalidName {
        kind: "host name",
        value: name.to_string(),
        rule: "3-15 letters, digits or hyphens, starting with a letter and not ending with a hyphen",
    })
}

/// # Errors
///
/// Returns [`ValidationError::InvalidName`] when the name breaks the rule.
pub fn validate_admin_user(name: &str) -> Result<(), ValidationError> {
    let well_formed = (1..=32).contains(&name.len())
        && starts_with_letter(name)
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if well_formed && !RESERVED_USERS.contains(&name) {
        return Ok(());
    }
    Err(ValidationError::InvalidName {
        kind: "admin user",
        value: name.to_string(),
        rule: "1-32 lowercase letters, digits, '-' or '_', starting with a letter; not a reserved name",
    })
}

/// Passwords need 12-72 characters and three of the four character classes.
///
/// # Errors
///
/// Returns [`ValidationError::WeakPassword`] naming the failed rule.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if !(12..=72).contains(&len) {
        return Err(ValidationError::WeakPassword("length must be 12-72 characters"));
    }
    let classes = [
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    if classes.iter().filter(|c| **c).count() < 3 {
        return Err(ValidationError::WeakPassword(
            "needs three of: lowercase, uppercase, digit, symbol",
        ));
    }
    Ok(())
}

/// # Errors
///
/// Returns [`ValidationError::InvalidName`] when the name breaks the rule.
pub fn validate_vault_name(name: &str) -> Result<(), ValidationError> {
    if (3..=24).contains(&name.len())
        && starts_with_letter(name)
        && is_alnum_hyphen(name)
        && !name.ends_with('-')
        && !name.contains("--")
    {
        return Ok(());
    }
    Err(ValidationError::InvalidName {
        kind: "vault name",
        value: name.to_string(),
        rule: "3-24 letters, digits or single hyphens, starting with a letter",
    })
}

/// # Errors
///
/// Returns [`ValidationError::InvalidName`] when the name breaks the rule.
pub fn validate_storage_account_name(name: &str) -> Result<(), ValidationError> {
    if (3..=24).contains(&name.len())
        && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Ok(());
    }
    Err(ValidationError::InvalidName {
        kind: "storage account",
        value: name.to_string(),
        rule: "3-24 lowercase letters or digits",
    })
}

/// # Errors
///
/// Returns [`ValidationError::InvalidPort`] outside 1..=65535.
pub fn validate_port(port: u32) -> Result<u16, ValidationError> {
    u16::try_from(port)
        .ok()
        .filter(|p| *p > 0)
        .ok_or(ValidationError::InvalidPort(port))
}

/// Container names and IDs, also used as image names when deploying.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidName`] when the name breaks the rule.
pub fn validate_container_name(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    if first_ok && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')) {
        return Ok(());
    }
    Err(ValidationError::InvalidName {
        kind: "container",
        value: name.to_string(),
        rule: "letters, digits, '_', '.' or '-', starting with a letter or digit",
    })
}

/// Image references such as `nginx`, `nginx:1.25` or `repo/app:tag`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidName`] when the reference breaks the rule.
pub fn validate_image_ref(image: &str) -> Result<(), ValidationError> {
    let ok = !image.is_empty()
        && image.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && image
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '/' | ':' | '@'));
    if ok {
        return Ok(());
    }
    Err(ValidationError::InvalidName {
        kind: "image",
        value: image.to_string(),
        rule: "letters, digits and '_ . - / : @', starting with a letter or digit",
    })
}

/// Storage account name derived from a host name when the user gives none.
#[must_use]
pub fn default_storage_account_name(host: &str) -> String {
    let mut base: String = host
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    base.truncate(17);
    format!("{base}storage")
}
