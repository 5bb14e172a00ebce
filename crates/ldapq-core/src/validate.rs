//! Configuration validation.
//!
//! Every rule is evaluated; nothing short-circuits. Validation only reads the
//! configuration and performs no network I/O (the certificate path check is
//! the only filesystem access).

use tracing::debug;

use crate::config::{DerefAliases, ReferralPolicy, SearchConfiguration};
use crate::error::{LdapError, LdapResult};

/// Largest valid port number.
pub const MAX_PORT: i64 = 65_535;

/// Collects every violation found in the configuration.
///
/// An empty list means the configuration is valid, apart from the alias
/// dereferencing input which is checked separately by [`validate`].
#[must_use]
pub fn collect_violations(config: &SearchConfiguration) -> Vec<String> {
    let mut errors = Vec::new();

    if is_blank(config.host.as_deref()) {
        errors.push("host cannot be empty!".to_string());
    }

    match (is_blank(config.username.as_deref()), is_blank(config.password.as_deref())) {
        (true, false) => errors.push("username cannot be empty!".to_string()),
        (false, true) => errors.push("password cannot be empty!".to_string()),
        _ => {}
    }

    if is_blank(config.base_object.as_deref()) {
        errors.push("baseObject cannot be empty!".to_string());
    }

    if is_blank(config.filter.as_deref()) {
        errors.push("filter cannot be empty!".to_string());
    }

    if config.port < 0 {
        errors.push("port cannot be less than 0!".to_string());
    } else if config.port > MAX_PORT {
        errors.push("port cannot be greater than 65535!".to_string());
    }

    if config.protocol.is_none() {
        errors.push("protocol cannot be null".to_string());
    }

    if config.scope.is_none() {
        errors.push("scope cannot be null".to_string());
    }

    if let Some(path) = &config.certificate_path {
        if !path.exists() {
            errors.push("Certificate path does not refer to a real file!".to_string());
        }
    }

    if config.size_limit < 0 {
        errors.push("sizeLimit cannot be null or negative".to_string());
    }

    if config.time_limit < 0 {
        errors.push("timeLimit cannot be null or negative".to_string());
    }

    match config.referral_handling.as_deref() {
        None => errors.push("referralHandling is null!".to_string()),
        Some(handling) if ReferralPolicy::from_name(handling).is_none() => {
            errors.push("referralHandling must be either ignore or follow!".to_string());
        }
        Some(_) => {}
    }

    errors
}

/// Validates the configuration.
///
/// ## Errors
///
/// - [`LdapError::InvalidDerefAliases`] when the raw alias dereferencing input
///   is non-empty and not exactly one of `NEVER`, `SEARCHING`, `FINDING` or
///   `ALWAYS`. This takes precedence over the other rules.
/// - [`LdapError::Validation`] carrying every violation otherwise.
pub fn validate(config: &SearchConfiguration) -> LdapResult<()> {
    let violations = collect_violations(config);

    if let Some(input) = config.deref_aliases_input.as_deref() {
        if !input.is_empty() && DerefAliases::from_name(input).is_none() {
            return Err(LdapError::InvalidDerefAliases(input.to_string()));
        }
    }

    if violations.is_empty() {
        debug!(config = ?config, "search configuration is valid");
        Ok(())
    } else {
        debug!(count = violations.len(), "search configuration rejected");
        Err(LdapError::Validation(violations))
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, str::is_empty)
}
