//! CLI error types.

use ldapq_core::LdapError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Search client error.
    #[error(transparent)]
    Ldap(#[from] LdapError),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error.
    #[error("failed to parse config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize config: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

impl CliError {
    /// Returns the individual validation messages, if this is a validation
    /// failure.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        match self {
            Self::Ldap(e) => e.violations(),
            _ => &[],
        }
    }
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
