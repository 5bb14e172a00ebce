//! Search client error types.
//!
//! ## Security Note
//!
//! Error messages must not leak sensitive information like
//! passwords or bind credentials.

use thiserror::Error;

/// Errors raised while decoding, validating or executing a directory search.
#[derive(Debug, Error)]
pub enum LdapError {
    /// The configuration failed validation. Carries every violation found.
    #[error("invalid search configuration: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The raw alias dereferencing input does not name a known policy.
    #[error("{0} is not a valid dereferencing alias.")]
    InvalidDerefAliases(String),

    /// A parameter arrived with a value of the wrong type.
    #[error("invalid value for parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name as used in the parameter map.
        name: String,
        /// What was wrong with the value.
        reason: String,
    },

    /// Connection failed.
    #[error("LDAP connection failed: {0}")]
    Connection(String),

    /// TLS/SSL error.
    #[error("LDAP TLS error: {0}")]
    Tls(String),

    /// Bind (authentication) failed.
    #[error("LDAP bind failed: {0}")]
    Bind(String),

    /// Search operation failed.
    #[error("LDAP search failed: {0}")]
    Search(String),

    /// Following a referral failed.
    #[error("LDAP referral failed: {0}")]
    Referral(String),

    /// Protocol error from LDAP server.
    #[error("LDAP protocol error: {0}")]
    Protocol(String),

    /// Underlying ldap3 error.
    #[error("LDAP error: {0}")]
    Ldap3(#[from] ldap3::LdapError),
}

impl LdapError {
    /// Creates a parameter error.
    #[must_use]
    pub fn parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a TLS error.
    #[must_use]
    pub fn tls(msg: impl Into<String>) -> Self {
        Self::Tls(msg.into())
    }

    /// Creates a bind error.
    #[must_use]
    pub fn bind(msg: impl Into<String>) -> Self {
        Self::Bind(msg.into())
    }

    /// Creates a search error.
    #[must_use]
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Checks if this error was raised before any network I/O.
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidDerefAliases(_) | Self::InvalidParameter { .. }
        )
    }

    /// Checks if this error came from an open directory session.
    #[must_use]
    pub const fn is_session_error(&self) -> bool {
        !self.is_validation_error()
    }

    /// Checks if this is a security-related error.
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(self, Self::Tls(_) | Self::Bind(_))
    }

    /// Returns the collected violations of a validation failure.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        match self {
            Self::Validation(violations) => violations,
            _ => &[],
        }
    }
}

/// Result type for search client operations.
pub type LdapResult<T> = Result<T, LdapError>;
