//! Search configuration.
//!
//! A [`SearchConfiguration`] holds the raw, not yet validated parameters of one
//! search invocation. Numeric fields are signed so that out-of-range input
//! (including the sentinel substituted for absent values) survives until
//! validation reports it.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default LDAP port.
pub const DEFAULT_PORT: i64 = 389;

/// Default referral handling.
pub const DEFAULT_REFERRAL_HANDLING: &str = "ignore";

// ============================================================================
// Protocol mode
// ============================================================================

/// Transport and security mode of a directory session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolMode {
    /// Plain `ldap://`, no encryption.
    Plain,
    /// `ldaps://`, TLS from connection start.
    Encrypted,
    /// `ldap://` upgraded in-band with StartTLS before binding.
    Negotiated,
}

impl ProtocolMode {
    /// Returns the external name of this mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "LDAP",
            Self::Encrypted => "LDAPS",
            Self::Negotiated => "TLS",
        }
    }

    /// Returns the URL scheme used to open the transport.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Encrypted => "ldaps",
            Self::Plain | Self::Negotiated => "ldap",
        }
    }

    /// Decodes a loosely typed protocol name.
    ///
    /// Matching is case-insensitive. Absent or unknown names select
    /// [`ProtocolMode::Encrypted`].
    #[must_use]
    pub fn decode(name: Option<&str>) -> Self {
        match name.map(str::to_uppercase).as_deref() {
            Some("LDAP") => Self::Plain,
            Some("TLS") => Self::Negotiated,
            _ => Self::Encrypted,
        }
    }
}

impl fmt::Display for ProtocolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Search scope
// ============================================================================

/// LDAP search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchScope {
    /// Search only the base object.
    Base,
    /// Search the immediate children of the base object.
    OneLevel,
    /// Search the entire subtree.
    Subtree,
}

impl SearchScope {
    /// Converts to ldap3 scope.
    #[must_use]
    pub fn to_ldap3(&self) -> ldap3::Scope {
        match self {
            Self::Base => ldap3::Scope::Base,
            Self::OneLevel => ldap3::Scope::OneLevel,
            Self::Subtree => ldap3::Scope::Subtree,
        }
    }

    /// Decodes a loosely typed scope name.
    ///
    /// Matching is case-insensitive. Absent or unknown names select
    /// [`SearchScope::OneLevel`].
    #[must_use]
    pub fn decode(name: Option<&str>) -> Self {
        match name.map(str::to_uppercase).as_deref() {
            Some("BASE") => Self::Base,
            Some("SUBTREE") => Self::Subtree,
            _ => Self::OneLevel,
        }
    }
}

// ============================================================================
// Alias dereferencing
// ============================================================================

/// Alias dereferencing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DerefAliases {
    /// Never dereference aliases.
    Never,
    /// Dereference aliases below the base object only.
    Searching,
    /// Dereference the base object only.
    Finding,
    /// Always dereference aliases.
    #[default]
    Always,
}

impl DerefAliases {
    /// All policies, in protocol order.
    pub const ALL: [Self; 4] = [Self::Never, Self::Searching, Self::Finding, Self::Always];

    /// Returns the canonical name of this policy.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Never => "NEVER",
            Self::Searching => "SEARCHING",
            Self::Finding => "FINDING",
            Self::Always => "ALWAYS",
        }
    }

    /// Looks up a policy by its exact canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|policy| policy.as_str() == name)
    }

    /// Decodes a loosely typed policy name, case-insensitively.
    ///
    /// Absent, empty or unknown names keep the default.
    #[must_use]
    pub fn decode(name: Option<&str>) -> Self {
        name.and_then(|n| Self::from_name(&n.to_uppercase()))
            .unwrap_or_default()
    }

    /// Converts to ldap3 dereferencing policy.
    #[must_use]
    pub fn to_ldap3(&self) -> ldap3::DerefAliases {
        match self {
            Self::Never => ldap3::DerefAliases::Never,
            Self::Searching => ldap3::DerefAliases::Searching,
            Self::Finding => ldap3::DerefAliases::Finding,
            Self::Always => ldap3::DerefAliases::Always,
        }
    }
}

// ============================================================================
// Referral policy
// ============================================================================

/// What to do with referrals returned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralPolicy {
    /// Skip referrals.
    #[default]
    Ignore,
    /// Chase referrals and merge the referred entries.
    Follow,
}

impl ReferralPolicy {
    /// Returns the external name of this policy.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Follow => "follow",
        }
    }

    /// Looks up a policy by its exact, case-sensitive name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ignore" => Some(Self::Ignore),
            "follow" => Some(Self::Follow),
            _ => None,
        }
    }
}

// ============================================================================
// Search configuration
// ============================================================================

/// Raw configuration of one search invocation.
///
/// Produced by [`crate::params::decode_parameters`] or the
/// [`SearchConfigurationBuilder`], checked by [`crate::validate::validate`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfiguration {
    /// Directory server host name.
    pub host: Option<String>,

    /// Directory server port; valid range is 0-65535.
    pub port: i64,

    /// Transport and security mode.
    pub protocol: Option<ProtocolMode>,

    /// Bind DN or user name.
    pub username: Option<String>,

    /// Bind password.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Additional trusted certificate (PEM or DER).
    pub certificate_path: Option<PathBuf>,

    /// Search base DN.
    pub base_object: Option<String>,

    /// Search scope.
    pub scope: Option<SearchScope>,

    /// Search filter.
    pub filter: Option<String>,

    /// Attributes to return; `None` returns all attributes.
    pub attributes: Option<Vec<String>>,

    /// Maximum number of entries; 0 means unbounded.
    pub size_limit: i64,

    /// Entries per page; 0 disables pagination.
    pub page_size: i64,

    /// Time limit in seconds; 0 means unbounded.
    pub time_limit: i64,

    /// Referral handling, `ignore` or `follow`.
    pub referral_handling: Option<String>,

    /// Decoded alias dereferencing policy.
    pub deref_aliases: DerefAliases,

    /// Alias dereferencing input exactly as received.
    pub deref_aliases_input: Option<String>,
}

impl Default for SearchConfiguration {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            protocol: None,
            username: None,
            password: None,
            certificate_path: None,
            base_object: None,
            scope: Some(SearchScope::Base),
            filter: None,
            attributes: None,
            size_limit: 0,
            page_size: 0,
            time_limit: 0,
            referral_handling: Some(DEFAULT_REFERRAL_HANDLING.to_string()),
            deref_aliases: DerefAliases::default(),
            deref_aliases_input: None,
        }
    }
}

impl fmt::Debug for SearchConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfiguration")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("protocol", &self.protocol)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***REDACTED***"))
            .field("certificate_path", &self.certificate_path)
            .field("base_object", &self.base_object)
            .field("scope", &self.scope)
            .field("filter", &self.filter)
            .field("attributes", &self.attributes)
            .field("size_limit", &self.size_limit)
            .field("page_size", &self.page_size)
            .field("time_limit", &self.time_limit)
            .field("referral_handling", &self.referral_handling)
            .field("deref_aliases", &self.deref_aliases)
            .field("deref_aliases_input", &self.deref_aliases_input)
            .finish()
    }
}

impl SearchConfiguration {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> SearchConfigurationBuilder {
        SearchConfigurationBuilder::default()
    }
}

// ============================================================================
// Configuration Builder
// ============================================================================

/// Builder for search configuration.
///
/// Starts from [`SearchConfiguration::default`]; nothing is validated here.
#[derive(Debug, Default)]
pub struct SearchConfigurationBuilder {
    config: SearchConfiguration,
}

impl SearchConfigurationBuilder {
    /// Sets the host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: i64) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the protocol mode.
    #[must_use]
    pub const fn protocol(mut self, protocol: ProtocolMode) -> Self {
        self.config.protocol = Some(protocol);
        self
    }

    /// Sets the bind user and password.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self.config.password = Some(password.into());
        self
    }

    /// Sets the trusted certificate path.
    #[must_use]
    pub fn certificate_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.certificate_path = Some(path.into());
        self
    }

    /// Sets the search base.
    #[must_use]
    pub fn base_object(mut self, dn: impl Into<String>) -> Self {
        self.config.base_object = Some(dn.into());
        self
    }

    /// Sets the search scope.
    #[must_use]
    pub const fn scope(mut self, scope: SearchScope) -> Self {
        self.config.scope = Some(scope);
        self
    }

    /// Sets the search filter.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.config.filter = Some(filter.into());
        self
    }

    /// Restricts the returned attributes.
    #[must_use]
    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the size limit.
    #[must_use]
    pub const fn size_limit(mut self, limit: i64) -> Self {
        self.config.size_limit = limit;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn page_size(mut self, size: i64) -> Self {
        self.config.page_size = size;
        self
    }

    /// Sets the time limit in seconds.
    #[must_use]
    pub const fn time_limit(mut self, seconds: i64) -> Self {
        self.config.time_limit = seconds;
        self
    }

    /// Sets the referral handling.
    #[must_use]
    pub fn referral_handling(mut self, handling: impl Into<String>) -> Self {
        self.config.referral_handling = Some(handling.into());
        self
    }

    /// Sets the alias dereferencing policy.
    #[must_use]
    pub const fn deref_aliases(mut self, policy: DerefAliases) -> Self {
        self.config.deref_aliases = policy;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> SearchConfiguration {
        self.config
    }
}
