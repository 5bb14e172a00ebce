//! Validated search plans.
//!
//! A [`SearchPlan`] can only be obtained from a configuration that passed
//! [`crate::validate::validate`], so the executor never sees raw input.

use std::fmt;
use std::net::Ipv6Addr;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{DerefAliases, ProtocolMode, ReferralPolicy, SearchConfiguration, SearchScope};
use crate::error::{LdapError, LdapResult};
use crate::validate::validate;

/// Attribute selector returning all user attributes.
pub const ALL_USER_ATTRIBUTES: &str = "*";

/// Simple bind credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Bind DN or user name.
    pub username: String,
    /// Bind password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***REDACTED***")
            .finish()
    }
}

/// Where and how to reach the directory server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Transport and security mode.
    pub protocol: ProtocolMode,
    /// Additional trusted certificate.
    pub certificate_path: Option<PathBuf>,
}

impl Endpoint {
    /// Returns the connection URL, e.g. `ldaps://ldap.example.com:636`.
    ///
    /// Negotiated sessions use the `ldap` scheme and upgrade in-band.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = self.protocol.scheme();
        if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("{scheme}://[{}]:{}", self.host, self.port)
        } else {
            format!("{scheme}://{}:{}", self.host, self.port)
        }
    }
}

/// Parameters of the search operation itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchControls {
    /// Search base DN.
    pub base_object: String,
    /// Search scope.
    pub scope: SearchScope,
    /// Search filter.
    pub filter: String,
    /// Requested attributes; `None` returns all user attributes.
    pub attributes: Option<Vec<String>>,
    /// Maximum number of entries; 0 means unbounded.
    pub size_limit: u32,
    /// Server-side time limit; zero means unbounded.
    pub time_limit: Duration,
    /// Alias dereferencing policy.
    pub deref_aliases: DerefAliases,
    /// Referral handling.
    pub referral_policy: ReferralPolicy,
}

impl SearchControls {
    /// Returns the attribute selection sent to the server.
    #[must_use]
    pub fn requested_attributes(&self) -> Vec<&str> {
        match &self.attributes {
            Some(attributes) => attributes.iter().map(String::as_str).collect(),
            None => vec![ALL_USER_ATTRIBUTES],
        }
    }

    /// Returns the time limit in whole seconds, as sent to the server.
    #[must_use]
    pub fn time_limit_secs(&self) -> u64 {
        self.time_limit.as_secs()
    }
}

/// An executable search: endpoint, credentials, controls and paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPlan {
    /// Server endpoint.
    pub endpoint: Endpoint,
    /// Bind credentials; `None` binds anonymously.
    pub credentials: Option<Credentials>,
    /// Search parameters.
    pub controls: SearchControls,
    /// Entries per page; 0 disables pagination.
    pub page_size: u32,
}

impl SearchPlan {
    /// Validates the configuration and turns it into a plan.
    ///
    /// ## Errors
    ///
    /// Returns the validation failure when the configuration is invalid.
    pub fn from_configuration(config: &SearchConfiguration) -> LdapResult<Self> {
        validate(config)?;

        let port = u16::try_from(config.port)
            .map_err(|_| LdapError::Validation(vec![format!("port {} is out of range", config.port)]))?;
        let protocol = config
            .protocol
            .ok_or_else(|| LdapError::Validation(vec!["protocol cannot be null".to_string()]))?;
        let scope = config
            .scope
            .ok_or_else(|| LdapError::Validation(vec!["scope cannot be null".to_string()]))?;
        let referral_policy = config
            .referral_handling
            .as_deref()
            .and_then(ReferralPolicy::from_name)
            .unwrap_or_default();

        let credentials = match (config.username.as_deref(), config.password.as_deref()) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(Credentials::new(username, password))
            }
            _ => None,
        };

        Ok(Self {
            endpoint: Endpoint {
                host: config.host.clone().unwrap_or_default(),
                port,
                protocol,
                certificate_path: config.certificate_path.clone(),
            },
            credentials,
            controls: SearchControls {
                base_object: config.base_object.clone().unwrap_or_default(),
                scope,
                filter: config.filter.clone().unwrap_or_default(),
                attributes: config.attributes.clone(),
                size_limit: saturate(config.size_limit),
                time_limit: Duration::from_millis(
                    u64::try_from(config.time_limit).unwrap_or(0).saturating_mul(1000),
                ),
                deref_aliases: config.deref_aliases,
                referral_policy,
            },
            page_size: saturate(config.page_size),
        })
    }

    /// Returns true when the search is paginated.
    #[must_use]
    pub const fn is_paged(&self) -> bool {
        self.page_size > 0
    }
}

// Negative values mean "disabled" and huge values are capped to what the
// protocol's 32-bit signed integers carry.
fn saturate(value: i64) -> u32 {
    u32::try_from(value.clamp(0, i64::from(i32::MAX))).unwrap_or(0)
}
