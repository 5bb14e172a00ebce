//! # ldapq-core
//!
//! Directory (LDAP) search client.
//!
//! A search runs as a three-stage pipeline:
//!
//! 1. [`decode_parameters`] turns a loosely typed parameter map into a
//!    [`SearchConfiguration`],
//! 2. [`SearchPlan::from_configuration`] validates it, reporting every
//!    violation at once, before any network I/O,
//! 3. [`SearchExecutor::execute`] opens the session (plain, `ldaps://` or
//!    StartTLS), binds, runs a single or paginated search and always closes
//!    the session.
//!
//! ```no_run
//! use ldapq_core::{Ldap3Client, SearchConfiguration, SearchExecutor, SearchPlan, SearchScope};
//! use ldapq_core::ProtocolMode;
//!
//! # fn main() -> ldapq_core::LdapResult<()> {
//! let config = SearchConfiguration::builder()
//!     .host("ldap.example.com")
//!     .port(636)
//!     .protocol(ProtocolMode::Encrypted)
//!     .base_object("ou=people,dc=example,dc=com")
//!     .scope(SearchScope::Subtree)
//!     .filter("(uid=jdoe)")
//!     .build();
//!
//! let plan = SearchPlan::from_configuration(&config)?;
//! let entries = SearchExecutor::new(Ldap3Client::default()).execute(&plan)?;
//! for entry in &entries {
//!     println!("{:?}", entry.get("cn"));
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod connection;
pub mod entry;
pub mod error;
pub mod params;
pub mod plan;
pub mod referral;
pub mod search;
pub mod validate;

pub use client::{DirectoryClient, DirectorySession, EntryCursor, PageControl, RawEntry, RawValue};
pub use config::{DerefAliases, ProtocolMode, ReferralPolicy, SearchConfiguration, SearchScope};
pub use connection::Ldap3Client;
pub use entry::{extract_entry, AttributeValue, Entry, SearchResult};
pub use error::{LdapError, LdapResult};
pub use params::{decode_parameters, ParameterMap, LDAP_ATTRIBUTE_LIST_OUTPUT};
pub use plan::{Credentials, Endpoint, SearchControls, SearchPlan};
pub use search::SearchExecutor;
pub use validate::{collect_violations, validate};
