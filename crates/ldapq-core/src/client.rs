//! Directory client abstraction.
//!
//! The executor drives a directory server only through these traits. The
//! production implementation lives in [`crate::connection`]; tests plug in
//! in-memory fakes.

use crate::error::LdapResult;
use crate::plan::{Credentials, Endpoint, SearchControls};

/// One attribute value as received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Value that arrived as valid UTF-8.
    Text(String),
    /// Value that is not valid UTF-8.
    Binary(Vec<u8>),
}

impl RawValue {
    /// Classifies raw octets as text or binary.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(e) => Self::Binary(e.into_bytes()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One attribute with its values, in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    /// Attribute description.
    pub name: String,
    /// Values in server order.
    pub values: Vec<RawValue>,
}

/// One search result entry as received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Distinguished name.
    pub dn: String,
    /// Attributes in server order.
    pub attributes: Vec<RawAttribute>,
}

impl RawEntry {
    /// Creates an entry with no attributes.
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    /// Appends a text attribute.
    #[must_use]
    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.push(RawAttribute {
            name: name.into(),
            values: values.into_iter().map(|v| RawValue::Text(v.into())).collect(),
        });
        self
    }

    /// Appends a binary attribute.
    #[must_use]
    pub fn with_binary_attribute(mut self, name: impl Into<String>, value: Vec<u8>) -> Self {
        self.attributes.push(RawAttribute {
            name: name.into(),
            values: vec![RawValue::Binary(value)],
        });
        self
    }
}

/// Simple paged results request (RFC 2696).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControl {
    /// Requested page size.
    pub size: u32,
    /// Continuation cookie from the previous round.
    pub cookie: Option<Vec<u8>>,
    /// Whether the server must honour the control.
    pub critical: bool,
}

/// Lazy cursor over the entries of one search round.
pub trait EntryCursor {
    /// Returns the next entry, or `None` when the round is exhausted.
    fn next_entry(&mut self) -> LdapResult<Option<RawEntry>>;

    /// Completes the round and returns the response paging cookie, if any.
    ///
    /// Must only be called after [`EntryCursor::next_entry`] returned `None`.
    fn finish(&mut self) -> LdapResult<Option<Vec<u8>>>;
}

/// An open directory session.
pub trait DirectorySession {
    /// Upgrades the connection with StartTLS.
    fn start_tls(&mut self) -> LdapResult<()>;

    /// Closes the StartTLS layer.
    fn stop_tls(&mut self) -> LdapResult<()>;

    /// Performs a simple bind; `None` binds anonymously.
    fn bind(&mut self, credentials: Option<&Credentials>) -> LdapResult<()>;

    /// Issues one search round.
    fn search<'s>(
        &'s mut self,
        controls: &SearchControls,
        page: Option<&PageControl>,
    ) -> LdapResult<Box<dyn EntryCursor + 's>>;

    /// Closes the session.
    fn close(&mut self) -> LdapResult<()>;
}

/// Opens directory sessions.
pub trait DirectoryClient {
    /// Session type produced by this client.
    type Session: DirectorySession;

    /// Opens a session to the endpoint. Nothing is bound yet.
    fn connect(&self, endpoint: &Endpoint) -> LdapResult<Self::Session>;
}
