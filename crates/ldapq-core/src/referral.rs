//! Referral following.
//!
//! Search continuation references are chased one hop: the referred server is
//! searched with the same filter, scope and attributes, and its own
//! references are ignored.

use percent_encoding::percent_decode_str;
use tracing::{debug, instrument};
use url::Url;

use crate::client::{DirectoryClient, DirectorySession, RawEntry};
use crate::config::{ProtocolMode, ReferralPolicy};
use crate::error::{LdapError, LdapResult};
use crate::plan::{Credentials, Endpoint, SearchControls};
use crate::search::teardown;

const LDAP_PORT: u16 = 389;
const LDAPS_PORT: u16 = 636;

/// Where a referral URL points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralTarget {
    /// Server to contact.
    pub endpoint: Endpoint,
    /// Base DN from the URL; `None` keeps the requested base.
    pub base_object: Option<String>,
}

/// Parses an LDAP URL (RFC 4516) returned as a referral.
///
/// `ldaps` URLs select [`ProtocolMode::Encrypted`]. `ldap` URLs keep
/// StartTLS when the referring session used it, plain transport otherwise.
/// The trusted certificate of the referring endpoint is carried over.
///
/// ## Errors
///
/// Returns [`LdapError::Referral`] for malformed URLs, non-LDAP schemes and
/// URLs without a host.
pub fn parse_referral(reference: &str, origin: &Endpoint) -> LdapResult<ReferralTarget> {
    let url = Url::parse(reference)
        .map_err(|e| LdapError::Referral(format!("invalid referral URL {reference}: {e}")))?;

    let protocol = match url.scheme() {
        "ldaps" => ProtocolMode::Encrypted,
        "ldap" if origin.protocol == ProtocolMode::Negotiated => ProtocolMode::Negotiated,
        "ldap" => ProtocolMode::Plain,
        other => {
            return Err(LdapError::Referral(format!(
                "unsupported referral scheme {other} in {reference}"
            )))
        }
    };

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| LdapError::Referral(format!("referral URL {reference} has no host")))?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();

    let port = url.port().unwrap_or(match protocol {
        ProtocolMode::Encrypted => LDAPS_PORT,
        ProtocolMode::Plain | ProtocolMode::Negotiated => LDAP_PORT,
    });

    let dn = percent_decode_str(url.path().trim_start_matches('/'))
        .decode_utf8()
        .map_err(|e| LdapError::Referral(format!("invalid DN in {reference}: {e}")))?;

    Ok(ReferralTarget {
        endpoint: Endpoint {
            host,
            port,
            protocol,
            certificate_path: origin.certificate_path.clone(),
        },
        base_object: (!dn.is_empty()).then(|| dn.into_owned()),
    })
}

/// Runs the search against the server a referral points to.
///
/// Returns every raw entry of that server. The referred session is always
/// closed; close failures are only logged.
///
/// ## Errors
///
/// Returns [`LdapError::Referral`] for unusable URLs and any session error
/// of the referred server.
#[instrument(skip(client, origin, credentials, controls))]
pub fn follow_referral<C: DirectoryClient>(
    client: &C,
    reference: &str,
    origin: &Endpoint,
    credentials: Option<&Credentials>,
    controls: &SearchControls,
) -> LdapResult<Vec<RawEntry>> {
    let target = parse_referral(reference, origin)?;

    let mut controls = controls.clone();
    controls.referral_policy = ReferralPolicy::Ignore;
    if let Some(base) = target.base_object {
        controls.base_object = base;
    }

    let mut session = client.connect(&target.endpoint)?;
    let mut tls_active = false;
    let outcome = search_referred(&mut session, &target.endpoint, credentials, &controls, &mut tls_active);
    teardown(&mut session, tls_active);

    if let Ok(entries) = &outcome {
        debug!(entries = entries.len(), base = %controls.base_object, "referral followed");
    }
    outcome
}

fn search_referred<S: DirectorySession>(
    session: &mut S,
    endpoint: &Endpoint,
    credentials: Option<&Credentials>,
    controls: &SearchControls,
    tls_active: &mut bool,
) -> LdapResult<Vec<RawEntry>> {
    if endpoint.protocol == ProtocolMode::Negotiated {
        session.start_tls()?;
        *tls_active = true;
    }
    session.bind(credentials)?;

    let mut entries = Vec::new();
    let mut cursor = session.search(controls, None)?;
    while let Some(entry) = cursor.next_entry()? {
        entries.push(entry);
    }
    cursor.finish()?;
    Ok(entries)
}
