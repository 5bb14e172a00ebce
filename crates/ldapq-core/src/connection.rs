//! `ldap3` directory client.
//!
//! ## Security Requirements
//!
//! - Credentials are never bound before a requested StartTLS upgrade.
//! - Passwords are never logged.
//!
//! `ldap3` negotiates StartTLS while opening the connection, so sessions in
//! [`ProtocolMode::Negotiated`] defer opening the socket until
//! [`DirectorySession::start_tls`]; the TLS layer is released with the
//! connection.

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use ldap3::asn1::StructureTag;
use ldap3::controls::{Control, ControlType, PagedResults, RawControl};
use ldap3::{parse_refs, EntryStream, LdapConn, LdapConnSettings, SearchOptions};
use native_tls::{Certificate, TlsConnector};
use tracing::{debug, warn};

use crate::client::{
    DirectoryClient, DirectorySession, EntryCursor, PageControl, RawAttribute, RawEntry, RawValue,
};
use crate::config::{ProtocolMode, ReferralPolicy};
use crate::error::{LdapError, LdapResult};
use crate::plan::{Credentials, Endpoint, SearchControls};
use crate::referral::follow_referral;

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const SIZE_LIMIT_EXCEEDED: u32 = 4;
const REFERRAL: u32 = 10;

/// Directory client backed by `ldap3`'s synchronous connection.
#[derive(Debug, Clone)]
pub struct Ldap3Client {
    connect_timeout: Duration,
}

impl Default for Ldap3Client {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl Ldap3Client {
    /// Creates a client with the given connection timeout.
    #[must_use]
    pub const fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Returns the connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl DirectoryClient for Ldap3Client {
    type Session = Ldap3Session;

    fn connect(&self, endpoint: &Endpoint) -> LdapResult<Ldap3Session> {
        let connector = endpoint
            .certificate_path
            .as_deref()
            .map(tls_connector)
            .transpose()?;

        let mut session = Ldap3Session {
            client: self.clone(),
            endpoint: endpoint.clone(),
            connector,
            conn: None,
            credentials: None,
        };
        if endpoint.protocol != ProtocolMode::Negotiated {
            session.open(false)?;
        }
        Ok(session)
    }
}

/// Loads an additional trusted root certificate, PEM or DER encoded.
fn tls_connector(path: &Path) -> LdapResult<TlsConnector> {
    let bytes = std::fs::read(path)
        .map_err(|e| LdapError::tls(format!("cannot read certificate {}: {e}", path.display())))?;
    let certificate = Certificate::from_pem(&bytes)
        .or_else(|_| Certificate::from_der(&bytes))
        .map_err(|e| LdapError::tls(format!("invalid certificate {}: {e}", path.display())))?;

    TlsConnector::builder()
        .add_root_certificate(certificate)
        .build()
        .map_err(|e| LdapError::tls(e.to_string()))
}

/// A session opened by [`Ldap3Client`].
pub struct Ldap3Session {
    client: Ldap3Client,
    endpoint: Endpoint,
    connector: Option<TlsConnector>,
    conn: Option<LdapConn>,
    credentials: Option<Credentials>,
}

impl Ldap3Session {
    fn open(&mut self, starttls: bool) -> LdapResult<()> {
        let mut settings = LdapConnSettings::new()
            .set_conn_timeout(self.client.connect_timeout)
            .set_starttls(starttls);
        if let Some(connector) = &self.connector {
            settings = settings.set_connector(connector.clone());
        }

        let url = self.endpoint.url();
        let conn = LdapConn::with_settings(settings, &url).map_err(|e| {
            if starttls {
                LdapError::tls(format!("StartTLS with {url} failed: {e}"))
            } else {
                LdapError::connection(format!("{url}: {e}"))
            }
        })?;

        debug!(%url, starttls, "connected");
        self.conn = Some(conn);
        Ok(())
    }

    fn conn(&mut self) -> LdapResult<&mut LdapConn> {
        self.conn
            .as_mut()
            .ok_or_else(|| LdapError::protocol("session is not connected"))
    }
}

impl DirectorySession for Ldap3Session {
    fn start_tls(&mut self) -> LdapResult<()> {
        if self.conn.is_some() {
            return Err(LdapError::protocol("StartTLS requested on an open connection"));
        }
        self.open(true)
    }

    fn stop_tls(&mut self) -> LdapResult<()> {
        debug!("StartTLS layer closes with the connection");
        Ok(())
    }

    fn bind(&mut self, credentials: Option<&Credentials>) -> LdapResult<()> {
        let (dn, password) = credentials.map_or(("", ""), |c| (c.username.as_str(), c.password.as_str()));

        self.conn()?
            .simple_bind(dn, password)
            .map_err(|e| LdapError::bind(e.to_string()))?
            .success()
            .map_err(|e| LdapError::bind(e.to_string()))?;

        self.credentials = credentials.cloned();
        Ok(())
    }

    fn search<'s>(
        &'s mut self,
        controls: &SearchControls,
        page: Option<&PageControl>,
    ) -> LdapResult<Box<dyn EntryCursor + 's>> {
        let referrals = match controls.referral_policy {
            ReferralPolicy::Follow => Some(ReferralContext {
                client: self.client.clone(),
                origin: self.endpoint.clone(),
                credentials: self.credentials.clone(),
                controls: controls.clone(),
            }),
            ReferralPolicy::Ignore => None,
        };

        let conn = self.conn()?;
        conn.with_search_options(
            SearchOptions::new()
                .deref(controls.deref_aliases.to_ldap3())
                .sizelimit(to_i32(u64::from(controls.size_limit)))
                .timelimit(to_i32(controls.time_limit_secs())),
        );
        if let Some(page) = page {
            conn.with_controls(vec![paged_results(page)]);
        }
        if !controls.time_limit.is_zero() {
            conn.with_timeout(controls.time_limit);
        }

        let attributes: Vec<String> = controls
            .requested_attributes()
            .into_iter()
            .map(String::from)
            .collect();
        let stream = conn
            .streaming_search(
                &controls.base_object,
                controls.scope.to_ldap3(),
                &controls.filter,
                attributes,
            )
            .map_err(|e| LdapError::search(e.to_string()))?;

        Ok(Box::new(Ldap3Cursor {
            stream: Some(stream),
            outcome: None,
            pending: VecDeque::new(),
            referrals,
        }))
    }

    fn close(&mut self) -> LdapResult<()> {
        match self.conn.take() {
            Some(mut conn) => Ok(conn.unbind()?),
            None => Ok(()),
        }
    }
}

fn to_i32(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn paged_results(page: &PageControl) -> RawControl {
    let mut control: RawControl = PagedResults {
        size: to_i32(u64::from(page.size)),
        cookie: page.cookie.clone().unwrap_or_default(),
    }
    .into();
    control.crit = page.critical;
    control
}

/// What a cursor needs to chase references.
struct ReferralContext<C> {
    client: C,
    origin: Endpoint,
    credentials: Option<Credentials>,
    controls: SearchControls,
}

impl<C: DirectoryClient> ReferralContext<C> {
    fn chase(&self, urls: &[String], pending: &mut VecDeque<RawEntry>) -> LdapResult<()> {
        for url in urls {
            pending.extend(follow_referral(
                &self.client,
                url,
                &self.origin,
                self.credentials.as_ref(),
                &self.controls,
            )?);
        }
        Ok(())
    }
}

/// Queues the entries behind referral URLs, or drops the URLs when
/// referrals are ignored.
fn queue_references<C: DirectoryClient>(
    referrals: Option<&ReferralContext<C>>,
    urls: &[String],
    pending: &mut VecDeque<RawEntry>,
) -> LdapResult<()> {
    match referrals {
        Some(ctx) => ctx.chase(urls, pending),
        None => {
            debug!(?urls, "ignoring referral");
            Ok(())
        }
    }
}

struct Ldap3Cursor<'s> {
    stream: Option<EntryStream<'static, 's, String, Vec<String>>>,
    outcome: Option<ldap3::LdapResult>,
    pending: VecDeque<RawEntry>,
    referrals: Option<ReferralContext<Ldap3Client>>,
}

impl Ldap3Cursor<'_> {
    /// Consumes the stream and keeps its final result. A referral result is
    /// chased here when following, so its entries still reach the caller.
    fn complete(&mut self) -> LdapResult<()> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        let result = stream.result();
        if result.rc == REFERRAL && self.referrals.is_some() {
            queue_references(self.referrals.as_ref(), &result.refs, &mut self.pending)?;
        }
        self.outcome = Some(result);
        Ok(())
    }
}

impl EntryCursor for Ldap3Cursor<'_> {
    fn next_entry(&mut self) -> LdapResult<Option<RawEntry>> {
        loop {
            if let Some(entry) = self.pending.pop_front() {
                return Ok(Some(entry));
            }

            let Some(stream) = self.stream.as_mut() else {
                return Ok(None);
            };
            let Some(entry) = stream.next()? else {
                self.complete()?;
                continue;
            };

            if entry.is_ref() {
                let urls = parse_refs(entry.0);
                queue_references(self.referrals.as_ref(), &urls, &mut self.pending)?;
                continue;
            }
            if entry.is_intermediate() {
                continue;
            }

            return parse_search_entry(entry.0).map(Some);
        }
    }

    fn finish(&mut self) -> LdapResult<Option<Vec<u8>>> {
        self.complete()?;
        let result = self
            .outcome
            .take()
            .ok_or_else(|| LdapError::protocol("search result already consumed"))?;
        completion(&result, self.referrals.is_some())
    }
}

/// Maps the final result of a search round to its paging cookie.
///
/// `sizeLimitExceeded` ends the search with what was received; `referral`
/// completes the round (its URLs were chased already when following).
fn completion(result: &ldap3::LdapResult, following: bool) -> LdapResult<Option<Vec<u8>>> {
    match result.rc {
        0 => Ok(paging_cookie(&result.ctrls)),
        SIZE_LIMIT_EXCEEDED => {
            warn!(text = %result.text, "server size limit exceeded, results truncated");
            Ok(None)
        }
        REFERRAL => {
            debug!(refs = ?result.refs, following, "search completed with a referral");
            Ok(paging_cookie(&result.ctrls))
        }
        rc => Err(LdapError::search(format!("result code {rc}: {}", result.text))),
    }
}

fn paging_cookie(ctrls: &[Control]) -> Option<Vec<u8>> {
    ctrls.iter().find_map(|Control(ctype, raw)| match ctype {
        Some(ControlType::PagedResults) if raw.val.is_some() => {
            Some(raw.parse::<PagedResults>().cookie)
        }
        _ => None,
    })
}

/// Decodes a SearchResultEntry, keeping attributes and values in server order.
fn parse_search_entry(tag: StructureTag) -> LdapResult<RawEntry> {
    let mut parts = tag
        .expect_constructed()
        .ok_or_else(|| LdapError::protocol("search entry is not constructed"))?
        .into_iter();

    let dn = parts
        .next()
        .and_then(StructureTag::expect_primitive)
        .ok_or_else(|| LdapError::protocol("search entry has no DN"))?;
    let attributes = parts
        .next()
        .and_then(StructureTag::expect_constructed)
        .ok_or_else(|| LdapError::protocol("search entry has no attribute list"))?
        .into_iter()
        .map(parse_attribute)
        .collect::<LdapResult<Vec<_>>>()?;

    Ok(RawEntry {
        dn: String::from_utf8_lossy(&dn).into_owned(),
        attributes,
    })
}

fn parse_attribute(tag: StructureTag) -> LdapResult<RawAttribute> {
    let mut parts = tag
        .expect_constructed()
        .ok_or_else(|| LdapError::protocol("attribute is not constructed"))?
        .into_iter();

    let name = parts
        .next()
        .and_then(StructureTag::expect_primitive)
        .ok_or_else(|| LdapError::protocol("attribute has no type"))?;
    let values = parts
        .next()
        .and_then(StructureTag::expect_constructed)
        .ok_or_else(|| LdapError::protocol("attribute has no value set"))?
        .into_iter()
        .map(|value| {
            value
                .expect_primitive()
                .map(RawValue::from_bytes)
                .ok_or_else(|| LdapError::protocol("attribute value is not primitive"))
        })
        .collect::<LdapResult<Vec<_>>>()?;

    Ok(RawAttribute {
        name: String::from_utf8_lossy(&name).into_owned(),
        values,
    })
}
