//! Search execution.
//!
//! [`SearchExecutor`] opens a session, negotiates StartTLS when asked to,
//! binds, runs a single or paginated search and always tears the session
//! down exactly once.

use tracing::{debug, info, instrument, warn};

use crate::client::{DirectoryClient, DirectorySession, PageControl};
use crate::config::ProtocolMode;
use crate::entry::{extract_entry, SearchResult};
use crate::error::LdapResult;
use crate::params::{decode_parameters, ParameterMap};
use crate::plan::{SearchControls, SearchPlan};

/// Runs searches through a [`DirectoryClient`].
#[derive(Debug, Clone, Default)]
pub struct SearchExecutor<C> {
    client: C,
}

impl<C: DirectoryClient> SearchExecutor<C> {
    /// Creates an executor.
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Executes a validated search plan.
    ///
    /// No partial result is returned on failure. Errors while closing the
    /// session are logged and never replace the outcome of the search.
    ///
    /// ## Errors
    ///
    /// Returns the first connection, TLS, bind or search failure.
    #[instrument(skip(self, plan), fields(url = %plan.endpoint.url(), base = %plan.controls.base_object))]
    pub fn execute(&self, plan: &SearchPlan) -> LdapResult<SearchResult> {
        let mut session = self.client.connect(&plan.endpoint)?;

        let mut tls_active = false;
        let outcome = run_session(&mut session, plan, &mut tls_active);
        teardown(&mut session, tls_active);

        match &outcome {
            Ok(entries) => info!(entries = entries.len(), "search completed"),
            Err(e) => debug!(error = %e, "search failed"),
        }
        outcome
    }

    /// Decodes, validates and executes a search given as loose parameters.
    ///
    /// ## Errors
    ///
    /// Returns decoding and validation failures before any network I/O, then
    /// any failure of [`SearchExecutor::execute`].
    pub fn run(&self, params: &ParameterMap) -> LdapResult<SearchResult> {
        let config = decode_parameters(params)?;
        let plan = SearchPlan::from_configuration(&config)?;
        self.execute(&plan)
    }
}

fn run_session<S: DirectorySession>(
    session: &mut S,
    plan: &SearchPlan,
    tls_active: &mut bool,
) -> LdapResult<SearchResult> {
    if plan.endpoint.protocol == ProtocolMode::Negotiated {
        session.start_tls()?;
        *tls_active = true;
        debug!("StartTLS negotiated");
    }

    // Bind only after any StartTLS upgrade completed.
    session.bind(plan.credentials.as_ref())?;
    debug!(anonymous = plan.credentials.is_none(), "bound");

    if plan.is_paged() {
        paged_search(session, &plan.controls, plan.page_size)
    } else {
        single_search(session, &plan.controls)
    }
}

pub(crate) fn teardown<S: DirectorySession>(session: &mut S, tls_active: bool) {
    if tls_active {
        if let Err(e) = session.stop_tls() {
            warn!(error = %e, "failed to close StartTLS layer");
        }
    }
    if let Err(e) = session.close() {
        warn!(error = %e, "failed to close directory session");
    }
}

/// Runs one search, enforcing the size limit client-side.
fn single_search<S: DirectorySession>(
    session: &mut S,
    controls: &SearchControls,
) -> LdapResult<SearchResult> {
    let limit = usize::try_from(controls.size_limit).unwrap_or(usize::MAX);
    let mut results = SearchResult::new();
    let mut received = 0usize;

    let mut cursor = session.search(controls, None)?;
    while limit == 0 || received < limit {
        match cursor.next_entry()? {
            Some(raw) => {
                received += 1;
                results.extend(extract_entry(raw));
            }
            None => {
                cursor.finish()?;
                return Ok(results);
            }
        }
    }

    debug!(limit, "size limit reached, remaining entries discarded");
    Ok(results)
}

/// Continuation state of a paginated search.
#[derive(Debug, Default)]
struct PaginationState {
    cookie: Option<Vec<u8>>,
    rounds: usize,
}

impl PaginationState {
    // The first request is advisory; follow-ups must be honoured or fail.
    fn request(&self, size: u32) -> PageControl {
        PageControl {
            size,
            cookie: self.cookie.clone(),
            critical: self.rounds > 0,
        }
    }

    /// Records the response cookie; returns true when another page follows.
    fn advance(&mut self, cookie: Option<Vec<u8>>) -> bool {
        self.rounds += 1;
        self.cookie = cookie.filter(|c| !c.is_empty());
        self.cookie.is_some()
    }
}

fn paged_search<S: DirectorySession>(
    session: &mut S,
    controls: &SearchControls,
    page_size: u32,
) -> LdapResult<SearchResult> {
    let mut results = SearchResult::new();
    let mut state = PaginationState::default();

    loop {
        let request = state.request(page_size);
        let mut cursor = session.search(controls, Some(&request))?;
        while let Some(raw) = cursor.next_entry()? {
            results.extend(extract_entry(raw));
        }
        let more = state.advance(cursor.finish()?);
        debug!(round = state.rounds, total = results.len(), more, "page received");
        if !more {
            return Ok(results);
        }
    }
}
