//! Common test utilities and fixtures.
//!
//! [`FakeDirectory`] is an in-memory [`DirectoryClient`] that serves scripted
//! search rounds and records every call made against it.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use ldapq_core::{
    Credentials, DirectoryClient, DirectorySession, Endpoint, EntryCursor, LdapError, LdapResult,
    PageControl, RawEntry, ReferralPolicy, SearchControls,
};

/// Installs a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ldapq_core=debug")
        .with_test_writer()
        .try_init();
}

/// One call observed by the fake directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// Session opened to the URL.
    Connect(String),
    /// StartTLS requested.
    StartTls,
    /// StartTLS layer closed.
    StopTls,
    /// Bind with the user name; `None` is anonymous.
    Bind(Option<String>),
    /// Search round issued.
    Search {
        /// Search base.
        base: String,
        /// Paging request, if any.
        page: Option<PageControl>,
        /// Referral policy of the round.
        referrals: ReferralPolicy,
    },
    /// Round completed through `finish`.
    Finish,
    /// Session closed.
    Close,
}

/// Entries and response cookie of one scripted search round.
#[derive(Debug, Clone, Default)]
pub struct Round {
    /// Entries returned by the round.
    pub entries: Vec<RawEntry>,
    /// Response paging cookie.
    pub cookie: Option<Vec<u8>>,
}

impl Round {
    /// Creates a round.
    pub fn new(entries: Vec<RawEntry>, cookie: Option<&[u8]>) -> Self {
        Self {
            entries,
            cookie: cookie.map(<[u8]>::to_vec),
        }
    }
}

/// Operations the fake can be told to fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Failures {
    pub connect: bool,
    pub start_tls: bool,
    pub bind: bool,
    pub search: bool,
    /// Fails `next_entry` after this many entries.
    pub cursor_after: Option<usize>,
    pub stop_tls: bool,
    pub close: bool,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    rounds: VecDeque<Round>,
    hosts: HashMap<String, Vec<RawEntry>>,
    failures: Failures,
}

/// In-memory directory client.
#[derive(Debug, Clone, Default)]
pub struct FakeDirectory {
    state: Rc<RefCell<State>>,
}

impl FakeDirectory {
    /// Creates a directory serving the given rounds in order.
    pub fn with_rounds(rounds: Vec<Round>) -> Self {
        let directory = Self::default();
        directory.state.borrow_mut().rounds = rounds.into();
        directory
    }

    /// Creates a directory answering one round with the entries.
    pub fn with_entries(entries: Vec<RawEntry>) -> Self {
        Self::with_rounds(vec![Round::new(entries, None)])
    }

    /// Serves a fixed entry list for every search against `host`.
    pub fn serve_host(&self, host: &str, entries: Vec<RawEntry>) {
        self.state.borrow_mut().hosts.insert(host.to_string(), entries);
    }

    /// Sets the failures to inject.
    pub fn fail(&self, failures: Failures) {
        self.state.borrow_mut().failures = failures;
    }

    /// Returns every call seen so far.
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Counts calls matching the predicate.
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Returns the paging requests of every search round.
    pub fn page_requests(&self) -> Vec<Option<PageControl>> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Search { page, .. } => Some(page.clone()),
                _ => None,
            })
            .collect()
    }
}

impl DirectoryClient for FakeDirectory {
    type Session = FakeSession;

    fn connect(&self, endpoint: &Endpoint) -> LdapResult<FakeSession> {
        let mut state = self.state.borrow_mut();
        if state.failures.connect {
            return Err(LdapError::connection("connection refused"));
        }
        state.calls.push(Call::Connect(endpoint.url()));
        Ok(FakeSession {
            state: Rc::clone(&self.state),
            host: endpoint.host.clone(),
        })
    }
}

/// Session of a [`FakeDirectory`].
#[derive(Debug)]
pub struct FakeSession {
    state: Rc<RefCell<State>>,
    host: String,
}

impl FakeSession {
    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn failures(&self) -> Failures {
        self.state.borrow().failures
    }
}

impl DirectorySession for FakeSession {
    fn start_tls(&mut self) -> LdapResult<()> {
        if self.failures().start_tls {
            return Err(LdapError::tls("handshake failed"));
        }
        self.record(Call::StartTls);
        Ok(())
    }

    fn stop_tls(&mut self) -> LdapResult<()> {
        self.record(Call::StopTls);
        if self.failures().stop_tls {
            return Err(LdapError::tls("close_notify failed"));
        }
        Ok(())
    }

    fn bind(&mut self, credentials: Option<&Credentials>) -> LdapResult<()> {
        if self.failures().bind {
            return Err(LdapError::bind("invalid credentials"));
        }
        self.record(Call::Bind(credentials.map(|c| c.username.clone())));
        Ok(())
    }

    fn search<'s>(
        &'s mut self,
        controls: &SearchControls,
        page: Option<&PageControl>,
    ) -> LdapResult<Box<dyn EntryCursor + 's>> {
        self.record(Call::Search {
            base: controls.base_object.clone(),
            page: page.cloned(),
            referrals: controls.referral_policy,
        });

        let failures = self.failures();
        if failures.search {
            return Err(LdapError::search("no such object"));
        }

        let round = {
            let mut state = self.state.borrow_mut();
            let hosted = state.hosts.get(&self.host).cloned();
            match hosted {
                Some(entries) => Round::new(entries, None),
                None => state.rounds.pop_front().unwrap_or_default(),
            }
        };

        Ok(Box::new(FakeCursor {
            state: Rc::clone(&self.state),
            entries: round.entries.into(),
            cookie: round.cookie,
            served: 0,
            fail_after: failures.cursor_after,
        }))
    }

    fn close(&mut self) -> LdapResult<()> {
        self.record(Call::Close);
        if self.failures().close {
            return Err(LdapError::connection("connection reset"));
        }
        Ok(())
    }
}

struct FakeCursor {
    state: Rc<RefCell<State>>,
    entries: VecDeque<RawEntry>,
    cookie: Option<Vec<u8>>,
    served: usize,
    fail_after: Option<usize>,
}

impl EntryCursor for FakeCursor {
    fn next_entry(&mut self) -> LdapResult<Option<RawEntry>> {
        if self.fail_after == Some(self.served) {
            return Err(LdapError::search("connection lost"));
        }
        self.served += 1;
        Ok(self.entries.pop_front())
    }

    fn finish(&mut self) -> LdapResult<Option<Vec<u8>>> {
        self.state.borrow_mut().calls.push(Call::Finish);
        Ok(self.cookie.take())
    }
}

/// Creates a person entry with `uid` and `cn`.
pub fn person(uid: &str) -> RawEntry {
    RawEntry::new(format!("uid={uid},ou=people,dc=example,dc=com"))
        .with_attribute("uid", [uid])
        .with_attribute("cn", [format!("User {uid}")])
}

/// Creates `count` person entries named `prefix0`, `prefix1`...
pub fn people(prefix: &str, count: usize) -> Vec<RawEntry> {
    (0..count).map(|i| person(&format!("{prefix}{i}"))).collect()
}
