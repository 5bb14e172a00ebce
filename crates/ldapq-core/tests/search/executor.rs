//! Search executor tests.

use ldapq_core::{
    LdapError, ProtocolMode, RawEntry, SearchConfiguration, SearchExecutor, SearchPlan, SearchScope,
};

use crate::common::{init_tracing, people, person, Call, FakeDirectory, Failures, Round};

const ADMIN: &str = "cn=admin,dc=example,dc=com";
const BASE: &str = "ou=people,dc=example,dc=com";

fn plan_with(protocol: ProtocolMode, page_size: i64, size_limit: i64) -> SearchPlan {
    let config = SearchConfiguration::builder()
        .host("ldap.example.com")
        .port(389)
        .protocol(protocol)
        .credentials(ADMIN, "secret")
        .base_object(BASE)
        .scope(SearchScope::Subtree)
        .filter("(objectClass=person)")
        .page_size(page_size)
        .size_limit(size_limit)
        .build();
    SearchPlan::from_configuration(&config).expect("valid plan")
}

fn plain(page_size: i64, size_limit: i64) -> SearchPlan {
    plan_with(ProtocolMode::Plain, page_size, size_limit)
}

fn uids(entries: &[ldapq_core::Entry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|e| e.get("uid").map(str::to_string))
        .collect()
}

/// Three pages concatenate in round order.
#[test]
fn test_paged_search_concatenates_rounds() -> anyhow::Result<()> {
    init_tracing();
    let directory = FakeDirectory::with_rounds(vec![
        Round::new(people("a", 2), Some(b"page-2")),
        Round::new(people("b", 2), Some(b"page-3")),
        Round::new(people("c", 1), Some(b"")),
    ]);
    let executor = SearchExecutor::new(directory.clone());

    let entries = executor.execute(&plain(2, 0))?;

    assert_eq!(uids(&entries), vec!["a0", "a1", "b0", "b1", "c0"]);
    assert_eq!(directory.count(|c| matches!(c, Call::Search { .. })), 3);
    assert_eq!(directory.count(|c| *c == Call::Finish), 3);
    Ok(())
}

/// The first paging request is advisory; follow-ups are critical and
/// carry the previous cookie.
#[test]
fn test_paging_controls_carry_cookies() -> anyhow::Result<()> {
    let directory = FakeDirectory::with_rounds(vec![
        Round::new(people("a", 1), Some(b"page-2")),
        Round::new(people("b", 1), Some(b"page-3")),
        Round::new(people("c", 1), None),
    ]);

    SearchExecutor::new(directory.clone()).execute(&plain(1, 0))?;

    let requests: Vec<_> = directory.page_requests().into_iter().flatten().collect();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.size == 1));
    assert!(!requests[0].critical);
    assert_eq!(requests[0].cookie, None);
    assert!(requests[1].critical);
    assert_eq!(requests[1].cookie.as_deref(), Some(&b"page-2"[..]));
    assert!(requests[2].critical);
    assert_eq!(requests[2].cookie.as_deref(), Some(&b"page-3"[..]));
    Ok(())
}

/// Size limit and page size are independent: pages are drained fully.
#[test]
fn test_paged_search_ignores_size_limit_within_page() -> anyhow::Result<()> {
    let directory = FakeDirectory::with_rounds(vec![Round::new(people("a", 4), None)]);

    let entries = SearchExecutor::new(directory).execute(&plain(10, 2))?;

    assert_eq!(entries.len(), 4);
    Ok(())
}

#[test]
fn test_non_paged_search_enforces_size_limit() -> anyhow::Result<()> {
    init_tracing();
    let directory = FakeDirectory::with_entries(people("u", 5));

    let entries = SearchExecutor::new(directory.clone()).execute(&plain(0, 2))?;

    assert_eq!(uids(&entries), vec!["u0", "u1"]);
    assert_eq!(directory.page_requests(), vec![None]);
    Ok(())
}

#[test]
fn test_non_paged_search_without_limit_returns_everything() -> anyhow::Result<()> {
    let directory = FakeDirectory::with_entries(people("u", 5));

    let entries = SearchExecutor::new(directory.clone()).execute(&plain(0, 0))?;

    assert_eq!(entries.len(), 5);
    assert_eq!(directory.count(|c| *c == Call::Finish), 1);
    Ok(())
}

#[test]
fn test_entries_without_attributes_are_excluded() -> anyhow::Result<()> {
    let directory = FakeDirectory::with_entries(vec![
        person("alice"),
        RawEntry::new("uid=hidden,ou=people,dc=example,dc=com"),
        person("bob"),
    ]);

    let entries = SearchExecutor::new(directory).execute(&plain(0, 0))?;

    assert_eq!(uids(&entries), vec!["alice", "bob"]);
    Ok(())
}

/// Filtered-out entries still count against the size limit.
#[test]
fn test_size_limit_counts_received_entries() -> anyhow::Result<()> {
    let directory = FakeDirectory::with_entries(vec![
        RawEntry::new("uid=hidden,ou=people,dc=example,dc=com"),
        person("alice"),
        person("bob"),
    ]);

    let entries = SearchExecutor::new(directory).execute(&plain(0, 2))?;

    assert_eq!(uids(&entries), vec!["alice"]);
    Ok(())
}

#[test]
fn test_plain_session_lifecycle() -> anyhow::Result<()> {
    let directory = FakeDirectory::with_entries(people("u", 1));

    SearchExecutor::new(directory.clone()).execute(&plain(0, 0))?;

    assert_eq!(
        directory.calls(),
        vec![
            Call::Connect("ldap://ldap.example.com:389".to_string()),
            Call::Bind(Some(ADMIN.to_string())),
            Call::Search {
                base: BASE.to_string(),
                page: None,
                referrals: ldapq_core::ReferralPolicy::Ignore,
            },
            Call::Finish,
            Call::Close,
        ]
    );
    Ok(())
}

/// StartTLS completes before credentials are sent and closes before the
/// session does.
#[test]
fn test_negotiated_session_binds_after_start_tls() -> anyhow::Result<()> {
    let directory = FakeDirectory::with_entries(people("u", 1));

    SearchExecutor::new(directory.clone()).execute(&plan_with(ProtocolMode::Negotiated, 0, 0))?;

    let calls = directory.calls();
    let position = |call: &Call| calls.iter().position(|c| c == call).expect("call recorded");
    assert!(position(&Call::StartTls) < position(&Call::Bind(Some(ADMIN.to_string()))));
    assert!(position(&Call::StopTls) < position(&Call::Close));
    assert_eq!(calls.last(), Some(&Call::Close));
    Ok(())
}

#[test]
fn test_encrypted_session_skips_start_tls() -> anyhow::Result<()> {
    let directory = FakeDirectory::with_entries(people("u", 1));

    SearchExecutor::new(directory.clone()).execute(&plan_with(ProtocolMode::Encrypted, 0, 0))?;

    assert_eq!(
        directory.calls().first(),
        Some(&Call::Connect("ldaps://ldap.example.com:389".to_string()))
    );
    assert_eq!(directory.count(|c| matches!(c, Call::StartTls | Call::StopTls)), 0);
    Ok(())
}

#[test]
fn test_anonymous_bind_without_credentials() -> anyhow::Result<()> {
    let directory = FakeDirectory::with_entries(people("u", 1));
    let mut plan = plain(0, 0);
    plan.credentials = None;

    SearchExecutor::new(directory.clone()).execute(&plan)?;

    assert_eq!(directory.count(|c| *c == Call::Bind(None)), 1);
    Ok(())
}

#[test]
fn test_search_failure_still_closes_once() {
    let directory = FakeDirectory::with_entries(people("u", 3));
    directory.fail(Failures {
        search: true,
        ..Failures::default()
    });

    let err = SearchExecutor::new(directory.clone())
        .execute(&plain(0, 0))
        .unwrap_err();

    assert!(matches!(err, LdapError::Search(_)));
    assert!(err.is_session_error());
    assert_eq!(directory.count(|c| *c == Call::Close), 1);
}

/// A failing cursor yields no partial result.
#[test]
fn test_cursor_failure_returns_no_partial_result() {
    let directory = FakeDirectory::with_entries(people("u", 5));
    directory.fail(Failures {
        cursor_after: Some(2),
        ..Failures::default()
    });

    let result = SearchExecutor::new(directory.clone()).execute(&plain(0, 0));

    assert!(result.is_err());
    assert_eq!(directory.count(|c| *c == Call::Close), 1);
    assert_eq!(directory.count(|c| *c == Call::Finish), 0);
}

#[test]
fn test_bind_failure_skips_search() {
    let directory = FakeDirectory::with_entries(people("u", 1));
    directory.fail(Failures {
        bind: true,
        ..Failures::default()
    });

    let err = SearchExecutor::new(directory.clone())
        .execute(&plain(0, 0))
        .unwrap_err();

    assert!(err.is_security_error());
    assert_eq!(directory.count(|c| matches!(c, Call::Search { .. })), 0);
    assert_eq!(directory.count(|c| *c == Call::Close), 1);
}

/// A failed handshake leaves no TLS layer to close.
#[test]
fn test_start_tls_failure_closes_session_only() {
    let directory = FakeDirectory::with_entries(people("u", 1));
    directory.fail(Failures {
        start_tls: true,
        ..Failures::default()
    });

    let err = SearchExecutor::new(directory.clone())
        .execute(&plan_with(ProtocolMode::Negotiated, 0, 0))
        .unwrap_err();

    assert!(matches!(err, LdapError::Tls(_)));
    assert_eq!(directory.count(|c| matches!(c, Call::Bind(_))), 0);
    assert_eq!(directory.count(|c| *c == Call::StopTls), 0);
    assert_eq!(directory.count(|c| *c == Call::Close), 1);
}

#[test]
fn test_connect_failure_opens_nothing() {
    let directory = FakeDirectory::default();
    directory.fail(Failures {
        connect: true,
        ..Failures::default()
    });

    let err = SearchExecutor::new(directory.clone())
        .execute(&plain(0, 0))
        .unwrap_err();

    assert!(matches!(err, LdapError::Connection(_)));
    assert!(directory.calls().is_empty());
}

/// Teardown failures are logged, never raised.
#[test]
fn test_teardown_failures_do_not_mask_success() -> anyhow::Result<()> {
    init_tracing();
    let directory = FakeDirectory::with_entries(people("u", 2));
    directory.fail(Failures {
        stop_tls: true,
        close: true,
        ..Failures::default()
    });

    let entries =
        SearchExecutor::new(directory.clone()).execute(&plan_with(ProtocolMode::Negotiated, 0, 0))?;

    assert_eq!(entries.len(), 2);
    assert_eq!(directory.count(|c| *c == Call::StopTls), 1);
    assert_eq!(directory.count(|c| *c == Call::Close), 1);
    Ok(())
}

/// Repeated runs on one executor share no results.
#[test]
fn test_results_are_not_shared_between_runs() -> anyhow::Result<()> {
    let directory = FakeDirectory::with_rounds(vec![
        Round::new(people("first", 2), None),
        Round::new(people("second", 1), None),
    ]);
    let executor = SearchExecutor::new(directory);

    let first = executor.execute(&plain(0, 0))?;
    let second = executor.execute(&plain(0, 0))?;

    assert_eq!(first.len(), 2);
    assert_eq!(uids(&second), vec!["second0"]);
    Ok(())
}
