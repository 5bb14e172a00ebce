//! Referral following tests.

use std::time::Duration;

use ldapq_core::referral::follow_referral;
use ldapq_core::{
    Credentials, DerefAliases, Endpoint, ProtocolMode, ReferralPolicy, SearchControls, SearchScope,
};

use crate::common::{people, Call, FakeDirectory};

fn origin(protocol: ProtocolMode) -> Endpoint {
    Endpoint {
        host: "ldap.example.com".to_string(),
        port: 389,
        protocol,
        certificate_path: None,
    }
}

fn controls() -> SearchControls {
    SearchControls {
        base_object: "dc=example,dc=com".to_string(),
        scope: SearchScope::Subtree,
        filter: "(objectClass=person)".to_string(),
        attributes: None,
        size_limit: 0,
        time_limit: Duration::ZERO,
        deref_aliases: DerefAliases::Always,
        referral_policy: ReferralPolicy::Follow,
    }
}

#[test]
fn test_referral_searches_referred_server() -> anyhow::Result<()> {
    let directory = FakeDirectory::default();
    directory.serve_host("east.example.com", people("east", 2));
    let credentials = Credentials::new("cn=admin,dc=example,dc=com", "secret");

    let entries = follow_referral(
        &directory,
        "ldap://east.example.com:1389/ou=east,dc=example,dc=com",
        &origin(ProtocolMode::Plain),
        Some(&credentials),
        &controls(),
    )?;

    assert_eq!(entries.len(), 2);
    assert_eq!(
        directory.calls(),
        vec![
            Call::Connect("ldap://east.example.com:1389".to_string()),
            Call::Bind(Some("cn=admin,dc=example,dc=com".to_string())),
            Call::Search {
                base: "ou=east,dc=example,dc=com".to_string(),
                page: None,
                referrals: ReferralPolicy::Ignore,
            },
            Call::Finish,
            Call::Close,
        ]
    );
    Ok(())
}

#[test]
fn test_referral_without_dn_keeps_base() -> anyhow::Result<()> {
    let directory = FakeDirectory::default();
    directory.serve_host("west.example.com", people("west", 1));

    follow_referral(
        &directory,
        "ldaps://west.example.com",
        &origin(ProtocolMode::Plain),
        None,
        &controls(),
    )?;

    let calls = directory.calls();
    assert_eq!(calls[0], Call::Connect("ldaps://west.example.com:636".to_string()));
    assert!(calls.iter().any(|c| matches!(
        c,
        Call::Search { base, .. } if base == "dc=example,dc=com"
    )));
    Ok(())
}

#[test]
fn test_referral_keeps_start_tls() -> anyhow::Result<()> {
    let directory = FakeDirectory::default();
    directory.serve_host("east.example.com", people("east", 1));

    follow_referral(
        &directory,
        "ldap://east.example.com/ou=east,dc=example,dc=com",
        &origin(ProtocolMode::Negotiated),
        None,
        &controls(),
    )?;

    let calls = directory.calls();
    assert_eq!(calls[1], Call::StartTls);
    assert_eq!(calls[2], Call::Bind(None));
    assert_eq!(&calls[calls.len() - 2..], &[Call::StopTls, Call::Close]);
    Ok(())
}

#[test]
fn test_malformed_referral_opens_nothing() {
    let directory = FakeDirectory::default();

    let result = follow_referral(
        &directory,
        "gopher://east.example.com/",
        &origin(ProtocolMode::Plain),
        None,
        &controls(),
    );

    assert!(result.is_err());
    assert!(directory.calls().is_empty());
}
