//! Search client integration tests.
//!
//! These tests drive the executor, the parameter pipeline and referral
//! following against an in-memory directory.

mod common;
mod executor;
mod referrals;
