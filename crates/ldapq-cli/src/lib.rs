//! # ldapq-cli
//!
//! Command-line host for the `ldapq` directory search client.
//!
//! This crate provides:
//! - `ldapq search`: decode, validate and run a search, printing the entries
//!   as a table, JSON, YAML or a bare count
//! - `ldapq validate`: report every configuration problem without connecting
//! - `ldapq config show|init`: inspect or create `~/.ldapq/config.toml`

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
