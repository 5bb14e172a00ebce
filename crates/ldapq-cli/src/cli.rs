//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ldapq_core::params::{
    ParameterMap, ATTRIBUTES, BASE_OBJECT, CERTIFICATE_PATH, DEREF_ALIASES, FILTER, HOST,
    PAGE_SIZE, PASSWORD, PORT, PROTOCOL, REFERRAL_HANDLING, SCOPE, SIZE_LIMIT, TIME_LIMIT,
    USERNAME,
};
use serde_json::Value;

use crate::config::OutputFormat;

/// ldapq - search LDAP directories from the command line.
#[derive(Debug, Parser)]
#[command(name = "ldapq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to ~/.ldapq/config.toml).
    #[arg(short, long, env = "LDAPQ_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (overrides config).
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search the directory.
    Search(SearchArgs),

    /// Check search parameters without connecting.
    Validate(SearchArgs),

    /// Configuration management.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Search parameters. Flags override the configuration file.
#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    /// Directory server host.
    #[arg(short = 'H', long, env = "LDAPQ_HOST")]
    pub host: Option<String>,

    /// Directory server port.
    #[arg(short, long)]
    pub port: Option<i64>,

    /// Protocol: LDAP, LDAPS or TLS (StartTLS).
    #[arg(short = 'P', long)]
    pub protocol: Option<String>,

    /// Bind DN.
    #[arg(short = 'D', long = "bind-dn", env = "LDAPQ_BIND_DN")]
    pub username: Option<String>,

    /// Bind password.
    #[arg(short = 'w', long, env = "LDAPQ_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Additional trusted certificate (PEM or DER).
    #[arg(long = "certificate")]
    pub certificate_path: Option<String>,

    /// Search base DN.
    #[arg(short, long = "base")]
    pub base_object: Option<String>,

    /// Scope: BASE, ONELEVEL or SUBTREE.
    #[arg(short, long)]
    pub scope: Option<String>,

    /// Search filter, e.g. "(uid=jdoe)".
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Comma-separated attributes to return.
    #[arg(short, long)]
    pub attributes: Option<String>,

    /// Maximum number of entries (0 = unbounded).
    #[arg(short = 'z', long)]
    pub size_limit: Option<i64>,

    /// Entries per page (0 = no paging).
    #[arg(long)]
    pub page_size: Option<i64>,

    /// Time limit in seconds (0 = unbounded).
    #[arg(short = 'l', long)]
    pub time_limit: Option<i64>,

    /// Referral handling: ignore or follow.
    #[arg(long = "referrals")]
    pub referral_handling: Option<String>,

    /// Alias dereferencing: NEVER, SEARCHING, FINDING or ALWAYS.
    #[arg(long)]
    pub deref_aliases: Option<String>,
}

impl SearchArgs {
    /// Overlays every flag that was given onto `params`.
    pub fn apply(&self, params: &mut ParameterMap) {
        let strings = [
            (HOST, &self.host),
            (PROTOCOL, &self.protocol),
            (USERNAME, &self.username),
            (PASSWORD, &self.password),
            (CERTIFICATE_PATH, &self.certificate_path),
            (BASE_OBJECT, &self.base_object),
            (SCOPE, &self.scope),
            (FILTER, &self.filter),
            (ATTRIBUTES, &self.attributes),
            (REFERRAL_HANDLING, &self.referral_handling),
            (DEREF_ALIASES, &self.deref_aliases),
        ];
        for (name, value) in strings {
            if let Some(value) = value {
                params.insert(name.to_string(), Value::from(value.as_str()));
            }
        }

        let numbers = [
            (PORT, self.port),
            (SIZE_LIMIT, self.size_limit),
            (PAGE_SIZE, self.page_size),
            (TIME_LIMIT, self.time_limit),
        ];
        for (name, value) in numbers {
            if let Some(value) = value {
                params.insert(name.to_string(), Value::from(value));
            }
        }
    }
}

/// Config commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,

    /// Write a starter configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}
