//! # ldapq
//!
//! Searches LDAP directories from the command line.

#![forbid(unsafe_code)]

use clap::Parser;
use ldapq_cli::{
    cli::{Cli, Command},
    commands::{run_config, run_search, run_validate},
    config::CliConfig,
    output::{error, warning},
    CliError,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "ldapq_core=debug,ldapq_cli=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error(&format!("Failed to load configuration: {e}"));
            std::process::exit(1);
        }
    };
    let output_format = cli.output.unwrap_or(config.output_format);

    // Execute command
    let result = match cli.command {
        Command::Search(args) => run_search(&args, &config, output_format),
        Command::Validate(args) => run_validate(&args, &config),
        Command::Config(cmd) => run_config(cmd, &config, cli.config.as_deref()),
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}

fn report(e: &CliError) {
    let violations = e.violations();
    if violations.is_empty() {
        error(&e.to_string());
    } else {
        error("invalid search configuration:");
        for violation in violations {
            warning(violation);
        }
    }
}
