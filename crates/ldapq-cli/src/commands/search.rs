//! Search and validate commands.

use ldapq_core::{
    decode_parameters, DirectoryClient, Ldap3Client, SearchExecutor, SearchPlan, SearchResult,
};
use tracing::debug;

use crate::cli::SearchArgs;
use crate::config::OutputFormat;
use crate::output::{print_entries, success};
use crate::CliConfig;

use super::resolve_parameters;

/// Runs a search and prints the entries.
pub fn run_search(
    args: &SearchArgs,
    config: &CliConfig,
    output_format: OutputFormat,
) -> crate::CliResult<()> {
    let entries = search_with(Ldap3Client::default(), args, config)?;
    print_entries(&entries, output_format)
}

/// Runs a search through the given directory client.
pub fn search_with<C: DirectoryClient>(
    client: C,
    args: &SearchArgs,
    config: &CliConfig,
) -> crate::CliResult<SearchResult> {
    let params = resolve_parameters(config, args)?;
    Ok(SearchExecutor::new(client).run(&params)?)
}

/// Decodes and validates the parameters without connecting.
pub fn run_validate(args: &SearchArgs, config: &CliConfig) -> crate::CliResult<()> {
    let plan = plan(args, config)?;
    debug!(plan = ?plan, "validated search plan");

    let paging = if plan.is_paged() {
        format!("pages of {}", plan.page_size)
    } else {
        "no paging".to_string()
    };
    success(&format!(
        "Parameters are valid: {} {} ({paging})",
        plan.endpoint.url(),
        plan.controls.base_object,
    ));
    Ok(())
}

/// Builds the search plan from file parameters and flags.
pub fn plan(args: &SearchArgs, config: &CliConfig) -> crate::CliResult<SearchPlan> {
    let params = resolve_parameters(config, args)?;
    let search_config = decode_parameters(&params)?;
    Ok(SearchPlan::from_configuration(&search_config)?)
}
