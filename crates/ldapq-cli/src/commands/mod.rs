//! Command implementations.

pub mod config;
pub mod search;

pub use config::run_config;
pub use search::{run_search, run_validate};

use ldapq_core::ParameterMap;

use crate::cli::SearchArgs;
use crate::CliConfig;

/// Merges built-in defaults, file parameters and command-line flags, in
/// increasing precedence.
pub fn resolve_parameters(config: &CliConfig, args: &SearchArgs) -> crate::CliResult<ParameterMap> {
    let mut params = config.search_parameters()?;
    args.apply(&mut params);
    Ok(params)
}
