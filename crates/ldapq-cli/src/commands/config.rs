//! Configuration management commands.

use std::path::Path;

use crate::cli::ConfigCommand;
use crate::output::{info, print_yaml, success};
use crate::CliConfig;

/// Runs a config command.
pub fn run_config(
    cmd: ConfigCommand,
    config: &CliConfig,
    path: Option<&Path>,
) -> crate::CliResult<()> {
    match cmd {
        ConfigCommand::Show => show_config(config, path),
        ConfigCommand::Init { force } => init_config(path, force),
    }
}

/// Shows the current configuration, password masked.
fn show_config(config: &CliConfig, path: Option<&Path>) -> crate::CliResult<()> {
    let config_path = CliConfig::resolve_path(path)?;

    info(&format!("Configuration file: {}", config_path.display()));
    println!();
    println!("output_format: {:?}", config.output_format);

    if config.parameters.is_empty() {
        println!("parameters: (none)");
    } else {
        let masked = serde_json::to_value(config.masked_parameters())?;
        print_yaml(&serde_json::json!({ "parameters": masked }));
    }

    Ok(())
}

/// Writes the starter configuration.
fn init_config(path: Option<&Path>, force: bool) -> crate::CliResult<()> {
    let config_path = CliConfig::resolve_path(path)?;

    if config_path.exists() && !force {
        return Err(crate::CliError::InvalidArgument(format!(
            "{} already exists; use --force to overwrite",
            config_path.display()
        )));
    }

    let written = CliConfig::template().save(Some(&config_path))?;
    success(&format!("Configuration saved to: {}", written.display()));
    Ok(())
}
