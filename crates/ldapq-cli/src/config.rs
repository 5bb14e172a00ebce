//! CLI configuration.
//!
//! The configuration file holds the default output format and a
//! `[parameters]` table of default search parameters, keyed by parameter
//! name:
//!
//! ```toml
//! output_format = "table"
//!
//! [parameters]
//! host = "ldap.example.com"
//! port = 636
//! protocol = "LDAPS"
//! baseObject = "dc=example,dc=com"
//! ```

use std::path::{Path, PathBuf};

use ldapq_core::params::{
    ParameterMap, PAGE_SIZE, PASSWORD, PORT, REFERRAL_HANDLING, SIZE_LIMIT, TIME_LIMIT,
};
use ldapq_core::config::{DEFAULT_PORT, DEFAULT_REFERRAL_HANDLING};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CliError, CliResult};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Output format.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Default search parameters.
    #[serde(default)]
    pub parameters: toml::Table,
}

impl CliConfig {
    /// Loads configuration from `path`, or from the default location.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let config_path = Self::resolve_path(path)?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves configuration to `path`, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> CliResult<PathBuf> {
        let config_path = Self::resolve_path(path)?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&config_path, toml::to_string_pretty(self)?)?;
        Ok(config_path)
    }

    /// Returns the configuration file path.
    pub fn resolve_path(path: Option<&Path>) -> CliResult<PathBuf> {
        match path {
            Some(p) => Ok(p.to_path_buf()),
            None => Self::default_path(),
        }
    }

    /// Gets the default configuration file path.
    pub fn default_path() -> CliResult<PathBuf> {
        let home = dirs_next::home_dir()
            .ok_or_else(|| CliError::Config("could not determine home directory".to_string()))?;
        Ok(home.join(".ldapq").join("config.toml"))
    }

    /// Returns a starter configuration with the default limits filled in.
    #[must_use]
    pub fn template() -> Self {
        let mut parameters = toml::Table::new();
        parameters.insert("host".into(), "localhost".into());
        parameters.insert(PORT.into(), DEFAULT_PORT.into());
        parameters.insert("protocol".into(), "LDAP".into());
        parameters.insert("baseObject".into(), "dc=example,dc=com".into());
        parameters.insert("scope".into(), "SUBTREE".into());
        parameters.insert(REFERRAL_HANDLING.into(), DEFAULT_REFERRAL_HANDLING.into());

        Self {
            output_format: OutputFormat::default(),
            parameters,
        }
    }

    /// Returns the search parameters: built-in defaults overlaid with the
    /// file's `[parameters]` table.
    pub fn search_parameters(&self) -> CliResult<ParameterMap> {
        let mut params = default_parameters();
        match serde_json::to_value(&self.parameters)? {
            Value::Object(file) => params.extend(file),
            _ => {
                return Err(CliError::Config(
                    "[parameters] must be a table".to_string(),
                ))
            }
        }
        Ok(params)
    }

    /// Returns the parameters with the password masked, for display.
    #[must_use]
    pub fn masked_parameters(&self) -> toml::Table {
        let mut parameters = self.parameters.clone();
        if let Some(password) = parameters.get_mut(PASSWORD) {
            *password = "****".into();
        }
        parameters
    }
}

/// Parameters a search starts from before the file and flags apply.
#[must_use]
pub fn default_parameters() -> ParameterMap {
    let mut params = ParameterMap::new();
    params.insert(PORT.to_string(), DEFAULT_PORT.into());
    params.insert(SIZE_LIMIT.to_string(), 0.into());
    params.insert(PAGE_SIZE.to_string(), 0.into());
    params.insert(TIME_LIMIT.to_string(), 0.into());
    params.insert(
        REFERRAL_HANDLING.to_string(),
        DEFAULT_REFERRAL_HANDLING.into(),
    );
    params
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
    /// YAML format.
    Yaml,
    /// Quiet (entry count only).
    Quiet,
}
