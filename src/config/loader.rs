//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::SubmitterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Endpoint URL override. Hosted endpoints embed API keys, so this is the
/// preferred way to supply one.
pub const RPC_ENDPOINT_ENV: &str = "RPC_ENDPOINT";
/// Chain ID override.
pub const CHAIN_ID_ENV: &str = "DCA_CHAIN_ID";
/// Contract address override.
pub const CONTRACT_ADDRESS_ENV: &str = "DCA_CONTRACT_ADDRESS";
/// Operator key file override.
pub const PRIVATE_KEY_FILE_ENV: &str = "DCA_PRIVATE_KEY_FILE";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value in {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse configuration from a TOML file. Not validated.
pub fn load_config(path: &Path) -> Result<SubmitterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut SubmitterConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(RPC_ENDPOINT_ENV) {
        config.blockchain.rpc_url = url;
    }

    if let Some(raw) = lookup(CHAIN_ID_ENV) {
        config.blockchain.chain_id = raw.trim().parse().map_err(|e| ConfigError::Env {
            var: CHAIN_ID_ENV,
            reason: format!("{}", e),
        })?;
    }

    if let Some(raw) = lookup(CONTRACT_ADDRESS_ENV) {
        let address = raw.trim().parse().map_err(|e| ConfigError::Env {
            var: CONTRACT_ADDRESS_ENV,
            reason: format!("{}", e),
        })?;
        config.contract.address = Some(address);
    }

    if let Some(path) = lookup(PRIVATE_KEY_FILE_ENV) {
        config.secrets.key_file = PathBuf::from(path);
    }

    Ok(())
}

/// Load the file (or defaults) and apply process environment overrides.
pub fn read_config(path: Option<&Path>) -> Result<SubmitterConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => SubmitterConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    Ok(config)
}

/// [`read_config`], then validate.
pub fn resolve_config(path: Option<&Path>) -> Result<SubmitterConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
