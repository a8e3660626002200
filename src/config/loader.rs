//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::security::RateLimitError;

pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_BIND_ADDRESS: &str = "BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Invalid rate limit: {0}")]
    RateLimit(#[from] RateLimitError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let config = read_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load the file if given and present, apply environment overrides, validate.
///
/// A `.env` file in the working directory is read into the environment first.
pub fn load_with_env(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    if let Ok(env_file) = dotenvy::dotenv() {
        tracing::debug!(path = ?env_file, "Loaded .env file");
    }

    let mut config = match path {
        Some(path) if path.exists() => read_file(path)?,
        Some(path) => {
            tracing::warn!(path = ?path, "Config file not found, using defaults");
            GatewayConfig::default()
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables on top of file values. Environment wins.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
        config.auth.api_key = key;
    }
    if let Some(addr) = lookup(ENV_BIND_ADDRESS).filter(|v| !v.is_empty()) {
        config.listener.bind_address = addr;
    }
}

fn read_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}
