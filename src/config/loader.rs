//! Configuration loading from disk and the environment.
//!
//! Precedence, lowest to highest: built-in defaults, TOML file, environment
//! variables (`PORT`, `SELF_URL`, `UPSTREAM_BASES`).

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", "))]
    Validation(Vec<ValidationError>),
}

/// Load, override, and validate a configuration.
///
/// With no path, defaults plus environment overrides apply.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config: ProxyConfig = match path {
        Some(p) => toml::from_str(&fs::read_to_string(p)?)?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment variable overrides to a loaded configuration.
pub fn apply_env_overrides(config: &mut ProxyConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides<F>(config: &mut ProxyConfig, get: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = get("PORT") {
        match port.parse() {
            Ok(p) => config.listener.port = p,
            Err(_) => tracing::warn!(value = %port, "Ignoring unparseable PORT"),
        }
    }

    if let Some(url) = get("SELF_URL") {
        if !url.is_empty() {
            config.keep_alive.self_url = Some(url);
        }
    }

    if let Some(raw) = get("UPSTREAM_BASES") {
        let bases: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !bases.is_empty() {
            config.upstreams.bases = bases;
        }
    }
}
