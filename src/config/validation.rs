//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the upstream set is non-empty and every base URL parses
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("upstreams.bases must not be empty")]
    NoUpstreams,

    #[error("invalid upstream base URL `{0}`")]
    InvalidUpstream(String),

    #[error("invalid keep_alive.self_url `{0}`")]
    InvalidSelfUrl(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstreams.bases.is_empty() {
        errors.push(ValidationError::NoUpstreams);
    }
    for base in &config.upstreams.bases {
        if Url::parse(base).is_err() {
            errors.push(ValidationError::InvalidUpstream(base.clone()));
        }
    }

    if let Some(url) = &config.keep_alive.self_url {
        if Url::parse(url).is_err() {
            errors.push(ValidationError::InvalidSelfUrl(url.clone()));
        }
    }

    let timeouts = [
        ("probe_secs", config.timeouts.probe_secs),
        ("forward_secs", config.timeouts.forward_secs),
        ("request_secs", config.timeouts.request_secs),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
