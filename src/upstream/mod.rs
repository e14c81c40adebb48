//! Upstream selection subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyConfig.upstreams
//!     → UpstreamSet (ordered, non-empty, immutable)
//!     → selector.rs (sticky-with-failover or round-robin)
//!         → probe.rs (liveness check, sticky mode only)
//!     → one candidate base URL per request
//! ```
//!
//! # Design Decisions
//! - The set is fixed at startup; only the selector's slot/cursor mutates
//! - List order defines both probe priority and rotation order
//! - Selection logic is unit-testable without a network via the probe trait

pub mod probe;
pub mod selector;

use std::sync::Arc;

use thiserror::Error;
use url::Url;

pub use selector::{Selector, Strategy};

/// Error constructing an [`UpstreamSet`].
#[derive(Debug, Error)]
pub enum UpstreamSetError {
    #[error("upstream set must contain at least one base URL")]
    Empty,

    #[error("invalid upstream base URL `{value}`: {source}")]
    InvalidUrl {
        value: String,
        source: url::ParseError,
    },
}

/// Ordered, non-empty list of candidate upstream base URLs.
///
/// Immutable after startup. Cheap to clone; the backing list is shared.
#[derive(Debug, Clone)]
pub struct UpstreamSet {
    bases: Arc<Vec<Url>>,
}

impl UpstreamSet {
    /// Build a set from already-parsed URLs. Fails on an empty list.
    pub fn new(bases: Vec<Url>) -> Result<Self, UpstreamSetError> {
        if bases.is_empty() {
            return Err(UpstreamSetError::Empty);
        }
        Ok(Self {
            bases: Arc::new(bases),
        })
    }

    /// Parse raw base strings, preserving order.
    pub fn parse(raw: &[String]) -> Result<Self, UpstreamSetError> {
        let mut bases = Vec::with_capacity(raw.len());
        for value in raw {
            let url = Url::parse(value).map_err(|source| UpstreamSetError::InvalidUrl {
                value: value.clone(),
                source,
            })?;
            bases.push(url);
        }
        Self::new(bases)
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Candidate at `index` modulo the set length.
    pub fn cyclic(&self, index: usize) -> &Url {
        &self.bases[index % self.bases.len()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Url> {
        self.bases.iter()
    }

    /// Display labels for every candidate, in order.
    pub fn labels(&self) -> Vec<String> {
        self.bases.iter().map(|u| base_label(u)).collect()
    }
}

/// Human-readable label for an upstream base (no trailing slash).
pub fn base_label(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}

/// Append `path_and_query` to a base URL, keeping any path component the
/// base already carries. `Url::join` would resolve an absolute path against
/// the host root and drop e.g. `/gateway` from `https://host/gateway`.
pub fn join_path(base: &Url, path_and_query: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("{}{}", base_label(base), path_and_query))
}
