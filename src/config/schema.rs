//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files, and
//! every section carries defaults so a minimal (or absent) config works.

use serde::{Deserialize, Serialize};

use crate::proxy::relay::RelayMode;
use crate::upstream::selector::Strategy;

/// Root configuration for the market-data proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, port).
    pub listener: ListenerConfig,

    /// Candidate upstream base URLs, in failover/rotation order.
    pub upstreams: UpstreamConfig,

    /// Upstream selection strategy.
    pub selector: SelectorConfig,

    /// Response relay behaviour for the generic passthrough route.
    pub relay: RelayConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Self-ping keep-alive settings.
    pub keep_alive: KeepAliveConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Address to bind (without port).
    pub bind_address: String,

    /// Port to listen on. Overridable via the `PORT` environment variable.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Upstream candidate set.
///
/// Order matters: it defines probe priority in sticky mode and rotation
/// order in round-robin mode. Overridable via the `UPSTREAM_BASES`
/// environment variable (comma-separated).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URLs of the candidate upstream hosts.
    pub bases: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            bases: vec!["https://api.binance.com".to_string()],
        }
    }
}

/// Selector configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SelectorConfig {
    /// Active selection strategy. Sticky-with-failover by default.
    pub strategy: Strategy,
}

/// Relay configuration for `/api/v3/*` passthrough responses.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// `passthrough` relays non-JSON bodies verbatim; `strict` treats them
    /// as a failure and rotates to the next candidate.
    pub mode: RelayMode,
}

/// Timeout configuration for outbound operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Health probe deadline in seconds.
    pub probe_secs: u64,

    /// Per-attempt forwarding deadline in seconds.
    pub forward_secs: u64,

    /// Overall inbound request timeout in seconds. Should exceed two
    /// forwarding attempts plus a probe walk.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_secs: 5,
            forward_secs: 8,
            request_secs: 25,
        }
    }
}

/// Keep-alive self-ping configuration.
///
/// When a self URL is configured the proxy periodically pings its own
/// `/keep-alive` route so free-tier hosts do not put it to sleep.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    /// Public URL of this proxy. Overridable via the `SELF_URL` environment
    /// variable; the pinger is disabled when unset.
    pub self_url: Option<String>,

    /// Ping interval in seconds.
    pub interval_secs: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            self_url: None,
            interval_secs: 600,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
