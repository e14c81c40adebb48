//! Upstream liveness probing.
//!
//! # Responsibilities
//! - Issue a cheap liveness request against one upstream
//! - Report Up/Down within a bounded deadline
//!
//! # Design Decisions
//! - Any transport error, timeout, or non-2xx status is Down
//! - Probes never mutate selector state; the selector interprets results
//! - The trait seam lets selector tests run without sockets

use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::observability::metrics;
use crate::upstream::{base_label, join_path};

/// Path of the upstream's lightweight liveness endpoint.
pub const PING_PATH: &str = "/api/v3/ping";

/// Outcome of a single liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    Up,
    Down,
}

impl ProbeResult {
    pub fn is_up(self) -> bool {
        self == ProbeResult::Up
    }
}

/// A liveness check against one upstream.
pub trait HealthProbe {
    fn check(&self, upstream: &Url) -> impl Future<Output = ProbeResult> + Send;
}

/// HTTP probe hitting `GET {base}/api/v3/ping`.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    deadline: Duration,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client, deadline: Duration) -> Self {
        Self { client, deadline }
    }
}

impl HealthProbe for HttpProbe {
    async fn check(&self, upstream: &Url) -> ProbeResult {
        let target = match join_path(upstream, PING_PATH) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(upstream = %base_label(upstream), error = %e, "Unusable upstream base for probe");
                return ProbeResult::Down;
            }
        };

        let result = match self
            .client
            .get(target)
            .timeout(self.deadline)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => ProbeResult::Up,
            Ok(response) => {
                tracing::warn!(
                    upstream = %base_label(upstream),
                    status = %response.status(),
                    "Probe failed: non-success status"
                );
                ProbeResult::Down
            }
            Err(e) => {
                tracing::warn!(upstream = %base_label(upstream), error = %e, "Probe failed");
                ProbeResult::Down
            }
        };

        metrics::record_upstream_health(&base_label(upstream), result.is_up());
        result
    }
}
