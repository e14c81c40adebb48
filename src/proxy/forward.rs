//! Outbound forwarding and the bounded failover loop.
//!
//! # Responsibilities
//! - Build `{base}{path+query}` and execute it with a fixed deadline
//! - Classify each attempt: Success / TransportFailure / InvalidPayload
//! - Retry at most once per inbound request, rotating the selector between
//!   attempts
//!
//! # Design Decisions
//! - The retry bound is an explicit constant, not implied by code shape
//! - Upstream HTTP status is relayed as-is; only transport errors (and
//!   invalid JSON under the strict rule) trigger rotation
//! - Worst-case latency is roughly `MAX_ATTEMPTS` × the per-call deadline

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderValue, StatusCode};
use url::Url;

use crate::error::ProxyError;
use crate::upstream::probe::HealthProbe;
use crate::upstream::{base_label, join_path, Selector};

/// Maximum forwarding attempts per inbound request: one retry.
pub const MAX_ATTEMPTS: u32 = 2;

/// Bytes of raw body kept for diagnostics when a payload is invalid.
pub const SNIPPET_MAX: usize = 200;

/// How a forwarded response body is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadRule {
    /// Body must parse as JSON; anything else is a retryable failure.
    JsonRequired,
    /// Body is relayed as-is, whatever it contains.
    Opaque,
}

/// Classified result of a single forwarding attempt.
#[derive(Debug)]
pub enum ForwardOutcome {
    Success {
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
    },
    TransportFailure {
        reason: String,
    },
    InvalidPayload {
        snippet: String,
    },
}

/// A successfully forwarded response plus the upstream that served it.
#[derive(Debug)]
pub struct Forwarded {
    pub upstream: Url,
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Executes outbound calls against a chosen upstream.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    deadline: Duration,
}

impl Forwarder {
    pub fn new(client: reqwest::Client, deadline: Duration) -> Self {
        Self { client, deadline }
    }

    /// Forward `path_and_query` to one upstream and classify the result.
    pub async fn forward(
        &self,
        upstream: &Url,
        path_and_query: &str,
        rule: PayloadRule,
    ) -> ForwardOutcome {
        let target = match join_path(upstream, path_and_query) {
            Ok(url) => url,
            Err(e) => {
                return ForwardOutcome::TransportFailure {
                    reason: format!("unusable target URL: {e}"),
                }
            }
        };

        let response = match self
            .client
            .get(target)
            .timeout(self.deadline)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return ForwardOutcome::TransportFailure {
                    reason: e.to_string(),
                }
            }
        };

        let status = response.status();
        let content_type = response.headers().get(reqwest::header::CONTENT_TYPE).cloned();
        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                return ForwardOutcome::TransportFailure {
                    reason: format!("failed reading upstream body: {e}"),
                }
            }
        };

        if rule == PayloadRule::JsonRequired
            && serde_json::from_slice::<serde_json::Value>(&body).is_err()
        {
            return ForwardOutcome::InvalidPayload {
                snippet: snippet(&body),
            };
        }

        ForwardOutcome::Success {
            status,
            content_type,
            body,
        }
    }
}

/// Forward with the bounded failover policy.
///
/// Each failed attempt invalidates the selector and re-acquires once; a
/// second consecutive failure yields an aggregate error listing the
/// upstreams attempted.
pub async fn forward_with_failover<P: HealthProbe>(
    selector: &Selector,
    probe: &P,
    forwarder: &Forwarder,
    path_and_query: &str,
    rule: PayloadRule,
) -> Result<Forwarded, ProxyError> {
    let mut tried: Vec<String> = Vec::new();
    let mut last_reason = String::new();

    for attempt in 1..=MAX_ATTEMPTS {
        let upstream = selector.acquire(probe).await?;
        let label = base_label(&upstream);
        if !tried.contains(&label) {
            tried.push(label.clone());
        }

        match forwarder.forward(&upstream, path_and_query, rule).await {
            ForwardOutcome::Success {
                status,
                content_type,
                body,
            } => {
                return Ok(Forwarded {
                    upstream,
                    status,
                    content_type,
                    body,
                })
            }
            ForwardOutcome::TransportFailure { reason } => {
                tracing::warn!(
                    upstream = %label,
                    attempt,
                    error = %reason,
                    "Upstream call failed, rotating"
                );
                last_reason = reason;
            }
            ForwardOutcome::InvalidPayload { snippet } => {
                tracing::warn!(
                    upstream = %label,
                    attempt,
                    snippet = %snippet,
                    "Upstream returned invalid JSON, rotating"
                );
                last_reason = format!("invalid JSON response: {snippet}");
            }
        }

        selector.invalidate();
    }

    Err(ProxyError::Exhausted {
        tried,
        reason: last_reason,
    })
}

/// Bounded, UTF-8-safe prefix of a raw body for diagnostics.
fn snippet(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(SNIPPET_MAX)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_bounded() {
        let long = "x".repeat(SNIPPET_MAX * 3);
        assert_eq!(snippet(long.as_bytes()).chars().count(), SNIPPET_MAX);
    }

    #[test]
    fn snippet_keeps_short_bodies_whole() {
        assert_eq!(snippet(b"<html>oops</html>"), "<html>oops</html>");
    }

    #[test]
    fn snippet_survives_invalid_utf8() {
        let s = snippet(&[0xff, 0xfe, b'o', b'k']);
        assert!(s.ends_with("ok"));
    }
}
