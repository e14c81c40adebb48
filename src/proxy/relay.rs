//! Response relaying.
//!
//! # Responsibilities
//! - Re-emit JSON upstream bodies as structured JSON
//! - Relay non-JSON bodies verbatim in passthrough mode, preserving the
//!   upstream content type
//! - Shape the `/prices` summary (`{base, count, prices}`)

use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::proxy::forward::{Forwarded, PayloadRule};
use crate::upstream::base_label;

/// How the generic passthrough route treats non-JSON upstream bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayMode {
    /// Relay non-JSON bodies as raw text, unchanged.
    #[default]
    Passthrough,
    /// Treat non-JSON bodies as a failure and rotate upstreams.
    Strict,
}

impl RelayMode {
    pub fn payload_rule(self) -> PayloadRule {
        match self {
            RelayMode::Passthrough => PayloadRule::Opaque,
            RelayMode::Strict => PayloadRule::JsonRequired,
        }
    }
}

/// Summary shape served by `/prices`.
#[derive(Debug, Serialize)]
pub struct PriceSummary {
    pub base: String,
    pub count: usize,
    pub prices: Value,
}

/// Convert a forwarded upstream response into the client response.
///
/// JSON bodies are re-emitted structured; anything else passes through
/// byte for byte with the upstream's content type and status.
pub fn relay(forwarded: Forwarded) -> Response {
    let Forwarded {
        status,
        content_type,
        body,
        ..
    } = forwarded;

    match serde_json::from_slice::<Value>(&body) {
        Ok(value) => (status, Json(value)).into_response(),
        Err(_) => {
            let mut response = (status, body).into_response();
            if let Some(ct) = content_type {
                response.headers_mut().insert(header::CONTENT_TYPE, ct);
            }
            response
        }
    }
}

/// Shape the `/prices` response from a JSON-validated forward.
pub fn price_summary(forwarded: &Forwarded) -> PriceSummary {
    let prices: Value = serde_json::from_slice(&forwarded.body).unwrap_or(Value::Null);
    let count = prices.as_array().map(|a| a.len()).unwrap_or(1);
    PriceSummary {
        base: base_label(&forwarded.upstream),
        count,
        prices,
    }
}
