//! Proxy error taxonomy.
//!
//! # Responsibilities
//! - Distinguish "no candidate was reachable" from "forwarding gave up"
//! - Render both as a 500 JSON body naming every upstream attempted

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failure of a whole inbound request, after selection and retries.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No upstream answered its health probe.
    #[error("All bases failed")]
    ResolutionFailed { tried: Vec<String> },

    /// Every forwarding attempt failed within the retry bound.
    #[error("all forwarding attempts failed: {reason}")]
    Exhausted { tried: Vec<String>, reason: String },
}

impl ProxyError {
    /// Upstreams attempted before giving up, in order.
    pub fn tried(&self) -> &[String] {
        match self {
            ProxyError::ResolutionFailed { tried } => tried,
            ProxyError::Exhausted { tried, .. } => tried,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.to_string(),
            "tried": self.tried(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
