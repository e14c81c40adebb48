//! HTTP server setup and request handlers.
//!
//! # Responsibilities
//! - Create the Axum router with the inbound surface:
//!   `/`, `/prices`, `/api/v3/{*path}`, `/keep-alive`
//! - Wire up middleware (request ID, CORS, timeout, tracing)
//! - Dispatch requests through the selector → forwarder → relay pipeline
//! - Serve with graceful shutdown

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::extract::{RawQuery, State};
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::observability::metrics;
use crate::proxy::forward::{forward_with_failover, Forwarder, PayloadRule};
use crate::proxy::relay::{price_summary, relay, RelayMode};
use crate::upstream::probe::HttpProbe;
use crate::upstream::{base_label, Selector, UpstreamSet, UpstreamSetError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub selector: Arc<Selector>,
    pub probe: Arc<HttpProbe>,
    pub forwarder: Arc<Forwarder>,
    pub relay_mode: RelayMode,
}

/// HTTP server for the market-data proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server from a validated configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, UpstreamSetError> {
        let upstreams = UpstreamSet::parse(&config.upstreams.bases)?;
        let selector = Arc::new(Selector::new(upstreams, config.selector.strategy));

        // One client, shared by probes and forwards.
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("failed to build upstream HTTP client");

        let probe = Arc::new(HttpProbe::new(
            client.clone(),
            Duration::from_secs(config.timeouts.probe_secs),
        ));
        let forwarder = Arc::new(Forwarder::new(
            client,
            Duration::from_secs(config.timeouts.forward_secs),
        ));

        let state = AppState {
            selector,
            probe,
            forwarder,
            relay_mode: config.relay.mode,
        };

        Ok(Self {
            router: Self::build_router(&config, state),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(root))
            .route("/prices", get(prices))
            .route("/keep-alive", get(keep_alive))
            .route("/api/v3/{*path}", get(passthrough))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(CorsLayer::permissive())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Service descriptor.
async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "API Proxy Server Running",
        "endpoints": ["/prices", "/api/v3/...", "/keep-alive"],
    }))
}

/// Liveness for the proxy itself (also the self-ping target).
async fn keep_alive() -> impl IntoResponse {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Json(json!({ "status": "ok", "timestamp": timestamp }))
}

/// Shortcut for the ticker-price query; always JSON-validated.
async fn prices(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ProxyError> {
    let start = Instant::now();
    let path_and_query = match query {
        Some(q) => format!("/api/v3/ticker/price?{q}"),
        None => "/api/v3/ticker/price".to_string(),
    };

    match forward_with_failover(
        &state.selector,
        state.probe.as_ref(),
        &state.forwarder,
        &path_and_query,
        PayloadRule::JsonRequired,
    )
    .await
    {
        Ok(forwarded) => {
            metrics::record_request("GET", forwarded.status.as_u16(), &base_label(&forwarded.upstream), start);
            Ok(Json(price_summary(&forwarded)).into_response())
        }
        Err(err) => {
            metrics::record_request("GET", 500, "none", start);
            Err(err)
        }
    }
}

/// Generic passthrough for any path under `/api/v3/`.
async fn passthrough(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let start = Instant::now();
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::debug!(
        request_id = %request_id,
        path = %path_and_query,
        "Proxying request"
    );

    match forward_with_failover(
        &state.selector,
        state.probe.as_ref(),
        &state.forwarder,
        &path_and_query,
        state.relay_mode.payload_rule(),
    )
    .await
    {
        Ok(forwarded) => {
            metrics::record_request("GET", forwarded.status.as_u16(), &base_label(&forwarded.upstream), start);
            Ok(relay(forwarded))
        }
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, "Request failed");
            metrics::record_request("GET", 500, "none", start);
            Err(err)
        }
    }
}
