//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`; level from config, `RUST_LOG` wins
//! - Metrics are cheap (atomic increments) and exported for Prometheus
//! - Request IDs flow through logs via the HTTP layer

pub mod logging;
pub mod metrics;
