//! Market-data failover proxy library.
//!
//! A stateless HTTP reverse proxy that forwards market-data requests to one
//! of several candidate upstream hosts, rotating automatically when one
//! fails or returns invalid data.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod upstream;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
