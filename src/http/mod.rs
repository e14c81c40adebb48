//! HTTP surface subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router + middleware)
//!     → request.rs (request ID)
//!     → [upstream selector picks a candidate]
//!     → [proxy forwards and relays]
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
