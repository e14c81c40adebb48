//! Forwarding and relay subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request path + query
//!     → forward.rs (selector dispenses a candidate,
//!        bounded retry: one failure → invalidate → one re-attempt)
//!     → relay.rs (JSON re-emitted structured, text passed through,
//!        /prices summarised)
//!     → client response or aggregate ProxyError
//! ```

pub mod forward;
pub mod relay;

pub use forward::{forward_with_failover, Forwarder, PayloadRule, MAX_ATTEMPTS};
pub use relay::RelayMode;
