//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Init logging/metrics → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C → broadcast signal → server drains, background tasks exit
//!
//! Keep-alive (keepalive.rs):
//!     Interval tick → GET {self_url}/keep-alive → host stays awake
//! ```

pub mod keepalive;
pub mod shutdown;

pub use keepalive::SelfPinger;
pub use shutdown::Shutdown;
