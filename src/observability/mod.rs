//! Observability hooks.
//!
//! # Data Flow
//! ```text
//! Request::with_hook(...)
//!     → correlation.rs (x-request-id on the outgoing request)
//!     → metrics.rs (counter + latency histogram around the transport)
//!     → logging.rs (request/response dumps through tracing)
//! ```
//!
//! # Design Decisions
//! - Everything is an ordinary hook; nothing runs unless registered
//! - Events go through the `tracing` and `metrics` facades, so the host
//!   application decides where they end up
//! - The request ID is read back by the debug dump for correlation

pub mod correlation;
pub mod logging;
pub mod metrics;

pub use correlation::{request_id_hook, REQUEST_ID_HEADER};
pub use logging::{debug_hook, DebugOptions};
pub use self::metrics::metrics_hook;
