//! Transport boundary.
//!
//! # Data Flow
//! ```text
//! HttpRequest
//!     → hook middleware (HandleRequest), outermost first
//!     → baseline Transport (reqwest or hyper-util client)
//!     → HttpResponse (streaming body)
//! ```
//!
//! # Design Decisions
//! - A transport is a boxed `tower::Service`, so any tower layer can wrap it
//! - The baseline is a process-wide reqwest client (TLS, pooling)
//! - No retries or timeouts here; cancellation comes from the request context

pub mod client;
pub mod pooled;

use std::future::Future;
use std::sync::OnceLock;

use tower::util::BoxCloneSyncService;

use crate::error::{Error, Result};

pub use axum::body::Body;
pub use client::ReqwestTransport;
pub use pooled::HyperTransport;

/// Transport-level request.
pub type HttpRequest = http::Request<Body>;

/// Transport-level response. The body is still streaming.
pub type HttpResponse = http::Response<Body>;

/// A type-erased, cloneable round-trip service.
pub type Transport = BoxCloneSyncService<HttpRequest, HttpResponse, Error>;

/// The shared baseline transport used when no hook replaces it.
pub fn default_transport() -> Transport {
    static CLIENT: OnceLock<ReqwestTransport> = OnceLock::new();
    let client = CLIENT.get_or_init(ReqwestTransport::default).clone();
    Transport::new(client)
}

/// Build a [`Transport`] from an async function.
pub fn transport_fn<F, Fut>(f: F) -> Transport
where
    F: Fn(HttpRequest) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
{
    Transport::new(tower::service_fn(f))
}
