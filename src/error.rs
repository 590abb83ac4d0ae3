//! Error taxonomy shared by every stage of a request.
//!
//! # Categories
//! - Configuration: invalid option, URL, header, query or coercion failures
//! - Body: missing or failing encoder/decoder, body read failures
//! - Transport: propagated verbatim from the underlying client
//! - Hook: errors returned by user callbacks, wrapped in [`Error::Custom`]
//!
//! # Design Decisions
//! - `Error` is `Clone` so a request can keep it as a sticky `last_error`
//! - Foreign error sources are held behind `Arc` to stay cloneable

use std::sync::Arc;

use thiserror::Error;

/// Boxed error accepted from user callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while composing, reconciling or executing a request.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An option entry nobody knows how to apply.
    #[error("invalid option type: {0}")]
    InvalidOption(&'static str),

    /// A top-level value that cannot become a key/value list.
    #[error("unsupported type for coercion: {0}")]
    Unsupported(&'static str),

    /// The value's `Serialize` impl failed.
    #[error("serialize value: {0}")]
    Serialize(Arc<serde_json::Error>),

    /// Coercing `Request::query` failed during reconciliation.
    #[error("build query values: {0}")]
    BuildQuery(#[source] Box<Error>),

    /// The resolved URL does not parse.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header name or value rejected by the `http` crate.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The transport request could not be assembled.
    #[error("http: {0}")]
    Http(String),

    /// No hook provides an `encode` slot.
    #[error("no encoder")]
    NoEncoder,

    /// No hook provides a `decode` slot.
    #[error("no decoder")]
    NoDecoder,

    /// A registered encoder failed.
    #[error("encode body: {0}")]
    Encode(String),

    /// A registered decoder failed, or the decoded value did not fit the target.
    #[error("decode body: {0}")]
    Decode(String),

    /// Reading or producing a body stream failed.
    #[error("read body: {0}")]
    Body(String),

    /// The transport returned an error.
    #[error("transport: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),

    /// The request context was cancelled.
    #[error("request cancelled")]
    Cancelled,

    /// The request context deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// An error raised by a hook or option callback.
    #[error("{0}")]
    Custom(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an arbitrary error (or message) raised by user code.
    pub fn custom(err: impl Into<BoxError>) -> Self {
        Error::Custom(Arc::from(err.into()))
    }

    /// Wrap an error returned by a transport.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Error::Transport(Arc::from(err.into()))
    }

    pub(crate) fn body(err: impl std::fmt::Display) -> Self {
        Error::Body(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialize(Arc::new(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Error::Http(err.to_string())
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
