//! Declarative request descriptors.
//!
//! # Data Flow
//! ```text
//! Request literal / builder
//!     → compose.rs (with: pure merge, no I/O)
//!     → reconcile.rs (apply options, default method, build URL + query)
//!     → execute.rs (encode body, build HttpRequest, run hooks, round trip)
//!     → target.rs (decode / capture into fetch targets)
//! ```
//!
//! # Design Decisions
//! - A `Request` is a value: combinators return new values, nothing runs
//!   until reconciliation
//! - Options are a closed enum; unknown payloads go to `handle_option` hooks
//! - `last_error` is sticky: once set, every later stage returns it
//! - The resolved request is threaded alongside the transport request
//!   (`Prepared`) instead of being stashed in request extensions

mod compose;
mod context;
mod execute;
mod reconcile;
mod target;

pub use context::Context;
pub use execute::Prepared;
pub use target::{Decoded, Fetched, RequestHead, ResponseHead, Target};

use std::any::Any;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::extension::{Extension, Hook};
use crate::transport::Body;
use crate::values::Values;

/// A repeatable body producer, for streaming bodies that may be replayed.
///
/// Also inserted into the transport request's extensions so middleware can
/// obtain a fresh copy of the body.
#[derive(Clone)]
pub struct GetBody(Arc<dyn Fn() -> Result<Body> + Send + Sync>);

impl GetBody {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Result<Body> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Produce a fresh body.
    pub fn body(&self) -> Result<Body> {
        (self.0)()
    }
}

impl std::fmt::Debug for GetBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GetBody(..)")
    }
}

/// An option payload of a type the request does not know.
///
/// Handled by [`Hook::handle_option`] callbacks, which typically downcast it.
#[derive(Clone)]
pub struct CustomOption {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl CustomOption {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for CustomOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CustomOption").field(&self.type_name).finish()
    }
}

/// A deferred option, applied in order by [`Request::reconcile`].
#[derive(Clone)]
pub enum RequestOption {
    /// Folded into the request with [`Request::with`].
    Request(Box<Request>),
    /// Infallible mutation.
    Apply(Arc<dyn Fn(&mut Request) + Send + Sync>),
    /// Fallible mutation; an error aborts reconciliation.
    TryApply(Arc<dyn Fn(&mut Request) -> Result<()> + Send + Sync>),
    /// Registered into the extension before any other option runs.
    Hook(Hook),
    /// Offered to `handle_option` hooks.
    Custom(CustomOption),
}

impl RequestOption {
    pub fn apply<F>(f: F) -> Self
    where
        F: Fn(&mut Request) + Send + Sync + 'static,
    {
        RequestOption::Apply(Arc::new(f))
    }

    pub fn try_apply<F>(f: F) -> Self
    where
        F: Fn(&mut Request) -> Result<()> + Send + Sync + 'static,
    {
        RequestOption::TryApply(Arc::new(f))
    }

    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        RequestOption::Custom(CustomOption::new(value))
    }
}

impl From<Request> for RequestOption {
    fn from(req: Request) -> Self {
        RequestOption::Request(Box::new(req))
    }
}

impl From<Hook> for RequestOption {
    fn from(hook: Hook) -> Self {
        RequestOption::Hook(hook)
    }
}

impl std::fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestOption::Request(r) => f.debug_tuple("Request").field(r).finish(),
            RequestOption::Apply(_) => f.write_str("Apply(..)"),
            RequestOption::TryApply(_) => f.write_str("TryApply(..)"),
            RequestOption::Hook(h) => f.debug_tuple("Hook").field(h).finish(),
            RequestOption::Custom(c) => std::fmt::Debug::fmt(c, f),
        }
    }
}

/// Description of an HTTP request, merged with [`Request::with`] and
/// resolved by [`Request::reconcile`].
///
/// Empty strings and `None` mean "not set".
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: Option<Method>,
    pub base_url: String,
    /// Relative (`/path`, joined to `base_url`) or absolute.
    pub url: String,
    /// Structured query, coerced lazily. Ignored when `raw_query` is set.
    pub query: Option<Value>,
    /// Pre-encoded query string.
    pub raw_query: String,
    /// Structured body, encoded by the extension's encoder.
    pub body: Option<Value>,
    /// Pre-encoded body. Takes precedence over `body`.
    pub raw_body: Option<Bytes>,
    pub get_body: Option<GetBody>,
    pub header: Values,
    pub context: Option<Context>,
    /// Free-form data for hooks and options.
    pub values: Values,
    pub last_error: Option<Error>,
    pub options: Vec<RequestOption>,
    pub extension: Extension,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the structured query. Serialization errors become `last_error`.
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        match serde_json::to_value(query) {
            Ok(v) => self.query = Some(v),
            Err(e) => {
                self.fail(e.into());
            }
        }
        self
    }

    pub fn raw_query(mut self, raw_query: impl Into<String>) -> Self {
        self.raw_query = raw_query.into();
        self
    }

    /// Set the structured body. Serialization errors become `last_error`.
    pub fn body<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(v) => self.body = Some(v),
            Err(e) => {
                self.fail(e.into());
            }
        }
        self
    }

    pub fn raw_body(mut self, raw_body: impl Into<Bytes>) -> Self {
        self.raw_body = Some(raw_body.into());
        self
    }

    pub fn get_body<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<Body> + Send + Sync + 'static,
    {
        self.get_body = Some(GetBody::new(f));
        self
    }

    /// Append a header value.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.add(key, value);
        self
    }

    pub fn context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Append a free-form value.
    pub fn value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.add(key, value);
        self
    }

    /// Append a deferred option.
    pub fn option(mut self, option: impl Into<RequestOption>) -> Self {
        self.options.push(option.into());
        self
    }

    /// Register hooks directly, as the most recent batch.
    pub fn with_hook(mut self, hooks: impl IntoIterator<Item = Hook>) -> Self {
        self.extension.with(hooks);
        self
    }

    /// Record `err` as the sticky error unless one is already set.
    pub(crate) fn fail(&mut self, err: Error) -> Error {
        self.last_error.get_or_insert(err).clone()
    }
}
