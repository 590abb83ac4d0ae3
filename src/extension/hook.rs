//! Hook definition: a named bundle of optional lifecycle callbacks.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tower::{Layer, Service};

use crate::error::{Error, Result};
use crate::request::{Context, CustomOption, Request};
use crate::transport::{HttpRequest, HttpResponse, Transport};

pub type OnRequestFn = Arc<dyn Fn(&mut HttpRequest) -> Result<()> + Send + Sync>;
pub type OnResponseFn = Arc<dyn Fn(&mut HttpResponse) -> Result<()> + Send + Sync>;
/// Transport middleware: receives the next transport, returns the wrapped one.
pub type HandleRequestFn = Arc<dyn Fn(Transport) -> Transport + Send + Sync>;
/// Fallback for option entries the request does not understand.
/// Returns `Ok(true)` when the option was consumed.
pub type HandleOptionFn = Arc<dyn Fn(&mut Request, &CustomOption) -> Result<bool> + Send + Sync>;
pub type EncodeFn = Arc<dyn Fn(&Context, &Value) -> Result<Bytes> + Send + Sync>;
pub type DecodeFn = Arc<dyn Fn(&Context, &[u8]) -> Result<Value> + Send + Sync>;

/// Lifecycle callbacks with a priority.
///
/// Inside an [`Extension`](super::Extension) hooks are kept sorted by
/// descending `order`; `name` is only used for logging.
#[derive(Clone, Default)]
pub struct Hook {
    pub name: String,
    pub order: i32,
    pub on_request: Option<OnRequestFn>,
    pub on_response: Option<OnResponseFn>,
    pub handle_request: Option<HandleRequestFn>,
    pub handle_option: Option<HandleOptionFn>,
    pub encode: Option<EncodeFn>,
    pub decode: Option<DecodeFn>,
}

impl Hook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HttpRequest) -> Result<()> + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(f));
        self
    }

    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HttpResponse) -> Result<()> + Send + Sync + 'static,
    {
        self.on_response = Some(Arc::new(f));
        self
    }

    pub fn handle_request<F>(mut self, f: F) -> Self
    where
        F: Fn(Transport) -> Transport + Send + Sync + 'static,
    {
        self.handle_request = Some(Arc::new(f));
        self
    }

    /// Use a tower layer as transport middleware.
    pub fn layer<L>(self, layer: L) -> Self
    where
        L: Layer<Transport> + Send + Sync + 'static,
        L::Service: Service<HttpRequest, Response = HttpResponse, Error = Error>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<HttpRequest>>::Future: Send + 'static,
    {
        self.handle_request(move |next| Transport::new(layer.layer(next)))
    }

    pub fn handle_option<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request, &CustomOption) -> Result<bool> + Send + Sync + 'static,
    {
        self.handle_option = Some(Arc::new(f));
        self
    }

    pub fn encode<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context, &Value) -> Result<Bytes> + Send + Sync + 'static,
    {
        self.encode = Some(Arc::new(f));
        self
    }

    pub fn decode<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context, &[u8]) -> Result<Value> + Send + Sync + 'static,
    {
        self.decode = Some(Arc::new(f));
        self
    }

    /// Whether `other` is a clone of this hook: same name, order and
    /// callback allocations.
    pub fn same_as(&self, other: &Hook) -> bool {
        fn slot<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
        }

        self.name == other.name
            && self.order == other.order
            && slot(&self.on_request, &other.on_request)
            && slot(&self.on_response, &other.on_response)
            && slot(&self.handle_request, &other.handle_request)
            && slot(&self.handle_option, &other.handle_option)
            && slot(&self.encode, &other.encode)
            && slot(&self.decode, &other.decode)
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut slots = Vec::new();
        if self.on_request.is_some() {
            slots.push("on_request");
        }
        if self.on_response.is_some() {
            slots.push("on_response");
        }
        if self.handle_request.is_some() {
            slots.push("handle_request");
        }
        if self.handle_option.is_some() {
            slots.push("handle_option");
        }
        if self.encode.is_some() {
            slots.push("encode");
        }
        if self.decode.is_some() {
            slots.push("decode");
        }
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("order", &self.order)
            .field("slots", &slots)
            .finish()
    }
}
