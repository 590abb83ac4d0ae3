//! Hook pipeline.
//!
//! # Data Flow
//! ```text
//! Request::with_hook / Hook options
//!     → Extension::with (prepend batch, stable sort by descending order)
//!
//! Execution:
//!     on_request   → every hook, first error aborts
//!     round_trip   → handle_request wraps, last visited is outermost
//!     on_response  → every hook, first error aborts
//!     encode/decode → first hook with the slot wins (single dispatch)
//! ```
//!
//! # Design Decisions
//! - Among equal orders the most recently added batch comes first
//! - Encode/decode are single dispatch so a body is never encoded twice
//! - The hook list is rebuilt on every insertion; clones are cheap (Arc slots)
//! - Re-registering a clone of a hook is a no-op, so a request derived from
//!   another never runs a shared callback twice

pub mod hook;
pub mod hooks;

pub use hook::Hook;

use bytes::Bytes;
use serde_json::Value;
use tower::ServiceExt;

use crate::error::{Error, Result};
use crate::request::{Context, CustomOption, Request};
use crate::transport::{self, HttpRequest, HttpResponse, Transport};

/// Ordered chain of hooks attached to a request.
#[derive(Debug, Clone, Default)]
pub struct Extension {
    hooks: Vec<Hook>,
}

impl Extension {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a batch of hooks ahead of the existing ones, then re-sort.
    ///
    /// A hook that is already registered (see [`Hook::same_as`]) keeps its
    /// current position and is not added again.
    pub fn with(&mut self, hooks: impl IntoIterator<Item = Hook>) {
        let mut next: Vec<Hook> = Vec::new();
        for hook in hooks {
            let known = next.iter().chain(&self.hooks).any(|h| h.same_as(&hook));
            if !known {
                next.push(hook);
            }
        }
        next.append(&mut self.hooks);
        // stable: ties keep the newer batch in front
        next.sort_by(|a, b| b.order.cmp(&a.order));
        self.hooks = next;
    }

    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Decode with the first hook that has a decoder.
    pub fn decode(&self, ctx: &Context, body: &[u8]) -> Result<Value> {
        match self.hooks.iter().find_map(|h| h.decode.as_ref().map(|d| (h, d))) {
            Some((hook, decode)) => {
                tracing::trace!(hook = %hook.name, len = body.len(), "decode");
                decode(ctx, body)
            }
            None => Err(Error::NoDecoder),
        }
    }

    /// Encode with the first hook that has an encoder.
    pub fn encode(&self, ctx: &Context, body: &Value) -> Result<Bytes> {
        match self.hooks.iter().find_map(|h| h.encode.as_ref().map(|e| (h, e))) {
            Some((hook, encode)) => {
                tracing::trace!(hook = %hook.name, "encode");
                encode(ctx, body)
            }
            None => Err(Error::NoEncoder),
        }
    }

    pub fn on_request(&self, req: &mut HttpRequest) -> Result<()> {
        for f in self.hooks.iter().filter_map(|h| h.on_request.as_ref()) {
            f(&mut *req)?;
        }
        Ok(())
    }

    pub fn on_response(&self, res: &mut HttpResponse) -> Result<()> {
        for f in self.hooks.iter().filter_map(|h| h.on_response.as_ref()) {
            f(&mut *res)?;
        }
        Ok(())
    }

    /// Offer an unknown option to every hook until one consumes it.
    pub fn handle_option(&self, req: &mut Request, option: &CustomOption) -> Result<bool> {
        for f in self.hooks.iter().filter_map(|h| h.handle_option.as_ref()) {
            if f(&mut *req, option)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Wrap `base` with every `handle_request` middleware in hook order.
    pub fn transport_over(&self, base: Transport) -> Transport {
        self.hooks
            .iter()
            .filter_map(|h| h.handle_request.as_ref())
            .fold(base, |next, wrap| wrap(next))
    }

    /// The middleware chain over the default baseline transport.
    pub fn transport(&self) -> Transport {
        self.transport_over(transport::default_transport())
    }

    /// Execute one round trip through the middleware chain.
    pub async fn round_trip(&self, req: HttpRequest) -> Result<HttpResponse> {
        self.transport().oneshot(req).await
    }
}
