//! Output targets filled from a drained response.

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri, Version};
use serde::de::DeserializeOwned;

use super::Request;
use crate::error::{Error, Result};
use crate::transport::HttpRequest;

/// Everything a target may read once the response body has been drained.
#[derive(Debug)]
pub struct Fetched<'a> {
    /// The reconciled request, carrying the extension and context.
    pub resolved: &'a Request,
    pub request: &'a RequestHead,
    pub response: &'a http::response::Parts,
    pub body: &'a Bytes,
}

/// Something [`Request::fetch`] can populate.
pub trait Target: Send {
    fn fill(&mut self, fetched: &Fetched<'_>) -> Result<()>;
}

/// Decode the body through the extension's decoder into `T`.
#[derive(Debug)]
pub struct Decoded<T>(pub Option<T>);

impl<T> Decoded<T> {
    pub fn new() -> Self {
        Self(None)
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned + Send> Target for Decoded<T> {
    fn fill(&mut self, fetched: &Fetched<'_>) -> Result<()> {
        let ctx = fetched.resolved.context.clone().unwrap_or_default();
        let value = fetched.resolved.extension.decode(&ctx, fetched.body)?;
        let out = serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))?;
        self.0 = Some(out);
        Ok(())
    }
}

/// Captures the response status line and headers.
#[derive(Debug, Clone, Default)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
}

impl Target for ResponseHead {
    fn fill(&mut self, fetched: &Fetched<'_>) -> Result<()> {
        self.status = fetched.response.status;
        self.version = fetched.response.version;
        self.headers = fetched.response.headers.clone();
        Ok(())
    }
}

/// Captures the transport request as it was sent, after `on_request` hooks.
#[derive(Debug, Clone, Default)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl From<&HttpRequest> for RequestHead {
    fn from(req: &HttpRequest) -> Self {
        Self {
            method: req.method().clone(),
            uri: req.uri().clone(),
            headers: req.headers().clone(),
        }
    }
}

impl Target for RequestHead {
    fn fill(&mut self, fetched: &Fetched<'_>) -> Result<()> {
        self.clone_from(fetched.request);
        Ok(())
    }
}
