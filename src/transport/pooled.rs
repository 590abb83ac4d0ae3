//! Plain-HTTP transport on the hyper-util pooled client.

use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tower::Service;

use super::{Body, HttpRequest, HttpResponse};
use crate::error::Error;

/// Forwards requests through a hyper-util connection pool.
///
/// Only `http://` URLs are supported; there is no TLS connector.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
}

impl HyperTransport {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport").finish_non_exhaustive()
    }
}

impl Service<HttpRequest> for HyperTransport {
    type Response = HttpResponse;
    type Error = Error;
    type Future = BoxFuture<'static, Result<HttpResponse, Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move {
            tracing::trace!(method = %request.method(), uri = %request.uri(), "hyper round trip");
            let response = client.request(request).await.map_err(Error::transport)?;
            Ok(into_response(response))
        })
    }
}

fn into_response(response: hyper::Response<Incoming>) -> HttpResponse {
    response.map(Body::new)
}
