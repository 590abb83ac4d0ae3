//! Baseline transport backed by `reqwest`.

use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use tower::Service;

use super::{Body, HttpRequest, HttpResponse};
use crate::error::Error;

/// Sends requests through a shared `reqwest::Client`.
///
/// The outgoing body is buffered before it is handed to reqwest; the
/// response body streams.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Service<HttpRequest> for ReqwestTransport {
    type Response = HttpResponse;
    type Error = Error;
    type Future = BoxFuture<'static, Result<HttpResponse, Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let bytes = axum::body::to_bytes(body, usize::MAX)
                .await
                .map_err(Error::body)?;

            let request = reqwest::Request::try_from(http::Request::from_parts(parts, bytes))
                .map_err(Error::transport)?;
            tracing::trace!(method = %request.method(), url = %request.url(), "reqwest round trip");

            let response = client.execute(request).await.map_err(Error::transport)?;
            let response: http::Response<reqwest::Body> = response.into();
            Ok(response.map(Body::new))
        })
    }
}
