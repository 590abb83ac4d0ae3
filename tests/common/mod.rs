//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery};
use axum::http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use reqkit::hooks::use_transport;
use reqkit::transport::ReqwestTransport;
use reqkit::{Request, Transport};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelloRequest {
    #[serde(rename = "Name")]
    pub name: String,
}

/// A running mock backend.
pub struct MockBackend {
    pub addr: SocketAddr,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Start a mock backend on an ephemeral port.
///
/// Routes:
/// - `/` returns `OK`
/// - `/echo` returns the request body with its content type
/// - `/query` returns the raw query string
/// - `/header/{name}` returns the value of request header `name`
/// - `/status/{code}` responds with `code`
/// - `/slow` answers after five seconds
pub async fn start_mock_backend() -> MockBackend {
    let app = Router::new()
        .route("/", any(|| async { "OK" }))
        .route("/echo", any(echo))
        .route(
            "/query",
            any(|RawQuery(query): RawQuery| async move { query.unwrap_or_default() }),
        )
        .route("/header/{name}", any(header))
        .route("/status/{code}", any(status))
        .route(
            "/slow",
            any(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockBackend { addr }
}

async fn echo(headers: HeaderMap, body: Bytes) -> Response {
    let mut res = body.into_response();
    match headers.get(CONTENT_TYPE) {
        Some(ct) => {
            res.headers_mut().insert(CONTENT_TYPE, ct.clone());
        }
        None => {
            res.headers_mut().remove(CONTENT_TYPE);
        }
    }
    res
}

async fn header(Path(name): Path<String>, headers: HeaderMap) -> String {
    headers
        .get(name.as_str())
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

/// A reqwest transport that ignores proxy environment variables.
pub fn direct_transport() -> Transport {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    Transport::new(ReqwestTransport::new(client))
}

/// Base request pointed at `backend`, sent without any proxy.
pub fn base_request(backend: &MockBackend) -> Request {
    Request::new()
        .base_url(backend.url())
        .with_hook([use_transport(direct_transport())])
}
