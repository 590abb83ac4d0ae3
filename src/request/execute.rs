//! Building the transport request and running the round trip.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;

use super::target::{Decoded, Fetched, RequestHead, Target};
use super::{Context, GetBody, Request};
use crate::error::{Error, Result};
use crate::extension::Extension;
use crate::transport::{Body, HttpRequest, HttpResponse};
use crate::values::Values;

/// A transport request paired with the reconciled request it came from.
#[derive(Debug)]
pub struct Prepared {
    pub request: HttpRequest,
    pub resolved: Request,
}

impl Prepared {
    /// The context governing this exchange.
    pub fn context(&self) -> Context {
        self.resolved.context.clone().unwrap_or_default()
    }

    /// Round trip through the extension's middleware, then run `on_response`.
    ///
    /// The response body is left streaming.
    pub async fn send(self) -> Result<HttpResponse> {
        let ctx = self.context();
        ctx.run(exchange(&self.resolved.extension, self.request)).await
    }

    /// Send, drain the body once, then fill every target in order.
    ///
    /// Targets filled before a failing one keep their values.
    pub async fn fetch(self, targets: &mut [&mut dyn Target]) -> Result<http::Response<Bytes>> {
        let Prepared { request, resolved } = self;
        let ctx = resolved.context.clone().unwrap_or_default();
        let head = RequestHead::from(&request);

        let response = ctx
            .run(async {
                let response = exchange(&resolved.extension, request).await?;
                collect(response).await
            })
            .await?;

        let (parts, body) = response.into_parts();
        let fetched = Fetched {
            resolved: &resolved,
            request: &head,
            response: &parts,
            body: &body,
        };
        for target in targets.iter_mut() {
            target.fill(&fetched)?;
        }
        Ok(http::Response::from_parts(parts, body))
    }
}

async fn exchange(extension: &Extension, request: HttpRequest) -> Result<HttpResponse> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let mut response = extension.round_trip(request).await?;
    tracing::debug!(%method, %uri, status = %response.status(), "round trip complete");
    extension.on_response(&mut response)?;
    Ok(response)
}

async fn collect(response: HttpResponse) -> Result<http::Response<Bytes>> {
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(Error::body)?;
    Ok(http::Response::from_parts(parts, bytes))
}

fn header_map(values: &Values) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (key, list) in values.iter() {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| Error::InvalidHeader(format!("{key}: {e}")))?;
        for value in list {
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidHeader(format!("{key}: {e}")))?;
            headers.append(name.clone(), value);
        }
    }
    Ok(headers)
}

impl Request {
    /// Reconcile a copy of this request and build the transport request.
    ///
    /// `raw_body` wins over `get_body`, which wins over `body`. A structured
    /// body is encoded by the extension's encoder. `on_request` hooks run last.
    pub fn new_request(&self) -> Result<Prepared> {
        let mut resolved = self.clone();
        resolved.reconcile()?;

        if resolved.raw_body.is_none() && resolved.get_body.is_none() {
            if let Some(body) = &resolved.body {
                let ctx = resolved.context.clone().unwrap_or_default();
                match resolved.extension.encode(&ctx, body) {
                    Ok(bytes) => resolved.raw_body = Some(bytes),
                    Err(e) => return Err(resolved.fail(e)),
                }
            }
        }

        let method = resolved.method.clone().unwrap_or(Method::GET);
        let (body, replay) = match (&resolved.raw_body, &resolved.get_body) {
            (Some(raw), _) if !raw.is_empty() => {
                let raw = raw.clone();
                let replay = GetBody::new(move || Ok(Body::from(raw.clone())));
                (replay.body()?, Some(replay))
            }
            (_, Some(get_body)) => (get_body.body()?, Some(get_body.clone())),
            _ => (Body::empty(), None),
        };

        let mut request = http::Request::builder()
            .method(method)
            .uri(resolved.url.as_str())
            .body(body)?;
        if !resolved.header.is_empty() {
            *request.headers_mut() = header_map(&resolved.header)?;
        }
        if let Some(replay) = replay {
            request.extensions_mut().insert(replay);
        }

        resolved.extension.on_request(&mut request)?;
        Ok(Prepared { request, resolved })
    }

    /// Build and send; the response body is left streaming.
    pub async fn send(&self) -> Result<HttpResponse> {
        self.new_request()?.send().await
    }

    /// Send and drain the body.
    pub async fn fetch_bytes(&self) -> Result<http::Response<Bytes>> {
        self.new_request()?.fetch(&mut []).await
    }

    /// Send and drain the body as text, replacing invalid UTF-8.
    pub async fn fetch_string(&self) -> Result<http::Response<String>> {
        let response = self.fetch_bytes().await?;
        Ok(response.map(|body| String::from_utf8_lossy(&body).into_owned()))
    }

    /// Send, drain the body, and fill `targets` in order.
    pub async fn fetch(&self, targets: &mut [&mut dyn Target]) -> Result<http::Response<Bytes>> {
        self.new_request()?.fetch(targets).await
    }

    /// Send and decode the body into `T`.
    pub async fn fetch_as<T>(&self) -> Result<(T, http::Response<Bytes>)>
    where
        T: DeserializeOwned + Send,
    {
        let mut out = Decoded::<T>::new();
        let response = self.fetch(&mut [&mut out]).await?;
        let value = out
            .into_inner()
            .ok_or_else(|| Error::Decode("no value decoded".into()))?;
        Ok((value, response))
    }
}
