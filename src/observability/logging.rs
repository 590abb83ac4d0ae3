//! Request/response dumps through `tracing`.
//!
//! # Responsibilities
//! - Log the outgoing request line and headers
//! - Log the response status and headers, optionally only for errors
//! - Optionally buffer and log both bodies
//!
//! # Design Decisions
//! - Events are emitted at `INFO` under the `reqkit::debug` target; the hook
//!   is opt-in, so no extra level gate is needed
//! - Body dumps buffer the whole body, which ends response streaming

use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use tower::ServiceExt;

use super::correlation::request_id;
use crate::error::Error;
use crate::extension::Hook;
use crate::transport::{transport_fn, Body, HttpRequest, HttpResponse, Transport};

/// Order of [`debug_hook`]: last to see the request, outermost middleware.
pub const DEBUG_ORDER: i32 = -100;

pub type IsErrorFn = Arc<dyn Fn(StatusCode) -> bool + Send + Sync>;

/// Options for [`debug_hook`].
#[derive(Clone, Default)]
pub struct DebugOptions {
    /// Register the hook but log nothing.
    pub disable: bool,
    /// Also dump request and response bodies.
    pub body: bool,
    /// Only dump responses that [`is_error`](Self::is_error) accepts.
    pub error_only: bool,
    /// Error predicate; defaults to `status >= 400`.
    pub is_error: Option<IsErrorFn>,
}

impl DebugOptions {
    pub fn is_error(&self, status: StatusCode) -> bool {
        match &self.is_error {
            Some(f) => f(status),
            None => status.as_u16() >= 400,
        }
    }

    fn dump_response(&self, status: StatusCode) -> bool {
        !self.disable && (!self.error_only || self.is_error(status))
    }
}

impl std::fmt::Debug for DebugOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugOptions")
            .field("disable", &self.disable)
            .field("body", &self.body)
            .field("error_only", &self.error_only)
            .field("is_error", &self.is_error.as_ref().map(|_| ".."))
            .finish()
    }
}

fn headers_text(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes())))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Dump every request and response through `tracing`.
pub fn debug_hook(options: DebugOptions) -> Hook {
    let hook = Hook::new("debug").order(DEBUG_ORDER);
    if options.disable {
        return hook;
    }

    let options = Arc::new(options);
    let on_response = options.clone();
    let hook = hook
        .on_request(|req| {
            tracing::info!(
                target: "reqkit::debug",
                request_id = %request_id(req),
                version = ?req.version(),
                headers = %headers_text(req.headers()),
                "-> {} {}",
                req.method(),
                req.uri()
            );
            Ok(())
        })
        .on_response(move |res| {
            if on_response.dump_response(res.status()) {
                tracing::info!(
                    target: "reqkit::debug",
                    version = ?res.version(),
                    headers = %headers_text(res.headers()),
                    "<- {}",
                    res.status()
                );
            }
            Ok(())
        });

    if options.body {
        hook.handle_request(move |next| dump_bodies(next, options.clone()))
    } else {
        hook
    }
}

fn dump_bodies(next: Transport, options: Arc<DebugOptions>) -> Transport {
    transport_fn(move |req: HttpRequest| {
        let next = next.clone();
        let options = options.clone();
        async move {
            let (parts, body) = req.into_parts();
            let bytes = axum::body::to_bytes(body, usize::MAX)
                .await
                .map_err(Error::body)?;
            tracing::info!(
                target: "reqkit::debug",
                body = %String::from_utf8_lossy(&bytes),
                "-> {} {} body",
                parts.method,
                parts.uri
            );

            let res = next
                .oneshot(HttpRequest::from_parts(parts, Body::from(bytes)))
                .await?;
            if !options.dump_response(res.status()) {
                return Ok(res);
            }

            let (parts, body) = res.into_parts();
            let bytes = axum::body::to_bytes(body, usize::MAX)
                .await
                .map_err(Error::body)?;
            tracing::info!(
                target: "reqkit::debug",
                body = %String::from_utf8_lossy(&bytes),
                "<- {} body",
                parts.status
            );
            Ok(HttpResponse::from_parts(parts, Body::from(bytes)))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::Extension;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn capture() -> (Buffer, tracing::subscriber::DefaultGuard) {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter("reqkit::debug=info")
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        (buffer, tracing::subscriber::set_default(subscriber))
    }

    fn echo(status: u16) -> Transport {
        transport_fn(move |req: HttpRequest| async move {
            let body = axum::body::to_bytes(req.into_body(), usize::MAX)
                .await
                .map_err(Error::body)?;
            Ok(http::Response::builder()
                .status(status)
                .body(Body::from(body))?)
        })
    }

    async fn run(options: DebugOptions, status: u16) -> String {
        let (buffer, _guard) = capture();
        let mut ext = Extension::new();
        ext.with([debug_hook(options)]);

        let mut req = http::Request::post("http://h/dump")
            .body(Body::from("PING"))
            .unwrap();
        ext.on_request(&mut req).unwrap();
        let mut res = ext.transport_over(echo(status)).oneshot(req).await.unwrap();
        ext.on_response(&mut res).unwrap();

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "PING");
        buffer.text()
    }

    #[tokio::test]
    async fn test_dumps_heads() {
        let out = run(DebugOptions::default(), 200).await;
        assert!(out.contains("-> POST http://h/dump"));
        assert!(out.contains("<- 200 OK"));
        assert!(!out.contains("body"));
    }

    #[tokio::test]
    async fn test_dumps_bodies() {
        let out = run(
            DebugOptions {
                body: true,
                ..Default::default()
            },
            200,
        )
        .await;
        assert!(out.contains("body=PING"));
    }

    #[tokio::test]
    async fn test_disabled_is_silent() {
        let out = run(
            DebugOptions {
                disable: true,
                body: true,
                ..Default::default()
            },
            500,
        )
        .await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_error_only() {
        let options = DebugOptions {
            error_only: true,
            ..Default::default()
        };
        let out = run(options.clone(), 200).await;
        assert!(out.contains("-> POST"));
        assert!(!out.contains("<- "));

        let out = run(options, 503).await;
        assert!(out.contains("<- 503 Service Unavailable"));

        let custom = DebugOptions {
            error_only: true,
            is_error: Some(Arc::new(|status| status == StatusCode::CREATED)),
            ..Default::default()
        };
        assert!(run(custom, 201).await.contains("<- 201 Created"));
    }
}
