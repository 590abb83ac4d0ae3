//! Built-in codec and transport hooks.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};

use super::Hook;
use crate::error::Error;
use crate::transport::{HttpRequest, Transport};
use crate::values::values_of_json;

pub const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Order of [`use_transport`]. Middleware of hooks ordered above it is
/// discarded; hooks ordered below it wrap the replacement.
pub const TRANSPORT_ORDER: i32 = -1;

fn default_content_type(req: &mut HttpRequest, value: &'static str) {
    if !req.headers().contains_key(CONTENT_TYPE) {
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(value));
    }
}

/// Encode bodies as JSON and default `Content-Type` to JSON.
pub fn json_encode() -> Hook {
    Hook::new("json_encode")
        .on_request(|req| {
            default_content_type(req, JSON_CONTENT_TYPE);
            Ok(())
        })
        .encode(|_, body| {
            serde_json::to_vec(body)
                .map(Bytes::from)
                .map_err(|e| Error::Encode(e.to_string()))
        })
}

/// Decode response bodies as JSON.
pub fn json_decode() -> Hook {
    Hook::new("json_decode")
        .decode(|_, body| serde_json::from_slice(body).map_err(|e| Error::Decode(e.to_string())))
}

/// Encode bodies as `application/x-www-form-urlencoded` via value coercion.
pub fn form_encode() -> Hook {
    Hook::new("form_encode")
        .on_request(|req| {
            default_content_type(req, FORM_CONTENT_TYPE);
            Ok(())
        })
        .encode(|_, body| Ok(Bytes::from(values_of_json(body)?.encode())))
}

/// Replace the transport beneath this hook with `transport`.
///
/// Middleware of lower-order hooks (metrics, debug) still wraps it.
pub fn use_transport(transport: Transport) -> Hook {
    Hook::new("transport")
        .order(TRANSPORT_ORDER)
        .handle_request(move |_next| transport.clone())
}
