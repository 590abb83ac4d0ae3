//! Request correlation IDs.

use http::header::HeaderValue;
use uuid::Uuid;

use crate::error::Error;
use crate::extension::Hook;
use crate::transport::HttpRequest;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Order of [`request_id_hook`]; above the defaults so other hooks see the ID.
pub const REQUEST_ID_ORDER: i32 = 100;

/// Set `x-request-id` to a fresh UUID v4 unless the request already has one.
pub fn request_id_hook() -> Hook {
    Hook::new("request_id")
        .order(REQUEST_ID_ORDER)
        .on_request(|req| {
            if !req.headers().contains_key(REQUEST_ID_HEADER) {
                let id = Uuid::new_v4().to_string();
                let value = HeaderValue::from_str(&id)
                    .map_err(|e| Error::InvalidHeader(e.to_string()))?;
                req.headers_mut().insert(REQUEST_ID_HEADER, value);
                tracing::trace!(request_id = %id, "assigned request id");
            }
            Ok(())
        })
}

/// The request ID of `req`, or `"-"`.
pub fn request_id(req: &HttpRequest) -> &str {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}
