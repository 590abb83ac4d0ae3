//! Declarative, composable HTTP requests.
//!
//! # Architecture Overview
//!
//! ```text
//!   Request (value)                         Extension (sorted hooks)
//!   ───────────────                         ────────────────────────
//!   base.with(override) ──┐                 on_request / on_response
//!                         ▼                 handle_request (tower middleware)
//!                    reconcile()            handle_option / encode / decode
//!                         │                            │
//!                         ▼                            │
//!                    new_request() ◀───────────────────┘
//!                         │
//!                         ▼
//!            transport chain (hooks → reqwest / hyper-util)
//!                         │
//!                         ▼
//!          send / fetch_bytes / fetch_string / fetch(targets)
//! ```
//!
//! ```no_run
//! use reqkit::{hooks, Request};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct Hello { name: String }
//!
//! #[derive(Deserialize)]
//! struct Greeting { hello: String }
//!
//! # async fn run() -> reqkit::Result<()> {
//! let api = Request::new()
//!     .base_url("https://example.com")
//!     .with_hook([hooks::json_encode(), hooks::json_decode()]);
//!
//! let (greeting, _response) = api
//!     .with(Request::new().url("/hello").body(&Hello { name: "wener".into() }))
//!     .method(http::Method::POST)
//!     .fetch_as::<Greeting>()
//!     .await?;
//! println!("{}", greeting.hello);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extension;
pub mod observability;
pub mod request;
pub mod transport;
pub mod values;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use extension::{hooks, Extension, Hook};
pub use request::{
    Context, CustomOption, Decoded, Fetched, GetBody, Prepared, Request, RequestHead,
    RequestOption, ResponseHead, Target,
};
pub use transport::{Body, HttpRequest, HttpResponse, Transport};
pub use values::{values_of, Values};
