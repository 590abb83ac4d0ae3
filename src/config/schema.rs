//! Configuration schema definitions.
//!
//! A `ClientConfig` describes a reusable base request. All types derive Serde
//! traits for deserialization from TOML files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::extension::hooks::{form_encode, json_decode, json_encode, use_transport};
use crate::extension::Hook;
use crate::observability::{debug_hook, metrics_hook, request_id_hook, DebugOptions};
use crate::request::{Context, Request};
use crate::transport::{HyperTransport, Transport};
use crate::values::Values;

/// Root configuration of a client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL joined with relative request URLs (e.g. "https://api.example.com").
    pub base_url: String,

    /// Default headers; a key may map to a string or a list of strings.
    pub headers: Values,

    /// Default query parameters, merged under per-request queries.
    pub query: Values,

    /// Total time allowed for each request, in seconds.
    pub timeout_secs: Option<u64>,

    /// `User-Agent` header, unless `headers` already sets one.
    pub user_agent: Option<String>,

    /// How structured request bodies are encoded.
    pub encoding: Encoding,

    /// How response bodies are decoded.
    pub decoding: Decoding,

    /// Baseline transport.
    pub transport: TransportKind,

    /// Attach an `x-request-id` header to every request.
    pub request_id: bool,

    /// Record request counters and latency histograms.
    pub metrics: bool,

    /// Request/response dumps.
    pub debug: DebugConfig,
}

/// Request body encoding.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Json,
    Form,
    None,
}

/// Response body decoding.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Decoding {
    #[default]
    Json,
    None,
}

/// Baseline transport selection.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Shared reqwest client (TLS capable).
    #[default]
    Reqwest,
    /// hyper-util pooled client, plain HTTP only.
    Hyper,
}

/// Debug dump configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,

    /// Dump bodies too.
    pub body: bool,

    /// Only dump error responses (status >= 400).
    pub error_only: bool,
}

impl ClientConfig {
    /// The hooks this configuration enables.
    pub fn hooks(&self) -> Vec<Hook> {
        let mut hooks = Vec::new();
        match self.encoding {
            Encoding::Json => hooks.push(json_encode()),
            Encoding::Form => hooks.push(form_encode()),
            Encoding::None => {}
        }
        if self.decoding == Decoding::Json {
            hooks.push(json_decode());
        }
        if self.transport == TransportKind::Hyper {
            hooks.push(use_transport(Transport::new(HyperTransport::new())));
        }
        if self.request_id {
            hooks.push(request_id_hook());
        }
        if self.metrics {
            hooks.push(metrics_hook());
        }
        if self.debug.enabled {
            hooks.push(debug_hook(DebugOptions {
                body: self.debug.body,
                error_only: self.debug.error_only,
                ..Default::default()
            }));
        }
        hooks
    }

    /// Build the base request every call derives from with [`Request::with`].
    pub fn to_request(&self) -> Request {
        let mut req = Request::new().base_url(self.base_url.clone());
        req.header = self.headers.clone();

        if let Some(agent) = &self.user_agent {
            let has_agent = req
                .header
                .keys()
                .any(|k| k.eq_ignore_ascii_case("user-agent"));
            if !has_agent {
                req.header.set("user-agent", agent.clone());
            }
        }
        if !self.query.is_empty() {
            req.query = Some(self.query.clone().into());
        }
        if let Some(secs) = self.timeout_secs {
            req.context = Some(Context::background().with_timeout(Duration::from_secs(secs)));
        }

        req.with_hook(self.hooks())
    }
}
