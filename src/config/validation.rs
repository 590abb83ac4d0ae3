//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the base URL parses and fits the selected transport
//! - Validate value ranges and header syntax
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ClientConfig → Result<(), Vec<ValidationError>>

use http::header::{HeaderName, HeaderValue};
use url::Url;

use crate::config::schema::{ClientConfig, TransportKind};

/// One rejected configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.base_url.is_empty() {
        match Url::parse(&config.base_url) {
            Ok(url) => match url.scheme() {
                "http" => {}
                "https" if config.transport == TransportKind::Hyper => errors.push(
                    ValidationError::new("base_url", "hyper transport supports plain http only"),
                ),
                "https" => {}
                other => errors.push(ValidationError::new(
                    "base_url",
                    format!("unsupported scheme {other:?}"),
                )),
            },
            Err(e) => errors.push(ValidationError::new("base_url", e.to_string())),
        }
    }

    if config.timeout_secs == Some(0) {
        errors.push(ValidationError::new("timeout_secs", "must be greater than 0"));
    }

    for (name, values) in config.headers.iter() {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                format!("headers.{name}"),
                "invalid header name",
            ));
        }
        if values.iter().any(|v| HeaderValue::from_str(v).is_err()) {
            errors.push(ValidationError::new(
                format!("headers.{name}"),
                "invalid header value",
            ));
        }
    }

    if let Some(agent) = &config.user_agent {
        if HeaderValue::from_str(agent).is_err() {
            errors.push(ValidationError::new("user_agent", "invalid header value"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
