//! Coerce arbitrary serializable values into [`Values`].
//!
//! Records go through `serde_json::Value` first, so structs (with their
//! `rename`/`skip_serializing_if` attributes) and maps share one code path
//! and one set of scalar formatting rules.

use serde::Serialize;
use serde_json::Value;

use super::Values;
use crate::error::{Error, Result};

/// Convert `value` into a key/value list suitable for a query string or form.
///
/// `None`/unit yields an empty result. Only map-shaped values are accepted at
/// the top level; scalars and sequences fail with [`Error::Unsupported`].
pub fn values_of<T: Serialize + ?Sized>(value: &T) -> Result<Values> {
    let json = serde_json::to_value(value)?;
    values_of_json(&json)
}

/// Same as [`values_of`] for a value that is already a `serde_json::Value`.
pub fn values_of_json(value: &Value) -> Result<Values> {
    let map = match value {
        Value::Null => return Ok(Values::new()),
        Value::Object(map) => map,
        other => return Err(Error::Unsupported(kind(other))),
    };

    let mut out = Values::new();
    for (key, entry) in map {
        match entry {
            // nil references vanish instead of producing an empty value
            Value::Null => continue,
            Value::Array(items) => {
                for item in items {
                    out.add(key.as_str(), value_string(item));
                }
            }
            scalar => {
                out.set(key.as_str(), value_string(scalar));
            }
        }
    }
    Ok(out)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Render one scalar. Zero values render as `""`.
fn value_string(value: &Value) -> String {
    match value {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Bool(true) => "true".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => number_string(n),
        nested => nested.to_string(),
    }
}

fn number_string(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return if i == 0 { String::new() } else { i.to_string() };
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    let f = n.as_f64().unwrap_or_default();
    if f == 0.0 {
        return String::new();
    }
    // avoid "1000000000018.0"-style output for integral floats
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        return (f as i64).to_string();
    }
    f.to_string()
}
