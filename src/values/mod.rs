//! Multi-valued string maps and value coercion.
//!
//! # Data Flow
//! ```text
//! arbitrary Serialize value
//!     → coerce.rs (serde_json::Value → key/value list)
//!     → Values (ordered keys, ordered values per key)
//!     → encode() (query string / form body)
//! ```
//!
//! # Design Decisions
//! - Keys keep insertion order; `encode` sorts them for stable query strings
//! - `clone` is a deep copy, so derived requests never alias a shared base
//! - Merge appends; override replaces per key

pub mod coerce;

pub use coerce::{values_of, values_of_json};

use indexmap::IndexMap;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Ordered mapping from a string key to an ordered list of string values.
///
/// Used for headers, query strings, form bodies and user extension data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    inner: IndexMap<String, Vec<String>>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value stored under `key`, or `""`.
    pub fn get(&self, key: &str) -> &str {
        self.inner
            .get(key)
            .and_then(|vs| vs.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Every value stored under `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Replace all values under `key` with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.inner.insert(key.into(), vec![value.into()]);
        self
    }

    /// Append a value under `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.inner.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Remove `key` and its values.
    pub fn del(&mut self, key: &str) -> &mut Self {
        self.inner.shift_remove(key);
        self
    }

    /// Append `other`'s values after ours, key by key.
    pub fn merge(&mut self, other: &Values) -> &mut Self {
        for (key, values) in &other.inner {
            self.inner
                .entry(key.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
        self
    }

    /// Replace our values with `other`'s for every key `other` has.
    pub fn override_with(&mut self, other: &Values) -> &mut Self {
        for (key, values) in &other.inner {
            self.inner.insert(key.clone(), values.clone());
        }
        self
    }

    pub fn with_merge(mut self, other: &Values) -> Self {
        self.merge(other);
        self
    }

    pub fn with_override(mut self, other: &Values) -> Self {
        self.override_with(other);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Encode as `application/x-www-form-urlencoded`, keys sorted.
    pub fn encode(&self) -> String {
        let mut keys: Vec<&String> = self.inner.keys().collect();
        keys.sort();

        let mut out = form_urlencoded::Serializer::new(String::new());
        for key in keys {
            for value in &self.inner[key] {
                out.append_pair(key, value);
            }
        }
        out.finish()
    }

    /// Parse a form-urlencoded string. Malformed escapes are kept verbatim.
    pub fn parse(input: &str) -> Self {
        form_urlencoded::parse(input.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Values
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Values::new();
        for (k, v) in iter {
            values.add(k, v);
        }
        values
    }
}

impl IntoIterator for Values {
    type Item = (String, Vec<String>);
    type IntoIter = indexmap::map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl From<IndexMap<String, Vec<String>>> for Values {
    fn from(inner: IndexMap<String, Vec<String>>) -> Self {
        Self { inner }
    }
}

impl From<Values> for serde_json::Value {
    fn from(values: Values) -> Self {
        let map = values
            .inner
            .into_iter()
            .map(|(k, vs)| {
                let list = vs.into_iter().map(serde_json::Value::String).collect();
                (k, serde_json::Value::Array(list))
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Serialize for Values {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.inner.len()))?;
        for (k, v) in &self.inner {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

struct ValuesVisitor;

impl<'de> Visitor<'de> for ValuesVisitor {
    type Value = Values;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a map of strings or string lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Values, A::Error> {
        let mut values = Values::new();
        while let Some((key, value)) = access.next_entry::<String, OneOrMany>()? {
            match value {
                OneOrMany::One(v) => {
                    values.add(key, v);
                }
                OneOrMany::Many(vs) => {
                    values.inner.entry(key).or_default().extend(vs);
                }
            }
        }
        Ok(values)
    }
}

impl<'de> Deserialize<'de> for Values {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ValuesVisitor)
    }
}
