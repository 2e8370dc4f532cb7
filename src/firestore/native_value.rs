//! Native (untagged) document values
//!
//! [`NativeValue`] is what application code reads and writes: plain
//! JSON-like data plus date-times, raw bytes and document references.
//! The codec in [`super::codec`] maps it to and from the tagged wire form.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use super::timestamp::format_timestamp;

/// Ordered native object
pub type NativeMap = IndexMap<String, NativeValue>;

/// Untagged document value
///
/// Numbers compare by numeric value, so `Integer(1) == Double(1.0)`.
#[derive(Debug, Clone)]
pub enum NativeValue {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Integral number
    Integer(i64),
    /// Floating-point number (integral doubles still encode as integers)
    Double(f64),
    /// Text; timestamp-shaped text encodes as a timestamp
    String(String),
    /// Point in time, encoded with millisecond precision
    Timestamp(DateTime<Utc>),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Document resource name (`projects/.../documents/...`)
    Reference(String),
    /// Ordered list
    Array(Vec<NativeValue>),
    /// Nested object (a geo point when it exposes numeric `longitude` and `latitude`)
    Object(NativeMap),
}

impl NativeValue {
    /// Numeric value as f64, if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NativeValue::Integer(i) => Some(*i as f64),
            NativeValue::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Integral value, if this is an integer or an integral double
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NativeValue::Integer(i) => Some(*i),
            NativeValue::Double(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Text, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean, if this is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Elements, if this is an array
    pub fn as_array(&self) -> Option<&[NativeValue]> {
        match self {
            NativeValue::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Fields, if this is an object
    pub fn as_object(&self) -> Option<&NativeMap> {
        match self {
            NativeValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Check for `null`
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    /// Convert to plain JSON
    ///
    /// Timestamps become ISO strings, bytes become base64 text and references
    /// become their path string.
    pub fn to_json(&self) -> JsonValue {
        match self {
            NativeValue::Null => JsonValue::Null,
            NativeValue::Boolean(b) => JsonValue::Bool(*b),
            NativeValue::Integer(i) => JsonValue::from(*i),
            NativeValue::Double(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            NativeValue::String(s) | NativeValue::Reference(s) => JsonValue::String(s.clone()),
            NativeValue::Timestamp(dt) => JsonValue::String(format_timestamp(dt)),
            NativeValue::Bytes(bytes) => {
                use base64::Engine;
                JsonValue::String(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            NativeValue::Array(values) => {
                JsonValue::Array(values.iter().map(NativeValue::to_json).collect())
            }
            NativeValue::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for NativeValue {
    fn eq(&self, other: &Self) -> bool {
        use NativeValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (Integer(a), Double(b)) | (Double(b), Integer(a)) => (*a as f64) == *b,
            (String(a), String(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Reference(a), Reference(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Object(a), Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<JsonValue> for NativeValue {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => NativeValue::Null,
            JsonValue::Bool(b) => NativeValue::Boolean(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => NativeValue::Integer(i),
                None => NativeValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => NativeValue::String(s),
            JsonValue::Array(values) => {
                NativeValue::Array(values.into_iter().map(NativeValue::from).collect())
            }
            JsonValue::Object(map) => NativeValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, NativeValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<NativeValue> for JsonValue {
    fn from(value: NativeValue) -> Self {
        value.to_json()
    }
}

impl From<bool> for NativeValue {
    fn from(b: bool) -> Self {
        NativeValue::Boolean(b)
    }
}

impl From<i32> for NativeValue {
    fn from(i: i32) -> Self {
        NativeValue::Integer(i64::from(i))
    }
}

impl From<i64> for NativeValue {
    fn from(i: i64) -> Self {
        NativeValue::Integer(i)
    }
}

impl From<u32> for NativeValue {
    fn from(i: u32) -> Self {
        NativeValue::Integer(i64::from(i))
    }
}

impl From<f64> for NativeValue {
    fn from(f: f64) -> Self {
        NativeValue::Double(f)
    }
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::String(s.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::String(s)
    }
}

impl From<DateTime<Utc>> for NativeValue {
    fn from(dt: DateTime<Utc>) -> Self {
        NativeValue::Timestamp(dt)
    }
}

impl From<NativeMap> for NativeValue {
    fn from(map: NativeMap) -> Self {
        NativeValue::Object(map)
    }
}

impl<T: Into<NativeValue>> From<Vec<T>> for NativeValue {
    fn from(values: Vec<T>) -> Self {
        NativeValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<NativeValue>> From<Option<T>> for NativeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(NativeValue::Null, Into::into)
    }
}
