//! Firestore wire value types
//!
//! Every scalar on the wire is a single-key object whose key names its type,
//! e.g. `{"integerValue": 1}` or `{"stringValue": "a"}`. [`Value`] models
//! that as a closed enum so decoding is an exhaustive match rather than a
//! key lookup.
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/Value`

use super::geo_point::GeoPoint;
use base64::Engine;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Firestore wire value - exactly one type tag per value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// `{"nullValue": null}`
    #[serde(rename = "nullValue")]
    Null(()),

    /// `{"booleanValue": true}`
    #[serde(rename = "booleanValue")]
    Boolean(bool),

    /// `{"integerValue": 1}` (the backend sends int64 as a string; both are accepted)
    #[serde(rename = "integerValue", deserialize_with = "deserialize_integer")]
    Integer(i64),

    /// `{"doubleValue": 0.5}`
    #[serde(rename = "doubleValue", deserialize_with = "deserialize_double")]
    Double(f64),

    /// `{"timestampValue": "2021-10-25T22:49:25.790Z"}`
    #[serde(rename = "timestampValue")]
    Timestamp(String),

    /// `{"stringValue": "a"}`
    #[serde(rename = "stringValue")]
    String(String),

    /// `{"bytesValue": "<base64>"}`
    #[serde(
        rename = "bytesValue",
        serialize_with = "serialize_bytes",
        deserialize_with = "deserialize_bytes"
    )]
    Bytes(Vec<u8>),

    /// `{"referenceValue": "projects/p/databases/d/documents/c/id"}`
    #[serde(rename = "referenceValue")]
    Reference(String),

    /// `{"geoPointValue": {"latitude": 0, "longitude": 0}}`
    #[serde(rename = "geoPointValue")]
    GeoPoint(GeoPoint),

    /// `{"mapValue": {"fields": {...}}}`
    #[serde(rename = "mapValue")]
    Map(MapValue),

    /// `{"arrayValue": {"values": [...]}}`
    #[serde(rename = "arrayValue")]
    Array(ArrayValue),
}

/// Map of field values
///
/// Field order is kept as given; it is what the encoder iterates when
/// producing field masks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    /// Field name to value
    #[serde(default)]
    pub fields: IndexMap<String, Value>,
}

/// Ordered list of values
///
/// The backend omits `values` for an empty array, so decoding defaults it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    /// Elements in order
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Document as sent and received on the wire
///
/// A read response without `fields` describes a document that does not exist.
///
/// # REST Reference
/// - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents#Document`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Resource name `projects/{p}/databases/{d}/documents/{path}`
    #[serde(default)]
    pub name: String,

    /// Field values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<IndexMap<String, Value>>,

    /// Creation time, set by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,

    /// Last update time, set by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

/// Wire type tag of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `nullValue`
    Null,
    /// `booleanValue`
    Boolean,
    /// `integerValue`
    Integer,
    /// `doubleValue`
    Double,
    /// `timestampValue`
    Timestamp,
    /// `stringValue`
    String,
    /// `bytesValue`
    Bytes,
    /// `referenceValue`
    Reference,
    /// `geoPointValue`
    GeoPoint,
    /// `mapValue`
    Map,
    /// `arrayValue`
    Array,
}

impl ValueType {
    /// Key used for this tag on the wire
    pub fn wire_key(&self) -> &'static str {
        match self {
            ValueType::Null => "nullValue",
            ValueType::Boolean => "booleanValue",
            ValueType::Integer => "integerValue",
            ValueType::Double => "doubleValue",
            ValueType::Timestamp => "timestampValue",
            ValueType::String => "stringValue",
            ValueType::Bytes => "bytesValue",
            ValueType::Reference => "referenceValue",
            ValueType::GeoPoint => "geoPointValue",
            ValueType::Map => "mapValue",
            ValueType::Array => "arrayValue",
        }
    }
}

impl Value {
    /// Type tag of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null(_) => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) => ValueType::Integer,
            Value::Double(_) => ValueType::Double,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::String(_) => ValueType::String,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Reference(_) => ValueType::Reference,
            Value::GeoPoint(_) => ValueType::GeoPoint,
            Value::Map(_) => ValueType::Map,
            Value::Array(_) => ValueType::Array,
        }
    }

    /// `{"nullValue": null}`
    pub fn null() -> Self {
        Value::Null(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Integer(i64),
    Float(f64),
    Text(String),
}

fn deserialize_integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Integer(i) => Ok(i),
        NumberOrString::Float(f)
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
        {
            Ok(f as i64)
        }
        NumberOrString::Float(f) => Err(serde::de::Error::custom(format!(
            "integerValue must be an integral i64, got {}",
            f
        ))),
        NumberOrString::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn deserialize_double<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Integer(i) => Ok(i as f64),
        NumberOrString::Float(f) => Ok(f),
        // NaN and the infinities travel as strings
        NumberOrString::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn serialize_bytes<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
}

fn deserialize_bytes<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    base64::engine::general_purpose::STANDARD
        .decode(text.as_bytes())
        .map_err(serde::de::Error::custom)
}
