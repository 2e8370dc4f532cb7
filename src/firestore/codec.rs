//! Value codec: native values to tagged wire values and back
//!
//! `classify` decides the wire tag, `encode` wraps a native value under it
//! and `decode` unwraps it again. For values built from null, booleans,
//! numbers, strings, date-times, geo points and nested objects/arrays,
//! `decode(encode(v)) == v` except that date-times come back as their ISO
//! string.

use indexmap::IndexMap;

use super::field_value::{ArrayValue, MapValue, Value, ValueType};
use super::geo_point::GeoPoint;
use super::native_value::{NativeMap, NativeValue};
use super::timestamp::{format_timestamp, looks_like_timestamp};

/// Determine the wire tag for a native value
///
/// Rules apply in order: null, boolean, number (integer when the fractional
/// part is zero, double otherwise), array, date-time, geo-point-shaped object,
/// other object, timestamp-shaped string, string. Bytes and references have
/// their own native variants and map to their own tags.
pub fn classify(value: &NativeValue) -> ValueType {
    match value {
        NativeValue::Null => ValueType::Null,
        NativeValue::Boolean(_) => ValueType::Boolean,
        NativeValue::Integer(_) => ValueType::Integer,
        NativeValue::Double(f) if is_integral(*f) => ValueType::Integer,
        NativeValue::Double(_) => ValueType::Double,
        NativeValue::Array(_) => ValueType::Array,
        NativeValue::Timestamp(_) => ValueType::Timestamp,
        NativeValue::Object(map) if GeoPoint::from_native_map(map).is_some() => ValueType::GeoPoint,
        NativeValue::Object(_) => ValueType::Map,
        NativeValue::String(s) if looks_like_timestamp(s) => ValueType::Timestamp,
        NativeValue::String(_) => ValueType::String,
        NativeValue::Bytes(_) => ValueType::Bytes,
        NativeValue::Reference(_) => ValueType::Reference,
    }
}

/// Encode a native value into its wire form
///
/// The produced tag always equals `classify(value)`.
pub fn encode(value: &NativeValue) -> Value {
    match value {
        NativeValue::Null => Value::null(),
        NativeValue::Boolean(b) => Value::Boolean(*b),
        NativeValue::Integer(i) => Value::Integer(*i),
        NativeValue::Double(f) if is_integral(*f) => Value::Integer(*f as i64),
        NativeValue::Double(f) => Value::Double(*f),
        NativeValue::Array(values) => Value::Array(ArrayValue {
            values: values.iter().map(encode).collect(),
        }),
        NativeValue::Timestamp(dt) => Value::Timestamp(format_timestamp(dt)),
        NativeValue::Object(map) => match GeoPoint::from_native_map(map) {
            Some(point) => Value::GeoPoint(point),
            None => Value::Map(encode_map(map)),
        },
        NativeValue::String(s) if looks_like_timestamp(s) => Value::Timestamp(s.clone()),
        NativeValue::String(s) => Value::String(s.clone()),
        NativeValue::Bytes(bytes) => Value::Bytes(bytes.clone()),
        NativeValue::Reference(path) => Value::Reference(path.clone()),
    }
}

/// Decode a wire value into its native form
pub fn decode(value: &Value) -> NativeValue {
    match value {
        Value::Null(()) => NativeValue::Null,
        Value::Boolean(b) => NativeValue::Boolean(*b),
        Value::Integer(i) => NativeValue::Integer(*i),
        Value::Double(f) => NativeValue::Double(*f),
        Value::Timestamp(s) | Value::String(s) => NativeValue::String(s.clone()),
        Value::Bytes(bytes) => NativeValue::Bytes(bytes.clone()),
        Value::Reference(path) => NativeValue::Reference(path.clone()),
        Value::GeoPoint(point) => point.to_native(),
        Value::Map(map) => NativeValue::Object(decode_fields(&map.fields)),
        Value::Array(array) => NativeValue::Array(array.values.iter().map(decode).collect()),
    }
}

/// Encode every field of a native object
pub fn encode_fields(fields: &NativeMap) -> IndexMap<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode(value)))
        .collect()
}

/// Decode every field of a wire field map
pub fn decode_fields(fields: &IndexMap<String, Value>) -> NativeMap {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode(value)))
        .collect()
}

fn encode_map(map: &NativeMap) -> MapValue {
    MapValue {
        fields: encode_fields(map),
    }
}

/// Integral and representable as i64
fn is_integral(f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}
