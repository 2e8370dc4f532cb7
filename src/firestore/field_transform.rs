//! Server-side field transforms
//!
//! A [`Transform`] placed in [`super::DocumentData`] instead of a literal
//! value asks the backend to compute the field: increment it, clamp it,
//! edit it as an array or stamp it with the commit time.
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/Write#FieldTransform`

use serde::{Deserialize, Serialize};

use super::codec::encode;
use super::field_value::{ArrayValue, Value};
use super::native_value::NativeValue;

/// Server-computed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerValue {
    /// Time the server processed the request, millisecond precision
    RequestTime,
}

/// Transform marker, stored in document data in place of a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Transform {
    /// Set the field to a server value
    SetToServerValue(ServerValue),
    /// Add to the field's current numeric value
    Increment(Value),
    /// Keep the larger of the current value and this one
    Maximum(Value),
    /// Keep the smaller of the current value and this one
    Minimum(Value),
    /// Append elements not already present
    AppendMissingElements(ArrayValue),
    /// Remove every occurrence of these elements
    RemoveAllFromArray(ArrayValue),
}

/// Number accepted by [`increment`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    /// Integral amount
    Integer(i64),
    /// Fractional amount (integral doubles still encode as integers)
    Double(f64),
}

impl From<i32> for Numeric {
    fn from(n: i32) -> Self {
        Numeric::Integer(i64::from(n))
    }
}

impl From<i64> for Numeric {
    fn from(n: i64) -> Self {
        Numeric::Integer(n)
    }
}

impl From<f64> for Numeric {
    fn from(n: f64) -> Self {
        Numeric::Double(n)
    }
}

impl From<Numeric> for NativeValue {
    fn from(n: Numeric) -> Self {
        match n {
            Numeric::Integer(i) => NativeValue::Integer(i),
            Numeric::Double(f) => NativeValue::Double(f),
        }
    }
}

/// One transform bound to a field, as sent on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    /// Field the transform applies to
    pub field_path: String,

    /// The transform itself
    #[serde(flatten)]
    pub transform: Transform,
}

impl FieldTransform {
    /// Bind a transform to a field
    pub fn new(field_path: impl Into<String>, transform: Transform) -> Self {
        Self {
            field_path: field_path.into(),
            transform,
        }
    }
}

/// Add `amount` to the field (tagged integer or double by fractional part)
pub fn increment(amount: impl Into<Numeric>) -> Transform {
    Transform::Increment(encode(&NativeValue::from(amount.into())))
}

/// Set the field to the maximum of its value and `value`
pub fn maximum(value: impl Into<NativeValue>) -> Transform {
    Transform::Maximum(encode(&value.into()))
}

/// Set the field to the minimum of its value and `value`
pub fn minimum(value: impl Into<NativeValue>) -> Transform {
    Transform::Minimum(encode(&value.into()))
}

/// Append `values` that are not already in the array field
///
/// A missing or non-array field is first set to the empty array.
pub fn append<I, V>(values: I) -> Transform
where
    I: IntoIterator<Item = V>,
    V: Into<NativeValue>,
{
    Transform::AppendMissingElements(encode_elements(values))
}

/// Remove every occurrence of `values` from the array field
///
/// A missing or non-array field is set to the empty array.
pub fn remove<I, V>(values: I) -> Transform
where
    I: IntoIterator<Item = V>,
    V: Into<NativeValue>,
{
    Transform::RemoveAllFromArray(encode_elements(values))
}

/// Set the field to the commit time
pub fn server_timestamp() -> Transform {
    Transform::SetToServerValue(ServerValue::RequestTime)
}

fn encode_elements<I, V>(values: I) -> ArrayValue
where
    I: IntoIterator<Item = V>,
    V: Into<NativeValue>,
{
    ArrayValue {
        values: values.into_iter().map(|v| encode(&v.into())).collect(),
    }
}
