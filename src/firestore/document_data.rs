//! Write input: document fields mixing values and transforms

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use super::field_transform::Transform;
use super::geo_point::GeoPoint;
use super::native_value::{NativeMap, NativeValue};
use crate::error::{FirebaseError, FirestoreError};

/// One entry of [`DocumentData`]
#[derive(Debug, Clone, PartialEq)]
pub enum DataField {
    /// Literal value written as-is
    Value(NativeValue),
    /// Server-side transform
    Transform(Transform),
    /// Absent value; the key is skipped when encoding
    Undefined,
}

impl From<Transform> for DataField {
    fn from(transform: Transform) -> Self {
        DataField::Transform(transform)
    }
}

impl<T: Into<DataField>> From<Option<T>> for DataField {
    /// `None` is [`DataField::Undefined`], not `null`
    fn from(value: Option<T>) -> Self {
        value.map_or(DataField::Undefined, Into::into)
    }
}

macro_rules! data_field_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for DataField {
                fn from(value: $ty) -> Self {
                    DataField::Value(NativeValue::from(value))
                }
            }
        )*
    };
}

data_field_from_value!(
    NativeValue,
    bool,
    i32,
    i64,
    u32,
    f64,
    &str,
    String,
    DateTime<Utc>,
    NativeMap,
    Vec<NativeValue>,
    GeoPoint,
    serde_json::Value,
);

/// Ordered document fields for `set`, `update` and `create`
///
/// # Example
/// ```
/// use firestore_rest::firestore::{increment, DocumentData};
///
/// let data = DocumentData::new()
///     .insert("name", "alice")
///     .insert("visits", increment(1));
/// assert_eq!(data.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentData {
    fields: IndexMap<String, DataField>,
}

impl DocumentData {
    /// Empty document data
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field, keeping its first insertion position
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<DataField>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add or replace a field in place
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<DataField>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Field by key
    pub fn get(&self, key: &str) -> Option<&DataField> {
        self.fields.get(key)
    }

    /// Fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DataField)> {
        self.fields.iter()
    }

    /// Number of entries, undefined ones included
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Plain values only, dropping transforms and undefined entries
    pub fn values(&self) -> NativeMap {
        self.fields
            .iter()
            .filter_map(|(key, field)| match field {
                DataField::Value(value) => Some((key.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    /// Convert any serializable struct or map into document data
    ///
    /// Fails when `data` does not serialize to a JSON object.
    pub fn from_serializable<T: Serialize + ?Sized>(data: &T) -> Result<Self, FirebaseError> {
        match serde_json::to_value(data)? {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(FirestoreError::InvalidData(format!(
                "document data must serialize to an object, got {}",
                other
            ))
            .into()),
        }
    }
}

impl From<NativeMap> for DocumentData {
    fn from(map: NativeMap) -> Self {
        map.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for DocumentData
where
    K: Into<String>,
    V: Into<DataField>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::field_transform::increment;
    use serde_json::json;

    #[derive(Serialize)]
    struct Profile {
        name: String,
        age: u32,
        tags: Vec<String>,
    }

    #[test]
    fn test_insert_keeps_order() {
        let data = DocumentData::new()
            .insert("b", 1)
            .insert("a", "x")
            .insert("b", 2);

        let keys: Vec<_> = data.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(data.get("b"), Some(&DataField::Value(NativeValue::Integer(2))));
    }

    #[test]
    fn test_option_none_is_undefined() {
        let data = DocumentData::new()
            .insert("gone", Option::<i64>::None)
            .insert("kept", Some(3));

        assert_eq!(data.get("gone"), Some(&DataField::Undefined));
        assert_eq!(data.get("kept"), Some(&DataField::Value(NativeValue::Integer(3))));
    }

    #[test]
    fn test_values_drops_transforms() {
        let data = DocumentData::new()
            .insert("n", increment(1))
            .insert("name", "a")
            .insert("skip", Option::<String>::None);

        let values = data.values();
        assert_eq!(values.len(), 1);
        assert_eq!(values["name"], NativeValue::from("a"));
    }

    #[test]
    fn test_from_serializable_struct() {
        let profile = Profile {
            name: "alice".to_string(),
            age: 30,
            tags: vec!["x".to_string()],
        };

        let data = DocumentData::from_serializable(&profile).unwrap();

        assert_eq!(
            data.values(),
            NativeValue::from(json!({"name": "alice", "age": 30, "tags": ["x"]}))
                .as_object()
                .cloned()
                .unwrap()
        );
    }

    #[test]
    fn test_from_serializable_rejects_scalars() {
        let err = DocumentData::from_serializable(&42).unwrap_err();
        assert!(matches!(
            err,
            FirebaseError::Firestore(FirestoreError::InvalidData(_))
        ));
    }
}
