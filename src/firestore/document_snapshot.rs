//! Firestore DocumentSnapshot type
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents/get`

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use super::codec::decode_fields;
use super::field_value::Document;
use super::native_value::{NativeMap, NativeValue};
use crate::error::FirebaseError;

/// Result of reading one document
///
/// A document exists only when the backend returned its `fields`; a 404
/// read produces a snapshot that does not exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSnapshot {
    name: String,
    data: Option<NativeMap>,
    create_time: Option<String>,
    update_time: Option<String>,
}

impl DocumentSnapshot {
    /// Snapshot of a wire document, or of nothing when `document` is `None`
    pub fn from_document(document: Option<Document>) -> Self {
        let Some(document) = document else {
            return Self::default();
        };

        Self {
            data: document.fields.as_ref().map(decode_fields),
            name: document.name,
            create_time: document.create_time,
            update_time: document.update_time,
        }
    }

    /// Check if document exists
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    /// Document ID (last segment of the name), if the document exists
    pub fn id(&self) -> Option<&str> {
        if !self.exists() {
            return None;
        }
        self.name.rsplit('/').next()
    }

    /// Resource name as returned by the backend
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decoded fields, if the document exists
    pub fn data(&self) -> Option<&NativeMap> {
        self.data.as_ref()
    }

    /// Take the decoded fields
    pub fn into_data(self) -> Option<NativeMap> {
        self.data
    }

    /// Field by dotted path (`"address.city"`)
    pub fn get(&self, field_path: &str) -> Option<&NativeValue> {
        let data = self.data.as_ref()?;
        let mut segments = field_path.split('.');
        let first = segments.next()?;

        segments.try_fold(data.get(first)?, |value, segment| {
            value.as_object()?.get(segment)
        })
    }

    /// Creation time, if the document exists
    pub fn create_time(&self) -> Option<&str> {
        self.create_time.as_deref()
    }

    /// Last update time, if the document exists
    pub fn update_time(&self) -> Option<&str> {
        self.update_time.as_deref()
    }

    /// Fields as plain JSON
    pub fn to_json(&self) -> Option<JsonValue> {
        self.data
            .as_ref()
            .map(|data| NativeValue::Object(data.clone()).to_json())
    }

    /// Deserialize the fields into `T`
    ///
    /// Timestamps arrive as ISO strings, so `T` should use `String` or a
    /// `chrono` type with serde support for them.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, FirebaseError> {
        let Some(json) = self.to_json() else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(json)?))
    }
}
