//! Write encoder and write buffer
//!
//! [`build_write`] turns one document mutation into a wire [`Write`],
//! splitting literal fields from server-side transforms. [`WriteBuilder`]
//! collects writes and produces the body of a `:commit` call.
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/Write`
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents/commit`

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::codec::encode;
use super::document_data::{DataField, DocumentData};
use super::field_transform::FieldTransform;
use super::field_value::{Document, Value};

/// Mutation carried by a write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteOperation {
    /// Write the given fields (limited by the update mask)
    Update(Document),
    /// Delete the named document
    Delete(String),
    /// Apply transforms only
    Transform(DocumentTransform),
}

/// Transforms applied to one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTransform {
    /// Resource name of the document
    pub document: String,
    /// Transforms in field order
    pub field_transforms: Vec<FieldTransform>,
}

/// Field paths an update touches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    /// Dotted field paths
    #[serde(default)]
    pub field_paths: Vec<String>,
}

/// Condition the target document must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Precondition {
    /// Document must (or must not) exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    /// Document must have been last updated at this time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

/// One write instruction of a commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    /// `update`, `delete` or `transform`
    #[serde(flatten)]
    pub operation: WriteOperation,

    /// Fields written by an `update`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<DocumentMask>,

    /// Transforms applied after an `update`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub update_transforms: Vec<FieldTransform>,

    /// Precondition on the target document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_document: Option<Precondition>,
}

impl Write {
    fn new(operation: WriteOperation) -> Self {
        Self {
            operation,
            update_mask: None,
            update_transforms: Vec::new(),
            current_document: None,
        }
    }
}

/// Encode one document mutation
///
/// `None` data deletes `name`. Otherwise literal fields become an `update`
/// with an update mask in field order and a `currentDocument.exists`
/// precondition, transforms ride along as `updateTransforms`, and a
/// transform-only mutation becomes a standalone `transform`. Undefined
/// fields are skipped.
pub fn build_write(name: &str, data: Option<&DocumentData>, exists: bool) -> Write {
    let Some(data) = data else {
        return Write::new(WriteOperation::Delete(name.to_string()));
    };

    let mut fields: IndexMap<String, Value> = IndexMap::new();
    let mut transforms = Vec::new();

    for (key, field) in data.iter() {
        match field {
            DataField::Undefined => continue,
            DataField::Transform(transform) => {
                transforms.push(FieldTransform::new(key.clone(), transform.clone()))
            }
            DataField::Value(value) => {
                fields.insert(key.clone(), encode(value));
            }
        }
    }

    if fields.is_empty() {
        // An empty mutation still produces an (empty) transform
        return Write::new(WriteOperation::Transform(DocumentTransform {
            document: name.to_string(),
            field_transforms: transforms,
        }));
    }

    let field_paths = fields.keys().cloned().collect();
    Write {
        operation: WriteOperation::Update(Document {
            name: name.to_string(),
            fields: Some(fields),
            ..Default::default()
        }),
        update_mask: Some(DocumentMask { field_paths }),
        update_transforms: transforms,
        current_document: Some(Precondition {
            exists: Some(exists),
            update_time: None,
        }),
    }
}

/// Options for `set`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Merge into the existing document
    ///
    /// Also sent as the `currentDocument.exists` precondition.
    pub merge: bool,
}

impl SetOptions {
    /// `{ merge: true }`
    pub fn merge() -> Self {
        Self { merge: true }
    }
}

/// Body of a `:commit` request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    /// Writes applied atomically, in order
    pub writes: Vec<Write>,
    /// Transaction the writes belong to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
}

/// Result of one applied write
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    /// Last update time of the document after the write
    #[serde(default)]
    pub update_time: Option<String>,
    /// Values produced by transforms, in transform order
    #[serde(default)]
    pub transform_results: Vec<Value>,
}

/// Response of a `:commit` request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    /// One result per write
    #[serde(default)]
    pub write_results: Vec<WriteResult>,
    /// Time the commit happened
    #[serde(default)]
    pub commit_time: Option<String>,
}

/// Ordered buffer of writes
///
/// Operations take document resource names
/// (`projects/{p}/databases/{d}/documents/{path}`).
#[derive(Debug, Clone, Default)]
pub struct WriteBuilder {
    writes: Vec<Write>,
    transaction: Option<String>,
}

impl WriteBuilder {
    /// Empty buffer outside any transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty buffer whose commit carries `transaction`
    ///
    /// Pairs with [`RequestBuilder::with_transaction`](super::request::RequestBuilder::with_transaction)
    /// for callers that manage a `:beginTransaction` id themselves.
    pub fn with_transaction(transaction: impl Into<String>) -> Self {
        Self {
            writes: Vec::new(),
            transaction: Some(transaction.into()),
        }
    }

    /// Queue a set; `options.merge` is sent as the exists precondition
    pub fn set(&mut self, name: &str, data: &DocumentData, options: SetOptions) -> &mut Self {
        self.writes.push(build_write(name, Some(data), options.merge));
        self
    }

    /// Queue an update of an existing document
    pub fn update(&mut self, name: &str, data: &DocumentData) -> &mut Self {
        self.writes.push(build_write(name, Some(data), true));
        self
    }

    /// Queue a delete
    pub fn delete(&mut self, name: &str) -> &mut Self {
        self.writes.push(build_write(name, None, false));
        self
    }

    /// Number of queued writes
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Commit body for everything queued so far
    pub fn build(&self) -> CommitRequest {
        CommitRequest {
            writes: self.writes.clone(),
            transaction: self.transaction.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::field_transform::{
        append, increment, maximum, minimum, remove, server_timestamp,
    };
    use crate::firestore::native_value::NativeValue;
    use serde_json::json;

    const NAME: &str = "projects/project/databases/(default)/documents/collection/document";

    fn writes_json(builder: &WriteBuilder) -> serde_json::Value {
        serde_json::to_value(builder.build().writes).unwrap()
    }

    #[test]
    fn test_delete_write() {
        let mut builder = WriteBuilder::new();
        builder.delete(NAME);

        assert_eq!(writes_json(&builder), json!([{"delete": NAME}]));
    }

    #[test]
    fn test_transform_only_write() {
        let data = DocumentData::new()
            .insert("countInt", increment(1))
            .insert("countDouble", increment(1.1))
            .insert("timestamp", server_timestamp())
            .insert("arrayNum", append([1, 2, 3]))
            .insert("arrayStr", remove(["1", "2"]))
            .insert("countMax", maximum(1))
            .insert("countMin", minimum(1))
            .insert("undefined", Option::<i64>::None);

        let mut builder = WriteBuilder::new();
        builder.update(NAME, &data);

        assert_eq!(
            writes_json(&builder),
            json!([{"transform": {
                "document": NAME,
                "fieldTransforms": [
                    {"fieldPath": "countInt", "increment": {"integerValue": 1}},
                    {"fieldPath": "countDouble", "increment": {"doubleValue": 1.1}},
                    {"fieldPath": "timestamp", "setToServerValue": "REQUEST_TIME"},
                    {"fieldPath": "arrayNum", "appendMissingElements": {"values": [
                        {"integerValue": 1}, {"integerValue": 2}, {"integerValue": 3}
                    ]}},
                    {"fieldPath": "arrayStr", "removeAllFromArray": {"values": [
                        {"stringValue": "1"}, {"stringValue": "2"}
                    ]}},
                    {"fieldPath": "countMax", "maximum": {"integerValue": 1}},
                    {"fieldPath": "countMin", "minimum": {"integerValue": 1}}
                ]
            }}])
        );
    }

    #[test]
    fn test_combined_update_and_transform() {
        let data = DocumentData::new()
            .insert("countInt", increment(1))
            .insert("id", "id")
            .insert("map", NativeValue::from(json!({"name": "name"})))
            .insert("array", NativeValue::from(json!([1, 2, {"map": {"name": "name"}}])));

        let mut builder = WriteBuilder::new();
        builder.set(NAME, &data, SetOptions::merge());

        assert_eq!(
            writes_json(&builder),
            json!([{
                "updateMask": {"fieldPaths": ["id", "map", "array"]},
                "updateTransforms": [
                    {"fieldPath": "countInt", "increment": {"integerValue": 1}}
                ],
                "currentDocument": {"exists": true},
                "update": {
                    "name": NAME,
                    "fields": {
                        "id": {"stringValue": "id"},
                        "map": {"mapValue": {"fields": {"name": {"stringValue": "name"}}}},
                        "array": {"arrayValue": {"values": [
                            {"integerValue": 1},
                            {"integerValue": 2},
                            {"mapValue": {"fields": {"map": {"mapValue": {"fields": {
                                "name": {"stringValue": "name"}
                            }}}}}}
                        ]}}
                    }
                }
            }])
        );
    }

    #[test]
    fn test_build_write_exists_flag() {
        let data = DocumentData::new()
            .insert("id", "x")
            .insert("count", increment(1));

        let write = build_write(NAME, Some(&data), true);

        assert_eq!(
            write.update_mask,
            Some(DocumentMask {
                field_paths: vec!["id".to_string()]
            })
        );
        assert_eq!(
            write.current_document,
            Some(Precondition {
                exists: Some(true),
                update_time: None
            })
        );
        assert_eq!(
            serde_json::to_value(&write.update_transforms).unwrap(),
            json!([{"fieldPath": "count", "increment": {"integerValue": 1}}])
        );
    }

    #[test]
    fn test_empty_data_is_empty_transform() {
        let expected = json!({"transform": {"document": NAME, "fieldTransforms": []}});

        let empty = build_write(NAME, Some(&DocumentData::new()), true);
        assert_eq!(serde_json::to_value(&empty).unwrap(), expected);

        let undefined_only = DocumentData::new().insert("gone", Option::<i64>::None);
        let write = build_write(NAME, Some(&undefined_only), false);
        assert_eq!(serde_json::to_value(&write).unwrap(), expected);
        assert_eq!(write.current_document, None);
    }

    #[test]
    fn test_set_without_merge_sends_exists_false() {
        let mut builder = WriteBuilder::new();
        builder.set(NAME, &DocumentData::new().insert("a", 1), SetOptions::default());

        let request = builder.build();
        assert_eq!(
            request.writes[0].current_document,
            Some(Precondition {
                exists: Some(false),
                update_time: None
            })
        );
    }

    #[test]
    fn test_builder_keeps_order_and_transaction() {
        let mut builder = WriteBuilder::with_transaction("tx-1");
        builder
            .set("projects/p/databases/(default)/documents/c/a", &DocumentData::new().insert("v", 1), SetOptions::default())
            .delete("projects/p/databases/(default)/documents/c/b");

        let request = builder.build();
        assert_eq!(builder.len(), 2);
        assert_eq!(request.transaction.as_deref(), Some("tx-1"));
        assert!(matches!(request.writes[0].operation, WriteOperation::Update(_)));
        assert!(matches!(request.writes[1].operation, WriteOperation::Delete(_)));

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["transaction"], json!("tx-1"));
    }

    #[test]
    fn test_commit_request_omits_missing_transaction() {
        let body = serde_json::to_value(WriteBuilder::new().build()).unwrap();
        assert_eq!(body, json!({"writes": []}));
    }

    #[test]
    fn test_commit_response_parses() {
        let response: CommitResponse = serde_json::from_value(json!({
            "writeResults": [{"updateTime": "2021-10-25T22:49:25.790Z"}, {}],
            "commitTime": "2021-10-25T22:49:25.790Z"
        }))
        .unwrap();

        assert_eq!(response.write_results.len(), 2);
        assert!(response.write_results[1].transform_results.is_empty());
    }
}
