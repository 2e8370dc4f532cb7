//! Firestore QuerySnapshot type
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents/list`
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents/runQuery`

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::document_snapshot::DocumentSnapshot;
use super::field_value::Document;
use super::native_value::NativeMap;
use crate::error::FirebaseError;

/// Response of a collection list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// One streamed `:runQuery` result; entries without a document carry only progress
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RunQueryResponse {
    #[serde(default)]
    pub document: Option<Document>,
}

/// Documents returned by a list or a query
///
/// Only existing documents are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySnapshot {
    documents: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    /// Keep the documents that exist
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        Self {
            documents: documents
                .into_iter()
                .map(|doc| DocumentSnapshot::from_document(Some(doc)))
                .filter(DocumentSnapshot::exists)
                .collect(),
        }
    }

    /// Parse a collection list body (`{documents: [...]}`, possibly empty)
    pub(crate) fn from_list_response(body: Option<JsonValue>) -> Result<Self, FirebaseError> {
        let response: ListDocumentsResponse = match body {
            Some(JsonValue::Null) | None => ListDocumentsResponse::default(),
            Some(json) => serde_json::from_value(json)?,
        };
        Ok(Self::from_documents(response.documents))
    }

    /// Parse a `:runQuery` body (`[{document?}, ...]`)
    pub(crate) fn from_query_response(body: Option<JsonValue>) -> Result<Self, FirebaseError> {
        let entries: Vec<RunQueryResponse> = match body {
            Some(JsonValue::Null) | None => Vec::new(),
            Some(json) => serde_json::from_value(json)?,
        };
        Ok(Self::from_documents(
            entries.into_iter().filter_map(|entry| entry.document),
        ))
    }

    /// Get all documents
    pub fn documents(&self) -> &[DocumentSnapshot] {
        &self.documents
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Get the number of documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Iterate over the documents
    pub fn iter(&self) -> std::slice::Iter<'_, DocumentSnapshot> {
        self.documents.iter()
    }

    /// Decoded fields of every document
    pub fn to_list(&self) -> Vec<NativeMap> {
        self.documents
            .iter()
            .filter_map(|doc| doc.data().cloned())
            .collect()
    }

    /// Deserialize every document into `T`
    pub fn to_list_as<T: DeserializeOwned>(&self) -> Result<Vec<T>, FirebaseError> {
        self.documents
            .iter()
            .filter_map(|doc| doc.data_as::<T>().transpose())
            .collect()
    }
}

impl IntoIterator for QuerySnapshot {
    type Item = DocumentSnapshot;
    type IntoIter = std::vec::IntoIter<DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

impl<'a> IntoIterator for &'a QuerySnapshot {
    type Item = &'a DocumentSnapshot;
    type IntoIter = std::slice::Iter<'a, DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}
