//! Firestore DocumentReference type
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents/get`
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents/commit`

use std::sync::Arc;

use super::collection_reference::CollectionReference;
use super::document_data::DocumentData;
use super::document_snapshot::DocumentSnapshot;
use super::field_value::Document;
use super::firestore::FirestoreInner;
use super::request::FindOptions;
use super::write::{SetOptions, WriteBuilder};
use crate::error::FirebaseError;

/// Reference to a Firestore document
#[derive(Clone)]
pub struct DocumentReference {
    /// Document path relative to the documents root (e.g., "users/alice")
    pub path: String,
    pub(crate) firestore: Arc<FirestoreInner>,
}

impl DocumentReference {
    pub(crate) fn new(path: &str, firestore: Arc<FirestoreInner>) -> Self {
        Self {
            path: path.trim_matches('/').to_string(),
            firestore,
        }
    }

    /// Get the document ID (last segment of path)
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Collection containing this document
    pub fn parent(&self) -> CollectionReference {
        let parent = self
            .path
            .rsplit_once('/')
            .map(|(parent, _)| parent)
            .unwrap_or_default();
        CollectionReference::new(parent, Arc::clone(&self.firestore))
    }

    /// Subcollection of this document
    pub fn collection(&self, collection_id: impl AsRef<str>) -> CollectionReference {
        let path = format!("{}/{}", self.path, collection_id.as_ref().trim_matches('/'));
        CollectionReference::new(&path, Arc::clone(&self.firestore))
    }

    /// Resource name (`projects/{p}/databases/{d}/documents/{path}`)
    pub fn name(&self) -> String {
        self.firestore.name_of(&self.path)
    }

    /// REST URL of the document
    pub fn url(&self) -> String {
        self.firestore.url_of(&self.path)
    }

    /// Read the document
    ///
    /// A missing document yields a snapshot whose `exists()` is false.
    pub async fn find(&self) -> Result<DocumentSnapshot, FirebaseError> {
        self.find_with_options(&FindOptions::default()).await
    }

    /// Read the document, returning only `options.picks` when set
    pub async fn find_with_options(&self, options: &FindOptions) -> Result<DocumentSnapshot, FirebaseError> {
        let request = self.firestore.requests().for_find(&self.url(), options)?;
        let document = match self.firestore.send(request, true).await? {
            Some(body) if !body.is_null() => Some(serde_json::from_value::<Document>(body)?),
            _ => None,
        };
        Ok(DocumentSnapshot::from_document(document))
    }

    /// Write the document
    ///
    /// `options.merge` is also sent as the exists precondition.
    pub async fn set(&self, data: impl Into<DocumentData>, options: SetOptions) -> Result<(), FirebaseError> {
        let mut writes = WriteBuilder::new();
        writes.set(&self.name(), &data.into(), options);
        self.firestore.commit(&writes).await?;
        Ok(())
    }

    /// Update fields of an existing document
    pub async fn update(&self, data: impl Into<DocumentData>) -> Result<(), FirebaseError> {
        let mut writes = WriteBuilder::new();
        writes.update(&self.name(), &data.into());
        self.firestore.commit(&writes).await?;
        Ok(())
    }

    /// Delete the document
    pub async fn delete(&self) -> Result<(), FirebaseError> {
        let mut writes = WriteBuilder::new();
        writes.delete(&self.name());
        self.firestore.commit(&writes).await?;
        Ok(())
    }
}

impl PartialEq for DocumentReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && Arc::ptr_eq(&self.firestore, &other.firestore)
    }
}

impl std::fmt::Debug for DocumentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentReference")
            .field("path", &self.path)
            .finish()
    }
}
