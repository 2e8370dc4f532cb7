//! Firestore WriteBatch type
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents/commit`

use std::sync::Arc;

use super::document_data::DocumentData;
use super::document_reference::DocumentReference;
use super::firestore::FirestoreInner;
use super::write::{CommitResponse, SetOptions, WriteBuilder};
use crate::error::FirebaseError;

/// Write batch for atomic operations
///
/// Writes are applied in the order they were queued, all or none.
///
/// # Example
/// ```no_run
/// # use firestore_rest::firestore::{Credential, DocumentData, Firestore, SetOptions};
/// # async fn example() -> Result<(), firestore_rest::FirebaseError> {
/// let firestore = Firestore::new(Credential::new("my-project"))?;
/// firestore
///     .batch()
///     .set(&firestore.document("users/alice"), DocumentData::new().insert("age", 30), SetOptions::default())
///     .delete(&firestore.document("users/bob"))
///     .commit()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct WriteBatch {
    writes: WriteBuilder,
    firestore: Arc<FirestoreInner>,
}

impl WriteBatch {
    pub(crate) fn new(firestore: Arc<FirestoreInner>) -> Self {
        Self {
            writes: WriteBuilder::new(),
            firestore,
        }
    }

    /// Queue a set of `document`
    pub fn set(mut self, document: &DocumentReference, data: impl Into<DocumentData>, options: SetOptions) -> Self {
        self.writes.set(&document.name(), &data.into(), options);
        self
    }

    /// Queue an update of an existing `document`
    pub fn update(mut self, document: &DocumentReference, data: impl Into<DocumentData>) -> Self {
        self.writes.update(&document.name(), &data.into());
        self
    }

    /// Queue a delete of `document`
    pub fn delete(mut self, document: &DocumentReference) -> Self {
        self.writes.delete(&document.name());
        self
    }

    /// Number of queued writes
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Commit every queued write in one request
    pub async fn commit(self) -> Result<CommitResponse, FirebaseError> {
        self.firestore.commit(&self.writes).await
    }
}

impl std::fmt::Debug for WriteBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteBatch")
            .field("writes", &self.writes.len())
            .finish()
    }
}
