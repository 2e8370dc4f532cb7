//! Firestore CollectionReference type
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents/list`
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents/runQuery`
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents/createDocument`

use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;

use super::codec::encode_fields;
use super::document_data::{DataField, DocumentData};
use super::document_reference::DocumentReference;
use super::firestore::FirestoreInner;
use super::query::{compile, QueryClause};
use super::query_snapshot::QuerySnapshot;
use super::request::FindOptions;
use crate::error::{FirebaseError, FirestoreError};

/// Length of generated document ids
const AUTO_ID_LENGTH: usize = 20;

/// Reference to a Firestore collection
#[derive(Clone)]
pub struct CollectionReference {
    /// Collection path relative to the documents root (e.g., "rooms/eros/messages")
    pub path: String,
    pub(crate) firestore: Arc<FirestoreInner>,
}

impl CollectionReference {
    pub(crate) fn new(path: &str, firestore: Arc<FirestoreInner>) -> Self {
        Self {
            path: path.trim_matches('/').to_string(),
            firestore,
        }
    }

    /// Get collection ID (last segment of path)
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Document owning this collection; `None` for a top-level collection
    pub fn parent(&self) -> Option<DocumentReference> {
        let (parent, _) = self.path.rsplit_once('/')?;
        Some(DocumentReference::new(parent, Arc::clone(&self.firestore)))
    }

    /// Get a document reference within this collection
    pub fn document(&self, document_id: impl AsRef<str>) -> DocumentReference {
        let path = format!("{}/{}", self.path, document_id.as_ref().trim_matches('/'));
        DocumentReference::new(&path, Arc::clone(&self.firestore))
    }

    /// Resource name (`projects/{p}/databases/{d}/documents/{path}`)
    pub fn name(&self) -> String {
        self.firestore.name_of(&self.path)
    }

    /// REST URL of the collection
    pub fn url(&self) -> String {
        self.firestore.url_of(&self.path)
    }

    /// URL queries are posted under: the parent document, or the root
    fn parent_url(&self) -> String {
        let parent = self
            .path
            .rsplit_once('/')
            .map(|(parent, _)| parent)
            .unwrap_or_default();
        self.firestore.url_of(parent)
    }

    /// List every existing document in the collection
    ///
    /// A missing collection is an empty result.
    pub async fn find_all(&self) -> Result<QuerySnapshot, FirebaseError> {
        self.find_all_with_options(&FindOptions::default()).await
    }

    /// List the collection, returning only `options.picks` when set
    pub async fn find_all_with_options(&self, options: &FindOptions) -> Result<QuerySnapshot, FirebaseError> {
        let request = self.firestore.requests().for_find_all(&self.url(), options)?;
        let body = self.firestore.send(request, true).await?;
        QuerySnapshot::from_list_response(body)
    }

    /// Run a structured query over this collection
    ///
    /// # Example
    /// ```no_run
    /// # use firestore_rest::firestore::{Credential, Firestore, Operator, where_, order_by, limit};
    /// # async fn example() -> Result<(), firestore_rest::FirebaseError> {
    /// let firestore = Firestore::new(Credential::new("my-project"))?;
    /// let adults = firestore
    ///     .collection("users")
    ///     .query(vec![where_("age", Operator::GreaterThanOrEqual, 18), order_by("age"), limit(10)])
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn query<I>(&self, clauses: I) -> Result<QuerySnapshot, FirebaseError>
    where
        I: IntoIterator<Item = QueryClause>,
    {
        self.run_query(clauses, &FindOptions::default(), false).await
    }

    /// Run a structured query, selecting only `options.picks` when set
    pub async fn query_with_options<I>(&self, clauses: I, options: &FindOptions) -> Result<QuerySnapshot, FirebaseError>
    where
        I: IntoIterator<Item = QueryClause>,
    {
        self.run_query(clauses, options, false).await
    }

    /// Run a query over every collection with this id below the parent
    pub async fn group_query<I>(&self, clauses: I) -> Result<QuerySnapshot, FirebaseError>
    where
        I: IntoIterator<Item = QueryClause>,
    {
        self.run_query(clauses, &FindOptions::default(), true).await
    }

    /// Collection-group query selecting only `options.picks` when set
    pub async fn group_query_with_options<I>(
        &self,
        clauses: I,
        options: &FindOptions,
    ) -> Result<QuerySnapshot, FirebaseError>
    where
        I: IntoIterator<Item = QueryClause>,
    {
        self.run_query(clauses, options, true).await
    }

    async fn run_query<I>(
        &self,
        clauses: I,
        options: &FindOptions,
        all_descendants: bool,
    ) -> Result<QuerySnapshot, FirebaseError>
    where
        I: IntoIterator<Item = QueryClause>,
    {
        let query = compile(&self.path, clauses, options.picks.as_deref(), all_descendants)?;
        let request = self.firestore.requests().for_query(&self.parent_url(), &query)?;
        let body = self.firestore.send(request, true).await?;
        QuerySnapshot::from_query_response(body)
    }

    /// Create a document with a generated 20-character id and return the id
    pub async fn create(&self, data: impl Into<DocumentData>) -> Result<String, FirebaseError> {
        let data = data.into();

        // Validate data (error cases first)
        if data.iter().any(|(_, field)| matches!(field, DataField::Transform(_))) {
            return Err(FirestoreError::InvalidArgument(
                "field transforms cannot be used when creating a document".to_string(),
            )
            .into());
        }

        let document_id = auto_id();
        let fields = encode_fields(&data.values());
        let request = self
            .firestore
            .requests()
            .for_create(&self.url(), &fields, &document_id)?;

        self.firestore.send(request, false).await?;
        debug!(collection = %self.path, id = %document_id, "Created document");
        Ok(document_id)
    }
}

fn auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LENGTH)
        .map(char::from)
        .collect()
}

impl PartialEq for CollectionReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && Arc::ptr_eq(&self.firestore, &other.firestore)
    }
}

impl std::fmt::Debug for CollectionReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionReference")
            .field("path", &self.path)
            .finish()
    }
}
