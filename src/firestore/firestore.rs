//! REST-based Firestore client
//!
//! [`Firestore`] owns the credential, the endpoint settings and the
//! transport; references, batches and transactions borrow them through a
//! shared [`FirestoreInner`].
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents`

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::debug;

use super::collection_reference::CollectionReference;
use super::document_reference::DocumentReference;
use super::request::{self, RequestBuilder};
use super::settings::{Credential, Settings};
use super::transaction::{Transaction, TransactionOptions, Transactor};
use super::transport::{HttpRequest, HttpTransport, ReqwestTransport};
use super::write::{CommitResponse, WriteBuilder};
use super::write_batch::WriteBatch;
use crate::error::FirebaseError;

/// Firestore database client
///
/// Cheap to clone; clones share the transport.
///
/// # Example
/// ```no_run
/// # use firestore_rest::firestore::{Credential, Firestore};
/// # async fn example() -> Result<(), firestore_rest::FirebaseError> {
/// let firestore = Firestore::new(Credential::new("my-project").with_token("token"))?;
/// let alice = firestore.document("users/alice").find().await?;
/// println!("exists: {}", alice.exists());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Firestore {
    pub(crate) inner: Arc<FirestoreInner>,
}

/// State shared by every handle created from one client
pub struct FirestoreInner {
    pub(crate) credential: Credential,
    pub(crate) settings: Settings,
    pub(crate) root_url: String,
    pub(crate) documents_name: String,
    pub(crate) transport: Arc<dyn HttpTransport>,
}

impl FirestoreInner {
    /// Request builder for plain (non-transactional) calls
    pub(crate) fn requests(&self) -> RequestBuilder {
        RequestBuilder::new(&self.root_url, self.credential.token.as_deref())
    }

    /// Send a request through the configured transport
    pub(crate) async fn send(
        &self,
        request: HttpRequest,
        disable_404: bool,
    ) -> Result<Option<JsonValue>, FirebaseError> {
        request::send(self.transport.as_ref(), request, disable_404).await
    }

    /// Commit the writes accumulated in `builder` in one request
    pub(crate) async fn commit(&self, builder: &WriteBuilder) -> Result<CommitResponse, FirebaseError> {
        let commit = builder.build();
        debug!(writes = commit.writes.len(), "Committing writes");

        let request = self.requests().for_commit(&commit)?;
        match self.send(request, false).await? {
            Some(JsonValue::Null) | None => Ok(CommitResponse::default()),
            Some(body) => Ok(serde_json::from_value(body)?),
        }
    }

    /// Absolute URL of a relative path (`users/alice`), or of the root for `""`
    pub(crate) fn url_of(&self, path: &str) -> String {
        if path.is_empty() {
            self.root_url.clone()
        } else {
            format!("{}/{}", self.root_url, path)
        }
    }

    /// Resource name of a relative path
    pub(crate) fn name_of(&self, path: &str) -> String {
        if path.is_empty() {
            self.documents_name.clone()
        } else {
            format!("{}/{}", self.documents_name, path)
        }
    }
}

impl fmt::Debug for FirestoreInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirestoreInner")
            .field("project_id", &self.credential.project_id)
            .field("root_url", &self.root_url)
            .finish()
    }
}

impl fmt::Debug for Firestore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Firestore")
            .field("project_id", &self.project_id())
            .field("database_id", &self.database_id())
            .finish()
    }
}

impl Firestore {
    /// Client for the production endpoint with default settings
    pub fn new(credential: Credential) -> Result<Self, FirebaseError> {
        Self::with_settings(credential, Settings::default())
    }

    /// Client with custom endpoint settings, using the `reqwest` transport
    pub fn with_settings(credential: Credential, settings: Settings) -> Result<Self, FirebaseError> {
        let transport = ReqwestTransport::new(settings.timeout)?;
        Ok(Self::with_transport(credential, settings, Arc::new(transport)))
    }

    /// Client sending every request through `transport`
    pub fn with_transport(
        credential: Credential,
        settings: Settings,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let root_url = settings.root_url(&credential.project_id);
        let documents_name = settings.documents_name(&credential.project_id);

        Self {
            inner: Arc::new(FirestoreInner {
                credential,
                settings,
                root_url,
                documents_name,
                transport,
            }),
        }
    }

    /// Get the project ID
    pub fn project_id(&self) -> &str {
        &self.inner.credential.project_id
    }

    /// Get the database ID
    pub fn database_id(&self) -> &str {
        &self.inner.settings.database_id
    }

    /// URL of the documents root
    pub fn root_url(&self) -> &str {
        &self.inner.root_url
    }

    /// Get a reference to a collection
    ///
    /// # Arguments
    /// * `path` - Collection path (e.g., "users" or "rooms/eros/messages")
    pub fn collection(&self, path: impl AsRef<str>) -> CollectionReference {
        CollectionReference::new(path.as_ref(), Arc::clone(&self.inner))
    }

    /// Get a reference to a document
    ///
    /// # Arguments
    /// * `path` - Document path (e.g., "users/alice")
    pub fn document(&self, path: impl AsRef<str>) -> DocumentReference {
        DocumentReference::new(path.as_ref(), Arc::clone(&self.inner))
    }

    /// Create a new write batch
    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new(Arc::clone(&self.inner))
    }

    /// Create a transaction coordinator
    ///
    /// Writes buffered by one transactor accumulate across all of its runs.
    pub fn transactor(&self) -> Transactor {
        Transactor::new(Arc::clone(&self.inner))
    }

    /// Run `runner` in a fresh transactor with default options
    ///
    /// # Example
    /// ```no_run
    /// # use firestore_rest::firestore::{Credential, DocumentData, Firestore, SetOptions};
    /// # async fn example() -> Result<(), firestore_rest::FirebaseError> {
    /// let firestore = Firestore::new(Credential::new("my-project"))?;
    /// let counter = firestore.document("counters/visitors");
    ///
    /// let count = firestore
    ///     .run_transaction(|tx| {
    ///         let counter = counter.clone();
    ///         async move {
    ///             let snapshot = tx.find(&counter).await?;
    ///             let count = snapshot.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
    ///             tx.set(&counter, DocumentData::new().insert("count", count + 1), SetOptions::default());
    ///             Ok::<_, firestore_rest::FirebaseError>(count + 1)
    ///         }
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_transaction<F, Fut, R>(&self, runner: F) -> Result<R, FirebaseError>
    where
        F: FnMut(Transaction) -> Fut,
        Fut: Future<Output = Result<R, FirebaseError>>,
    {
        self.transactor()
            .run(runner, TransactionOptions::default())
            .await
    }
}
