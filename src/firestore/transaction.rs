//! Firestore transaction support
//!
//! A [`Transactor`] runs a user function against a [`Transaction`] handle,
//! commits the writes the function queued, and retries the whole attempt
//! when the commit or the function fails with a retryable error.
//!
//! Reads made through the handle are plain reads. The write buffer belongs
//! to the transactor and is not cleared between attempts or runs, so writes
//! queued by a failed attempt are committed again with the next one.
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents/commit`

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::collection_reference::CollectionReference;
use super::document_data::DocumentData;
use super::document_reference::DocumentReference;
use super::document_snapshot::DocumentSnapshot;
use super::firestore::FirestoreInner;
use super::query_snapshot::QuerySnapshot;
use super::request::FindOptions;
use super::write::{SetOptions, WriteBuilder};
use crate::error::{FirebaseError, FirestoreError};

/// Default ceiling on attempts of one run
pub const DEFAULT_MAX_ATTEMPT: u32 = 5;

/// Options for [`Transactor::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionOptions {
    /// Maximum number of times the user function is invoked
    ///
    /// Default: 5
    pub max_attempt: u32,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_attempt: DEFAULT_MAX_ATTEMPT,
        }
    }
}

impl TransactionOptions {
    /// Options with a custom attempt ceiling
    pub fn max_attempt(max_attempt: u32) -> Self {
        Self { max_attempt }
    }
}

/// Where a transactor is in its run loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionState {
    /// No run started yet
    Idle,
    /// Attempt `n` (1-based) is in flight
    Attempting(u32),
    /// Attempt `n` failed and the next one is about to start
    Retrying(u32),
    /// The last run committed
    Committed,
    /// The last run gave up with an error
    Failed,
}

/// Handle passed to the user function on each attempt
///
/// Clones share the same write buffer.
#[derive(Clone)]
pub struct Transaction {
    writes: Arc<Mutex<WriteBuilder>>,
    firestore: Arc<FirestoreInner>,
}

impl Transaction {
    fn new(firestore: Arc<FirestoreInner>) -> Self {
        Self {
            writes: Arc::new(Mutex::new(WriteBuilder::new())),
            firestore,
        }
    }

    fn writes(&self) -> MutexGuard<'_, WriteBuilder> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read a document
    pub async fn find(&self, document: &DocumentReference) -> Result<DocumentSnapshot, FirebaseError> {
        document.find().await
    }

    /// List a collection
    pub async fn find_all(&self, collection: &CollectionReference) -> Result<QuerySnapshot, FirebaseError> {
        collection.find_all().await
    }

    /// Read a document, returning only the picked fields
    pub async fn find_with_options(
        &self,
        document: &DocumentReference,
        options: &FindOptions,
    ) -> Result<DocumentSnapshot, FirebaseError> {
        document.find_with_options(options).await
    }

    /// List a collection, returning only the picked fields
    pub async fn find_all_with_options(
        &self,
        collection: &CollectionReference,
        options: &FindOptions,
    ) -> Result<QuerySnapshot, FirebaseError> {
        collection.find_all_with_options(options).await
    }

    /// Queue a set of `document`
    pub fn set(&self, document: &DocumentReference, data: impl Into<DocumentData>, options: SetOptions) -> &Self {
        self.writes().set(&document.name(), &data.into(), options);
        self
    }

    /// Queue an update of an existing `document`
    pub fn update(&self, document: &DocumentReference, data: impl Into<DocumentData>) -> &Self {
        self.writes().update(&document.name(), &data.into());
        self
    }

    /// Queue a delete of `document`
    pub fn delete(&self, document: &DocumentReference) -> &Self {
        self.writes().delete(&document.name());
        self
    }

    /// Number of writes in the buffer
    pub fn len(&self) -> usize {
        self.writes().len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.writes().is_empty()
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("writes", &self.len())
            .finish()
    }
}

/// Optimistic transaction coordinator
///
/// # Example
/// ```no_run
/// # use firestore_rest::firestore::{Credential, DocumentData, Firestore, TransactionOptions};
/// # async fn example() -> Result<(), firestore_rest::FirebaseError> {
/// let firestore = Firestore::new(Credential::new("my-project"))?;
/// let room = firestore.document("rooms/eros");
///
/// firestore
///     .transactor()
///     .run(
///         |tx| {
///             let room = room.clone();
///             async move {
///                 tx.update(&room, DocumentData::new().insert("open", false));
///                 Ok::<_, firestore_rest::FirebaseError>(())
///             }
///         },
///         TransactionOptions::max_attempt(3),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Transactor {
    transaction: Transaction,
    state: Mutex<TransactionState>,
}

impl Transactor {
    pub(crate) fn new(firestore: Arc<FirestoreInner>) -> Self {
        Self {
            transaction: Transaction::new(firestore),
            state: Mutex::new(TransactionState::Idle),
        }
    }

    /// Current state of the run loop
    pub fn state(&self) -> TransactionState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn enter(&self, state: TransactionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Run `runner` and commit what it queued, retrying on failure
    ///
    /// A failure carrying code 404 or 413 (or a query validation error) is
    /// returned immediately. Other failures start a new attempt until
    /// `options.max_attempt` invocations have been made; the last error is
    /// then returned. On success the value produced by `runner` is returned.
    pub async fn run<F, Fut, R>(&self, mut runner: F, options: TransactionOptions) -> Result<R, FirebaseError>
    where
        F: FnMut(Transaction) -> Fut,
        Fut: Future<Output = Result<R, FirebaseError>>,
    {
        // Validate options (error cases first)
        if options.max_attempt == 0 {
            return Err(FirestoreError::InvalidArgument(
                "max_attempt must be at least 1".to_string(),
            )
            .into());
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.enter(TransactionState::Attempting(attempt));

            match self.attempt(&mut runner).await {
                Ok(value) => {
                    self.enter(TransactionState::Committed);
                    return Ok(value);
                }
                Err(err) if !err.is_retryable() || attempt >= options.max_attempt => {
                    self.enter(TransactionState::Failed);
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempt = options.max_attempt,
                        error = %err,
                        "Transaction attempt failed, retrying"
                    );
                    self.enter(TransactionState::Retrying(attempt));
                }
            }
        }
    }

    async fn attempt<F, Fut, R>(&self, runner: &mut F) -> Result<R, FirebaseError>
    where
        F: FnMut(Transaction) -> Fut,
        Fut: Future<Output = Result<R, FirebaseError>>,
    {
        let value = runner(self.transaction.clone()).await?;

        let writes = self.transaction.writes().clone();
        debug!(writes = writes.len(), "Committing transaction");
        self.transaction.firestore.commit(&writes).await?;

        Ok(value)
    }
}

impl std::fmt::Debug for Transactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transactor")
            .field("state", &self.state())
            .field("transaction", &self.transaction)
            .finish()
    }
}
