//! Cloud Firestore REST client
//!
//! Protocol core for talking to Firestore over its REST API: a value codec,
//! a structured-query compiler, a write/transform encoder and an optimistic
//! transaction coordinator, with a thin async client on top.
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), firestore_rest::FirebaseError> {
//! use firestore_rest::firestore::{
//!     increment, limit, where_, Credential, DocumentData, Firestore, Operator, SetOptions,
//! };
//!
//! let firestore = Firestore::new(Credential::new("my-project").with_token("token"))?;
//! let alice = firestore.document("users/alice");
//!
//! alice
//!     .set(DocumentData::new().insert("name", "alice").insert("visits", increment(1)), SetOptions::default())
//!     .await?;
//!
//! let adults = firestore
//!     .collection("users")
//!     .query(vec![where_("age", Operator::GreaterThanOrEqual, 18), limit(10)])
//!     .await?;
//! println!("{} adults", adults.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod firestore;

// Re-exports for convenience
pub use error::{FirebaseError, FirestoreError};
pub use firestore::Firestore;
