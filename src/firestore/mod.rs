//! Cloud Firestore REST client
//!
//! # Module Structure
//! Protocol core (pure, no I/O):
//! - `native_value.rs`, `field_value.rs` → native and wire value models
//! - `codec.rs` → value classification, encoding and decoding
//! - `timestamp.rs`, `geo_point.rs` → timestamp and geo point helpers
//! - `query.rs` → clause tokens and the structured query compiler
//! - `field_transform.rs`, `document_data.rs`, `write.rs` → write encoding
//!
//! Client:
//! - `settings.rs`, `transport.rs`, `request.rs` → endpoint, HTTP and error handling
//! - `firestore.rs` → `Firestore` client
//! - `document_reference.rs`, `collection_reference.rs` → references and their operations
//! - `document_snapshot.rs`, `query_snapshot.rs` → read results
//! - `write_batch.rs`, `transaction.rs` → batched writes and the transaction coordinator

pub mod codec;
pub mod collection_reference;
pub mod document_data;
pub mod document_reference;
pub mod document_snapshot;
pub mod field_transform;
pub mod field_value;
pub mod geo_point;
pub mod native_value;
pub mod query;
pub mod query_snapshot;
pub mod request;
pub mod settings;
pub mod timestamp;
pub mod transport;
pub mod write;
pub mod write_batch;

/// Core Firestore client
pub mod firestore;
/// Transaction support for atomic read-write operations
pub mod transaction;

// Re-export main Firestore client
pub use firestore::Firestore;

// Values
pub use codec::{classify, decode, decode_fields, encode, encode_fields};
pub use field_value::{ArrayValue, Document, MapValue, Value, ValueType};
pub use geo_point::GeoPoint;
pub use native_value::{NativeMap, NativeValue};

// Queries
pub use query::{
    compile, end, limit, offset, order_by, order_by_direction, start, where_, Direction, EndMode,
    Operator, QueryClause, RunQueryRequest, StartMode, StructuredQuery,
};

// Writes
pub use document_data::{DataField, DocumentData};
pub use field_transform::{
    append, increment, maximum, minimum, remove, server_timestamp, FieldTransform, Transform,
};
pub use write::{CommitRequest, CommitResponse, SetOptions, Write, WriteBuilder};

// Client
pub use collection_reference::CollectionReference;
pub use document_reference::DocumentReference;
pub use document_snapshot::DocumentSnapshot;
pub use query_snapshot::QuerySnapshot;
pub use request::FindOptions;
pub use settings::{Credential, Settings};
pub use transaction::{Transaction, TransactionOptions, TransactionState, Transactor};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use write_batch::WriteBatch;
