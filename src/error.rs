//! Firestore error types
//!
//! Provides a unified error type hierarchy for all Firestore operations.
//!
//! # Design
//! Uses thiserror for ergonomic error definitions. All errors implement
//! std::error::Error and can be converted to FirebaseError via From trait.
//!
//! Remote failures keep the `{code, message}` pair from the REST error
//! payload untouched so callers see exactly what the backend reported.

use thiserror::Error;

/// HTTP code the backend uses for a missing document or collection
pub const CODE_NOT_FOUND: i64 = 404;

/// HTTP code the backend uses for an oversized request
pub const CODE_REQUEST_TOO_LARGE: i64 = 413;

/// Top-level error type
///
/// Wraps Firestore errors and the transport/serialization failures beneath
/// them into a unified type.
///
/// # Example
/// ```
/// use firestore_rest::{FirebaseError, FirestoreError};
///
/// let err: FirebaseError = FirestoreError::remote(404, "no such document").into();
/// assert!(err.is_not_found());
/// ```
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Firestore-related errors
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// Network/HTTP errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Firestore errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FirestoreError {
    /// Error payload returned by the backend (`{error: {code, message}}`)
    #[error("Remote error {code}: {message}")]
    Remote {
        /// HTTP-style error code (404, 409, 413, ...)
        code: i64,
        /// Human readable message from the backend
        message: String,
        /// Canonical status name (`NOT_FOUND`, `ABORTED`, ...) when present
        status: Option<String>,
    },

    /// A clause that may appear once was given twice in one query
    #[error("{clause} can only be used once on the same query.")]
    DuplicateClause {
        /// User-facing clause name (`start` or `end`)
        clause: &'static str,
    },

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Connection or network error
    #[error("Connection error: {0}")]
    Connection(String),
}

impl FirestoreError {
    /// Create a remote error from a code and message
    pub fn remote(code: i64, message: impl Into<String>) -> Self {
        Self::Remote {
            code,
            message: message.into(),
            status: None,
        }
    }

    /// Remote error code, if this error came from the backend
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl FirebaseError {
    /// Create an internal error from a string
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Remote error code carried by this error, if any
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Firestore(err) => err.code(),
            Self::Network(err) => err.status().map(|s| i64::from(s.as_u16())),
            _ => None,
        }
    }

    /// Check if the backend reported the target as missing
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(CODE_NOT_FOUND)
    }

    /// Check if a transaction attempt that failed with this error may be retried
    ///
    /// 404 and 413 are terminal, as are query validation errors: repeating the
    /// attempt cannot change their outcome.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Firestore(FirestoreError::DuplicateClause { .. }) => false,
            _ => !matches!(
                self.code(),
                Some(CODE_NOT_FOUND) | Some(CODE_REQUEST_TOO_LARGE)
            ),
        }
    }
}
