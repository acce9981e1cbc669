//! Error types for the user session store.

use sea_orm::DbErr;
use thiserror::Error;

/// Errors produced by the record model and [`UserSessionStore`](crate::UserSessionStore).
///
/// Lookups that find nothing are not errors; they return `Ok(None)` or an
/// empty collection instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The identifier could not be normalized into a canonical UUID.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// The stored version moved on since the record was loaded.
    ///
    /// The caller is expected to reload the record and retry its mutation.
    #[error("optimistic lock conflict on user session {id}: expected version {expected}")]
    OptimisticLockConflict {
        /// Identifier of the conflicting record.
        id: String,
        /// Version the caller held when committing.
        expected: i32,
    },

    /// The record to update no longer exists.
    #[error("user session {0} not found")]
    NotFound(String),

    /// The record has no identifier yet.
    #[error("user session has no identifier")]
    MissingIdentifier,

    /// The record was loaded without its payload and cannot be written back.
    #[error("user session {0} was loaded partially and cannot be written")]
    PartialRecord(String),

    /// Error reported by the database.
    #[error(transparent)]
    Backend(#[from] DbErr),

    /// The metadata payload could not be serialized.
    #[error("failed to encode metadata: {0}")]
    Encode(#[source] serde_json::Error),

    /// The stored metadata payload could not be deserialized.
    #[error("failed to decode metadata: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
