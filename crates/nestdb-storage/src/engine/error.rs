//! Storage error types.

use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the storage layer.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The database could not be opened.
    #[error("failed to open database: {0}")]
    Open(String),

    /// Another handle kept the database file locked past the configured wait.
    #[error("timed out after {0:?} waiting for the database lock")]
    LockTimeout(Duration),

    /// A transaction could not be started, committed or aborted.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A mutation was attempted on a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnly,

    /// A name was used as a bucket where a value is stored, or the reverse.
    #[error("incompatible value: {0}")]
    IncompatibleValue(String),

    /// Bucket names must be non-empty.
    #[error("bucket name required")]
    BucketNameRequired,

    /// Keys must be non-empty.
    #[error("key required")]
    KeyRequired,

    /// The backend reported an unexpected failure.
    #[error("internal storage error: {0}")]
    Internal(String),
}

/// Attach a short description of the failing step to backend errors.
pub trait ErrorContext<T> {
    /// Map the error into [`StorageError::Internal`] prefixed with `context`.
    fn context(self, context: &str) -> StorageResult<T>;
}

impl<T, E: std::fmt::Display> ErrorContext<T> for Result<T, E> {
    fn context(self, context: &str) -> StorageResult<T> {
        self.map_err(|e| StorageError::Internal(format!("{context}: {e}")))
    }
}
