//! Error types for `NestDB`.
//!
//! This module provides the [`enum@Error`] type that represents all possible errors
//! when using `NestDB`.

use std::path::PathBuf;
use std::sync::Arc;

use nestdb_storage::StorageError;
use thiserror::Error;

/// Errors that can occur when using `NestDB`.
///
/// Errors are cheap to clone so that a session can keep the first failure it
/// saw while still handing the same error back to the caller.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A path segment does not exist as a bucket.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// The bucket holds no value for the key.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The key already holds a value.
    ///
    /// Reserved: writes overwrite silently and never report this.
    #[error("key already exists: {0}")]
    KeyExists(String),

    /// A path cannot be used to create buckets.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A configuration error occurred.
    #[error("configuration error: {0}")]
    Config(String),

    /// The store is not open.
    #[error("store is closed")]
    Closed,

    /// A filesystem operation around the database file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path being worked on.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A storage error occurred.
    #[error("storage error: {0}")]
    Storage(#[source] Arc<StorageError>),
}

impl Error {
    /// Returns `true` for [`Error::PathNotFound`] and [`Error::KeyNotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::PathNotFound(_) | Self::KeyNotFound(_))
    }

    /// Returns `true` if this is a storage error.
    #[must_use]
    pub const fn is_storage_error(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source: Arc::new(source) }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(Arc::new(err))
    }
}

/// A specialized `Result` type for `NestDB` operations.
pub type Result<T> = std::result::Result<T, Error>;
