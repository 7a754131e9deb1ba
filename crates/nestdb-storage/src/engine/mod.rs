//! Storage engine traits and abstractions.
//!
//! This module defines the core traits that storage backends must implement:
//!
//! - [`StorageEngine`] - Main entry point for creating transactions
//! - [`Transaction`] - Bucket lookup, creation, deletion and keyed access
//! - [`Cursor`] - Ordered iteration over the entries of a bucket
//!
//! # Error Handling
//!
//! All operations return [`StorageResult<T>`] which is an alias for
//! `Result<T, StorageError>`. See [`StorageError`] for the possible error variants.

mod error;
mod traits;

pub use error::{ErrorContext, StorageError, StorageResult};
pub use traits::{BucketId, Cursor, CursorResult, Entry, KeyEntry, StorageEngine, Transaction};
