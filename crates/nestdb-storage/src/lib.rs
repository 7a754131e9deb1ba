//! `NestDB` Storage
//!
//! This crate provides the bucket-structured storage abstraction used by
//! `NestDB` and its Redb backend.
//!
//! # Overview
//!
//! Data lives in *buckets*: ordered maps from byte keys to either values or
//! nested buckets. Top-level buckets hang off the pseudo-bucket
//! [`BucketId::ROOT`]. All access goes through transactions; the engine allows
//! one writer at a time and any number of snapshot readers.
//!
//! # Core Traits
//!
//! - [`StorageEngine`] - The main entry point for storage operations
//! - [`Transaction`] - Bucket lookup, creation and keyed reads/writes
//! - [`Cursor`] - Ordered iteration over a bucket's entries
//!
//! # Error Handling
//!
//! All storage operations return [`StorageResult<T>`], which is an alias for
//! `Result<T, StorageError>`.
//!
//! # Modules
//!
//! - [`engine`] - Storage engine traits and abstractions
//! - [`backends`] - Concrete storage backend implementations

pub mod backends;
pub mod engine;

pub use engine::{
    BucketId, Cursor, CursorResult, Entry, ErrorContext, KeyEntry, StorageEngine, StorageError,
    StorageResult, Transaction,
};
