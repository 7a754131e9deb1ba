//! Redb storage backend.
//!
//! This module provides a storage backend implementation using Redb,
//! a pure-Rust embedded database. Redb provides ACID transactions with a
//! single writer and any number of snapshot readers, but only flat tables;
//! the bucket tree is layered on top through the key encoding in [`tables`].
//!
//! # Example
//!
//! ```ignore
//! use nestdb_storage::backends::RedbEngine;
//! use nestdb_storage::{BucketId, StorageEngine, Transaction};
//!
//! let engine = RedbEngine::open("my_database.redb")?;
//!
//! let mut tx = engine.begin_write()?;
//! let users = tx.create_bucket_if_absent(BucketId::ROOT, b"users")?;
//! tx.put(users, b"user:1", b"Alice")?;
//! tx.commit()?;
//! ```
//!
//! # In-Memory Databases
//!
//! For testing, you can create an in-memory database that doesn't persist:
//!
//! ```ignore
//! let engine = RedbEngine::in_memory()?;
//! ```

mod engine;
pub mod tables;
mod transaction;

pub use engine::{RedbConfig, RedbEngine};
pub use transaction::{RedbCursor, RedbTransaction};
