//! Core storage engine traits.
//!
//! This module defines the fundamental traits for storage backends:
//!
//! - [`StorageEngine`] - The main entry point for creating transactions
//! - [`Transaction`] - Bucket-structured reads and writes inside one transaction
//! - [`Cursor`] - Ordered iteration over the entries of one bucket
//!
//! Buckets are addressed through [`BucketId`] handles. A handle is only
//! meaningful inside the transaction that produced it.

use std::fmt;
use std::sync::Arc;

use super::StorageResult;

/// Handle to a bucket resolved inside a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketId(u64);

impl BucketId {
    /// The pseudo-bucket holding all top-level buckets.
    ///
    /// The root only ever contains buckets; storing values in it is rejected.
    pub const ROOT: Self = Self(0);

    /// Wrap a raw bucket id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether this is [`BucketId::ROOT`].
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == Self::ROOT.0
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("root")
        } else {
            write!(f, "bucket#{}", self.0)
        }
    }
}

/// What a key inside a bucket refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A plain value.
    Value(Vec<u8>),
    /// A nested bucket.
    Bucket(BucketId),
}

impl Entry {
    /// The stored value, if this entry is not a bucket.
    #[must_use]
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Self::Value(v) => Some(v),
            Self::Bucket(_) => None,
        }
    }

    /// The nested bucket, if this entry is one.
    #[must_use]
    pub const fn bucket(&self) -> Option<BucketId> {
        match self {
            Self::Value(_) => None,
            Self::Bucket(id) => Some(*id),
        }
    }

    /// Whether this entry is a nested bucket.
    #[must_use]
    pub const fn is_bucket(&self) -> bool {
        matches!(self, Self::Bucket(_))
    }
}

/// A key and the entry stored under it.
pub type KeyEntry = (Vec<u8>, Entry);

/// Result type for cursor operations that return an entry.
pub type CursorResult = StorageResult<Option<KeyEntry>>;

/// A storage engine that provides transactional, bucket-structured storage.
///
/// Implementations must be thread-safe (`Send + Sync`). Write transactions
/// are serialized by the engine; read transactions see a consistent snapshot
/// taken when they begin.
///
/// # Example
///
/// ```ignore
/// use nestdb_storage::{BucketId, StorageEngine, Transaction};
///
/// fn example<E: StorageEngine>(engine: &E) -> StorageResult<()> {
///     let mut tx = engine.begin_write()?;
///     let users = tx.create_bucket_if_absent(BucketId::ROOT, b"users")?;
///     tx.put(users, b"user:1", b"Alice")?;
///     tx.commit()?;
///
///     let tx = engine.begin_read()?;
///     if let Some(users) = tx.bucket(BucketId::ROOT, b"users")? {
///         assert_eq!(tx.get(users, b"user:1")?, Some(b"Alice".to_vec()));
///     }
///     Ok(())
/// }
/// ```
pub trait StorageEngine: Send + Sync {
    /// The transaction type for this engine.
    type Transaction<'a>: Transaction
    where
        Self: 'a;

    /// Begin a read-only transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transaction`](super::StorageError::Transaction)
    /// if the transaction cannot be started.
    fn begin_read(&self) -> StorageResult<Self::Transaction<'_>>;

    /// Begin a read-write transaction.
    ///
    /// Blocks while another write transaction is active.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transaction`](super::StorageError::Transaction)
    /// if the transaction cannot be started.
    fn begin_write(&self) -> StorageResult<Self::Transaction<'_>>;
}

/// A transaction over a tree of buckets.
///
/// Write transactions must be explicitly committed; dropping one without
/// committing rolls it back.
pub trait Transaction {
    /// The cursor type for iteration.
    type Cursor<'a>: Cursor
    where
        Self: 'a;

    /// Look up the nested bucket `name` inside `parent`.
    ///
    /// Returns `Ok(None)` when the name is absent or holds a value.
    fn bucket(&self, parent: BucketId, name: &[u8]) -> StorageResult<Option<BucketId>>;

    /// Return the nested bucket `name` inside `parent`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IncompatibleValue`](super::StorageError::IncompatibleValue)
    /// if `name` already holds a value, and
    /// [`StorageError::ReadOnly`](super::StorageError::ReadOnly) on read transactions.
    fn create_bucket_if_absent(&mut self, parent: BucketId, name: &[u8])
        -> StorageResult<BucketId>;

    /// Delete the nested bucket `name` and everything below it.
    ///
    /// Returns `Ok(false)` if there was no such bucket.
    fn delete_bucket(&mut self, parent: BucketId, name: &[u8]) -> StorageResult<bool>;

    /// Get the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent or names a nested bucket.
    fn get(&self, bucket: BucketId, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Insert or replace the value stored under `key`.
    fn put(&mut self, bucket: BucketId, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Delete the value stored under `key`.
    ///
    /// Returns `Ok(false)` if the key did not exist.
    fn delete(&mut self, bucket: BucketId, key: &[u8]) -> StorageResult<bool>;

    /// Create a cursor over the direct entries of `bucket`.
    ///
    /// The cursor is unpositioned; call [`Cursor::seek_first`] or
    /// [`Cursor::seek`] before iterating. Use [`BucketId::ROOT`] to walk the
    /// top-level buckets.
    fn cursor(&self, bucket: BucketId) -> StorageResult<Self::Cursor<'_>>;

    /// Increment and return the sequence counter of `bucket`.
    ///
    /// The first call on a bucket returns 1.
    fn next_sequence(&mut self, bucket: BucketId) -> StorageResult<u64>;

    /// Commit the transaction, making all changes durable.
    fn commit(self) -> StorageResult<()>;

    /// Roll back the transaction, discarding all changes.
    fn rollback(self) -> StorageResult<()>;

    /// Check if this is a read-only transaction.
    fn is_read_only(&self) -> bool;
}

/// A forward cursor over the entries of one bucket, in ascending key order.
///
/// # Iteration Pattern
///
/// ```ignore
/// let mut cursor = tx.cursor(bucket)?;
/// let mut entry = cursor.seek(b"prefix")?;
/// while let Some((key, value)) = entry {
///     // ...
///     entry = cursor.next()?;
/// }
/// ```
pub trait Cursor {
    /// Position at the first key greater than or equal to `key`.
    fn seek(&mut self, key: &[u8]) -> CursorResult;

    /// Position at the first key of the bucket.
    fn seek_first(&mut self) -> CursorResult;

    /// Advance to the next key.
    ///
    /// On an unpositioned cursor this behaves like [`Cursor::seek_first`].
    fn next(&mut self) -> CursorResult;

    /// The entry under the cursor, if positioned.
    fn current(&self) -> Option<(&[u8], &Entry)>;
}

/// Allow shared ownership of an engine.
impl<E: StorageEngine> StorageEngine for Arc<E> {
    type Transaction<'a>
        = E::Transaction<'a>
    where
        Self: 'a;

    fn begin_read(&self) -> StorageResult<Self::Transaction<'_>> {
        (**self).begin_read()
    }

    fn begin_write(&self) -> StorageResult<Self::Transaction<'_>> {
        (**self).begin_write()
    }
}
