//! Redb storage engine implementation.
//!
//! This module provides the `RedbEngine` type which implements the
//! `StorageEngine` trait using the Redb embedded database.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use redb::{Database, DatabaseError};
use tracing::{debug, warn};

use crate::engine::{StorageEngine, StorageError, StorageResult};

use super::transaction::RedbTransaction;

/// Pause between attempts to acquire a database file held by another handle.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Configuration options for the Redb storage engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedbConfig {
    /// Cache size in bytes.
    /// If not set, uses Redb's default.
    pub cache_size: Option<usize>,

    /// How long to keep retrying while another handle holds the file lock.
    /// Zero means a single attempt.
    pub lock_timeout: Duration,
}

impl RedbConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache size.
    #[must_use]
    pub const fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = Some(size);
        self
    }

    /// Set the lock wait timeout.
    #[must_use]
    pub const fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

/// A storage engine backed by Redb.
///
/// Redb is a pure-Rust embedded database that provides ACID transactions:
/// one writer at a time and any number of snapshot readers.
///
/// # Example
///
/// ```ignore
/// use nestdb_storage::backends::RedbEngine;
///
/// let engine = RedbEngine::open("my_database.redb")?;
///
/// let mut tx = engine.begin_write()?;
/// let users = tx.create_bucket_if_absent(BucketId::ROOT, b"users")?;
/// tx.put(users, b"user:1", b"Alice")?;
/// tx.commit()?;
/// ```
pub struct RedbEngine {
    /// The underlying Redb database.
    db: Database,
}

impl RedbEngine {
    /// Open or create a database at the given path with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_config(path, RedbConfig::default())
    }

    /// Open or create a database at the given path with custom configuration.
    ///
    /// Redb refuses a file that another handle already holds. Such attempts
    /// are retried until `config.lock_timeout` has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::LockTimeout`] if the file stayed locked, or
    /// [`StorageError::Open`] if the database cannot be opened or created.
    pub fn open_with_config(path: impl AsRef<Path>, config: RedbConfig) -> StorageResult<Self> {
        let path = path.as_ref();
        let deadline = Instant::now() + config.lock_timeout;

        let mut builder = Database::builder();
        if let Some(cache_size) = config.cache_size {
            builder.set_cache_size(cache_size);
        }

        loop {
            match builder.create(path) {
                Ok(db) => return Ok(Self { db }),
                Err(DatabaseError::DatabaseAlreadyOpen) => {
                    let now = Instant::now();
                    if now >= deadline {
                        warn!(
                            path = %path.display(),
                            timeout = ?config.lock_timeout,
                            "database lock wait timed out"
                        );
                        return Err(StorageError::LockTimeout(config.lock_timeout));
                    }
                    debug!(path = %path.display(), "database locked, retrying");
                    thread::sleep(LOCK_RETRY_INTERVAL.min(deadline - now));
                }
                Err(e) => return Err(StorageError::Open(e.to_string())),
            }
        }
    }

    /// Create an in-memory database for testing.
    ///
    /// The database will be lost when the engine is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the database cannot be created.
    pub fn in_memory() -> StorageResult<Self> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(|e| StorageError::Open(e.to_string()))?;

        Ok(Self { db })
    }

    /// Get the underlying Redb database.
    pub const fn inner(&self) -> &Database {
        &self.db
    }
}

impl StorageEngine for RedbEngine {
    type Transaction<'a> = RedbTransaction;

    fn begin_read(&self) -> StorageResult<Self::Transaction<'_>> {
        let tx = self.db.begin_read().map_err(|e| StorageError::Transaction(e.to_string()))?;
        Ok(RedbTransaction::new_read(tx))
    }

    fn begin_write(&self) -> StorageResult<Self::Transaction<'_>> {
        let tx = self.db.begin_write().map_err(|e| StorageError::Transaction(e.to_string()))?;
        Ok(RedbTransaction::new_write(tx))
    }
}
