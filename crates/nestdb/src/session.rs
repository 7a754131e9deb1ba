//! Sessions: a unit of work bound to one transaction.
//!
//! This module provides [`Session`], which runs any number of path-addressed
//! operations inside a single storage transaction and settles it once, when
//! the session is closed.
//!
//! # Outcome Tracking
//!
//! A session keeps an explicit [`Outcome`]. It starts `Clean`; the first error
//! an operation returns (or an unexpected engine error swallowed by a
//! predicate or listing) turns it into `Failed`. Later errors never replace
//! the first one, and later operations still run.
//!
//! [`Session::close`] turns the outcome into a [`Resolution`]:
//!
//! | Access     | Outcome  | Resolution   |
//! |------------|----------|--------------|
//! | read-only  | any      | rolled back  |
//! | read-write | clean    | committed    |
//! | read-write | failed   | rolled back  |
//!
//! A write session is therefore all-or-nothing. Dropping a session without
//! closing it rolls back.
//!
//! # Example
//!
//! ```ignore
//! let mut session = store.write_session()?;
//! session.write(&["users", "alice"], "email", b"alice@example.com")?;
//! let id = session.next_seq(&["users"])?;
//! assert_eq!(session.close()?, Resolution::Committed);
//! ```

use std::marker::PhantomData;

use nestdb_storage::backends::RedbTransaction;
use nestdb_storage::Transaction;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::ops;
use crate::page::{Page, Scan, PAGE_SIZE};
use crate::path;

/// Whether a session may modify the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Backed by a read-only transaction.
    ReadOnly,
    /// Backed by a read-write transaction.
    ReadWrite,
}

/// What a session has run into so far.
#[derive(Debug, Clone, Default)]
pub enum Outcome {
    /// No operation has failed.
    #[default]
    Clean,
    /// The first failure seen by the session.
    Failed(Error),
}

impl Outcome {
    /// Keep `err` unless an earlier failure is already recorded.
    pub fn record(&mut self, err: &Error) {
        if let Self::Clean = self {
            *self = Self::Failed(err.clone());
        }
    }

    /// The recorded failure, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        match self {
            Self::Clean => None,
            Self::Failed(err) => Some(err),
        }
    }

    /// Whether no failure was recorded.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

/// How a closed session settled its transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Changes were made durable.
    Committed,
    /// Changes, if any, were discarded.
    RolledBack,
}

impl Resolution {
    /// Decide how a session with the given access and outcome must settle.
    #[must_use]
    pub const fn decide(access: Access, outcome: &Outcome) -> Self {
        match (access, outcome) {
            (Access::ReadWrite, Outcome::Clean) => Self::Committed,
            _ => Self::RolledBack,
        }
    }
}

/// A unit of work bound to exactly one transaction.
///
/// Created by [`Store::read_session`](crate::Store::read_session) or
/// [`Store::write_session`](crate::Store::write_session) and consumed by
/// [`Session::close`]. Not meant to be shared between callers: every
/// operation takes `&mut self`.
///
/// All operations take a bucket path, root-first, e.g. `&["users", "alice"]`.
pub struct Session<'s, T: Transaction = RedbTransaction> {
    tx: T,
    access: Access,
    outcome: Outcome,
    _store: PhantomData<&'s ()>,
}

impl<T: Transaction> Session<'_, T> {
    /// Bind a session to an already started transaction.
    pub fn new(tx: T) -> Self {
        let access = if tx.is_read_only() { Access::ReadOnly } else { Access::ReadWrite };
        Self { tx, access, outcome: Outcome::Clean, _store: PhantomData }
    }

    /// Whether the session is backed by a read-write transaction.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.access == Access::ReadWrite
    }

    /// The first failure recorded by this session.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        self.outcome.error()
    }

    /// The outcome so far.
    #[must_use]
    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    fn track<R>(&mut self, result: Result<R>) -> Result<R> {
        if let Err(err) = &result {
            self.outcome.record(err);
        }
        result
    }

    fn settle_predicate(&mut self, op: &'static str, path: &[&str], result: Result<bool>) -> bool {
        if let Err(err) = &result {
            if !err.is_not_found() {
                self.outcome.record(err);
            }
        }
        ops::answer(op, path, &result)
    }

    /// Read the value stored under `key` in the bucket at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathNotFound`] if the bucket does not exist and
    /// [`Error::KeyNotFound`] if it holds no value for `key`.
    pub fn read(&mut self, path: &[&str], key: &str) -> Result<Vec<u8>> {
        trace!(path = %path::display(path), key, "Session::read");
        let result = ops::read(&self.tx, path, key);
        self.track(result)
    }

    /// Store `value` under `key`, creating missing buckets along `path`.
    ///
    /// Existing values are overwritten.
    pub fn write(&mut self, path: &[&str], key: &str, value: &[u8]) -> Result<()> {
        trace!(path = %path::display(path), key, "Session::write");
        let result = ops::write(&mut self.tx, path, key, value);
        self.track(result)
    }

    /// Create every missing bucket along `path`.
    pub fn create_bucket(&mut self, path: &[&str]) -> Result<()> {
        trace!(path = %path::display(path), "Session::create_bucket");
        let result = ops::create_bucket(&mut self.tx, path);
        self.track(result)
    }

    /// Delete `key` from the bucket at `path`.
    ///
    /// The path is resolved like a write, so missing buckets are created and
    /// a read session always fails with a storage error. Succeeds when the
    /// key is absent or the path cannot hold buckets.
    pub fn delete_key(&mut self, path: &[&str], key: &str) -> Result<()> {
        trace!(path = %path::display(path), key, "Session::delete_key");
        let result = ops::delete_key(&mut self.tx, path, key);
        self.track(result)
    }

    /// Delete the bucket at `path` and everything below it.
    ///
    /// Succeeds when the bucket or its parent does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathNotFound`] for an empty path.
    pub fn delete_bucket(&mut self, path: &[&str]) -> Result<()> {
        trace!(path = %path::display(path), "Session::delete_bucket");
        let result = ops::delete_bucket(&mut self.tx, path);
        self.track(result)
    }

    /// Whether the bucket at `path` holds a value for `key`.
    pub fn key_exists(&mut self, path: &[&str], key: &str) -> bool {
        trace!(path = %path::display(path), key, "Session::key_exists");
        let result = ops::key_exists(&self.tx, path, key);
        self.settle_predicate("key_exists", path, result)
    }

    /// Whether every bucket along `path` exists.
    pub fn bucket_exists(&mut self, path: &[&str]) -> bool {
        trace!(path = %path::display(path), "Session::bucket_exists");
        let result = ops::bucket_exists(&self.tx, path);
        self.settle_predicate("bucket_exists", path, result)
    }

    /// Whether any key or nested bucket name in the bucket at `path` starts
    /// with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathNotFound`] if the bucket does not exist.
    pub fn prefix_exists(&mut self, path: &[&str], prefix: &str) -> Result<bool> {
        trace!(path = %path::display(path), prefix, "Session::prefix_exists");
        let result = ops::prefix_exists(&self.tx, path, prefix);
        self.track(result)
    }

    /// Every key and value in the bucket at `path` whose key starts with
    /// `prefix`, in ascending key order. Nested bucket names are included
    /// with an empty value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathNotFound`] if the bucket does not exist.
    pub fn read_scan(&mut self, path: &[&str], prefix: &str) -> Result<Scan> {
        trace!(path = %path::display(path), prefix, "Session::read_scan");
        let result = ops::read_scan(&self.tx, path, prefix);
        self.track(result)
    }

    /// A page of keys and values of the bucket at `path`.
    ///
    /// Pass an empty `token` for the first page and the returned
    /// `next_token` for the following ones. Nested bucket names are listed
    /// with an empty value. A missing bucket lists as empty.
    pub fn list(&mut self, path: &[&str], token: &str) -> Result<Page<(String, Vec<u8>)>> {
        self.list_with_page_size(path, token, PAGE_SIZE)
    }

    /// [`Session::list`] with a caller-chosen page size.
    pub fn list_with_page_size(
        &mut self,
        path: &[&str],
        token: &str,
        page_size: usize,
    ) -> Result<Page<(String, Vec<u8>)>> {
        trace!(path = %path::display(path), token, "Session::list");
        let result = ops::list(&self.tx, path, token, page_size);
        self.track(result)
    }

    /// A page of keys of the bucket at `path`.
    ///
    /// Nested bucket names are included; [`Session::list_buckets`] lists
    /// only those.
    pub fn list_keys(&mut self, path: &[&str], token: &str) -> Result<Page<String>> {
        self.list_keys_with_page_size(path, token, PAGE_SIZE)
    }

    /// [`Session::list_keys`] with a caller-chosen page size.
    pub fn list_keys_with_page_size(
        &mut self,
        path: &[&str],
        token: &str,
        page_size: usize,
    ) -> Result<Page<String>> {
        trace!(path = %path::display(path), token, "Session::list_keys");
        let result = ops::list_keys(&self.tx, path, token, page_size);
        self.track(result)
    }

    /// A page of the nested bucket names of the bucket at `path`.
    ///
    /// An empty path lists the top-level buckets.
    pub fn list_buckets(&mut self, path: &[&str], token: &str) -> Result<Page<String>> {
        self.list_buckets_with_page_size(path, token, PAGE_SIZE)
    }

    /// [`Session::list_buckets`] with a caller-chosen page size.
    pub fn list_buckets_with_page_size(
        &mut self,
        path: &[&str],
        token: &str,
        page_size: usize,
    ) -> Result<Page<String>> {
        trace!(path = %path::display(path), token, "Session::list_buckets");
        let result = ops::list_buckets(&self.tx, path, token, page_size);
        self.track(result)
    }

    /// The next value of the sequence counter of the bucket at `path`,
    /// creating the bucket if needed. Sequences start at 1.
    pub fn next_seq(&mut self, path: &[&str]) -> Result<u64> {
        trace!(path = %path::display(path), "Session::next_seq");
        let result = ops::next_seq(&mut self.tx, path);
        self.track(result)
    }

    /// Settle the transaction according to [`Resolution::decide`].
    ///
    /// # Errors
    ///
    /// Returns a storage error if the commit or rollback fails. A failed
    /// commit leaves the store unchanged.
    pub fn close(self) -> Result<Resolution> {
        let resolution = Resolution::decide(self.access, &self.outcome);
        match resolution {
            Resolution::Committed => self.tx.commit()?,
            Resolution::RolledBack => self.tx.rollback()?,
        }

        match &self.outcome {
            Outcome::Failed(err) => debug!(error = %err, ?resolution, "session closed"),
            Outcome::Clean => trace!(?resolution, "session closed"),
        }
        Ok(resolution)
    }
}
