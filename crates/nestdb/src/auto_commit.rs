//! Ad-hoc operations, one transaction per call.
//!
//! [`AutoCommit`] mirrors the [`Session`](crate::Session) operation set
//! without binding to a transaction. Lookups run in a read transaction that
//! is always rolled back; mutations run in a write transaction that commits
//! when the operation succeeds and rolls back when it fails. Nothing is
//! remembered between calls.

use nestdb_storage::backends::RedbEngine;
use nestdb_storage::{StorageEngine, Transaction};
use tracing::{trace, warn};

use crate::error::Result;
use crate::ops;
use crate::page::{Page, Scan, PAGE_SIZE};
use crate::path;

/// Runs each operation in its own short-lived transaction.
///
/// Obtained from [`Store::auto_commit`](crate::Store::auto_commit).
pub struct AutoCommit<'e, E: StorageEngine = RedbEngine> {
    engine: &'e E,
}

impl<'e, E: StorageEngine> AutoCommit<'e, E> {
    /// Wrap an open engine.
    pub const fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    fn view<R>(&self, f: impl FnOnce(&E::Transaction<'e>) -> Result<R>) -> Result<R> {
        let tx = self.engine.begin_read()?;
        let result = f(&tx);
        tx.rollback()?;
        result
    }

    fn update<R>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut E::Transaction<'e>) -> Result<R>,
    ) -> Result<R> {
        let mut tx = self.engine.begin_write()?;
        match f(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                warn!(op, error = %err, "rolling back");
                tx.rollback()?;
                Err(err)
            }
        }
    }

    /// See [`Session::read`](crate::Session::read).
    pub fn read(&self, path: &[&str], key: &str) -> Result<Vec<u8>> {
        trace!(path = %path::display(path), key, "AutoCommit::read");
        self.view(|tx| ops::read(tx, path, key))
    }

    /// See [`Session::write`](crate::Session::write).
    pub fn write(&self, path: &[&str], key: &str, value: &[u8]) -> Result<()> {
        trace!(path = %path::display(path), key, "AutoCommit::write");
        self.update("write", |tx| ops::write(tx, path, key, value))
    }

    /// See [`Session::create_bucket`](crate::Session::create_bucket).
    pub fn create_bucket(&self, path: &[&str]) -> Result<()> {
        trace!(path = %path::display(path), "AutoCommit::create_bucket");
        self.update("create_bucket", |tx| ops::create_bucket(tx, path))
    }

    /// See [`Session::delete_key`](crate::Session::delete_key).
    pub fn delete_key(&self, path: &[&str], key: &str) -> Result<()> {
        trace!(path = %path::display(path), key, "AutoCommit::delete_key");
        self.update("delete_key", |tx| ops::delete_key(tx, path, key))
    }

    /// See [`Session::delete_bucket`](crate::Session::delete_bucket).
    pub fn delete_bucket(&self, path: &[&str]) -> Result<()> {
        trace!(path = %path::display(path), "AutoCommit::delete_bucket");
        self.update("delete_bucket", |tx| ops::delete_bucket(tx, path))
    }

    /// See [`Session::key_exists`](crate::Session::key_exists).
    pub fn key_exists(&self, path: &[&str], key: &str) -> bool {
        trace!(path = %path::display(path), key, "AutoCommit::key_exists");
        let result = self.view(|tx| ops::key_exists(tx, path, key));
        ops::answer("key_exists", path, &result)
    }

    /// See [`Session::bucket_exists`](crate::Session::bucket_exists).
    pub fn bucket_exists(&self, path: &[&str]) -> bool {
        trace!(path = %path::display(path), "AutoCommit::bucket_exists");
        let result = self.view(|tx| ops::bucket_exists(tx, path));
        ops::answer("bucket_exists", path, &result)
    }

    /// See [`Session::prefix_exists`](crate::Session::prefix_exists).
    pub fn prefix_exists(&self, path: &[&str], prefix: &str) -> Result<bool> {
        trace!(path = %path::display(path), prefix, "AutoCommit::prefix_exists");
        self.view(|tx| ops::prefix_exists(tx, path, prefix))
    }

    /// See [`Session::read_scan`](crate::Session::read_scan).
    pub fn read_scan(&self, path: &[&str], prefix: &str) -> Result<Scan> {
        trace!(path = %path::display(path), prefix, "AutoCommit::read_scan");
        self.view(|tx| ops::read_scan(tx, path, prefix))
    }

    /// See [`Session::list`](crate::Session::list).
    pub fn list(&self, path: &[&str], token: &str) -> Result<Page<(String, Vec<u8>)>> {
        self.list_with_page_size(path, token, PAGE_SIZE)
    }

    /// See [`Session::list_with_page_size`](crate::Session::list_with_page_size).
    pub fn list_with_page_size(
        &self,
        path: &[&str],
        token: &str,
        page_size: usize,
    ) -> Result<Page<(String, Vec<u8>)>> {
        trace!(path = %path::display(path), token, "AutoCommit::list");
        self.view(|tx| ops::list(tx, path, token, page_size))
    }

    /// See [`Session::list_keys`](crate::Session::list_keys).
    pub fn list_keys(&self, path: &[&str], token: &str) -> Result<Page<String>> {
        self.list_keys_with_page_size(path, token, PAGE_SIZE)
    }

    /// See [`Session::list_keys_with_page_size`](crate::Session::list_keys_with_page_size).
    pub fn list_keys_with_page_size(
        &self,
        path: &[&str],
        token: &str,
        page_size: usize,
    ) -> Result<Page<String>> {
        trace!(path = %path::display(path), token, "AutoCommit::list_keys");
        self.view(|tx| ops::list_keys(tx, path, token, page_size))
    }

    /// See [`Session::list_buckets`](crate::Session::list_buckets).
    pub fn list_buckets(&self, path: &[&str], token: &str) -> Result<Page<String>> {
        self.list_buckets_with_page_size(path, token, PAGE_SIZE)
    }

    /// See [`Session::list_buckets_with_page_size`](crate::Session::list_buckets_with_page_size).
    pub fn list_buckets_with_page_size(
        &self,
        path: &[&str],
        token: &str,
        page_size: usize,
    ) -> Result<Page<String>> {
        trace!(path = %path::display(path), token, "AutoCommit::list_buckets");
        self.view(|tx| ops::list_buckets(tx, path, token, page_size))
    }

    /// See [`Session::next_seq`](crate::Session::next_seq).
    pub fn next_seq(&self, path: &[&str]) -> Result<u64> {
        trace!(path = %path::display(path), "AutoCommit::next_seq");
        self.update("next_seq", |tx| ops::next_seq(tx, path))
    }
}
