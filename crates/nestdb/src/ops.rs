//! Path-addressed operations against a single transaction.
//!
//! Every operation is written once here, generic over [`Transaction`], and
//! shared by [`Session`](crate::Session) and [`AutoCommit`](crate::AutoCommit).
//! Those wrappers decide which transaction to run in and what to do with the
//! outcome; the error policy of each operation lives here.

use nestdb_storage::{BucketId, StorageError, Transaction};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::page::{entry_value, key_string, walk_page, walk_prefix, Page, Scan};
use crate::path::{self, lookup, resolve, resolve_or_create};

pub(crate) fn read<T: Transaction>(tx: &T, path: &[&str], key: &str) -> Result<Vec<u8>> {
    let bucket = resolve(tx, path)?;
    tx.get(bucket, key.as_bytes())?.ok_or_else(|| Error::KeyNotFound(key.to_string()))
}

pub(crate) fn write<T: Transaction>(
    tx: &mut T,
    path: &[&str],
    key: &str,
    value: &[u8],
) -> Result<()> {
    let bucket = resolve_or_create(tx, path)?;
    tx.put(bucket, key.as_bytes(), value)?;
    Ok(())
}

pub(crate) fn create_bucket<T: Transaction>(tx: &mut T, path: &[&str]) -> Result<()> {
    resolve_or_create(tx, path).map(drop)
}

/// Resolves with write semantics, so missing buckets along `path` are
/// created and a read-only transaction is always refused. Paths that cannot
/// hold buckets count as already deleted, as do absent keys.
pub(crate) fn delete_key<T: Transaction>(tx: &mut T, path: &[&str], key: &str) -> Result<()> {
    let bucket = match resolve_or_create(tx, path) {
        Ok(bucket) => bucket,
        Err(err) if is_unusable_path(&err) => {
            trace!(path = %path::display(path), error = %err, "nothing to delete");
            return Ok(());
        }
        Err(err) => return Err(err),
    };
    tx.delete(bucket, key.as_bytes())?;
    Ok(())
}

fn is_unusable_path(err: &Error) -> bool {
    match err {
        Error::PathNotFound(_) | Error::InvalidPath(_) => true,
        Error::Storage(inner) => matches!(**inner, StorageError::IncompatibleValue(_)),
        _ => false,
    }
}

/// Absent buckets, and buckets whose parent is absent, count as already deleted.
pub(crate) fn delete_bucket<T: Transaction>(tx: &mut T, path: &[&str]) -> Result<()> {
    let Some((name, parent_path)) = path.split_last() else {
        return Err(Error::PathNotFound(String::new()));
    };

    let parent = if parent_path.is_empty() {
        BucketId::ROOT
    } else {
        match lookup(&*tx, parent_path)? {
            Some(parent) => parent,
            None => return Ok(()),
        }
    };

    tx.delete_bucket(parent, name.as_bytes())?;
    Ok(())
}

pub(crate) fn key_exists<T: Transaction>(tx: &T, path: &[&str], key: &str) -> Result<bool> {
    match lookup(tx, path)? {
        Some(bucket) => Ok(tx.get(bucket, key.as_bytes())?.is_some()),
        None => Ok(false),
    }
}

pub(crate) fn bucket_exists<T: Transaction>(tx: &T, path: &[&str]) -> Result<bool> {
    Ok(lookup(tx, path)?.is_some())
}

pub(crate) fn prefix_exists<T: Transaction>(tx: &T, path: &[&str], prefix: &str) -> Result<bool> {
    let bucket = resolve(tx, path)?;
    let mut found = false;
    walk_prefix(tx, bucket, prefix, |_, _| {
        found = true;
        false
    })?;
    Ok(found)
}

pub(crate) fn read_scan<T: Transaction>(tx: &T, path: &[&str], prefix: &str) -> Result<Scan> {
    let bucket = resolve(tx, path)?;
    let mut scan = Scan::default();
    walk_prefix(tx, bucket, prefix, |key, entry| {
        scan.keys.push(key_string(key));
        scan.values.push(entry_value(entry));
        true
    })?;
    Ok(scan)
}

pub(crate) fn next_seq<T: Transaction>(tx: &mut T, path: &[&str]) -> Result<u64> {
    let bucket = resolve_or_create(tx, path)?;
    Ok(tx.next_sequence(bucket)?)
}

/// Resolve the bucket a listing walks, or `None` when the listing should
/// come back empty.
///
/// Resolution failures are logged and swallowed: a missing path lists like an
/// empty one. Engine failures still propagate.
fn listing_target<T: Transaction>(
    tx: &T,
    op: &'static str,
    path: &[&str],
    allow_root: bool,
) -> Result<Option<BucketId>> {
    if path.is_empty() && allow_root {
        return Ok(Some(BucketId::ROOT));
    }
    match resolve(tx, path) {
        Ok(bucket) => Ok(Some(bucket)),
        Err(err @ (Error::PathNotFound(_) | Error::InvalidPath(_))) => {
            trace!(op, path = %path::display(path), error = %err, "listing unresolved path");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

pub(crate) fn list<T: Transaction>(
    tx: &T,
    path: &[&str],
    token: &str,
    page_size: usize,
) -> Result<Page<(String, Vec<u8>)>> {
    let Some(bucket) = listing_target(tx, "list", path, false)? else {
        return Ok(Page::empty());
    };
    walk_page(tx, bucket, token, page_size, |key, entry| {
        Some((key_string(key.to_vec()), entry_value(entry)))
    })
}

pub(crate) fn list_keys<T: Transaction>(
    tx: &T,
    path: &[&str],
    token: &str,
    page_size: usize,
) -> Result<Page<String>> {
    let Some(bucket) = listing_target(tx, "list_keys", path, false)? else {
        return Ok(Page::empty());
    };
    walk_page(tx, bucket, token, page_size, |key, _| Some(key_string(key.to_vec())))
}

/// With an empty path this pages over the top-level buckets.
pub(crate) fn list_buckets<T: Transaction>(
    tx: &T,
    path: &[&str],
    token: &str,
    page_size: usize,
) -> Result<Page<String>> {
    let Some(bucket) = listing_target(tx, "list_buckets", path, true)? else {
        return Ok(Page::empty());
    };
    walk_page(tx, bucket, token, page_size, |key, entry| {
        entry.is_bucket().then(|| key_string(key.to_vec()))
    })
}

/// Collapse a predicate result into its answer.
///
/// Errors outside the not-found family are logged; every error reads as
/// `false`.
pub(crate) fn answer(op: &'static str, path: &[&str], result: &Result<bool>) -> bool {
    match result {
        Ok(found) => *found,
        Err(err) if err.is_not_found() => false,
        Err(err) => {
            debug!(op, path = %path::display(path), error = %err, "predicate failed");
            false
        }
    }
}
