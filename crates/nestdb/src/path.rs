//! Bucket path resolution.
//!
//! A path names a chain of nested buckets, root-first. Resolution is written
//! once against the [`Transaction`] trait so the session layer never touches
//! a concrete engine.

use nestdb_storage::{BucketId, Transaction};

use crate::error::{Error, Result};

/// Render a path for messages and logs.
pub fn display(path: &[&str]) -> String {
    path.join("/")
}

/// Resolve `path` to an existing bucket.
///
/// Never creates anything.
///
/// # Errors
///
/// Returns [`Error::PathNotFound`] for an empty path or as soon as a segment
/// is missing (or names a value rather than a bucket).
pub fn resolve<T: Transaction>(tx: &T, path: &[&str]) -> Result<BucketId> {
    if path.is_empty() {
        return Err(Error::PathNotFound(display(path)));
    }

    let mut bucket = BucketId::ROOT;
    for segment in path {
        if segment.is_empty() {
            return Err(Error::PathNotFound(display(path)));
        }
        bucket = tx
            .bucket(bucket, segment.as_bytes())?
            .ok_or_else(|| Error::PathNotFound(display(path)))?;
    }
    Ok(bucket)
}

/// Resolve `path`, creating every missing segment on the way.
///
/// # Errors
///
/// Returns [`Error::PathNotFound`] for an empty path, [`Error::InvalidPath`]
/// for an empty segment, and a storage error if a segment names a value or
/// the transaction is read-only.
pub fn resolve_or_create<T: Transaction>(tx: &mut T, path: &[&str]) -> Result<BucketId> {
    if path.is_empty() {
        return Err(Error::PathNotFound(display(path)));
    }

    let mut bucket = BucketId::ROOT;
    for segment in path {
        if segment.is_empty() {
            return Err(Error::InvalidPath(format!("empty segment in [{}]", display(path))));
        }
        bucket = tx.create_bucket_if_absent(bucket, segment.as_bytes())?;
    }
    Ok(bucket)
}

/// Resolve `path`, mapping a missing path to `None`.
pub fn lookup<T: Transaction>(tx: &T, path: &[&str]) -> Result<Option<BucketId>> {
    match resolve(tx, path) {
        Ok(bucket) => Ok(Some(bucket)),
        Err(Error::PathNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
