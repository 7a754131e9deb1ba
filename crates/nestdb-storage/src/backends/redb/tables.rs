//! Redb table definitions and key encoding utilities.
//!
//! Redb tables are flat and need static names, so the bucket tree is encoded
//! into a single physical table. Every entry is keyed by the id of the bucket
//! that owns it followed by the entry's own key:
//!
//! ```text
//! <owner id: u64 big-endian><key bytes>  ->  <tag><payload>
//! ```
//!
//! Big-endian ids keep the entries of one bucket adjacent and in key order, so
//! a bucket is the half-open range `[id, id + 1)` of the table.

use redb::TableDefinition;

use crate::engine::{BucketId, Entry, StorageError, StorageResult};

/// Every value and nested bucket of every bucket.
pub const ENTRIES_TABLE: TableDefinition<'static, &[u8], &[u8]> =
    TableDefinition::new("nest_entries");

/// Sequence counters, keyed by bucket id.
pub const SEQUENCES_TABLE: TableDefinition<'static, u64, u64> =
    TableDefinition::new("nest_sequences");

/// Engine bookkeeping.
pub const META_TABLE: TableDefinition<'static, &str, u64> = TableDefinition::new("nest_meta");

/// Key in [`META_TABLE`] holding the last allocated bucket id.
pub const LAST_BUCKET_ID: &str = "last_bucket_id";

/// Width of the owner prefix in an encoded key.
pub const OWNER_LEN: usize = 8;

/// Largest bucket id the allocator hands out. `id + 1` must stay
/// representable to bound the bucket's key range.
pub const MAX_BUCKET_ID: u64 = u64::MAX - 1;

const TAG_VALUE: u8 = 0;
const TAG_BUCKET: u8 = 1;

/// Encode an owner bucket and key into a physical key.
pub fn encode_key(bucket: BucketId, key: &[u8]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(OWNER_LEN + key.len());
    encoded.extend_from_slice(&bucket.as_u64().to_be_bytes());
    encoded.extend_from_slice(key);
    encoded
}

/// Decode a physical key into its owner bucket and logical key.
///
/// Returns `None` if the key is shorter than the owner prefix.
pub fn decode_key(encoded: &[u8]) -> Option<(BucketId, &[u8])> {
    if encoded.len() < OWNER_LEN {
        return None;
    }
    let (owner, key) = encoded.split_at(OWNER_LEN);
    let mut raw = [0u8; OWNER_LEN];
    raw.copy_from_slice(owner);
    Some((BucketId::new(u64::from_be_bytes(raw)), key))
}

/// First physical key of a bucket's range.
pub fn bucket_start_key(bucket: BucketId) -> Vec<u8> {
    bucket.as_u64().to_be_bytes().to_vec()
}

/// First physical key past a bucket's range.
pub fn bucket_end_key(bucket: BucketId) -> Vec<u8> {
    bucket.as_u64().saturating_add(1).to_be_bytes().to_vec()
}

/// Encode an entry into its stored form.
pub fn encode_entry(entry: &Entry) -> Vec<u8> {
    match entry {
        Entry::Value(value) => {
            let mut out = Vec::with_capacity(1 + value.len());
            out.push(TAG_VALUE);
            out.extend_from_slice(value);
            out
        }
        Entry::Bucket(id) => {
            let mut out = Vec::with_capacity(1 + OWNER_LEN);
            out.push(TAG_BUCKET);
            out.extend_from_slice(&id.as_u64().to_be_bytes());
            out
        }
    }
}

/// Decode a stored entry.
///
/// # Errors
///
/// Returns [`StorageError::Internal`] for an unknown tag or a truncated
/// bucket reference.
pub fn decode_entry(stored: &[u8]) -> StorageResult<Entry> {
    match stored.split_first() {
        Some((&TAG_VALUE, value)) => Ok(Entry::Value(value.to_vec())),
        Some((&TAG_BUCKET, id)) if id.len() == OWNER_LEN => {
            let mut raw = [0u8; OWNER_LEN];
            raw.copy_from_slice(id);
            Ok(Entry::Bucket(BucketId::new(u64::from_be_bytes(raw))))
        }
        Some((tag, _)) => Err(StorageError::Internal(format!("corrupt entry with tag {tag}"))),
        None => Err(StorageError::Internal("empty entry".into())),
    }
}
