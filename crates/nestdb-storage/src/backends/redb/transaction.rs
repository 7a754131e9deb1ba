//! Redb transaction implementation.
//!
//! This module provides the `RedbTransaction` type which implements the
//! `Transaction` trait for both read-only and read-write transactions.
//!
//! # Memory-Efficient Cursors
//!
//! Cursors load the entries of a bucket in batches (default 256 entries) and
//! fetch the next batch on demand, so walking a large bucket never
//! materialises it whole.

use std::ops::Bound;

use redb::{ReadTransaction, ReadableTable, Table, WriteTransaction};

use crate::engine::{
    BucketId, Cursor, CursorResult, Entry, ErrorContext, KeyEntry, StorageError, StorageResult,
    Transaction,
};

use super::tables::{
    bucket_end_key, bucket_start_key, decode_entry, decode_key, encode_entry, encode_key,
    ENTRIES_TABLE, LAST_BUCKET_ID, MAX_BUCKET_ID, META_TABLE, SEQUENCES_TABLE,
};

/// Default batch size for cursor operations.
const DEFAULT_BATCH_SIZE: usize = 256;

type EntriesTable<'txn> = Table<'txn, &'static [u8], &'static [u8]>;

/// A transaction for the Redb storage engine.
///
/// This type wraps both read-only and read-write Redb transactions,
/// providing a unified interface through the `Transaction` trait.
#[allow(clippy::large_enum_variant)]
pub enum RedbTransaction {
    /// A read-only transaction.
    Read(ReadTransaction),
    /// A read-write transaction.
    Write(WriteTransaction),
}

impl RedbTransaction {
    /// Create a new read-only transaction.
    pub const fn new_read(tx: ReadTransaction) -> Self {
        Self::Read(tx)
    }

    /// Create a new read-write transaction.
    pub const fn new_write(tx: WriteTransaction) -> Self {
        Self::Write(tx)
    }

    /// Create a cursor that loads `batch_size` entries at a time.
    pub fn cursor_with_batch_size(&self, bucket: BucketId, batch_size: usize) -> RedbCursor<'_> {
        RedbCursor::new(self, bucket, batch_size.max(1))
    }

    fn writable(&self) -> StorageResult<&WriteTransaction> {
        match self {
            Self::Read(_) => Err(StorageError::ReadOnly),
            Self::Write(tx) => Ok(tx),
        }
    }

    /// Read the raw entry stored under `key` in `owner`.
    fn lookup(&self, owner: BucketId, key: &[u8]) -> StorageResult<Option<Entry>> {
        let encoded = encode_key(owner, key);

        match self {
            Self::Read(tx) => match tx.open_table(ENTRIES_TABLE) {
                Ok(table) => read_entry(&table, &encoded),
                // No entries table means nothing was ever written
                Err(redb::TableError::TableDoesNotExist(_)) => Ok(None),
                Err(e) => Err(StorageError::Internal(e.to_string())),
            },
            Self::Write(tx) => {
                let table = tx.open_table(ENTRIES_TABLE).context("open entries")?;
                read_entry(&table, &encoded)
            }
        }
    }

    /// Fetch up to `batch_size` entries of `bucket`, starting at `start`.
    fn fetch_batch(
        &self,
        bucket: BucketId,
        start: Bound<&[u8]>,
        batch_size: usize,
    ) -> StorageResult<Vec<KeyEntry>> {
        match self {
            Self::Read(tx) => match tx.open_table(ENTRIES_TABLE) {
                Ok(table) => collect_batch(&table, bucket, start, batch_size),
                Err(redb::TableError::TableDoesNotExist(_)) => Ok(Vec::new()),
                Err(e) => Err(StorageError::Internal(e.to_string())),
            },
            Self::Write(tx) => {
                let table = tx.open_table(ENTRIES_TABLE).context("open entries")?;
                collect_batch(&table, bucket, start, batch_size)
            }
        }
    }
}

fn read_entry<T>(table: &T, encoded: &[u8]) -> StorageResult<Option<Entry>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let stored = table.get(encoded).context("get entry")?;
    let entry = match stored {
        Some(guard) => Some(decode_entry(guard.value())?),
        None => None,
    };
    Ok(entry)
}

fn collect_batch<T>(
    table: &T,
    bucket: BucketId,
    start: Bound<&[u8]>,
    batch_size: usize,
) -> StorageResult<Vec<KeyEntry>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let lower = match start {
        Bound::Included(key) | Bound::Excluded(key) => encode_key(bucket, key),
        Bound::Unbounded => bucket_start_key(bucket),
    };
    let upper = bucket_end_key(bucket);

    let mut entries = Vec::with_capacity(batch_size.min(1024));
    for item in table.range(lower.as_slice()..upper.as_slice()).context("range scan")? {
        if entries.len() >= batch_size {
            break;
        }

        let (raw_key, stored) = item.context("range scan")?;
        let Some((_, key)) = decode_key(raw_key.value()) else {
            continue;
        };
        if let Bound::Excluded(after) = start {
            if key == after {
                continue;
            }
        }
        entries.push((key.to_vec(), decode_entry(stored.value())?));
    }
    Ok(entries)
}

/// Hand out the next unused bucket id.
fn allocate_bucket_id(tx: &WriteTransaction) -> StorageResult<BucketId> {
    let mut meta = tx.open_table(META_TABLE).context("open meta")?;
    let last = meta.get(LAST_BUCKET_ID).context("read bucket id")?.map_or(0, |g| g.value());
    if last >= MAX_BUCKET_ID {
        return Err(StorageError::Internal("bucket ids exhausted".into()));
    }
    let next = last + 1;
    meta.insert(LAST_BUCKET_ID, next).context("store bucket id")?;
    Ok(BucketId::new(next))
}

/// Remove every entry and sequence counter below `root`, `root` included.
fn drop_subtree(
    entries: &mut EntriesTable<'_>,
    sequences: &mut Table<'_, u64, u64>,
    root: BucketId,
) -> StorageResult<()> {
    let mut pending = vec![root];

    while let Some(bucket) = pending.pop() {
        let start = bucket_start_key(bucket);
        let end = bucket_end_key(bucket);

        let mut doomed = Vec::new();
        for item in entries.range(start.as_slice()..end.as_slice()).context("scan bucket")? {
            let (raw_key, stored) = item.context("scan bucket")?;
            if let Entry::Bucket(child) = decode_entry(stored.value())? {
                pending.push(child);
            }
            doomed.push(raw_key.value().to_vec());
        }

        for raw_key in doomed {
            entries.remove(raw_key.as_slice()).context("remove entry")?;
        }
        sequences.remove(bucket.as_u64()).context("remove sequence")?;
    }

    Ok(())
}

impl Transaction for RedbTransaction {
    type Cursor<'a>
        = RedbCursor<'a>
    where
        Self: 'a;

    fn bucket(&self, parent: BucketId, name: &[u8]) -> StorageResult<Option<BucketId>> {
        Ok(self.lookup(parent, name)?.and_then(|entry| entry.bucket()))
    }

    fn create_bucket_if_absent(
        &mut self,
        parent: BucketId,
        name: &[u8],
    ) -> StorageResult<BucketId> {
        let tx = self.writable()?;
        if name.is_empty() {
            return Err(StorageError::BucketNameRequired);
        }

        let encoded = encode_key(parent, name);
        let mut entries = tx.open_table(ENTRIES_TABLE).context("open entries")?;
        match read_entry(&entries, &encoded)? {
            Some(Entry::Bucket(id)) => return Ok(id),
            Some(Entry::Value(_)) => {
                return Err(StorageError::IncompatibleValue(format!(
                    "{} holds a value",
                    String::from_utf8_lossy(name)
                )))
            }
            None => {}
        }

        let id = allocate_bucket_id(tx)?;
        let stored = encode_entry(&Entry::Bucket(id));
        entries.insert(encoded.as_slice(), stored.as_slice()).context("insert bucket")?;
        Ok(id)
    }

    fn delete_bucket(&mut self, parent: BucketId, name: &[u8]) -> StorageResult<bool> {
        let tx = self.writable()?;

        let encoded = encode_key(parent, name);
        let mut entries = tx.open_table(ENTRIES_TABLE).context("open entries")?;
        let id = match read_entry(&entries, &encoded)? {
            None => return Ok(false),
            Some(Entry::Bucket(id)) => id,
            Some(Entry::Value(_)) => {
                return Err(StorageError::IncompatibleValue(format!(
                    "{} is not a bucket",
                    String::from_utf8_lossy(name)
                )))
            }
        };

        let mut sequences = tx.open_table(SEQUENCES_TABLE).context("open sequences")?;
        drop_subtree(&mut entries, &mut sequences, id)?;
        entries.remove(encoded.as_slice()).context("remove bucket")?;
        Ok(true)
    }

    fn get(&self, bucket: BucketId, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        match self.lookup(bucket, key)? {
            Some(Entry::Value(value)) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    fn put(&mut self, bucket: BucketId, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let tx = self.writable()?;
        if key.is_empty() {
            return Err(StorageError::KeyRequired);
        }
        if bucket.is_root() {
            return Err(StorageError::IncompatibleValue("the root holds buckets only".into()));
        }

        let encoded = encode_key(bucket, key);
        let mut entries = tx.open_table(ENTRIES_TABLE).context("open entries")?;
        if let Some(Entry::Bucket(_)) = read_entry(&entries, &encoded)? {
            return Err(StorageError::IncompatibleValue(format!(
                "{} is a bucket",
                String::from_utf8_lossy(key)
            )));
        }

        let stored = encode_entry(&Entry::Value(value.to_vec()));
        entries.insert(encoded.as_slice(), stored.as_slice()).context("insert value")?;
        Ok(())
    }

    fn delete(&mut self, bucket: BucketId, key: &[u8]) -> StorageResult<bool> {
        let tx = self.writable()?;

        let encoded = encode_key(bucket, key);
        let mut entries = tx.open_table(ENTRIES_TABLE).context("open entries")?;
        match read_entry(&entries, &encoded)? {
            None => Ok(false),
            Some(Entry::Bucket(_)) => Err(StorageError::IncompatibleValue(format!(
                "{} is a bucket",
                String::from_utf8_lossy(key)
            ))),
            Some(Entry::Value(_)) => {
                entries.remove(encoded.as_slice()).context("remove value")?;
                Ok(true)
            }
        }
    }

    fn cursor(&self, bucket: BucketId) -> StorageResult<Self::Cursor<'_>> {
        Ok(RedbCursor::new(self, bucket, DEFAULT_BATCH_SIZE))
    }

    fn next_sequence(&mut self, bucket: BucketId) -> StorageResult<u64> {
        let tx = self.writable()?;
        if bucket.is_root() {
            return Err(StorageError::IncompatibleValue("the root has no sequence".into()));
        }

        let mut sequences = tx.open_table(SEQUENCES_TABLE).context("open sequences")?;
        let current =
            sequences.get(bucket.as_u64()).context("read sequence")?.map_or(0, |g| g.value());
        let next = current
            .checked_add(1)
            .ok_or_else(|| StorageError::Internal(format!("sequence of {bucket} overflowed")))?;
        sequences.insert(bucket.as_u64(), next).context("store sequence")?;
        Ok(next)
    }

    fn commit(self) -> StorageResult<()> {
        match self {
            // Read transactions don't need explicit commit
            Self::Read(_) => Ok(()),
            Self::Write(tx) => tx.commit().map_err(|e| StorageError::Transaction(e.to_string())),
        }
    }

    fn rollback(self) -> StorageResult<()> {
        match self {
            Self::Read(_) => Ok(()),
            Self::Write(tx) => tx.abort().map_err(|e| StorageError::Transaction(e.to_string())),
        }
    }

    fn is_read_only(&self) -> bool {
        matches!(self, Self::Read(_))
    }
}

/// Where a cursor stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// No seek yet.
    Unpositioned,
    /// Index into the current batch.
    At(usize),
    /// Walked past the last entry.
    Exhausted,
}

/// A streaming forward cursor over the entries of one bucket.
///
/// At any time the cursor holds at most `batch_size` entries in memory.
pub struct RedbCursor<'a> {
    /// Reference to the transaction for fetching additional batches.
    tx: &'a RedbTransaction,
    /// The bucket being walked.
    bucket: BucketId,
    /// Current batch of entries.
    batch: Vec<KeyEntry>,
    position: Position,
    /// Maximum entries per batch.
    batch_size: usize,
    /// Whether the bucket may hold entries after the current batch.
    has_more: bool,
}

impl<'a> RedbCursor<'a> {
    fn new(tx: &'a RedbTransaction, bucket: BucketId, batch_size: usize) -> Self {
        Self {
            tx,
            bucket,
            batch: Vec::new(),
            position: Position::Unpositioned,
            batch_size,
            has_more: true,
        }
    }

    /// Replace the batch with entries from `start` and position on its head.
    fn load(&mut self, start: Bound<&[u8]>) -> StorageResult<()> {
        self.batch = self.tx.fetch_batch(self.bucket, start, self.batch_size)?;
        self.has_more = self.batch.len() >= self.batch_size;
        self.position = if self.batch.is_empty() { Position::Exhausted } else { Position::At(0) };
        Ok(())
    }

    fn current_entry(&self) -> Option<KeyEntry> {
        match self.position {
            Position::At(pos) => self.batch.get(pos).cloned(),
            _ => None,
        }
    }
}

impl Cursor for RedbCursor<'_> {
    fn seek(&mut self, key: &[u8]) -> CursorResult {
        self.load(Bound::Included(key))?;
        Ok(self.current_entry())
    }

    fn seek_first(&mut self) -> CursorResult {
        self.load(Bound::Unbounded)?;
        Ok(self.current_entry())
    }

    fn next(&mut self) -> CursorResult {
        match self.position {
            Position::Unpositioned => self.seek_first(),
            Position::Exhausted => Ok(None),
            Position::At(pos) if pos + 1 < self.batch.len() => {
                self.position = Position::At(pos + 1);
                Ok(self.current_entry())
            }
            Position::At(_) if self.has_more => {
                let last = self.batch.last().map(|(k, _)| k.clone()).unwrap_or_default();
                self.load(Bound::Excluded(last.as_slice()))?;
                Ok(self.current_entry())
            }
            Position::At(_) => {
                self.position = Position::Exhausted;
                Ok(None)
            }
        }
    }

    fn current(&self) -> Option<(&[u8], &Entry)> {
        match self.position {
            Position::At(pos) => self.batch.get(pos).map(|(k, e)| (k.as_slice(), e)),
            _ => None,
        }
    }
}

// Cursor behaviour against real transactions is covered in tests/redb_tests.rs.
