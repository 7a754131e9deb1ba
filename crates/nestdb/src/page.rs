//! Paged and prefix-bounded cursor walks.

use nestdb_storage::{BucketId, Cursor, Entry, Transaction};

use crate::error::Result;

/// Number of entries returned by one listing call.
pub const PAGE_SIZE: usize = 100;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Entries of this page, in ascending key order.
    pub items: Vec<T>,
    /// Key to resume from; empty when there are no further pages.
    pub next_token: String,
}

impl<T> Page<T> {
    /// A page with no entries and no continuation.
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new(), next_token: String::new() }
    }

    /// Whether this is the final page.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next_token.is_empty()
    }

    /// Number of entries on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Page<(String, Vec<u8>)> {
    /// Split into parallel key and value vectors.
    #[must_use]
    pub fn unzip(self) -> (Vec<String>, Vec<Vec<u8>>) {
        self.items.into_iter().unzip()
    }
}

/// Keys and values matching a prefix, in ascending key order.
///
/// Nested bucket names share the key range and appear with an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    /// Matching keys.
    pub keys: Vec<String>,
    /// Values, index-aligned with `keys`.
    pub values: Vec<Vec<u8>>,
}

impl Scan {
    /// Number of matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

pub(crate) fn key_string(key: Vec<u8>) -> String {
    String::from_utf8(key).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Collect up to `page_size` entries accepted by `select`, starting at the
/// first key at or after `token` (or the first key for an empty token).
///
/// The key of the next accepted entry past the page becomes the token.
pub(crate) fn walk_page<T, R>(
    tx: &T,
    bucket: BucketId,
    token: &str,
    page_size: usize,
    mut select: impl FnMut(&[u8], Entry) -> Option<R>,
) -> Result<Page<R>>
where
    T: Transaction,
{
    let page_size = page_size.max(1);
    let mut cursor = tx.cursor(bucket)?;
    let mut entry =
        if token.is_empty() { cursor.seek_first()? } else { cursor.seek(token.as_bytes())? };

    let mut page =
        Page { items: Vec::with_capacity(page_size.min(PAGE_SIZE)), next_token: String::new() };
    while let Some((key, found)) = entry {
        if let Some(item) = select(&key, found) {
            if page.items.len() == page_size {
                page.next_token = key_string(key);
                break;
            }
            page.items.push(item);
        }
        entry = cursor.next()?;
    }
    Ok(page)
}

/// Visit every entry whose key starts with `prefix`, in key order, until
/// `visit` returns `false`. Nested bucket names are visited too.
pub(crate) fn walk_prefix<T>(
    tx: &T,
    bucket: BucketId,
    prefix: &str,
    mut visit: impl FnMut(Vec<u8>, Entry) -> bool,
) -> Result<()>
where
    T: Transaction,
{
    let prefix = prefix.as_bytes();
    let mut cursor = tx.cursor(bucket)?;
    let mut entry = cursor.seek(prefix)?;

    while let Some((key, found)) = entry {
        if !key.starts_with(prefix) || !visit(key, found) {
            break;
        }
        entry = cursor.next()?;
    }
    Ok(())
}

/// The stored value of an entry; bucket names carry an empty one.
pub(crate) fn entry_value(entry: Entry) -> Vec<u8> {
    match entry {
        Entry::Value(value) => value,
        Entry::Bucket(_) => Vec::new(),
    }
}
