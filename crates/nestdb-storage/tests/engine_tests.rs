//! Tests for storage engine traits.
//!
//! These tests validate the trait contracts and can be used to test
//! any storage engine implementation.

use nestdb_storage::{
    BucketId, Cursor, Entry, StorageEngine, StorageError, StorageResult, Transaction,
};

/// A test harness trait for testing storage engine implementations.
pub trait TestHarness {
    /// The storage engine type being tested.
    type Engine: StorageEngine;

    /// Create a new storage engine for testing.
    fn create_engine() -> StorageResult<Self::Engine>;

    /// Clean up after tests (remove temp files, etc.).
    fn cleanup(_engine: Self::Engine) {}
}

/// Run the standard test suite against a storage engine.
///
/// # Example
///
/// ```ignore
/// struct RedbHarness;
///
/// impl TestHarness for RedbHarness {
///     type Engine = RedbEngine;
///
///     fn create_engine() -> StorageResult<Self::Engine> {
///         RedbEngine::in_memory()
///     }
/// }
///
/// #[test]
/// fn test_redb_compliance() {
///     run_test_suite::<RedbHarness>();
/// }
/// ```
pub fn run_test_suite<H: TestHarness>() {
    test_basic_operations::<H>();
    test_nested_buckets::<H>();
    test_transaction_isolation::<H>();
    test_cursor_operations::<H>();
    test_delete_bucket_subtree::<H>();
    test_sequences::<H>();
    test_shared_namespace::<H>();
    test_read_only_enforcement::<H>();
}

/// Test basic get/put/delete operations.
fn test_basic_operations<H: TestHarness>() {
    let engine = H::create_engine().expect("failed to create engine");

    {
        let mut tx = engine.begin_write().expect("failed to begin write");
        let bucket = tx.create_bucket_if_absent(BucketId::ROOT, b"table").expect("create");
        tx.put(bucket, b"key1", b"value1").expect("failed to put");
        tx.commit().expect("failed to commit");
    }

    {
        let mut tx = engine.begin_write().expect("failed to begin write");
        let bucket = tx.bucket(BucketId::ROOT, b"table").expect("lookup").expect("bucket");
        assert_eq!(tx.get(bucket, b"key1").expect("get"), Some(b"value1".to_vec()));

        tx.put(bucket, b"key1", b"value1_updated").expect("failed to put");
        assert_eq!(tx.get(bucket, b"key1").expect("get"), Some(b"value1_updated".to_vec()));

        assert!(tx.delete(bucket, b"key1").expect("failed to delete"));
        assert!(!tx.delete(bucket, b"key1").expect("failed to delete"));
        assert_eq!(tx.get(bucket, b"key1").expect("get"), None);
        tx.commit().expect("failed to commit");
    }

    H::cleanup(engine);
}

/// Test that buckets nest and resolve level by level.
fn test_nested_buckets<H: TestHarness>() {
    let engine = H::create_engine().expect("failed to create engine");

    let (outer, inner) = {
        let mut tx = engine.begin_write().expect("failed to begin write");
        let outer = tx.create_bucket_if_absent(BucketId::ROOT, b"outer").expect("create");
        let inner = tx.create_bucket_if_absent(outer, b"inner").expect("create");
        assert_eq!(tx.create_bucket_if_absent(outer, b"inner").expect("create"), inner);
        tx.put(inner, b"k", b"v").expect("put");
        tx.commit().expect("failed to commit");
        (outer, inner)
    };

    {
        let tx = engine.begin_read().expect("failed to begin read");
        assert_eq!(tx.bucket(BucketId::ROOT, b"outer").expect("lookup"), Some(outer));
        assert_eq!(tx.bucket(outer, b"inner").expect("lookup"), Some(inner));
        assert_eq!(tx.bucket(BucketId::ROOT, b"inner").expect("lookup"), None);
        assert_eq!(tx.get(inner, b"k").expect("get"), Some(b"v".to_vec()));
        assert_eq!(tx.get(outer, b"k").expect("get"), None);
    }

    H::cleanup(engine);
}

/// Test that transactions provide proper isolation.
fn test_transaction_isolation<H: TestHarness>() {
    let engine = H::create_engine().expect("failed to create engine");

    let bucket = {
        let mut tx = engine.begin_write().expect("failed to begin write");
        let bucket = tx.create_bucket_if_absent(BucketId::ROOT, b"iso").expect("create");
        tx.put(bucket, b"key1", b"initial").expect("failed to put");
        tx.commit().expect("failed to commit");
        bucket
    };

    {
        let mut write_tx = engine.begin_write().expect("failed to begin write");
        write_tx.put(bucket, b"key1", b"discarded").expect("failed to put");
        write_tx.rollback().expect("failed to rollback");
    }

    {
        let read_tx = engine.begin_read().expect("failed to begin read");
        let value = read_tx.get(bucket, b"key1").expect("failed to get");
        assert_eq!(value, Some(b"initial".to_vec()));
    }

    {
        let mut write_tx = engine.begin_write().expect("failed to begin write");
        write_tx.put(bucket, b"key1", b"updated").expect("failed to put");
        write_tx.commit().expect("failed to commit");
    }

    {
        let read_tx = engine.begin_read().expect("failed to begin read");
        let value = read_tx.get(bucket, b"key1").expect("failed to get");
        assert_eq!(value, Some(b"updated".to_vec()));
    }

    H::cleanup(engine);
}

/// Test cursor operations: seek_first, seek, next, current.
fn test_cursor_operations<H: TestHarness>() {
    let engine = H::create_engine().expect("failed to create engine");

    {
        let mut tx = engine.begin_write().expect("failed to begin write");
        let bucket = tx.create_bucket_if_absent(BucketId::ROOT, b"cur").expect("create");
        for (k, v) in [(b"a", b"1"), (b"c", b"3"), (b"e", b"5"), (b"b", b"2"), (b"d", b"4")] {
            tx.put(bucket, k, v).expect("failed to put");
        }
        tx.commit().expect("failed to commit");
    }

    {
        let tx = engine.begin_read().expect("failed to begin read");
        let bucket = tx.bucket(BucketId::ROOT, b"cur").expect("lookup").expect("bucket");
        let mut cursor = tx.cursor(bucket).expect("failed to create cursor");

        assert!(cursor.current().is_none());

        let first = cursor.seek_first().expect("failed to seek_first");
        assert_eq!(first, Some((b"a".to_vec(), Entry::Value(b"1".to_vec()))));

        let second = cursor.next().expect("failed to next");
        assert_eq!(second, Some((b"b".to_vec(), Entry::Value(b"2".to_vec()))));

        let current = cursor.current().expect("positioned");
        assert_eq!(current.0, b"b");

        let c = cursor.seek(b"c").expect("failed to seek");
        assert_eq!(c.map(|(k, _)| k), Some(b"c".to_vec()));

        // Seeking to a missing key lands on the next greater one
        let after_bb = cursor.seek(b"bb").expect("failed to seek");
        assert_eq!(after_bb.map(|(k, _)| k), Some(b"c".to_vec()));

        cursor.seek(b"e").expect("failed to seek");
        assert_eq!(cursor.next().expect("failed to next"), None);
        assert_eq!(cursor.next().expect("failed to next"), None);

        assert_eq!(cursor.seek(b"f").expect("failed to seek"), None);
    }

    // Top-level buckets are walked through the root
    {
        let tx = engine.begin_read().expect("failed to begin read");
        let mut cursor = tx.cursor(BucketId::ROOT).expect("failed to create cursor");
        let (name, entry) = cursor.seek_first().expect("seek").expect("entry");
        assert_eq!(name, b"cur");
        assert!(entry.is_bucket());
        assert_eq!(cursor.next().expect("next"), None);
    }

    H::cleanup(engine);
}

/// Test that deleting a bucket removes everything below it.
fn test_delete_bucket_subtree<H: TestHarness>() {
    let engine = H::create_engine().expect("failed to create engine");

    {
        let mut tx = engine.begin_write().expect("failed to begin write");
        let a = tx.create_bucket_if_absent(BucketId::ROOT, b"a").expect("create");
        let b = tx.create_bucket_if_absent(a, b"b").expect("create");
        let c = tx.create_bucket_if_absent(b, b"c").expect("create");
        tx.put(b, b"k", b"v").expect("put");
        tx.put(c, b"k", b"v").expect("put");
        tx.next_sequence(c).expect("sequence");
        tx.commit().expect("failed to commit");
    }

    {
        let mut tx = engine.begin_write().expect("failed to begin write");
        let a = tx.bucket(BucketId::ROOT, b"a").expect("lookup").expect("bucket");
        assert!(tx.delete_bucket(a, b"b").expect("delete"));
        assert!(!tx.delete_bucket(a, b"b").expect("delete"));
        assert!(!tx.delete_bucket(a, b"never").expect("delete"));
        tx.commit().expect("failed to commit");
    }

    {
        let mut tx = engine.begin_write().expect("failed to begin write");
        let a = tx.bucket(BucketId::ROOT, b"a").expect("lookup").expect("bucket");
        assert_eq!(tx.bucket(a, b"b").expect("lookup"), None);

        // A recreated bucket starts empty with a fresh sequence
        let b = tx.create_bucket_if_absent(a, b"b").expect("create");
        let c = tx.create_bucket_if_absent(b, b"c").expect("create");
        assert_eq!(tx.get(c, b"k").expect("get"), None);
        assert_eq!(tx.next_sequence(c).expect("sequence"), 1);
        tx.rollback().expect("failed to rollback");
    }

    H::cleanup(engine);
}

/// Test per-bucket sequence counters.
fn test_sequences<H: TestHarness>() {
    let engine = H::create_engine().expect("failed to create engine");

    {
        let mut tx = engine.begin_write().expect("failed to begin write");
        let one = tx.create_bucket_if_absent(BucketId::ROOT, b"one").expect("create");
        let two = tx.create_bucket_if_absent(BucketId::ROOT, b"two").expect("create");
        assert_eq!(tx.next_sequence(one).expect("seq"), 1);
        assert_eq!(tx.next_sequence(one).expect("seq"), 2);
        assert_eq!(tx.next_sequence(two).expect("seq"), 1);
        tx.commit().expect("failed to commit");
    }

    {
        let mut tx = engine.begin_write().expect("failed to begin write");
        let one = tx.bucket(BucketId::ROOT, b"one").expect("lookup").expect("bucket");
        assert_eq!(tx.next_sequence(one).expect("seq"), 3);
        tx.commit().expect("failed to commit");
    }

    H::cleanup(engine);
}

/// Test that a name is either a value or a bucket, never both.
fn test_shared_namespace<H: TestHarness>() {
    let engine = H::create_engine().expect("failed to create engine");

    let mut tx = engine.begin_write().expect("failed to begin write");
    let parent = tx.create_bucket_if_absent(BucketId::ROOT, b"parent").expect("create");
    tx.put(parent, b"leaf", b"v").expect("put");
    tx.create_bucket_if_absent(parent, b"child").expect("create");

    assert!(matches!(
        tx.create_bucket_if_absent(parent, b"leaf"),
        Err(StorageError::IncompatibleValue(_))
    ));
    assert!(matches!(tx.put(parent, b"child", b"v"), Err(StorageError::IncompatibleValue(_))));
    assert!(matches!(tx.delete(parent, b"child"), Err(StorageError::IncompatibleValue(_))));
    assert!(matches!(tx.delete_bucket(parent, b"leaf"), Err(StorageError::IncompatibleValue(_))));
    assert!(matches!(
        tx.put(BucketId::ROOT, b"k", b"v"),
        Err(StorageError::IncompatibleValue(_))
    ));
    assert!(matches!(tx.put(parent, b"", b"v"), Err(StorageError::KeyRequired)));
    assert!(matches!(
        tx.create_bucket_if_absent(parent, b""),
        Err(StorageError::BucketNameRequired)
    ));

    assert_eq!(tx.get(parent, b"child").expect("get"), None);
    assert_eq!(tx.bucket(parent, b"leaf").expect("lookup"), None);
    tx.rollback().expect("failed to rollback");

    H::cleanup(engine);
}

/// Test that read-only transactions reject writes.
fn test_read_only_enforcement<H: TestHarness>() {
    let engine = H::create_engine().expect("failed to create engine");

    let mut tx = engine.begin_read().expect("failed to begin read");
    assert!(tx.is_read_only());

    assert!(matches!(
        tx.create_bucket_if_absent(BucketId::ROOT, b"x"),
        Err(StorageError::ReadOnly)
    ));
    assert!(matches!(tx.delete_bucket(BucketId::ROOT, b"x"), Err(StorageError::ReadOnly)));
    assert!(matches!(tx.put(BucketId::new(1), b"k", b"v"), Err(StorageError::ReadOnly)));
    assert!(matches!(tx.delete(BucketId::new(1), b"k"), Err(StorageError::ReadOnly)));
    assert!(matches!(tx.next_sequence(BucketId::new(1)), Err(StorageError::ReadOnly)));

    // Lookups on a fresh database simply find nothing
    assert_eq!(tx.bucket(BucketId::ROOT, b"x").expect("lookup"), None);
    drop(tx);

    H::cleanup(engine);
}
