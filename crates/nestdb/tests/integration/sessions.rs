//! Session commit and rollback behavior.

use nestdb::{Error, Resolution, Store};
use nestdb_storage::StorageError;
use tempfile::TempDir;

use super::open_store;

#[test]
fn write_is_visible_to_later_sessions() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let mut session = store.write_session().unwrap();
    session.write(&["users", "alice"], "email", b"alice@example.com").unwrap();
    session.write(&["users", "alice"], "email", b"alice@example.org").unwrap();
    assert_eq!(session.close().unwrap(), Resolution::Committed);

    let mut session = store.read_session().unwrap();
    assert_eq!(session.read(&["users", "alice"], "email").unwrap(), b"alice@example.org");
    assert!(session.key_exists(&["users", "alice"], "email"));
    assert!(session.bucket_exists(&["users"]));
    assert_eq!(session.close().unwrap(), Resolution::RolledBack);
}

#[test]
fn recorded_error_rolls_back_the_whole_session() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let mut session = store.write_session().unwrap();
    session.write(&["kept"], "k", b"v").unwrap();
    assert_eq!(session.close().unwrap(), Resolution::Committed);

    let mut session = store.write_session().unwrap();
    session.write(&["lost"], "a", b"1").unwrap();
    session.delete_bucket(&["kept"]).unwrap();
    assert!(matches!(session.read(&["lost"], "missing"), Err(Error::KeyNotFound(_))));
    // Operations after the failure still run but cannot change the decision
    session.write(&["lost"], "b", b"2").unwrap();
    assert!(matches!(session.error(), Some(Error::KeyNotFound(_))));
    assert_eq!(session.close().unwrap(), Resolution::RolledBack);

    let mut session = store.read_session().unwrap();
    assert!(!session.bucket_exists(&["lost"]));
    assert_eq!(session.read(&["kept"], "k").unwrap(), b"v");
    session.close().unwrap();
}

#[test]
fn dropped_session_rolls_back() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    {
        let mut session = store.write_session().unwrap();
        session.write(&["temp"], "k", b"v").unwrap();
    }

    let mut session = store.read_session().unwrap();
    assert!(!session.bucket_exists(&["temp"]));
}

#[test]
fn read_session_rejects_writes() {
    let store = Store::in_memory().unwrap();

    let mut session = store.read_session().unwrap();
    assert!(!session.is_writable());
    let err = session.write(&["a"], "k", b"v").unwrap_err();
    assert!(matches!(err, Error::Storage(ref e) if matches!(**e, StorageError::ReadOnly)));
    assert!(session.error().is_some());
    assert_eq!(session.close().unwrap(), Resolution::RolledBack);

    assert!(!store.auto_commit().unwrap().bucket_exists(&["a"]));
}

#[test]
fn sequences_increase_across_sessions() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let mut session = store.write_session().unwrap();
    assert_eq!(session.next_seq(&["orders"]).unwrap(), 1);
    assert_eq!(session.next_seq(&["orders"]).unwrap(), 2);
    assert_eq!(session.next_seq(&["invoices"]).unwrap(), 1);
    session.close().unwrap();

    let mut session = store.write_session().unwrap();
    assert_eq!(session.next_seq(&["orders"]).unwrap(), 3);
    session.close().unwrap();
}

#[test]
fn missing_paths_answer_false_without_error() {
    let store = Store::in_memory().unwrap();

    let mut session = store.write_session().unwrap();
    for key in ["k1a", "k2a", "k3a"] {
        session.write(&["l1a", "l2a", "l3a"], key, b"v").unwrap();
    }
    assert!(!session.bucket_exists(&["l1a", "l2a", "k3a"]));
    assert!(!session.key_exists(&["l1a", "nope"], "k1a"));
    assert!(session.error().is_none());
    assert_eq!(session.close().unwrap(), Resolution::Committed);
}

#[test]
fn deletes_tolerate_absence() {
    let store = Store::in_memory().unwrap();

    let mut session = store.write_session().unwrap();
    session.write(&["a", "b"], "k", b"v").unwrap();
    session.delete_key(&["a", "b"], "k").unwrap();
    session.delete_key(&["a", "b"], "k").unwrap();
    session.delete_key(&["x", "y"], "k").unwrap();
    session.delete_bucket(&["a"]).unwrap();
    session.delete_bucket(&["a"]).unwrap();
    session.delete_bucket(&["x", "y"]).unwrap();
    assert_eq!(session.close().unwrap(), Resolution::Committed);

    let mut session = store.read_session().unwrap();
    assert!(!session.bucket_exists(&["a"]));
    // Deleting a key resolves its path like a write does
    assert!(session.bucket_exists(&["x"]));
    assert!(!session.bucket_exists(&["x", "y"]));
}

#[test]
fn read_session_refuses_deletes_whatever_the_data() {
    let store = Store::in_memory().unwrap();
    store.auto_commit().unwrap().write(&["a"], "k", b"v").unwrap();

    let mut session = store.read_session().unwrap();
    for path in [&["a"][..], &["missing"][..]] {
        let err = session.delete_key(path, "k").unwrap_err();
        assert!(matches!(err, Error::Storage(ref e) if matches!(**e, StorageError::ReadOnly)));
    }
    assert_eq!(session.close().unwrap(), Resolution::RolledBack);
}

#[test]
fn empty_delete_path_fails_the_session() {
    let store = Store::in_memory().unwrap();

    let mut session = store.write_session().unwrap();
    session.write(&["a"], "k", b"v").unwrap();
    assert!(matches!(session.delete_bucket(&[]), Err(Error::PathNotFound(_))));
    assert_eq!(session.close().unwrap(), Resolution::RolledBack);

    assert!(!store.auto_commit().unwrap().bucket_exists(&["a"]));
}

#[test]
fn auto_commit_applies_each_call() {
    let store = Store::in_memory().unwrap();
    let auto = store.auto_commit().unwrap();

    auto.create_bucket(&["config"]).unwrap();
    auto.write(&["config"], "mode", b"fast").unwrap();
    assert!(auto.read(&["config"], "missing").is_err());

    let mut session = store.read_session().unwrap();
    assert_eq!(session.read(&["config"], "mode").unwrap(), b"fast");
}
