//! Opening, closing and reopening stores.

use std::time::{Duration, Instant};

use nestdb::{Config, Error, Store};
use nestdb_storage::StorageError;
use tempfile::TempDir;

use super::open_store;

#[test]
fn data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);

    let mut session = store.write_session().unwrap();
    session.write(&["a", "b"], "k", b"v").unwrap();
    session.close().unwrap();
    store.close();
    assert!(matches!(store.read_session(), Err(Error::Closed)));

    store.open().unwrap();
    let mut session = store.read_session().unwrap();
    assert_eq!(session.read(&["a", "b"], "k").unwrap(), b"v");
}

#[test]
fn open_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let parent = dir.path().join("nested").join("deeper");
    let mut store = Store::new(Config::new(parent.join("app.db")));

    store.open().unwrap();
    assert!(parent.is_dir());
    assert!(store.is_open());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&parent).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}

#[test]
fn open_without_path_is_a_config_error() {
    let mut store = Store::new(Config::default());
    assert!(matches!(store.open(), Err(Error::Config(_))));
}

#[test]
fn open_and_close_are_idempotent() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);

    store.open().unwrap();
    assert!(store.is_open());
    store.close();
    store.close();
    assert!(!store.is_open());
}

#[test]
fn second_store_waits_then_times_out() {
    let dir = TempDir::new().unwrap();
    let first = open_store(&dir);

    let timeout = Duration::from_millis(200);
    let mut second =
        Store::new(Config::new(first.config().db_path.clone()).request_timeout(timeout));

    let started = Instant::now();
    let err = second.open().unwrap_err();
    assert!(started.elapsed() >= timeout);
    assert!(matches!(err, Error::Storage(ref e) if matches!(**e, StorageError::LockTimeout(_))));
    assert!(!second.is_open());

    drop(first);
    second.open().unwrap();
}
