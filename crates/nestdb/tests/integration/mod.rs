//! Integration tests for `NestDB`.
//!
//! These tests drive the public API end to end, mostly against on-disk
//! stores in temporary directories.

pub mod lifecycle;
pub mod listing;
pub mod sessions;

use nestdb::{Config, Store};
use tempfile::TempDir;

/// Open a store on a fresh file inside `dir`.
pub fn open_store(dir: &TempDir) -> Store {
    let mut store = Store::new(Config::new(dir.path().join("test.db")));
    store.open().expect("failed to open store");
    store
}
