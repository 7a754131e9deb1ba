//! Paged listings and prefix scans.

use nestdb::{Store, PAGE_SIZE};

#[test]
fn list_keys_pages_with_continuation_token() {
    let store = Store::in_memory().unwrap();
    let path = ["l1a", "l2a", "l3a"];

    let mut session = store.write_session().unwrap();
    for key in ["k1a", "k2a", "k3a"] {
        session.write(&path, key, key.as_bytes()).unwrap();
    }
    session.close().unwrap();

    let mut session = store.read_session().unwrap();
    let first = session.list_keys_with_page_size(&path, "", 2).unwrap();
    assert_eq!(first.items, ["k1a", "k2a"]);
    assert_eq!(first.next_token, "k3a");

    let second = session.list_keys_with_page_size(&path, &first.next_token, 2).unwrap();
    assert_eq!(second.items, ["k3a"]);
    assert!(second.is_last());
    assert!(session.error().is_none());
}

#[test]
fn default_page_size_applies() {
    let store = Store::in_memory().unwrap();
    let auto = store.auto_commit().unwrap();

    let mut session = store.write_session().unwrap();
    for i in 0..PAGE_SIZE + 5 {
        session.write(&["many"], &format!("key{i:04}"), b"").unwrap();
    }
    session.close().unwrap();

    let first = auto.list(&["many"], "").unwrap();
    assert_eq!(first.len(), PAGE_SIZE);
    assert_eq!(first.next_token, format!("key{PAGE_SIZE:04}"));

    let (keys, _) = auto.list(&["many"], &first.next_token).unwrap().unzip();
    assert_eq!(keys.len(), 5);
}

#[test]
fn list_buckets_walks_each_level() {
    let store = Store::in_memory().unwrap();

    let mut session = store.write_session().unwrap();
    session.create_bucket(&["zoo", "lions"]).unwrap();
    session.create_bucket(&["zoo", "bears"]).unwrap();
    session.write(&["zoo"], "address", b"1 Main St").unwrap();
    session.create_bucket(&["aquarium"]).unwrap();
    session.close().unwrap();

    let mut session = store.read_session().unwrap();
    assert_eq!(session.list_buckets(&[], "").unwrap().items, ["aquarium", "zoo"]);
    assert_eq!(session.list_buckets(&["zoo"], "").unwrap().items, ["bears", "lions"]);
    assert!(session.list_buckets(&["zoo", "lions"], "").unwrap().is_empty());

    let listed = session.list(&["zoo"], "").unwrap();
    assert_eq!(
        listed.items,
        [
            ("address".to_string(), b"1 Main St".to_vec()),
            ("bears".to_string(), Vec::new()),
            ("lions".to_string(), Vec::new()),
        ]
    );
    assert_eq!(session.list_keys(&["zoo"], "").unwrap().items, ["address", "bears", "lions"]);
}

#[test]
fn unresolvable_listings_are_empty() {
    let store = Store::in_memory().unwrap();
    let mut session = store.read_session().unwrap();

    assert!(session.list(&["nowhere"], "").unwrap().is_empty());
    assert!(session.list_keys(&["nowhere", "deeper"], "").unwrap().is_last());
    assert!(session.list_buckets(&["nowhere"], "").unwrap().is_empty());
    assert!(session.list_keys(&[], "").unwrap().is_empty());
    assert!(session.error().is_none());
}

#[test]
fn scans_match_exact_prefix_bytes() {
    let store = Store::in_memory().unwrap();

    let mut session = store.write_session().unwrap();
    for key in ["user:1", "user:2", "user_x", "username"] {
        session.write(&["idx"], key, key.as_bytes()).unwrap();
    }
    session.create_bucket(&["idx", "user:sub"]).unwrap();
    session.close().unwrap();

    let mut session = store.read_session().unwrap();
    let scan = session.read_scan(&["idx"], "user:").unwrap();
    assert_eq!(scan.keys, ["user:1", "user:2", "user:sub"]);
    assert_eq!(scan.values, [b"user:1".to_vec(), b"user:2".to_vec(), Vec::new()]);

    assert_eq!(session.read_scan(&["idx"], "").unwrap().len(), 5);
    assert!(session.prefix_exists(&["idx"], "user:s").unwrap());
    assert!(session.prefix_exists(&["idx"], "user_").unwrap());
    assert!(!session.prefix_exists(&["idx"], "group").unwrap());
    assert!(session.read_scan(&["missing"], "user").is_err());
}
