use super::*;
use crate::family::Family;
use crate::object::{CachedObject, Certificate};
use std::rc::Rc;

fn entry(bytes: &[u8], created: u64) -> Entry {
    let chain = vec![Rc::new(Certificate { der: bytes.to_vec() })];
    Entry::new(Family::Cert, bytes.to_vec(), CachedObject::Cert(chain), created, None)
}

fn key(hash: u32, bytes: &[u8]) -> IndexKey {
    (hash, Family::Cert.discriminant(), bytes.to_vec())
}

#[test]
fn insert_and_get_roundtrip() {
    let mut store = Store::new();
    store.insert(key(1, b"a"), entry(b"a", 0));
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(&key(1, b"a")).unwrap().key_bytes, b"a");
}

#[test]
fn splice_to_head_orders_most_recent_first() {
    let mut store = Store::new();
    store.insert(key(1, b"a"), entry(b"a", 0));
    store.insert(key(2, b"b"), entry(b"b", 1));
    store.splice_to_head(&key(1, b"a"));
    store.splice_to_head(&key(2, b"b"));
    assert_eq!(store.head_key(), Some(key(2, b"b")));
    assert_eq!(store.tail_key(), Some(key(1, b"a")));
}

#[test]
fn remove_unlinks_from_recency_list() {
    let mut store = Store::new();
    store.insert(key(1, b"a"), entry(b"a", 0));
    store.insert(key(2, b"b"), entry(b"b", 1));
    store.splice_to_head(&key(1, b"a"));
    store.splice_to_head(&key(2, b"b"));

    store.remove(&key(2, b"b"));
    assert_eq!(store.head_key(), Some(key(1, b"a")));
    assert_eq!(store.tail_key(), Some(key(1, b"a")));
    assert_eq!(store.len(), 1);
}

#[test]
fn detach_is_idempotent() {
    let mut store = Store::new();
    store.insert(key(1, b"a"), entry(b"a", 0));
    store.splice_to_head(&key(1, b"a"));
    store.detach(&key(1, b"a"));
    store.detach(&key(1, b"a"));
    assert!(store.recency_list_is_empty());
}

#[test]
fn three_entries_tail_is_least_recently_used() {
    let mut store = Store::new();
    for (h, b) in [(1, b"a".as_slice()), (2, b"b"), (3, b"c")] {
        store.insert(key(h, b), entry(b, 0));
        store.splice_to_head(&key(h, b));
    }
    assert_eq!(store.tail_key(), Some(key(1, b"a")));
    assert_eq!(store.head_key(), Some(key(3, b"c")));
}

#[test]
fn in_order_iteration_matches_index_key_order() {
    let mut store = Store::new();
    store.insert(key(5, b"z"), entry(b"z", 0));
    store.insert(key(1, b"a"), entry(b"a", 0));
    let hashes: Vec<u32> = store.iter().map(|(k, _)| k.0).collect();
    assert_eq!(hashes, vec![1, 5]);
}

#[test]
fn drain_all_empties_store_and_list() {
    let mut store = Store::new();
    store.insert(key(1, b"a"), entry(b"a", 0));
    store.splice_to_head(&key(1, b"a"));
    let drained = store.drain_all();
    assert_eq!(drained.len(), 1);
    assert_eq!(store.len(), 0);
    assert!(store.recency_list_is_empty());
}
