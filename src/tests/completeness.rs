//! Completeness tests: insert/remove must not lose data.

use std::collections::HashSet;

use archery::{RcK, SharedPointer};

use crate::ChampMap;
use crate::change::ChangeKind;
use crate::hash::hash_one;
use crate::mutator::Mutator;
use crate::node::{Node, NodeRef};
use crate::ops::{self, Merge};

// ---------------------------------------------------------------------------
// insert must return the old value when updating
// ---------------------------------------------------------------------------

#[test]
fn insert_new_returns_none() {
    let mut map = ChampMap::new();
    let old = map.insert("key", 42);
    assert_eq!(old, None, "inserting new key should return None");
}

#[test]
fn insert_update_chain() {
    let mut map = ChampMap::new();
    assert_eq!(map.insert("k", 10), None);
    assert_eq!(map.insert("k", 20), Some(10));
    assert_eq!(map.insert("k", 30), Some(20));
    assert_eq!(map.get(&"k"), Some(&30));
}

/// Every update and removal on the raw trie reports what it did.
#[test]
fn change_events_report_kind() {
    let mut mutator = Mutator::new();
    let mut root: NodeRef<(u32, char), RcK> = SharedPointer::new(Node::empty());
    let eq = |a: &(u32, char), b: &(u32, char)| a.0 == b.0;
    let key_eq = |e: &(u32, char), k: &u32| e.0 == *k;
    let hash_fn = |e: &(u32, char)| hash_one(&e.0);
    let replace = |_: &(u32, char), c: (u32, char)| Merge::Replace(c);
    let keep = |_: &(u32, char), c: (u32, char)| Merge::Keep(c);
    let h = hash_one(&1_u32);

    let event = ops::update(&mut root, (1, 'a'), h, replace, eq, hash_fn, &mut mutator);
    assert_eq!(event.kind(), ChangeKind::Added);
    assert!(event.is_modified() && !event.is_updated());
    assert_eq!(event.displaced(), None);

    let event = ops::update(&mut root, (1, 'b'), h, replace, eq, hash_fn, &mut mutator);
    assert_eq!(event.kind(), ChangeKind::Updated);
    assert!(event.is_updated());
    assert_eq!(event.into_displaced(), Some((1, 'a')));

    let event = ops::update(&mut root, (1, 'c'), h, keep, eq, hash_fn, &mut mutator);
    assert_eq!(event.kind(), ChangeKind::Unchanged);
    assert!(!event.is_modified() && !event.is_updated());
    assert_eq!(event.displaced(), Some(&(1, 'c')));

    let event = ops::remove(&mut root, &1, h, key_eq, &mut mutator);
    assert_eq!(event.kind(), ChangeKind::Removed);
    assert!(event.is_removed() && !event.is_updated());
    assert_eq!(event.into_displaced(), Some((1, 'b')));

    let event = ops::remove(&mut root, &1, h, key_eq, &mut mutator);
    assert_eq!(event.kind(), ChangeKind::Unchanged);
    assert_eq!(event.displaced(), None);
    assert!(root.is_empty());
}

// ---------------------------------------------------------------------------
// remove must return the removed value
// ---------------------------------------------------------------------------

#[test]
fn remove_missing_returns_none() {
    let mut map = ChampMap::new();
    map.insert("a", 1);
    let removed = map.remove(&"z");
    assert_eq!(removed, None, "removing missing key should return None");
}

#[test]
fn remove_returns_correct_value_among_many() {
    let mut map = ChampMap::new();
    for i in 0..100 {
        map.insert(i, i * 10);
    }
    assert_eq!(map.remove(&50), Some(500));
    assert_eq!(map.remove(&50), None);
    assert_eq!(map.len(), 99);
}

// ---------------------------------------------------------------------------
// iteration must visit every entry exactly once
// ---------------------------------------------------------------------------

#[test]
fn iter_visits_each_entry_once() {
    let map: ChampMap<u64, u64> = (0..3000).map(|i| (i, i + 1)).collect();
    let mut seen = HashSet::new();
    for (k, v) in &map {
        assert_eq!(*v, k + 1);
        assert!(seen.insert(*k), "key {k} visited twice");
    }
    assert_eq!(seen.len(), 3000);
}

#[test]
fn iter_is_exact_size() {
    let map: ChampMap<u64, u64> = (0..257).map(|i| (i, i)).collect();
    let mut it = map.iter();
    assert_eq!(it.len(), 257);
    it.next();
    it.next();
    assert_eq!(it.len(), 255);
    assert_eq!(it.count(), 255);
}

#[test]
fn iter_after_removals() {
    let mut map: ChampMap<u64, u64> = (0..1000).map(|i| (i, i)).collect();
    for i in (0..1000).step_by(3) {
        map.remove(&i);
    }
    let mut keys: Vec<u64> = map.keys().copied().collect();
    keys.sort_unstable();
    let expected: Vec<u64> = (0..1000).filter(|i| i % 3 != 0).collect();
    assert_eq!(keys, expected);
}
