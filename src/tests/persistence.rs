use archery::SharedPointer;

use crate::ChampMap;

fn build(n: u64) -> ChampMap<u64, u64> {
    let mut map = ChampMap::new();
    for i in 0..n {
        map.insert(i, i * 2);
    }
    map.freeze();
    map
}

/// Clone is O(1): the clone shares the root.
#[test]
fn clone_shares_root() {
    let map = build(500);
    let copy = map.clone();
    assert!(map.ptr_eq(&copy));
    assert!(copy.is_frozen());
}

/// A single insert copies one path; every other sub-trie stays shared.
#[test]
fn insert_shares_untouched_subtries() {
    let original = build(1000);
    let mut derived = original.clone();
    derived.insert(1_000_000, 0);

    assert!(!original.ptr_eq(&derived));
    let crate::node::Node::Bitmap(old_root) = &**original.root() else {
        panic!("root is a bitmap node");
    };
    let crate::node::Node::Bitmap(new_root) = &**derived.root() else {
        panic!("root is a bitmap node");
    };
    let total = new_root.children().count();
    let shared = new_root
        .children()
        .filter(|c| {
            old_root
                .children()
                .any(|d| SharedPointer::ptr_eq(c, d))
        })
        .count();
    assert!(total > 1);
    assert!(
        shared + 1 >= total,
        "only {shared} of {total} children shared"
    );
}

/// Edits of the derived version never show through in the original.
#[test]
fn original_unaffected_by_derived_edits() {
    let original = build(200);
    let mut derived = original.clone();
    for i in 0..100 {
        derived.remove(&i);
    }
    for i in 200..300 {
        derived.insert(i, 0);
    }

    assert_eq!(original.len(), 200);
    for i in 0..200 {
        assert_eq!(original.get(&i), Some(&(i * 2)));
    }
    assert_eq!(original.get(&250), None);
    assert_eq!(derived.len(), 200);
}

/// `inserted` and `removed` return new versions.
#[test]
fn persistent_style_updates() {
    let v0: ChampMap<&str, i32> = ChampMap::new();
    let v1 = v0.inserted("a", 1);
    let v2 = v1.inserted("b", 2);
    let v3 = v2.removed(&"a");

    assert!(v0.is_empty());
    assert_eq!(v1.len(), 1);
    assert_eq!(v2.len(), 2);
    assert_eq!(v3.len(), 1);
    assert_eq!(v3.get(&"a"), None);
    assert_eq!(v2.get(&"a"), Some(&1));
    assert!(v3.is_frozen());
}

/// Removing a missing key from a derived version still shares the root.
#[test]
fn noop_removal_keeps_sharing() {
    let original = build(50);
    let derived = original.removed(&9999);
    assert!(original.ptr_eq(&derived));
}
