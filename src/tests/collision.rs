use crate::hash::hash_one;
use crate::node::Node;
use crate::{ChampMap, ChampSet};

use super::{CollidingKey, assert_valid, collision_depth};

fn key_hash(entry: &(CollidingKey, i32)) -> u32 {
    hash_one(&entry.0)
}

/// Two keys with the same 64-bit hash create a collision node.
#[test]
fn two_colliding_keys() {
    let k1 = CollidingKey::new(1, 0xDEAD_BEEF);
    let k2 = CollidingKey::new(2, 0xDEAD_BEEF);

    let mut map = ChampMap::new();
    map.insert(k1.clone(), "first");
    map.insert(k2.clone(), "second");

    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&k1), Some(&"first"));
    assert_eq!(map.get(&k2), Some(&"second"));
}

/// The collision node sits below the last bitmap level.
#[test]
fn collision_node_at_max_depth() {
    let mut map = ChampMap::new();
    map.insert(CollidingKey::new(1, 0x1234), 1);
    map.insert(CollidingKey::new(2, 0x1234), 2);

    // Seven bitmap levels (shift 0..=30), then the collision node.
    assert_eq!(collision_depth(map.root()), Some(7));
    assert_valid(map.root(), 2, key_hash);
}

/// Both colliding keys are visited exactly once.
#[test]
fn iteration_visits_colliding_keys_once() {
    let mut map = ChampMap::new();
    map.insert(CollidingKey::new(1, 0x77), 1);
    map.insert(CollidingKey::new(2, 0x77), 2);
    map.insert(CollidingKey::new(3, 0x99), 3);

    let mut ids: Vec<u32> = map.keys().map(|k| k.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
}

/// Three keys with the same hash.
#[test]
fn three_colliding_keys() {
    let keys: Vec<CollidingKey> = (0..3).map(|i| CollidingKey::new(i, 0xCAFE)).collect();

    let mut map = ChampMap::new();
    for (i, k) in keys.iter().enumerate() {
        map.insert(k.clone(), i32::try_from(i).unwrap());
    }

    assert_eq!(map.len(), 3);
    for (i, k) in keys.iter().enumerate() {
        assert_eq!(map.get(k), Some(&i32::try_from(i).unwrap()));
    }
    assert_valid(map.root(), 3, key_hash);
}

/// Remove from collision node.
#[test]
fn remove_from_collision() {
    let k1 = CollidingKey::new(1, 0xAAAA);
    let k2 = CollidingKey::new(2, 0xAAAA);
    let k3 = CollidingKey::new(3, 0xAAAA);

    let mut map = ChampMap::new();
    map.insert(k1.clone(), 10);
    map.insert(k2.clone(), 20);
    map.insert(k3.clone(), 30);

    assert_eq!(map.remove(&k2), Some(20));
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&k1), Some(&10));
    assert_eq!(map.get(&k2), None);
    assert_eq!(map.get(&k3), Some(&30));
    assert_valid(map.root(), 2, key_hash);
}

/// A collision node left with one entry collapses all the way up.
#[test]
fn collision_collapses_to_inline() {
    let k1 = CollidingKey::new(1, 0xAAAA);
    let k2 = CollidingKey::new(2, 0xAAAA);

    let mut map = ChampMap::new();
    map.insert(k1.clone(), 10);
    map.insert(k2.clone(), 20);
    map.remove(&k2);

    assert_eq!(collision_depth(map.root()), None);
    assert_eq!(map.node_count(), 1);
    assert_valid(map.root(), 1, key_hash);

    let mut direct = ChampMap::new();
    direct.insert(k1, 10);
    assert!(map.equivalent(&direct));
}

/// Collapse next to unrelated keys inlines the survivor into the parent.
#[test]
fn collision_collapse_with_neighbours() {
    let mut map = ChampMap::new();
    for i in 0..40 {
        map.insert(CollidingKey::new(100 + i, u64::from(i) * 7919), 0);
    }
    map.insert(CollidingKey::new(1, 0xF00D), 1);
    map.insert(CollidingKey::new(2, 0xF00D), 2);
    assert!(collision_depth(map.root()).is_some());

    map.remove(&CollidingKey::new(1, 0xF00D));
    assert_eq!(collision_depth(map.root()), None);
    assert_eq!(map.get(&CollidingKey::new(2, 0xF00D)), Some(&2));
    assert_valid(map.root(), 41, key_hash);
}

/// Overwrite in collision node.
#[test]
fn overwrite_in_collision() {
    let k1 = CollidingKey::new(1, 0xBBBB);
    let k2 = CollidingKey::new(2, 0xBBBB);

    let mut map = ChampMap::new();
    map.insert(k1.clone(), 1);
    map.insert(k2.clone(), 2);
    assert_eq!(map.insert(k1.clone(), 100), Some(1));

    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&k1), Some(&100));
    assert_eq!(map.get(&k2), Some(&2));
}

/// Lookup of a non-colliding key whose path ends in a collision node.
#[test]
fn miss_through_collision_node() {
    let mut set = ChampSet::new();
    set.insert(CollidingKey::new(1, 0x5555));
    set.insert(CollidingKey::new(2, 0x5555));
    assert!(!set.contains(&CollidingKey::new(3, 0x5555)));
    assert!(!set.contains(&CollidingKey::new(1, 0x5556)));
}

/// Collision nodes compare equal regardless of entry order.
#[test]
fn collision_equivalence_ignores_order() {
    let keys: Vec<CollidingKey> = (0..4).map(|i| CollidingKey::new(i, 0x00C0_FFEE)).collect();

    let mut forward = ChampSet::new();
    for k in &keys {
        forward.insert(k.clone());
    }
    let mut backward = ChampSet::new();
    for k in keys.iter().rev() {
        backward.insert(k.clone());
    }

    let a = find_collision(forward.root()).expect("collision node");
    let b = find_collision(backward.root()).expect("collision node");
    assert_ne!(a.entries()[0], b.entries()[0]);
    assert!(forward.equivalent(&backward));
    assert_eq!(forward, backward);
}

fn find_collision<A, P: archery::SharedPointerKind>(
    node: &Node<A, P>,
) -> Option<&crate::node::CollisionNode<A>> {
    match node {
        Node::Collision(c) => Some(c),
        Node::Bitmap(n) => n.children().find_map(|c| find_collision(c)),
    }
}
