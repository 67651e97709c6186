use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::hash::hash_one;
use crate::{ChampMap, SequencedChampSet};

use super::assert_valid;

/// 10 000 entries: insert all, verify all, remove all.
#[test]
fn ten_thousand_entries() {
    let mut map = ChampMap::new();
    for i in 0_u64..10_000 {
        map.insert(i, i * 3);
    }
    assert_eq!(map.len(), 10_000);

    for i in 0_u64..10_000 {
        assert_eq!(map.get(&i), Some(&(i * 3)), "missing key {i}");
    }

    for i in 0_u64..10_000 {
        assert!(map.remove(&i).is_some(), "failed to remove key {i}");
    }
    assert!(map.is_empty());
    assert_eq!(map.node_count(), 1);
}

/// Insert + overwrite + remove interleaved.
#[test]
fn interleaved_operations() {
    let mut map = ChampMap::new();
    for i in 0_u64..2_000 {
        map.insert(i, i);
    }
    // Overwrite even keys.
    for i in (0_u64..2_000).step_by(2) {
        map.insert(i, i + 1000);
    }
    // Remove odd keys.
    for i in (1_u64..2_000).step_by(2) {
        assert!(map.remove(&i).is_some());
    }
    assert_eq!(map.len(), 1_000);
    for i in (0_u64..2_000).step_by(2) {
        assert_eq!(map.get(&i), Some(&(i + 1000)));
    }
    assert_valid(map.root(), 1_000, |e: &(u64, u64)| hash_one(&e.0));
}

/// Random operations across many frozen versions.
#[test]
fn random_versions() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut map: ChampMap<u32, u32> = ChampMap::new();
    let mut versions = Vec::new();

    for round in 0..50 {
        for _ in 0..200 {
            let key = rng.gen_range(0..1_000);
            if rng.gen_bool(0.7) {
                map.insert(key, round);
            } else {
                map.remove(&key);
            }
        }
        map.freeze();
        let snapshot: Vec<(u32, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        versions.push((map.clone(), snapshot));
    }

    for (version, snapshot) in &versions {
        assert_eq!(version.len(), snapshot.len());
        for (k, v) in snapshot {
            assert_eq!(version.get(k), Some(v));
        }
        assert_valid(version.root(), version.len(), |e: &(u32, u32)| {
            hash_one(&e.0)
        });
    }
}

/// A long queue workload: sequence numbers drift far from zero and the
/// order survives every renumbering.
#[test]
fn sliding_queue() {
    let mut set = SequencedChampSet::new();
    for i in 0_u32..100 {
        set.push_back(i);
    }
    for i in 100_u32..20_000 {
        set.push_back(i);
        assert_eq!(set.pop_front(), Some(i - 100));
    }
    assert_eq!(set.len(), 100);
    let order: Vec<u32> = set.iter().copied().collect();
    assert_eq!(order, (19_900..20_000).collect::<Vec<_>>());
    let bounds = set.sequence_bounds();
    assert!(bounds.last() - bounds.first() <= 101);
}
