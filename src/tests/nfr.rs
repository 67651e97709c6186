//! Non-functional requirement tests: asymptotic complexity, memory, sharing.
//!
//! These tests verify quantitative properties of the CHAMP trie:
//! - O(log₃₂ n) get/insert/remove
//! - O(n) total node count
//! - O(D) node allocations per mutation of a frozen trie
//! - O(1) clone
//! - O(n) iteration, hash-ordered and sequence-ordered

#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use std::hint::black_box;
use std::time::Instant;

use crate::SequencedChampSet;
use crate::iter::Strategy;
use crate::node::MAX_DEPTH;

/// Measures wall-clock time of a closure in nanoseconds.
fn measure_ns<F: FnMut()>(mut f: F) -> u64 {
    let start = Instant::now();
    f();
    start.elapsed().as_nanos() as u64
}

/// Runs `f` multiple times and returns median time in nanoseconds.
fn median_ns<F: FnMut()>(iterations: u32, mut f: F) -> u64 {
    let mut times: Vec<u64> = (0..iterations).map(|_| measure_ns(&mut f)).collect();
    times.sort_unstable();
    times[times.len() / 2]
}

/// Runs `f` on `state` multiple times and returns median time in
/// nanoseconds. `reset` restores `state` after every run and is not timed.
fn median_reset_ns<S, F, R>(iterations: u32, state: &mut S, mut f: F, mut reset: R) -> u64
where
    F: FnMut(&mut S),
    R: FnMut(&mut S),
{
    let mut times = Vec::new();
    for _ in 0..iterations {
        times.push(measure_ns(|| f(state)));
        reset(state);
    }
    times.sort_unstable();
    times[times.len() / 2]
}

macro_rules! nfr_tests {
    ($mod_name:ident, $map_type:ty) => {
        mod $mod_name {
            use super::*;

            // =================================================================
            // Asymptotic: O(log₃₂ n) operations
            // =================================================================

            /// get time grows sublinearly with map size.
            ///
            /// log₃₂(1000) ≈ 2.0, log₃₂(100000) ≈ 3.3
            /// So 100x more entries should yield < 2x slower gets.
            /// We use 5x headroom for CI noise.
            #[test]
            fn get_sublinear() {
                let small = build_map(1_000);
                let large = build_map(100_000);

                let t_small = median_ns(5, || {
                    for i in 0_u64..1_000 {
                        black_box(small.get(&i));
                    }
                });
                let t_large = median_ns(5, || {
                    for i in 0_u64..1_000 {
                        black_box(large.get(&i));
                    }
                });

                let ratio = t_large as f64 / t_small as f64;
                assert!(
                    ratio < 5.0,
                    "get ratio {ratio:.2}x exceeds 5x bound (small={t_small}ns, large={t_large}ns)"
                );
            }

            /// insert time grows sublinearly with map size.
            ///
            /// Runs on a map whose nodes the open batch already owns, so
            /// every insert edits in place; the inserted keys are removed
            /// again between runs.
            #[test]
            fn insert_sublinear() {
                let t_small = time_inserts(1_000);
                let t_large = time_inserts(100_000);

                let ratio = t_large as f64 / t_small as f64;
                assert!(
                    ratio < 5.0,
                    "insert ratio {ratio:.2}x exceeds 5x bound (small={t_small}ns, large={t_large}ns)"
                );
            }

            /// remove time grows sublinearly with map size.
            ///
            /// Same owned base as `insert_sublinear`: no run pays for
            /// copying nodes out of a shared trie. Removed keys are put back
            /// between runs.
            #[test]
            fn remove_sublinear() {
                let t_small = time_removes(2_000);
                let t_large = time_removes(101_000);

                let ratio = t_large as f64 / t_small as f64;
                assert!(
                    ratio < 5.0,
                    "remove ratio {ratio:.2}x exceeds 5x bound (small={t_small}ns, large={t_large}ns)"
                );
            }

            // =================================================================
            // Memory: O(n) nodes
            // =================================================================

            /// Node count grows linearly with entry count.
            #[test]
            fn memory_linear() {
                let sizes = [1_000_u64, 10_000, 50_000];
                let mut ratios = Vec::new();

                for &n in &sizes {
                    let map = build_map(n);
                    ratios.push(map.node_count() as f64 / n as f64);
                }

                // Ratios should be roughly constant (within 2x of each other).
                let min = ratios.iter().copied().fold(f64::INFINITY, f64::min);
                let max = ratios.iter().copied().fold(0.0_f64, f64::max);
                assert!(
                    max / min < 2.0,
                    "node ratio not constant: ratios={ratios:?} (min={min:.2}, max={max:.2})"
                );
            }

            // =================================================================
            // Path copying: O(D) allocations per mutation
            // =================================================================

            /// A single insert into a frozen map allocates O(D) nodes, not O(n).
            ///
            /// At most one copy per level on the path, plus the sub-nodes
            /// that separate two keys sharing a hash prefix.
            #[test]
            fn cow_single_insert() {
                let mut map = build_map(100_000);
                map.insert(999_999, 999_999);
                let allocated = map.batch_allocations();
                assert!(
                    allocated <= 2 * MAX_DEPTH,
                    "single insert allocated {allocated} nodes"
                );
            }

            /// A single remove from a frozen map allocates O(D) nodes.
            #[test]
            fn cow_single_remove() {
                let mut map = build_map(100_000);
                map.remove(&50_000);
                let allocated = map.batch_allocations();
                assert!(
                    allocated <= MAX_DEPTH,
                    "single remove allocated {allocated} nodes"
                );
            }

            /// Further edits in the same batch reuse the copied path.
            #[test]
            fn batch_reuses_path() {
                let mut map = build_map(100_000);
                map.insert(999_999, 1);
                let first = map.batch_allocations();
                map.insert(999_999, 2);
                assert_eq!(map.batch_allocations(), first);
            }

            // =================================================================
            // Clone: O(1) time and space
            // =================================================================

            /// Clone time is constant regardless of map size.
            #[test]
            fn clone_constant_time() {
                let small = build_map(1_000);
                let large = build_map(100_000);

                let t_small = median_ns(11, || {
                    black_box(small.clone());
                });
                let t_large = median_ns(11, || {
                    black_box(large.clone());
                });

                // Both should be near-instant. Allow 10x for noise.
                let ratio = if t_small == 0 {
                    1.0
                } else {
                    t_large as f64 / t_small as f64
                };
                assert!(
                    ratio < 10.0,
                    "clone ratio {ratio:.2}x exceeds 10x (small={t_small}ns, large={t_large}ns)"
                );
            }

            /// Clone shares the root and allocates nothing.
            #[test]
            fn clone_zero_alloc() {
                let map = build_map(10_000);
                let copy = map.clone();
                assert!(copy.ptr_eq(&map));
                assert_eq!(copy.batch_allocations(), 0);
            }

            // =================================================================
            // Iter: O(n) time
            // =================================================================

            /// Iteration time scales linearly with entry count.
            #[test]
            fn iter_linear() {
                let small = build_map(10_000);
                let large = build_map(100_000);

                let t_small = median_ns(5, || {
                    let mut count = 0_u64;
                    for (k, v) in small.iter() {
                        count += black_box(*k) + black_box(*v);
                    }
                    black_box(count);
                });
                let t_large = median_ns(5, || {
                    let mut count = 0_u64;
                    for (k, v) in large.iter() {
                        count += black_box(*k) + black_box(*v);
                    }
                    black_box(count);
                });

                // Bound catches O(n²) regression (would be 100x+), not exact linearity.
                let ratio = t_large as f64 / t_small as f64;
                assert!(
                    ratio < 60.0,
                    "iter ratio {ratio:.2}x exceeds 60x for 10x entries \
                     (small={t_small}ns, large={t_large}ns)"
                );
            }

            /// Iter yields exactly `len()` entries.
            #[test]
            fn iter_count_matches_len() {
                for &n in &[0_u64, 1, 10, 100, 1_000, 10_000] {
                    let map = build_map(n);
                    assert_eq!(
                        map.iter().count(),
                        map.len(),
                        "iter count != len for n={n}"
                    );
                }
            }

            // =================================================================
            // Helper
            // =================================================================

            fn build_map(n: u64) -> $map_type {
                let mut map = build_owned(n);
                map.freeze();
                map
            }

            /// Builds a map whose batch stays open: every node is owned and
            /// unshared, so later edits happen in place.
            fn build_owned(n: u64) -> $map_type {
                let mut map = <$map_type>::default();
                for i in 0..n {
                    map.insert(i, i);
                }
                map
            }

            /// Median time of inserting 1000 fresh keys into an owned map
            /// of `n` entries.
            fn time_inserts(n: u64) -> u64 {
                let mut map = build_owned(n);
                let t = median_reset_ns(
                    5,
                    &mut map,
                    |map| {
                        for i in n..n + 1_000 {
                            map.insert(i, i);
                        }
                    },
                    |map| {
                        for i in n..n + 1_000 {
                            map.remove(&i);
                        }
                    },
                );
                assert_eq!(map.len() as u64, n);
                assert!(!map.is_frozen());
                t
            }

            /// Median time of removing the keys `0..1000` from an owned map
            /// of `n` entries.
            fn time_removes(n: u64) -> u64 {
                let mut map = build_owned(n);
                let t = median_reset_ns(
                    5,
                    &mut map,
                    |map| {
                        for i in 0_u64..1_000 {
                            map.remove(&i);
                        }
                    },
                    |map| {
                        for i in 0_u64..1_000 {
                            map.insert(i, i);
                        }
                    },
                );
                assert_eq!(map.len() as u64, n);
                t
            }
        }
    };
}

nfr_tests!(single, crate::ChampMap<u64, u64>);
nfr_tests!(sync, crate::ChampMapSync<u64, u64>);

/// Sequence-ordered iteration stays linear on dense and sparse numbering.
#[test]
fn sequenced_iter_linear() {
    fn build(n: u32, sparse: bool) -> SequencedChampSet<u32> {
        let mut set = SequencedChampSet::new();
        let stride = if sparse { 10 } else { 1 };
        for i in 0..n * stride {
            set.push_back(i);
        }
        set.retain(|v| v % stride == 0);
        set.freeze();
        set
    }

    for sparse in [false, true] {
        let small = build(2_000, sparse);
        let large = build(20_000, sparse);
        assert_eq!(small.len(), 2_000);
        let strategy = small.iter_with(Strategy::Auto, false).strategy();
        assert_eq!(strategy == Strategy::Heap, sparse);

        let t_small = median_ns(5, || {
            black_box(small.iter().count());
        });
        let t_large = median_ns(5, || {
            black_box(large.iter().count());
        });
        let ratio = t_large as f64 / t_small as f64;
        assert!(
            ratio < 60.0,
            "sequenced iter ratio {ratio:.2}x exceeds 60x (sparse={sparse})"
        );
    }
}
