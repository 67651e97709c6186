use std::fmt::Write;

use crate::dump::{Dot, to_dot};
use crate::{ChampMap, ChampSet, SequencedChampSet};

use super::CollidingKey;

fn edges(dot: &str) -> usize {
    dot.lines().filter(|l| l.contains(" -> ")).count()
}

#[test]
fn empty_trie() {
    let set: ChampSet<u32> = ChampSet::new();
    let zeros = "0".repeat(32);
    let expected = format!(
        "digraph champ {{\n  node [shape=record];\n  n0 [label=\"{{data {zeros}|node {zeros}}}\"];\n}}\n"
    );
    assert_eq!(to_dot(set.root()), expected);
}

#[test]
fn one_edge_per_child() {
    let set: ChampSet<u32> = (0..2_000).collect();
    let dot = to_dot(set.root());
    assert!(dot.starts_with("digraph champ {"));
    assert!(dot.ends_with("}\n"));
    assert_eq!(edges(&dot), set.node_count() - 1);
}

#[test]
fn labels_are_escaped() {
    let mut map = ChampMap::new();
    map.insert("a|b", 1);
    let dot = to_dot(map.root());
    assert!(dot.contains(r#"(\"a\|b\", 1)"#), "{dot}");
}

#[test]
fn collision_nodes_show_hash() {
    let mut set = ChampSet::new();
    set.insert(CollidingKey::new(1, 7));
    set.insert(CollidingKey::new(2, 7));
    let dot = to_dot(set.root());
    assert!(dot.contains("collision 0x"));
    assert_eq!(edges(&dot), 7);
}

#[test]
fn sequence_numbers_rendered() {
    let set: SequencedChampSet<u32> = [5, 6].into_iter().collect();
    let dot = to_dot(set.root());
    assert!(dot.contains("5#0"));
    assert!(dot.contains("6#1"));
}

/// The `Display` adapter writes the same digraph into any formatter.
#[test]
fn display_adapter_matches() {
    let set: ChampSet<u32> = (0..100).collect();
    let mut out = String::from("// trie\n");
    let dot = Dot::new(set.root());
    write!(out, "{dot}").expect("writing to a String");
    assert_eq!(out, format!("// trie\n{}", to_dot(set.root())));
}
