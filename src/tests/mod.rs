use std::hash::{Hash, Hasher};

use archery::SharedPointerKind;

use crate::node::Node;

mod collision;
mod completeness;
mod dump;
mod nfr;
mod persistence;
mod stress;

/// A key type with a controllable hash value for testing hash collisions.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CollidingKey {
    id: u32,
    forced_hash: u64,
}

impl CollidingKey {
    const fn new(id: u32, hash: u64) -> Self {
        Self {
            id,
            forced_hash: hash,
        }
    }
}

impl Hash for CollidingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.forced_hash.hash(state);
    }
}

/// Checks every structural invariant and the payload count.
fn assert_valid<A, P, H>(root: &Node<A, P>, len: usize, hash_of: H)
where
    P: SharedPointerKind,
    H: Fn(&A) -> u32,
{
    assert_eq!(
        root.check_invariants(0, true, &hash_of),
        len,
        "payload count"
    );
}

/// Depth of the first collision node, if any (root = 0).
fn collision_depth<A, P: SharedPointerKind>(node: &Node<A, P>) -> Option<usize> {
    match node {
        Node::Collision(_) => Some(0),
        Node::Bitmap(n) => Some(1 + n.children().find_map(|c| collision_depth(c))?),
    }
}
