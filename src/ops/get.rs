//! Lookup operation: traverses the trie to find a key.

use archery::SharedPointerKind;

use crate::node::{self, Node};

/// Searches the trie rooted at `root` for a payload matching `key`.
///
/// `hash` is the 32-bit hash of `key`; `eq` decides whether a stored payload
/// matches. Returns a reference to the payload if found.
pub fn find<'a, A, Q, P, E>(root: &'a Node<A, P>, key: &Q, hash: u32, eq: E) -> Option<&'a A>
where
    Q: ?Sized,
    P: SharedPointerKind,
    E: Fn(&A, &Q) -> bool,
{
    find_recursive(root, key, hash, 0, &eq)
}

fn find_recursive<'a, A, Q, P, E>(
    node: &'a Node<A, P>,
    key: &Q,
    hash: u32,
    shift: u32,
    eq: &E,
) -> Option<&'a A>
where
    Q: ?Sized,
    P: SharedPointerKind,
    E: Fn(&A, &Q) -> bool,
{
    match node {
        Node::Bitmap(n) => {
            let bit = node::bitpos(hash, shift);
            if n.data_map() & bit != 0 {
                // Position has an inline payload.
                let payload = n.data_at(bit);
                eq(payload, key).then_some(payload)
            } else if n.node_map() & bit != 0 {
                // Position has a child subtree, recurse.
                find_recursive(n.child_at(bit), key, hash, shift + node::BITS_PER_LEVEL, eq)
            } else {
                None
            }
        }
        Node::Collision(n) => {
            if hash != n.hash() {
                return None;
            }
            n.entries().iter().find(|a| eq(*a, key))
        }
    }
}
