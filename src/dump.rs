//! Graphviz dump of a trie, for debugging.
//!
//! The output is a `dot` digraph with one record per node (bitmaps in
//! binary, one field per payload rendered with `Debug`) and one edge per
//! child. It is meant for eyeballing, not as a storage format.

use std::collections::HashMap;
use std::fmt;
use std::ptr;

use archery::SharedPointerKind;

use crate::node::{Node, NodeRef};

/// Renders the trie rooted at `root` as a Graphviz digraph.
///
/// Shared sub-tries are emitted once and referenced by every parent.
#[must_use]
pub fn to_dot<A: fmt::Debug, P: SharedPointerKind>(root: &NodeRef<A, P>) -> String {
    Dot::new(root).to_string()
}

/// [`Display`](fmt::Display) adapter behind [`to_dot`], for writing the
/// digraph straight into a formatter.
pub struct Dot<'a, A, P: SharedPointerKind> {
    root: &'a NodeRef<A, P>,
}

impl<'a, A, P: SharedPointerKind> Dot<'a, A, P> {
    /// Wraps the trie rooted at `root`.
    #[must_use]
    pub const fn new(root: &'a NodeRef<A, P>) -> Self {
        Self { root }
    }
}

impl<A: fmt::Debug, P: SharedPointerKind> fmt::Display for Dot<'_, A, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("digraph champ {\n  node [shape=record];\n")?;
        write_node(f, self.root, &mut HashMap::new())?;
        f.write_str("}\n")
    }
}

fn write_node<A: fmt::Debug, P: SharedPointerKind>(
    f: &mut fmt::Formatter<'_>,
    node: &NodeRef<A, P>,
    seen: &mut HashMap<*const Node<A, P>, usize>,
) -> Result<usize, fmt::Error> {
    let key = ptr::from_ref::<Node<A, P>>(node);
    if let Some(&id) = seen.get(&key) {
        return Ok(id);
    }
    let id = seen.len();
    seen.insert(key, id);

    match &**node {
        Node::Bitmap(n) => {
            write!(
                f,
                "  n{id} [label=\"{{data {:032b}|node {:032b}",
                n.data_map(),
                n.node_map()
            )?;
            for payload in n.payloads() {
                write!(f, "|{}", escape(&format!("{payload:?}")))?;
            }
            f.write_str("}\"];\n")?;
            for child in n.children() {
                let child_id = write_node(f, child, seen)?;
                writeln!(f, "  n{id} -> n{child_id};")?;
            }
        }
        Node::Collision(n) => {
            write!(f, "  n{id} [label=\"{{collision {:#010x}", n.hash())?;
            for payload in n.entries() {
                write!(f, "|{}", escape(&format!("{payload:?}")))?;
            }
            f.write_str("}\"];\n")?;
        }
    }
    Ok(id)
}

/// Escapes characters that are special inside a record label.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '"' | '\\' | '{' | '}' | '|' | '<' | '>') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
