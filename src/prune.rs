//! Contraction of `null` nodes in a seed logical tree.
//!
//! Non-root nulls are contracted in ascending order of their initial subtree
//! height, so the deepest nulls go first and reparented children are seen by
//! later contractions. A null root is resolved last: single children are
//! promoted, the first of multiple children absorbs its siblings, and a
//! childless null root means the whole covering was semantically empty.

use crate::tree::Tree;

const NULL_LABEL: &str = "null";

/// Contract every `null` node of `seed`.
///
/// Returns `None` when the tree reduces to nothing (every node was null);
/// that covering yields no logical trees.
pub fn prune_null(seed: &Tree<String>) -> Option<Tree<String>> {
    let mut tree = seed.compact();

    let mut descendants = tree.descendants(tree.root());
    descendants.sort_by_key(|&node| tree.height(node));
    for node in descendants {
        if tree.value(node) != NULL_LABEL {
            continue;
        }
        let parent = match tree.parent(node) {
            Some(parent) => parent,
            None => continue,
        };
        for child in tree.children(node).to_vec() {
            tree.detach(child);
            tree.attach(parent, child);
        }
        tree.detach(node);
    }

    while tree.value(tree.root()) == NULL_LABEL {
        let root = tree.root();
        let children = tree.children(root).to_vec();
        match children.len() {
            0 => {
                tracing::warn!("logical tree is all nulls; covering yields nothing");
                return None;
            }
            1 => {
                tree.detach(children[0]);
                tree.set_root(children[0]);
            }
            _ => {
                // Take the first child and hope the generation rules sort
                // out the rest.
                let new_root = children[0];
                for &child in &children[1..] {
                    tree.detach(child);
                    tree.attach(new_root, child);
                }
                tree.detach(new_root);
                tree.set_root(new_root);
            }
        }
    }

    let pruned = tree.compact();
    debug_assert!(pruned
        .all_nodes()
        .iter()
        .all(|&node| pruned.value(node) != NULL_LABEL));
    tracing::trace!(tree = %pruned.tree_string(), "null-pruned tree");
    Some(pruned)
}
