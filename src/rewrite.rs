//! Bounded breadth-first search over local tree transformations.
//!
//! Every dequeued tree is scanned node by node; each applicable rule is
//! applied to a compacted deep copy (queued trees are never mutated) and the
//! result is kept only if its canonical string is new. The output set always
//! includes the seed. Growth stops at a soft cap on distinct trees, but the
//! queue still drains so the search ends deterministically.

use crate::tree::{NodeId, Tree};
use std::collections::{HashSet, VecDeque};

/// Soft cap on distinct generated trees.
const TREE_CAP: usize = 100_000;
/// Progress is logged every this many generated trees.
const PROGRESS_INTERVAL: usize = 1_000;

struct Search {
    generated: Vec<Tree<String>>,
    processed: HashSet<String>,
    queue: VecDeque<usize>,
    capped: bool,
}

impl Search {
    fn new(seed: Tree<String>) -> Self {
        let mut processed = HashSet::new();
        processed.insert(seed.canonical());
        let mut queue = VecDeque::new();
        queue.push_back(0);
        Search {
            generated: vec![seed],
            processed,
            queue,
            capped: false,
        }
    }

    fn add(&mut self, tree: Tree<String>, rule: &str) {
        if self.generated.len() > TREE_CAP {
            if !self.capped {
                tracing::warn!(
                    cap = TREE_CAP,
                    "generated-tree cap exceeded; dropping further trees"
                );
                self.capped = true;
            }
            return;
        }
        if self.processed.insert(tree.canonical()) {
            tracing::trace!(rule, tree = %tree.tree_string(), "rule created tree");
            self.generated.push(tree);
            if self.generated.len() % PROGRESS_INTERVAL == 0 {
                tracing::debug!(trees = self.generated.len(), "generated trees so far");
            }
            self.queue.push_back(self.generated.len() - 1);
        }
    }
}

/// Run the rewrite search from a null-pruned seed tree.
pub fn run_generation_rules(seed: &Tree<String>) -> Vec<Tree<String>> {
    let mut search = Search::new(seed.compact());

    while let Some(index) = search.queue.pop_front() {
        let tree = search.generated[index].clone();
        for node in tree.all_nodes() {
            let child_count = tree.children(node).len();

            if child_count == 1 {
                let (mut copy, copy_node) = copy_at(&tree, node);
                if flip(&mut copy, copy_node) {
                    debug_assert_eq!(copy.size(), tree.size());
                    search.add(copy, "Flip");
                }
            }

            if child_count > 1 && child_count < 4 {
                for child_index in 0..child_count {
                    let (mut copy, copy_node) = copy_at(&tree, node);
                    let child = copy.children(copy_node)[child_index];
                    promote(&mut copy, child);
                    debug_assert_eq!(copy.size(), tree.size());
                    search.add(copy, "Promote-Child");
                }
            }

            if child_count == 1 && node != tree.root() {
                let (mut copy, copy_node) = copy_at(&tree, node);
                demote(&mut copy, copy_node);
                debug_assert_eq!(copy.size(), tree.size());
                search.add(copy, "Demote-Child");
            }

            if tree.value(node).starts_with("lambda ") && child_count > 0 {
                let (mut copy, copy_node) = copy_at(&tree, node);
                if lambda_and(&mut copy, copy_node) {
                    debug_assert_eq!(copy.size(), tree.size() + 1);
                    search.add(copy, "Lambda-And");
                }
            }
        }
    }

    tracing::debug!(trees = search.generated.len(), "rewrite search finished");
    search.generated
}

/// Compacted deep copy of the whole tree with `node` re-resolved by its
/// path from the root.
fn copy_at(tree: &Tree<String>, node: NodeId) -> (Tree<String>, NodeId) {
    let copy = tree.compact();
    let copy_node = copy.node_at_path(&tree.path_from_root(node));
    debug_assert_eq!(copy.value(copy_node), tree.value(node));
    (copy, copy_node)
}

/// Swap `node` with its only child: the child becomes the parent, taking
/// `node`'s place, and `node` inherits the child's children. Refused when
/// either label is `and` or the labels are equal.
fn flip(tree: &mut Tree<String>, node: NodeId) -> bool {
    let child = tree.children(node)[0];
    if tree.value(node) == "and" || tree.value(child) == "and" {
        return false;
    }
    if tree.value(node) == tree.value(child) {
        return false;
    }

    tree.detach(child);
    for grandchild in tree.children(child).to_vec() {
        tree.detach(grandchild);
        tree.attach(node, grandchild);
    }
    match tree.parent(node) {
        None => {
            tree.attach(child, node);
            tree.set_root(child);
        }
        Some(parent) => {
            tree.detach(node);
            tree.attach(parent, child);
            tree.attach(child, node);
        }
    }
    true
}

/// Promote `child` above its siblings: it absorbs them as its own children.
fn promote(tree: &mut Tree<String>, child: NodeId) {
    let parent = match tree.parent(child) {
        Some(parent) => parent,
        None => return,
    };
    for sibling in tree.children(parent).to_vec() {
        if sibling != child {
            tree.detach(sibling);
            tree.attach(child, sibling);
        }
    }
}

/// Demote `node`: its children become its parent's children, leaving `node`
/// as a leaf sibling of its former children.
fn demote(tree: &mut Tree<String>, node: NodeId) {
    let parent = match tree.parent(node) {
        Some(parent) => parent,
        None => return,
    };
    for child in tree.children(node).to_vec() {
        tree.detach(child);
        tree.attach(parent, child);
    }
}

/// Insert an `and` node between a lambda and its children. Refused when the
/// tree already holds two `and` nodes.
fn lambda_and(tree: &mut Tree<String>, lambda: NodeId) -> bool {
    let and_count = tree
        .all_nodes()
        .into_iter()
        .filter(|&node| tree.value(node) == "and")
        .count();
    if and_count >= 2 {
        return false;
    }

    let children = tree.children(lambda).to_vec();
    let and_node = tree.new_node("and".to_string());
    for child in children {
        tree.detach(child);
        tree.attach(and_node, child);
    }
    tree.attach(lambda, and_node);
    true
}
