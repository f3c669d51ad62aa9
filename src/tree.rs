//! Arena-backed ownership tree.
//!
//! Nodes are addressed by [`NodeId`] (an index into the arena). Each node
//! owns its ordered child list and carries a non-owning parent back-reference
//! for upward navigation, so local restructuring (flip/promote/demote) is a
//! matter of re-linking ids rather than juggling owned pointers. Detached
//! nodes stay in the arena as garbage until the next [`Tree::compact`], which
//! rebuilds the arena from the root and drops everything unreachable.

use serde::Serialize;
use std::fmt::{self, Display, Write};

/// Identifier of a node within one [`Tree`] arena.
///
/// Ids are only meaningful for the arena that produced them; compacting a
/// tree renumbers its nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Serialize)]
struct NodeData<T> {
    value: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A generic ownership tree with parent back-references.
#[derive(Debug, Clone, Serialize)]
pub struct Tree<T> {
    nodes: Vec<NodeData<T>>,
    root: NodeId,
}

impl<T> Tree<T> {
    /// Create a tree holding a single root node.
    pub fn new(value: T) -> Self {
        Tree {
            nodes: vec![NodeData {
                value,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    /// The current root of the tree.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The value stored at `id`.
    pub fn value(&self, id: NodeId) -> &T {
        &self.nodes[id.0].value
    }

    /// Replace the value stored at `id`.
    pub fn set_value(&mut self, id: NodeId, value: T) {
        self.nodes[id.0].value = value;
    }

    /// The parent of `id`, or `None` for the root (and detached nodes).
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// The ordered children of `id`.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Whether `id` has no children.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.0].children.is_empty()
    }

    /// Allocate a new detached node.
    pub fn new_node(&mut self, value: T) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            value,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Allocate a new node and attach it as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, value: T) -> NodeId {
        let id = self.new_node(value);
        self.attach(parent, id);
        id
    }

    /// Attach a detached node as the last child of `parent`.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child.0].parent.is_none());
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Detach `child` from its parent, preserving sibling order.
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            let siblings = &mut self.nodes[parent.0].children;
            if let Some(pos) = siblings.iter().position(|&c| c == child) {
                siblings.remove(pos);
            }
        }
    }

    /// Make a detached node the new root.
    pub fn set_root(&mut self, id: NodeId) {
        debug_assert!(self.nodes[id.0].parent.is_none());
        self.root = id;
    }

    /// Preorder traversal of the subtree rooted at `id`.
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            for &child in self.nodes[node.0].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Preorder traversal of the whole tree.
    pub fn all_nodes(&self) -> Vec<NodeId> {
        self.preorder(self.root)
    }

    /// Preorder traversal of the subtree below `id` (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = self.preorder(id);
        out.remove(0);
        out
    }

    /// Number of nodes reachable from the root.
    pub fn size(&self) -> usize {
        self.all_nodes().len()
    }

    /// Number of edges from `id` up to the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Length of the longest downward path from `id` to a leaf.
    pub fn height(&self, id: NodeId) -> usize {
        self.nodes[id.0]
            .children
            .iter()
            .map(|&child| self.height(child) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Child indices leading from the root down to `id`.
    pub fn path_from_root(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            let pos = self.nodes[parent.0]
                .children
                .iter()
                .position(|&c| c == current)
                .unwrap_or(0);
            path.push(pos);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Resolve a child-index path from the root back to a node id.
    pub fn node_at_path(&self, path: &[usize]) -> NodeId {
        let mut current = self.root;
        for &index in path {
            current = self.nodes[current.0].children[index];
        }
        current
    }
}

impl<T: Clone> Tree<T> {
    /// Clone the tree, rebuilding the arena from the root.
    ///
    /// Detached garbage is dropped and child order is preserved; node ids are
    /// renumbered in preorder.
    pub fn compact(&self) -> Tree<T> {
        let mut out = Tree::new(self.nodes[self.root.0].value.clone());
        self.copy_children(self.root, out.root(), &mut out);
        out
    }

    fn copy_children(&self, from: NodeId, to: NodeId, out: &mut Tree<T>) {
        for &child in &self.nodes[from.0].children {
            let new_child = out.add_child(to, self.nodes[child.0].value.clone());
            self.copy_children(child, new_child, out);
        }
    }
}

impl<T: Display> Tree<T> {
    /// Canonical single-line form: preorder, `label(child,child)`, no
    /// whitespace. Used as a dedup key, so the format must stay unambiguous.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        self.write_canonical(self.root, &mut out);
        out
    }

    fn write_canonical(&self, id: NodeId, out: &mut String) {
        let _ = write!(out, "{}", self.nodes[id.0].value);
        let children = &self.nodes[id.0].children;
        if !children.is_empty() {
            out.push('(');
            for (i, &child) in children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                self.write_canonical(child, out);
            }
            out.push(')');
        }
    }

    /// Indented multi-line rendering for logs and snapshots.
    pub fn tree_string(&self) -> String {
        let mut out = String::new();
        self.write_tree_string(self.root, 0, &mut out);
        out
    }

    fn write_tree_string(&self, id: NodeId, indent: usize, out: &mut String) {
        for _ in 0..indent {
            out.push_str("  ");
        }
        let _ = writeln!(out, "{}", self.nodes[id.0].value);
        for &child in &self.nodes[id.0].children {
            self.write_tree_string(child, indent + 1, out);
        }
    }
}

impl<T: Display> fmt::Display for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tree_string())
    }
}
