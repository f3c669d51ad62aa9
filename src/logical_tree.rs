//! The produced candidate: a logical-form tree plus its provenance matches.
//!
//! Construction instantiates the placeholder variables the builder emitted
//! (`_1`/`_2`/`_3` become `x`/`y`/`z`) and strips argument-list suffixes
//! from labels of nodes with children: arity markers only mean something on
//! leaves. Flattening renders the nested predicate-expression string the
//! downstream reranker and exporter consume.

use crate::error::{Error, Result};
use crate::matching::LexiconMatch;
use crate::tree::{NodeId, Tree};
use serde::Serialize;
use std::collections::HashMap;

/// A candidate semantic parse of one sentence.
#[derive(Debug, Clone, Serialize)]
pub struct LogicalTree {
    root: Tree<String>,
    matches: Vec<LexiconMatch>,
}

impl LogicalTree {
    /// Wrap a generated tree, instantiating its variables. `matches` is the
    /// covering the tree was derived from, kept for provenance.
    pub fn new(raw: &Tree<String>, matches: Vec<LexiconMatch>) -> Result<Self> {
        Ok(LogicalTree {
            root: instantiate_vars(raw)?,
            matches,
        })
    }

    /// The instantiated tree.
    pub fn root(&self) -> &Tree<String> {
        &self.root
    }

    /// The matches of the covering this tree came from.
    pub fn matches(&self) -> &[LexiconMatch] {
        &self.matches
    }

    /// The nested predicate-expression form, e.g.
    /// `is_problem(lambda x.has_concept(x))`.
    pub fn flatten(&self) -> String {
        flatten_node(&self.root, self.root.root(), false)
    }

    /// Flatten with the `has_*` predicate family collapsed onto
    /// `has_concept` and extra arguments trimmed.
    pub fn flatten_simple(&self) -> String {
        flatten_node(&self.root, self.root.root(), true)
    }
}

const PLACEHOLDERS: [&str; 3] = ["_1", "_2", "_3"];
const LETTERS: [&str; 3] = ["x", "y", "z"];

fn instantiate_vars(raw: &Tree<String>) -> Result<Tree<String>> {
    let mut tree = raw.compact();
    let mut assigned: HashMap<&'static str, &'static str> = HashMap::new();
    for node in tree.all_nodes() {
        let mut label = tree.value(node).clone();
        for &placeholder in &PLACEHOLDERS {
            if !label.contains(placeholder) {
                continue;
            }
            let letter = match assigned.get(placeholder) {
                Some(&letter) => letter,
                None => {
                    let mut unused = None;
                    for &candidate in &LETTERS {
                        if !assigned.values().any(|&used| used == candidate) {
                            unused = Some(candidate);
                            break;
                        }
                    }
                    let letter = unused.ok_or(Error::TooManyVariables)?;
                    assigned.insert(placeholder, letter);
                    letter
                }
            };
            label = label.replace(placeholder, letter);
        }
        if has_unassignable_variable(&label) {
            return Err(Error::TooManyVariables);
        }
        if !tree.is_leaf(node) {
            label = label.replace("(x)", "").replace("(y)", "").replace("(z)", "");
        }
        tree.set_value(node, label);
    }
    Ok(tree)
}

/// A `_N` placeholder beyond the three instantiable variables.
fn has_unassignable_variable(label: &str) -> bool {
    let bytes = label.as_bytes();
    bytes.windows(2).any(|pair| {
        pair[0] == b'_' && pair[1].is_ascii_digit()
    })
}

fn flatten_node(tree: &Tree<String>, node: NodeId, simple: bool) -> String {
    let op = if simple {
        simplify_label(tree.value(node))
    } else {
        tree.value(node).clone()
    };

    if tree.is_leaf(node) {
        return op;
    }

    let children: Vec<String> = tree
        .children(node)
        .iter()
        .map(|&child| flatten_node(tree, child, simple))
        .collect();

    if op.starts_with("lambda ") {
        format!("{}.{}", op, children.join(" ^ "))
    } else if op == "and" {
        children.join(" and ")
    } else {
        format!("{}({})", op, children.join(", "))
    }
}

/// Collapse the `has_*` family onto `has_concept` and trim arguments past
/// the variable.
fn simplify_label(label: &str) -> String {
    let mut item = label.to_string();
    for predicate in &[
        "has_device",
        "has_doctor",
        "has_event",
        "has_finding",
        "has_function",
        "has_problem",
        "has_substance",
        "has_test",
        "has_treatment",
        "has_attribute",
    ] {
        item = item.replace(predicate, "has_concept");
    }
    for variable in &["x", "y", "z"] {
        let open = format!("({}, ", variable);
        if let Some(index) = item.find(&open) {
            item.truncate(index);
            if item.starts_with("has_concept") {
                item.push('(');
                item.push_str(variable);
                item.push(')');
            }
        }
    }
    item
}
