//! Final per-tree validation: type compatibility and AND shape.

use crate::error::Result;
use crate::logical_tree::LogicalTree;
use crate::type_rules::{TypeTable, EVENT_TYPE, NULL_TYPE};

/// Whether any parent/child pair of the tree is type-incompatible.
///
/// Every node's function must be known to the table (unknown functions are a
/// fatal configuration error). A leaf must take `NULL` or `Event` input;
/// only `and` nodes may have more than one child; all children of a node
/// must share one output type; and the first child's output must equal the
/// parent's input (for `and` nodes the first child dictates the type).
pub fn has_type_mismatch(tree: &LogicalTree, table: &TypeTable) -> Result<bool> {
    let root = tree.root();
    for node in root.all_nodes() {
        let op = root.value(node);
        let types = table.types(op)?;

        if root.is_leaf(node) {
            if types.input != NULL_TYPE && types.input != EVENT_TYPE {
                tracing::debug!(op = %op, "rejected: incompatible leaf input");
                return Ok(true);
            }
            continue;
        }

        let children = root.children(node);
        if children.len() > 1 && op != "and" {
            tracing::debug!(op = %op, "rejected: non-and node with multiple children");
            return Ok(true);
        }

        let mut child_output: Option<&str> = None;
        for &child in children {
            let output = table.types(root.value(child))?.output.as_str();
            match child_output {
                None => child_output = Some(output),
                Some(previous) if previous != output => {
                    tracing::debug!(op = %op, "rejected: children with differing output types");
                    return Ok(true);
                }
                Some(_) => {}
            }
        }

        let first_output = &table.types(root.value(children[0]))?.output;
        if types.input != *first_output {
            tracing::debug!(
                op = %op,
                child = %root.value(children[0]),
                "rejected: parent input does not match child output"
            );
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether the tree violates the AND-shape constraints: an `and` under an
/// `and`, or an `and` directly under a lambda whose first child is not a
/// `has_*` predicate or whose remaining children are out of lexicographic
/// order.
pub fn has_invalid_and(tree: &LogicalTree) -> bool {
    let root = tree.root();
    for node in root.all_nodes() {
        let children = root.children(node);
        if root.value(node) == "and" {
            if children
                .iter()
                .any(|&child| root.value(child) == "and")
            {
                return true;
            }
        }

        if children.len() > 1 && root.value(node) == "and" {
            let under_lambda = root
                .parent(node)
                .map(|parent| root.value(parent).starts_with("lambda"))
                .unwrap_or(false);
            if !under_lambda {
                continue;
            }
            if !root.value(children[0]).starts_with("has_") {
                tracing::debug!(
                    first = %root.value(children[0]),
                    "rejected: and under lambda must lead with a has_* predicate"
                );
                return true;
            }
            let mut previous = "";
            for &child in &children[1..] {
                let label = root.value(child).as_str();
                if label < previous {
                    return true;
                }
                previous = label;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::tree::Tree;

    const RULES: &str = "lambda\tEvent\tEvent\n\
        has_concept\tNULL\tEvent\n\
        is_problem\tEvent\tTrueFalse\n\
        and\tEvent\tEvent\n\
        latest\tEvent\tEvent\n\
        not\tTrueFalse\tTrueFalse\n";

    fn logical(build: impl FnOnce(&mut Tree<String>)) -> LogicalTree {
        let mut tree = Tree::new(String::new());
        build(&mut tree);
        LogicalTree::new(&tree, Vec::new()).unwrap()
    }

    #[test]
    fn well_typed_chain_is_accepted() {
        let table = TypeTable::parse(RULES).unwrap();
        let tree = logical(|tree| {
            tree.set_value(tree.root(), "is_problem(_1)".to_string());
            let lambda = tree.add_child(tree.root(), "lambda _1".to_string());
            tree.add_child(lambda, "has_concept(_1)".to_string());
        });
        assert!(!has_type_mismatch(&tree, &table).unwrap());
        assert!(!has_invalid_and(&tree));
    }

    #[test]
    fn true_false_input_leaf_is_rejected() {
        let table = TypeTable::parse(RULES).unwrap();
        // A leaf must take NULL or Event; not consumes a TrueFalse.
        let tree = logical(|tree| {
            tree.set_value(tree.root(), "not".to_string());
        });
        assert!(has_type_mismatch(&tree, &table).unwrap());
    }

    #[test]
    fn multi_child_non_and_is_rejected() {
        let table = TypeTable::parse(RULES).unwrap();
        let tree = logical(|tree| {
            tree.set_value(tree.root(), "lambda _1".to_string());
            tree.add_child(tree.root(), "has_concept(_1)".to_string());
            tree.add_child(tree.root(), "latest".to_string());
        });
        assert!(has_type_mismatch(&tree, &table).unwrap());
    }

    #[test]
    fn parent_child_type_mismatch_is_rejected() {
        let table = TypeTable::parse(RULES).unwrap();
        // latest consumes Event; is_problem outputs TrueFalse.
        let tree = logical(|tree| {
            tree.set_value(tree.root(), "latest".to_string());
            let problem = tree.add_child(tree.root(), "is_problem(_1)".to_string());
            let lambda = tree.add_child(problem, "lambda _1".to_string());
            tree.add_child(lambda, "has_concept(_1)".to_string());
        });
        assert!(has_type_mismatch(&tree, &table).unwrap());
    }

    #[test]
    fn unknown_function_is_fatal() {
        let table = TypeTable::parse(RULES).unwrap();
        let tree = logical(|tree| {
            tree.set_value(tree.root(), "mystery".to_string());
        });
        assert!(matches!(
            has_type_mismatch(&tree, &table),
            Err(Error::UnknownFunction(_))
        ));
    }

    #[test]
    fn and_under_and_is_invalid() {
        let tree = logical(|tree| {
            tree.set_value(tree.root(), "and".to_string());
            let inner = tree.add_child(tree.root(), "and".to_string());
            tree.add_child(inner, "has_concept(_1)".to_string());
        });
        assert!(has_invalid_and(&tree));
    }

    #[test]
    fn and_under_lambda_must_lead_with_has() {
        let tree = logical(|tree| {
            tree.set_value(tree.root(), "lambda _1".to_string());
            let and = tree.add_child(tree.root(), "and".to_string());
            tree.add_child(and, "is_problem(_1)".to_string());
            tree.add_child(and, "has_concept(_1)".to_string());
        });
        assert!(has_invalid_and(&tree));
    }

    #[test]
    fn and_children_must_be_sorted() {
        let sorted = logical(|tree| {
            tree.set_value(tree.root(), "lambda _1".to_string());
            let and = tree.add_child(tree.root(), "and".to_string());
            tree.add_child(and, "has_concept(_1)".to_string());
            tree.add_child(and, "is_problem(_1)".to_string());
            tree.add_child(and, "latest".to_string());
        });
        assert!(!has_invalid_and(&sorted));

        let unsorted = logical(|tree| {
            tree.set_value(tree.root(), "lambda _1".to_string());
            let and = tree.add_child(tree.root(), "and".to_string());
            tree.add_child(and, "has_concept(_1)".to_string());
            tree.add_child(and, "latest".to_string());
            tree.add_child(and, "is_problem(_1)".to_string());
        });
        assert!(has_invalid_and(&unsorted));
    }

    #[test]
    fn and_not_under_lambda_is_tolerated() {
        let tree = logical(|tree| {
            tree.set_value(tree.root(), "and".to_string());
            tree.add_child(tree.root(), "latest".to_string());
            tree.add_child(tree.root(), "has_concept(_1)".to_string());
        });
        assert!(!has_invalid_and(&tree));
    }
}
