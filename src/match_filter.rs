//! Type-balance pre-filter over coverings.
//!
//! Before any tree is built, a covering's logical forms are expanded into
//! their functions and the per-type input/output tallies are balanced. A
//! covering that cannot possibly assemble into a well-typed tree is dropped
//! here, which keeps the rewrite search off hopeless seeds.

use crate::candidates::LexiconMatchTree;
use crate::error::Result;
use crate::type_rules::{expand_functions, TypeTable, EVENT_TYPE, NULL_TYPE, TRUE_FALSE_TYPE};
use std::collections::BTreeMap;

/// Whether the covering's function types cannot balance into any tree.
///
/// Per type, inputs (`NULL` inputs excluded) and outputs are tallied. The
/// covering is rejected when:
/// - more than one type is produced but never consumed (a tree has exactly
///   one unconsumed root output),
/// - any type is consumed but never produced, where the tolerated count for
///   `Event` is the number of Event-consuming functions that do not emit
///   `TrueFalse` (Event consumers need not re-emit an Event),
/// - any type other than `TrueFalse` has unequal input and output counts.
pub fn has_type_mismatch(tree: &LexiconMatchTree<'_>, table: &TypeTable) -> Result<bool> {
    let mut functions: Vec<&str> = Vec::new();
    for lexicon_match in tree.matches() {
        functions.extend(expand_functions(lexicon_match.entry().logical_form())?);
    }

    let mut lhs: BTreeMap<&str, usize> = BTreeMap::new();
    let mut rhs: BTreeMap<&str, usize> = BTreeMap::new();
    let mut event_input_non_true_false_output = 0usize;
    for function in &functions {
        let types = table.types(function)?;
        if types.input == EVENT_TYPE && types.output != TRUE_FALSE_TYPE {
            event_input_non_true_false_output += 1;
        }
        // Leaf functions take NULL arguments and consume nothing.
        if types.input != NULL_TYPE {
            *lhs.entry(types.input.as_str()).or_insert(0) += 1;
        }
        *rhs.entry(types.output.as_str()).or_insert(0) += 1;
    }
    tracing::trace!(?lhs, ?rhs, "covering type tallies");

    let mut missing_input = 0usize;
    let mut missing_output = 0usize;
    let mut count_mismatch = false;
    let mut ops: Vec<&str> = lhs.keys().chain(rhs.keys()).copied().collect();
    ops.sort_unstable();
    ops.dedup();
    for op in ops {
        match (lhs.get(op), rhs.get(op)) {
            (None, Some(&produced)) => missing_input += produced,
            (Some(&consumed), None) => {
                missing_output += if op == EVENT_TYPE {
                    event_input_non_true_false_output
                } else {
                    consumed
                };
            }
            (Some(&consumed), Some(&produced)) => {
                if consumed != produced && op != TRUE_FALSE_TYPE {
                    count_mismatch = true;
                }
            }
            (None, None) => {}
        }
    }

    if missing_input > 1 {
        tracing::debug!(missing_input, "covering rejected: unconsumed outputs");
        return Ok(true);
    }
    if missing_output > 0 {
        tracing::debug!(missing_output, "covering rejected: unproduced inputs");
        return Ok(true);
    }
    if count_mismatch {
        tracing::debug!("covering rejected: input/output count mismatch");
        return Ok(true);
    }
    Ok(false)
}
