//! Seed logical tree construction from a covering.
//!
//! Each match is aligned to the shallowest dependency node owning one of its
//! tokens; the stripped dependency tree is then walked top-down, emitting a
//! logical node per aligned match and splicing the children of unaligned
//! nodes straight through. `lambda.*` templates emit a two-node
//! wrapper/predicate pair with a fresh variable; a fixed set of unary-state
//! predicates is always parametrized with `_1`.

use crate::candidates::LexiconMatchTree;
use crate::error::{Error, Result};
use crate::matching::LexiconMatch;
use crate::sentence::Span;
use crate::tree::{NodeId, Tree};
use crate::type_rules::lambda_predicate;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Predicates that always take the first variable as their sole argument.
static UNARY_STATE_PREDICATES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();
    for predicate in &[
        "is_large",
        "is_problem",
        "is_healed",
        "is_serious",
        "is_positive",
        "is_significant",
        "is_normal",
    ] {
        set.insert(*predicate);
    }
    set
});

/// Build the initial logical tree for a covering.
///
/// `Ok(None)` means the covering is skipped: two of its matches aligned to
/// the same dependency node, so no single consistent seed exists. When the
/// walk does not produce exactly one root, a bare synthetic `has_concept`
/// root stands in (a fallback heuristic, not a correctness guarantee).
pub fn create_initial_tree(covering: &LexiconMatchTree<'_>) -> Result<Option<Tree<String>>> {
    let (dep_tree, owners) = covering.dependencies().typeless_tree();
    tracing::trace!(tree = %dep_tree.tree_string(), "typeless dependency tree");

    let mut alignment: HashMap<NodeId, &LexiconMatch> = HashMap::new();
    for lexicon_match in covering.matches() {
        let mut shallowest: Option<NodeId> = None;
        for &token in lexicon_match.tokens() {
            let node = owners[token];
            match shallowest {
                None => shallowest = Some(node),
                Some(current) => {
                    let depth = dep_tree.depth(node);
                    let current_depth = dep_tree.depth(current);
                    if depth < current_depth {
                        shallowest = Some(node);
                    } else if depth == current_depth && node != current {
                        tracing::debug!(%lexicon_match, "alignment nodes at equal depth");
                    }
                }
            }
        }
        let node = match shallowest {
            Some(node) => node,
            None => continue,
        };
        if alignment.insert(node, lexicon_match).is_some() {
            tracing::warn!(
                %lexicon_match,
                "two matches aligned to the same dependency node; skipping covering"
            );
            return Ok(None);
        }
    }

    let mut tree = Tree::new(String::new());
    let mut lambda_count = 0u32;
    let roots = emit_nodes(
        &dep_tree,
        dep_tree.root(),
        &alignment,
        &mut tree,
        &mut lambda_count,
    )?;

    let seed = if roots.len() == 1 {
        tree.set_root(roots[0]);
        tree.compact()
    } else {
        tracing::debug!(
            roots = roots.len(),
            "no single root emerged; falling back to a synthetic has_concept root"
        );
        Tree::new("has_concept".to_string())
    };
    tracing::trace!(tree = %seed.tree_string(), "initial tree");
    Ok(Some(seed))
}

/// Emit the logical nodes for the dependency subtree at `dep_node`, detached
/// in `out`. Aligned nodes emit one node (or a lambda wrapper pair) with the
/// children attached under the bottom; unaligned nodes splice their
/// children's nodes through.
fn emit_nodes(
    dep_tree: &Tree<Span>,
    dep_node: NodeId,
    alignment: &HashMap<NodeId, &LexiconMatch>,
    out: &mut Tree<String>,
    lambda_count: &mut u32,
) -> Result<Vec<NodeId>> {
    let lexicon_match = match alignment.get(&dep_node) {
        Some(lexicon_match) => *lexicon_match,
        None => {
            let mut spliced = Vec::new();
            for &child in dep_tree.children(dep_node) {
                spliced.extend(emit_nodes(dep_tree, child, alignment, out, lambda_count)?);
            }
            return Ok(spliced);
        }
    };

    let form = lexicon_match.entry().logical_form();
    let (top, bottom) = if form.starts_with("lambda.") {
        *lambda_count += 1;
        let count = *lambda_count;
        let predicate = lambda_predicate(form)
            .ok_or_else(|| Error::UnknownLogicalForm(form.to_string()))?;
        let top = out.new_node(format!("lambda _{}", count));
        let bottom = out.new_node(format!("{}(_{})", predicate, count));
        out.attach(top, bottom);
        (top, bottom)
    } else if UNARY_STATE_PREDICATES.contains(form) {
        let node = out.new_node(format!("{}(_1)", form));
        (node, node)
    } else {
        let node = out.new_node(form.to_string());
        (node, node)
    };

    for &child in dep_tree.children(dep_node) {
        for emitted in emit_nodes(dep_tree, child, alignment, out, lambda_count)? {
            out.attach(bottom, emitted);
        }
    }
    Ok(vec![top])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::LexiconEntry;
    use crate::sentence::{DependencyTree, Sentence};
    use std::sync::Arc;

    fn lexicon_match(pattern: &str, form: &str, line: i32, tokens: Vec<usize>) -> LexiconMatch {
        let entry = Arc::new(LexiconEntry::new("t", pattern, form, line).unwrap());
        LexiconMatch::new(entry, tokens)
    }

    fn fixture() -> (Sentence, DependencyTree) {
        // "Is the patient diabetic ?" headed at "diabetic"
        let sentence = Sentence::from_words(vec!["Is", "the", "patient", "diabetic", "?"]);
        let dep = DependencyTree::new(
            5,
            vec![
                (0, 3, "cop"),
                (1, 2, "det"),
                (2, 3, "nsubj"),
                (4, 3, "punct"),
            ],
        );
        (sentence, dep)
    }

    #[test]
    fn aligned_root_with_lambda_child() {
        let (sentence, dep) = fixture();
        let covering = LexiconMatchTree::new(
            &sentence,
            &dep,
            vec![
                lexicon_match("diabetic", "is_problem", 1, vec![3]),
                lexicon_match("patient", "lambda.concept", 2, vec![2]),
                lexicon_match("is", "null", -1, vec![0]),
                lexicon_match("the", "null", -2, vec![1]),
            ],
        );
        let tree = create_initial_tree(&covering).unwrap().unwrap();
        insta::assert_snapshot!(tree.tree_string(), @r###"
        is_problem(_1)
          null
          lambda _1
            has_concept(_1)
              null
        "###);
    }

    #[test]
    fn joint_match_aligns_to_shallowest_token() {
        let (sentence, dep) = fixture();
        // The 2-token match covers offsets {2, 3}; 3 is the dependency root,
        // so the match aligns there and "patient" contributes nothing of its
        // own.
        let covering = LexiconMatchTree::new(
            &sentence,
            &dep,
            vec![
                lexicon_match("diabetic(nsubj:patient)", "is_problem", 1, vec![2, 3]),
                lexicon_match("is", "null", -1, vec![0]),
                lexicon_match("the", "null", -2, vec![1]),
            ],
        );
        let tree = create_initial_tree(&covering).unwrap().unwrap();
        insta::assert_snapshot!(tree.tree_string(), @r###"
        is_problem(_1)
          null
          null
        "###);
    }

    #[test]
    fn lambda_variables_are_numbered_in_emission_order() {
        let sentence = Sentence::from_words(vec!["pain", "and", "fever"]);
        let dep = DependencyTree::new(3, vec![(1, 0, "cc"), (2, 0, "conj")]);
        let covering = LexiconMatchTree::new(
            &sentence,
            &dep,
            vec![
                lexicon_match("pain", "lambda.concept", 1, vec![0]),
                lexicon_match("fever", "lambda.concept", 1, vec![2]),
                lexicon_match("and", "null", -1, vec![1]),
            ],
        );
        let tree = create_initial_tree(&covering).unwrap().unwrap();
        insta::assert_snapshot!(tree.tree_string(), @r###"
        lambda _1
          has_concept(_1)
            null
            lambda _2
              has_concept(_2)
        "###);
    }

    #[test]
    fn unaligned_root_falls_back_to_synthetic_root() {
        let sentence = Sentence::from_words(vec!["show", "pain", "fever"]);
        let dep = DependencyTree::new(3, vec![(1, 0, "dobj"), (2, 0, "dobj")]);
        // Only the two children align; the walk yields two roots.
        let covering = LexiconMatchTree::new(
            &sentence,
            &dep,
            vec![
                lexicon_match("pain", "lambda.concept", 1, vec![1]),
                lexicon_match("fever", "lambda.concept", 1, vec![2]),
            ],
        );
        let tree = create_initial_tree(&covering).unwrap().unwrap();
        assert_eq!(tree.canonical(), "has_concept");
        assert_eq!(tree.size(), 1);
    }

    #[test]
    fn alignment_collision_skips_the_covering() {
        let sentence = Sentence::from_words(vec!["chest", "pain"]);
        let dep = DependencyTree::new(2, vec![(0, 1, "compound")]);
        // Both matches own token 1 (the root), forcing a collision.
        let covering = LexiconMatchTree::new(
            &sentence,
            &dep,
            vec![
                lexicon_match("pain", "lambda.concept", 1, vec![1]),
                lexicon_match("chest(compound:pain)", "has_problem", 2, vec![0, 1]),
            ],
        );
        assert!(create_initial_tree(&covering).unwrap().is_none());
    }

    #[test]
    fn unary_state_predicates_take_the_first_variable() {
        let sentence = Sentence::from_words(vec!["serious"]);
        let dep = DependencyTree::new(1, vec![]);
        let covering = LexiconMatchTree::new(
            &sentence,
            &dep,
            vec![lexicon_match("serious", "is_serious", 1, vec![0])],
        );
        let tree = create_initial_tree(&covering).unwrap().unwrap();
        assert_eq!(tree.canonical(), "is_serious(_1)");
    }
}
