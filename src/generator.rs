//! End-to-end candidate generation for one sentence.
//!
//! The generator owns the lexicon and the type table, validated against each
//! other at construction. `generate` runs the per-sentence pipeline: match
//! enumeration, covering assembly, the covering type pre-filter, seed
//! construction, null pruning, the rewrite search, the final per-tree
//! checks, and a last dedup of the surviving candidates by their flattened
//! form.

use crate::candidates::identify_candidates;
use crate::error::Result;
use crate::initial_tree::create_initial_tree;
use crate::lexicon::LexiconEntry;
use crate::logical_tree::LogicalTree;
use crate::match_filter;
use crate::matching::enumerate_matches;
use crate::prune::prune_null;
use crate::rewrite::run_generation_rules;
use crate::sentence::{DependencyTree, Sentence};
use crate::span_index::SpanIndex;
use crate::tree_filter;
use crate::type_rules::{expand_functions, TypeTable};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Rule-based semantic parser: lexicon + type table.
pub struct LogicalTreeGenerator {
    entries: Vec<Arc<LexiconEntry>>,
    type_table: TypeTable,
    allow_concept_tokens_matching: bool,
}

impl LogicalTreeGenerator {
    /// Build a generator, validating the configuration: every function any
    /// lexicon logical form expands to must have a type rule. Duplicate
    /// patterns across lexicon lines are tolerated with a warning.
    pub fn new(
        entries: Vec<LexiconEntry>,
        type_table: TypeTable,
        allow_concept_tokens_matching: bool,
    ) -> Result<Self> {
        let mut patterns: HashMap<&str, i32> = HashMap::new();
        for entry in &entries {
            for function in expand_functions(entry.logical_form())? {
                type_table.types(function)?;
            }
            if let Some(previous) = patterns.insert(entry.pattern(), entry.line()) {
                if previous != entry.line() {
                    tracing::warn!(
                        pattern = entry.pattern(),
                        first_line = previous,
                        second_line = entry.line(),
                        "duplicate lexicon pattern"
                    );
                }
            }
        }
        Ok(LogicalTreeGenerator {
            entries: entries.into_iter().map(Arc::new).collect(),
            type_table,
            allow_concept_tokens_matching,
        })
    }

    /// The lexicon entries this generator matches with.
    pub fn entries(&self) -> &[Arc<LexiconEntry>] {
        &self.entries
    }

    /// Produce every distinct valid logical tree for the sentence.
    ///
    /// An empty result is the expected outcome for a sentence the lexicon
    /// does not cover; errors are configuration or internal-consistency
    /// failures only.
    pub fn generate(
        &self,
        sentence: &Sentence,
        dependencies: &DependencyTree,
    ) -> Result<Vec<LogicalTree>> {
        tracing::debug!(sentence = %sentence.text(), "generating logical trees");
        let index = SpanIndex::build(sentence);
        let matches = enumerate_matches(
            &self.entries,
            sentence,
            &index,
            dependencies,
            self.allow_concept_tokens_matching,
        );
        let coverings = identify_candidates(sentence, dependencies, &matches)?;

        let mut candidates = Vec::new();
        let mut flattened_seen = HashSet::new();
        for covering in coverings {
            if match_filter::has_type_mismatch(&covering, &self.type_table)? {
                continue;
            }
            let seed = match create_initial_tree(&covering)? {
                Some(seed) => seed,
                None => continue,
            };
            let pruned = match prune_null(&seed) {
                Some(pruned) => pruned,
                None => continue,
            };

            let provenance = covering.into_matches();
            for tree in run_generation_rules(&pruned) {
                let logical = LogicalTree::new(&tree, provenance.clone())?;
                if tree_filter::has_type_mismatch(&logical, &self.type_table)? {
                    continue;
                }
                if tree_filter::has_invalid_and(&logical) {
                    continue;
                }
                if flattened_seen.insert(logical.flatten()) {
                    candidates.push(logical);
                }
            }
        }

        tracing::debug!(
            sentence = %sentence.text(),
            candidates = candidates.len(),
            "generation finished"
        );
        Ok(candidates)
    }
}
