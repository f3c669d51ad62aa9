//! Rule-based semantic parsing of clinical questions.
//!
//! `lexform` converts a dependency-parsed sentence plus a lexicon into a set
//! of candidate *logical-form trees*: nested predicate expressions such as
//! `is_problem(lambda x.has_concept(x))`. The caller supplies the sentence,
//! its dependency parse, and concept annotations; an external reranker picks
//! one tree from the candidate set.
//!
//! ## Pipeline
//!
//! 1. **Matching** — lexicon patterns (small labeled dependency sub-graphs)
//!    are aligned against the sentence ([`matching`]).
//! 2. **Covering assembly** — token-disjoint, fully-covering subsets of the
//!    matches are enumerated ([`candidates`]).
//! 3. **Seed construction** — each surviving covering is aligned to the
//!    dependency tree, built into an initial tree, and contracted
//!    ([`initial_tree`], [`prune`]).
//! 4. **Rewrite search** — bounded breadth-first exploration of local tree
//!    transformations, with every result type-checked ([`rewrite`],
//!    [`tree_filter`]).
//!
//! ## Usage
//!
//! ```ignore
//! use lexform::{load_lexicon, LogicalTreeGenerator, TypeTable};
//!
//! let entries = load_lexicon(lexicon_path)?;
//! let table = TypeTable::load(type_rules_path)?;
//! let generator = LogicalTreeGenerator::new(entries, table, true)?;
//! let candidates = generator.generate(&sentence, &dependencies)?;
//! for tree in &candidates {
//!     println!("{}", tree.flatten());
//! }
//! ```

pub mod candidates;
pub mod error;
pub mod generator;
pub mod initial_tree;
pub mod lexicon;
pub mod logical_tree;
pub mod match_filter;
pub mod matching;
pub mod prune;
pub mod rewrite;
pub mod sentence;
pub mod span_index;
pub mod tree;
pub mod tree_filter;
pub mod type_rules;

pub use candidates::{identify_candidates, LexiconMatchTree};
pub use error::{Error, Result};
pub use generator::LogicalTreeGenerator;
pub use lexicon::{load_lexicon, parse_lexicon, LexiconEntry, PatternEdge, NULL_FORM};
pub use logical_tree::LogicalTree;
pub use matching::{enumerate_matches, find_matches, LexiconMatch};
pub use sentence::{Concept, DependencyTree, Sentence, Span, Token};
pub use span_index::SpanIndex;
pub use tree::{NodeId, Tree};
pub use type_rules::{FunctionTypes, TypeTable};

#[cfg(test)]
mod tests {
    mod coverage;
    mod pipeline;
    mod rewrite_props;
}
