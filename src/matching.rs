//! Aligning lexicon entries against a dependency-parsed sentence.
//!
//! Every pattern node of an entry is looked up in the sentence's
//! [`SpanIndex`]; the Cartesian product of the per-node candidate spans is
//! then filtered by the pattern edges, each of which must hold as a
//! depth-1 downward dependency path between some token pair of the bound
//! spans. Tokens no accepted match covers are backfilled with synthetic
//! single-token `null` matches so that full coverings always exist.

use crate::lexicon::LexiconEntry;
use crate::sentence::{DependencyTree, Sentence, Span, DOWN_DELIM};
use crate::span_index::SpanIndex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A binding of one lexicon entry to a set of sentence tokens.
#[derive(Debug, Clone, Serialize)]
pub struct LexiconMatch {
    entry: Arc<LexiconEntry>,
    tokens: Vec<usize>,
}

impl LexiconMatch {
    /// Create a match; token offsets are kept sorted.
    pub fn new(entry: Arc<LexiconEntry>, mut tokens: Vec<usize>) -> Self {
        tokens.sort_unstable();
        LexiconMatch { entry, tokens }
    }

    /// The matched lexicon entry.
    pub fn entry(&self) -> &LexiconEntry {
        &self.entry
    }

    /// The sorted token offsets this match covers.
    pub fn tokens(&self) -> &[usize] {
        &self.tokens
    }
}

impl fmt::Display for LexiconMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:?}", self.entry, self.tokens)
    }
}

/// Whether `relation` holds as a direct dependency between any token of
/// `head` and any token of `tail`.
fn relation_holds(dep: &DependencyTree, head: Span, tail: Span, relation: &str) -> bool {
    let target = format!("{}{}", DOWN_DELIM, relation);
    for from in head.offsets() {
        for to in tail.offsets() {
            if dep.path(from, to, 1).as_deref() == Some(target.as_str()) {
                return true;
            }
        }
    }
    false
}

/// Every alignment of `entry` against the sentence, or nothing if some
/// pattern node has no candidate span at all.
pub fn find_matches(
    entry: &Arc<LexiconEntry>,
    index: &SpanIndex,
    dep: &DependencyTree,
) -> Vec<LexiconMatch> {
    tracing::trace!(pattern = entry.pattern(), "matching lexicon entry");
    let mut candidates: Vec<&[Span]> = Vec::with_capacity(entry.nodes().len());
    for node in entry.nodes() {
        match index.get(node) {
            Some(spans) => candidates.push(spans),
            None => return Vec::new(),
        }
    }

    let mut matches = Vec::new();
    for combination in combinations(&candidates) {
        let binding = |label: &str| -> Option<Span> {
            entry
                .nodes()
                .iter()
                .position(|node| node == label)
                .map(|position| combination[position])
        };

        let satisfied = entry.edges().iter().all(|edge| {
            match (binding(&edge.head), binding(&edge.tail)) {
                (Some(head), Some(tail)) => relation_holds(dep, head, tail, &edge.relation),
                _ => false,
            }
        });
        if !satisfied {
            continue;
        }

        let mut tokens = Vec::new();
        for span in &combination {
            tokens.extend(span.offsets());
        }
        let lexicon_match = LexiconMatch::new(Arc::clone(entry), tokens);
        tracing::debug!(%lexicon_match, "accepted lexicon match");
        matches.push(lexicon_match);
    }
    matches
}

/// Odometer over the per-node candidate lists (last node varies fastest).
fn combinations(candidates: &[&[Span]]) -> Vec<Vec<Span>> {
    let mut out = Vec::new();
    if candidates.iter().any(|spans| spans.is_empty()) {
        return out;
    }
    let mut cursor = vec![0usize; candidates.len()];
    loop {
        out.push(
            cursor
                .iter()
                .zip(candidates)
                .map(|(&index, spans)| spans[index])
                .collect(),
        );
        let mut position = candidates.len();
        loop {
            if position == 0 {
                return out;
            }
            position -= 1;
            cursor[position] += 1;
            if cursor[position] < candidates[position].len() {
                break;
            }
            cursor[position] = 0;
        }
    }
}

/// Match every entry against the sentence, then backfill uncovered tokens
/// with synthetic `null` matches (in token order, skipping single-character
/// punctuation).
///
/// With `allow_concept_tokens_matching`, only tokens already covered by a
/// non-concept match are exempt from defaulting, so a covering may choose a
/// `null` reading over a concept reading; without it, concept-spanning
/// tokens are never defaulted.
pub fn enumerate_matches(
    entries: &[Arc<LexiconEntry>],
    sentence: &Sentence,
    index: &SpanIndex,
    dep: &DependencyTree,
    allow_concept_tokens_matching: bool,
) -> Vec<LexiconMatch> {
    let mut matches = Vec::new();
    for entry in entries {
        matches.extend(find_matches(entry, index, dep));
    }

    let mut exempt: HashSet<usize> = HashSet::new();
    if allow_concept_tokens_matching {
        for lexicon_match in &matches {
            if lexicon_match.entry().logical_form() != "lambda.concept" {
                exempt.extend(lexicon_match.tokens().iter().copied());
            }
        }
    } else {
        exempt.extend(index.concept_tokens().iter().copied());
    }

    let mut synthetic_line = 0i32;
    for token in sentence.tokens() {
        if exempt.contains(&token.offset()) {
            continue;
        }
        tracing::debug!(token = token.text(), offset = token.offset(), "token not covered by the lexicon");
        let mut chars = token.text().chars();
        if let (Some(first), None) = (chars.next(), chars.next()) {
            if first.is_ascii_punctuation() {
                tracing::debug!(token = token.text(), "skipping punctuation");
                continue;
            }
        }
        synthetic_line -= 1;
        let entry = LexiconEntry::null_for_token(synthetic_line, token.text());
        matches.push(LexiconMatch::new(Arc::new(entry), vec![token.offset()]));
    }

    matches
}
