//! Assembling coverings: disjoint, fully-covering subsets of the match list.
//!
//! Subsets are enumerated as a growing bitmask over the match list, rejecting
//! a subset as soon as two of its matches claim the same token and accepting
//! it when its distinct tokens equal the union of all matched tokens. The
//! enumeration is exponential in the number of matches, so a warning is
//! logged when the list is large.

use crate::error::{Error, Result};
use crate::matching::LexiconMatch;
use crate::sentence::{DependencyTree, Sentence};

/// Match-list size at which the subset enumeration gets expensive.
const MATCH_COUNT_WARNING: usize = 20;

/// One covering of the sentence: a token-disjoint set of matches whose union
/// is every matched token.
#[derive(Debug, Clone)]
pub struct LexiconMatchTree<'a> {
    sentence: &'a Sentence,
    dependencies: &'a DependencyTree,
    matches: Vec<LexiconMatch>,
}

impl<'a> LexiconMatchTree<'a> {
    pub fn new(
        sentence: &'a Sentence,
        dependencies: &'a DependencyTree,
        matches: Vec<LexiconMatch>,
    ) -> Self {
        LexiconMatchTree {
            sentence,
            dependencies,
            matches,
        }
    }

    pub fn sentence(&self) -> &Sentence {
        self.sentence
    }

    pub fn dependencies(&self) -> &DependencyTree {
        self.dependencies
    }

    pub fn matches(&self) -> &[LexiconMatch] {
        &self.matches
    }

    /// Consume the covering, yielding its matches.
    pub fn into_matches(self) -> Vec<LexiconMatch> {
        self.matches
    }

    /// Verify the covering invariant: every sentence token (excluding a
    /// trailing `?` or `.`) is claimed by exactly one match.
    pub fn check_fully_matched(&self) -> Result<()> {
        let mut claims = vec![0usize; self.sentence.len()];
        for lexicon_match in &self.matches {
            for &token in lexicon_match.tokens() {
                claims[token] += 1;
                if claims[token] > 1 {
                    return Err(Error::TokenCollision { token });
                }
            }
        }

        let mut end = self.sentence.len();
        if let Some(last) = self.sentence.last_token() {
            if last.text() == "?" || last.text() == "." {
                end -= 1;
            }
        }
        let uncovered: Vec<usize> = (0..end)
            .filter(|&offset| {
                claims[offset] == 0 && !is_skippable_punctuation(self.sentence.token_text(offset))
            })
            .collect();
        if !uncovered.is_empty() {
            return Err(Error::IncompleteCovering(uncovered));
        }
        Ok(())
    }

    /// Sorted summary of the lexicon rules this covering used (synthetic
    /// default-null matches excluded), for logging and inspection.
    pub fn matched_rules(&self) -> Vec<String> {
        let mut rules: Vec<String> = self
            .matches
            .iter()
            .filter(|lexicon_match| lexicon_match.entry().line() > 0)
            .map(|lexicon_match| {
                format!(
                    "{}: {}",
                    lexicon_match.entry().line(),
                    lexicon_match.entry()
                )
            })
            .collect();
        rules.sort();
        rules
    }
}

fn is_skippable_punctuation(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(first), None) => first.is_ascii_punctuation(),
        _ => false,
    }
}

/// Enumerate every covering of the matched tokens.
///
/// Each accepted subset is re-checked against the covering invariant before
/// it is returned; a violation there is an assembler bug, not a sentence
/// failure.
pub fn identify_candidates<'a>(
    sentence: &'a Sentence,
    dependencies: &'a DependencyTree,
    matches: &[LexiconMatch],
) -> Result<Vec<LexiconMatchTree<'a>>> {
    let count = matches.len();
    if count >= MATCH_COUNT_WARNING {
        tracing::warn!(
            matches = count,
            "large match list; covering enumeration is exponential"
        );
    }
    if count == 0 || count >= 128 {
        return Ok(Vec::new());
    }

    let mut all_tokens = vec![false; sentence.len()];
    for lexicon_match in matches {
        for &token in lexicon_match.tokens() {
            all_tokens[token] = true;
        }
    }
    let total: usize = all_tokens.iter().filter(|&&covered| covered).count();

    let mut candidates = Vec::new();
    let mut mask: u128 = 1;
    let last: u128 = 1u128 << count;
    while mask < last {
        let mut claimed = vec![false; sentence.len()];
        let mut distinct = 0usize;
        let mut collision = false;
        for (index, lexicon_match) in matches.iter().enumerate() {
            if mask & (1u128 << index) == 0 {
                continue;
            }
            for &token in lexicon_match.tokens() {
                if claimed[token] {
                    collision = true;
                    break;
                }
                claimed[token] = true;
                distinct += 1;
            }
            if collision {
                break;
            }
        }
        if !collision && distinct == total {
            let selected: Vec<LexiconMatch> = matches
                .iter()
                .enumerate()
                .filter(|(index, _)| mask & (1u128 << index) != 0)
                .map(|(_, lexicon_match)| lexicon_match.clone())
                .collect();
            let candidate = LexiconMatchTree::new(sentence, dependencies, selected);
            candidate.check_fully_matched()?;
            candidates.push(candidate);
        }
        mask += 1;
    }

    tracing::debug!(
        coverings = candidates.len(),
        matches = count,
        "assembled candidate coverings"
    );
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::LexiconEntry;
    use crate::matching::enumerate_matches;
    use crate::span_index::SpanIndex;
    use std::sync::Arc;

    fn covering_fixture() -> (Sentence, DependencyTree) {
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

    fn lexicon_match(pattern: &str, form: &str, line: i32, tokens: Vec<usize>) -> LexiconMatch {
        let entry = Arc::new(LexiconEntry::new("t", pattern, form, line).unwrap());
        LexiconMatch::new(entry, tokens)
    }

    #[test]
    fn single_covering() {
        let (sentence, dep) = covering_fixture();
        let index = SpanIndex::build(&sentence);
        let entries = vec![Arc::new(
            LexiconEntry::new("1:1", "diabetic(nsubj:patient)", "is_problem", 1).unwrap(),
        )];
        let matches = enumerate_matches(&entries, &sentence, &index, &dep, true);
        let candidates = identify_candidates(&sentence, &dep, &matches).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].matches().len(), 3);
        candidates[0].check_fully_matched().unwrap();
    }

    #[test]
    fn overlapping_matches_split_into_coverings() {
        let (sentence, dep) = covering_fixture();
        let matches = vec![
            lexicon_match("diabetic(nsubj:patient)", "is_problem", 1, vec![2, 3]),
            lexicon_match("patient", "lambda.concept", 2, vec![2]),
            lexicon_match("diabetic", "has_problem", 3, vec![3]),
            lexicon_match("is", "null", -1, vec![0]),
            lexicon_match("the", "null", -2, vec![1]),
        ];
        let candidates = identify_candidates(&sentence, &dep, &matches).unwrap();
        // Either the joint 2-token match or the two single-token matches
        // cover {2, 3}; nulls are forced either way.
        assert_eq!(candidates.len(), 2);
        for candidate in &candidates {
            candidate.check_fully_matched().unwrap();
        }
    }

    #[test]
    fn partial_subsets_are_not_coverings() {
        let (sentence, dep) = covering_fixture();
        let matches = vec![
            lexicon_match("patient", "lambda.concept", 2, vec![2]),
            lexicon_match("diabetic", "has_problem", 3, vec![3]),
        ];
        let candidates = identify_candidates(&sentence, &dep, &matches).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].matches().len(), 2);
    }

    #[test]
    fn collision_detection() {
        let (sentence, dep) = covering_fixture();
        let tree = LexiconMatchTree::new(
            &sentence,
            &dep,
            vec![
                lexicon_match("patient", "lambda.concept", 2, vec![2]),
                lexicon_match("patient", "lambda.concept", 2, vec![2]),
            ],
        );
        match tree.check_fully_matched().unwrap_err() {
            Error::TokenCollision { token } => assert_eq!(token, 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn incomplete_covering_detection() {
        let (sentence, dep) = covering_fixture();
        let tree = LexiconMatchTree::new(
            &sentence,
            &dep,
            vec![lexicon_match("patient", "lambda.concept", 2, vec![2])],
        );
        match tree.check_fully_matched().unwrap_err() {
            Error::IncompleteCovering(tokens) => assert_eq!(tokens, vec![0, 1, 3]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn trailing_question_mark_is_exempt() {
        let (sentence, dep) = covering_fixture();
        let tree = LexiconMatchTree::new(
            &sentence,
            &dep,
            vec![
                lexicon_match("diabetic(nsubj:patient)", "is_problem", 1, vec![2, 3]),
                lexicon_match("is", "null", -1, vec![0]),
                lexicon_match("the", "null", -2, vec![1]),
            ],
        );
        tree.check_fully_matched().unwrap();
    }

    #[test]
    fn matched_rules_summary() {
        let (sentence, dep) = covering_fixture();
        let tree = LexiconMatchTree::new(
            &sentence,
            &dep,
            vec![
                lexicon_match("diabetic", "has_problem", 3, vec![3]),
                lexicon_match("patient", "lambda.concept", 2, vec![2]),
                lexicon_match("is", "null", -1, vec![0]),
            ],
        );
        assert_eq!(
            tree.matched_rules(),
            vec![
                "2: patient -> lambda.concept".to_string(),
                "3: diabetic -> has_problem".to_string(),
            ]
        );
    }

    #[test]
    fn empty_match_list() {
        let (sentence, dep) = covering_fixture();
        let candidates = identify_candidates(&sentence, &dep, &[]).unwrap();
        assert!(candidates.is_empty());
    }
}
