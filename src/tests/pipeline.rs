//! End-to-end pipeline tests over the fixture lexicon and type rules.

use crate::candidates::LexiconMatchTree;
use crate::generator::LogicalTreeGenerator;
use crate::lexicon::{load_lexicon, LexiconEntry};
use crate::match_filter;
use crate::matching::LexiconMatch;
use crate::sentence::{DependencyTree, Sentence};
use crate::tree_filter;
use crate::type_rules::{TypeTable, EVENT_TYPE, NULL_TYPE};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

fn fixture_generator() -> LogicalTreeGenerator {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let entries = load_lexicon(&root.join("fixtures/lexicon.tsv")).unwrap();
    let table = TypeTable::load(&root.join("fixtures/type_rules.tsv")).unwrap();
    LogicalTreeGenerator::new(entries, table, true).unwrap()
}

fn fixture_table() -> TypeTable {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    TypeTable::load(&root.join("fixtures/type_rules.tsv")).unwrap()
}

fn diabetic_question() -> (Sentence, DependencyTree) {
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
fn diabetic_question_produces_the_expected_parse() {
    let generator = fixture_generator();
    let (sentence, dep) = diabetic_question();
    let candidates = generator.generate(&sentence, &dep).unwrap();
    assert!(!candidates.is_empty());

    let flattened: Vec<String> = candidates.iter().map(|tree| tree.flatten()).collect();
    assert!(
        flattened
            .iter()
            .any(|form| form == "is_problem(lambda x.has_concept(x))"),
        "expected parse missing from {:?}",
        flattened
    );
}

#[test]
fn final_candidates_have_unique_flattened_forms() {
    let generator = fixture_generator();
    let (sentence, dep) = diabetic_question();
    let candidates = generator.generate(&sentence, &dep).unwrap();

    let mut seen = HashSet::new();
    for tree in &candidates {
        assert!(
            seen.insert(tree.flatten()),
            "duplicate flattened form: {}",
            tree.flatten()
        );
    }
}

#[test]
fn final_candidates_are_type_sound() {
    let generator = fixture_generator();
    let table = fixture_table();
    let (sentence, dep) = diabetic_question();

    for tree in generator.generate(&sentence, &dep).unwrap() {
        assert!(!tree_filter::has_type_mismatch(&tree, &table).unwrap());
        assert!(!tree_filter::has_invalid_and(&tree));
        let root = tree.root();
        for node in root.all_nodes() {
            if root.is_leaf(node) {
                let input = &table.types(root.value(node)).unwrap().input;
                assert!(input == NULL_TYPE || input == EVENT_TYPE);
            }
        }
    }
}

#[test]
fn lexicon_gap_yields_empty_not_error() {
    let generator = fixture_generator();
    let sentence = Sentence::from_words(vec!["How", "tall", "is", "Everest", "?"]);
    let dep = DependencyTree::new(
        5,
        vec![
            (0, 1, "advmod"),
            (2, 1, "cop"),
            (3, 1, "nsubj"),
            (4, 1, "punct"),
        ],
    );
    let candidates = generator.generate(&sentence, &dep).unwrap();
    assert!(candidates.is_empty());
}

#[test]
fn concept_annotations_drive_concept_patterns() {
    let generator = fixture_generator();
    let mut sentence =
        Sentence::from_words(vec!["Is", "the", "patient", "diabetic", "?"]);
    sentence.add_concept(3, 3, "problem");
    let (_, dep) = diabetic_question();

    // The __concept__ entry now matches the annotated span alongside the
    // literal entries; the expected parse must still come out.
    let candidates = generator.generate(&sentence, &dep).unwrap();
    let flattened: Vec<String> = candidates.iter().map(|tree| tree.flatten()).collect();
    assert!(flattened
        .iter()
        .any(|form| form == "is_problem(lambda x.has_concept(x))"));
}

#[test]
fn unconsumed_has_concept_covering_is_rejected_before_rewrite() {
    // With has_concept typed Event -> Concept, a covering producing a
    // Concept nothing consumes must die in the covering pre-filter.
    let table = TypeTable::parse(
        "lambda\tEvent\tEvent\nhas_concept\tEvent\tConcept\n",
    )
    .unwrap();
    let sentence = Sentence::from_words(vec!["the", "concept"]);
    let dep = DependencyTree::new(2, vec![(0, 1, "det")]);
    let matches = vec![
        LexiconMatch::new(
            Arc::new(LexiconEntry::new("1:1", "concept", "has_concept", 1).unwrap()),
            vec![1],
        ),
        LexiconMatch::new(Arc::new(LexiconEntry::null_for_token(-1, "the")), vec![0]),
    ];
    let covering = LexiconMatchTree::new(&sentence, &dep, matches);
    covering.check_fully_matched().unwrap();
    assert!(match_filter::has_type_mismatch(&covering, &table).unwrap());
}
