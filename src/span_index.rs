//! Per-sentence inverse index from lexical key to candidate spans.
//!
//! Concept annotations are bucketed under `"__concept__"` when their
//! semantic type is in the closed concept-type set (general clinical labels,
//! FHIR resource types, and UMLS semantic-type abbreviations), otherwise
//! under `"__<type>__"`. Raw tokens are bucketed under their lowercased
//! text. Keys therefore never collide across the two kinds: token keys are
//! literal words, concept keys are double-underscore-wrapped.

use crate::sentence::{Sentence, Span};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Semantic-type labels bucketed under the generic `"__concept__"` key.
static CONCEPT_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();
    for label in &[
        "abnormality", "activity", "anatomy", "antibiotic", "attribute",
        "chemical", "concept", "device", "disease", "element", "finding",
        "food", "function", "injury", "intraoperative", "material",
        "organism", "problem", "procedure", "professional", "quantitative",
        "substance", "symptom", "virus",
        // FHIR resource types
        "Condition", "Encounter", "Immunization", "MedicationOrder",
        "Observation", "CarePlan", "DiagnosticReport", "Procedure",
        "AllergyIntolerance", "Goal",
        // UMLS semantic types
        "Anatomical Abnormality", "Clinical Attribute", "Clinical Drug",
        "Daily or Recreational Activity", "Diagnostic Procedure",
        "Disease or Syndrome", "Drug Delivery Device", "Finding",
        "Health Care Activity", "Immunologic Factor", "Injury or Poisoning",
        "Intellectual Product", "Laboratory Procedure", "Neoplastic Process",
        "Organism Function", "Pathologic Function", "Temporal Concept",
        "Therapeutic or Preventive Procedure",
        "aapp", "acab", "acty", "aggp", "amas", "amph", "anab", "anim",
        "anst", "antb", "arch", "bacs", "bact", "bdsu", "bdsy", "bhvr",
        "biof", "bird", "blor", "bmod", "bodm", "bpoc", "bsoj", "celc",
        "celf", "cell", "cgab", "chem", "chvf", "chvs", "clas", "clna",
        "clnd", "cnce", "comd", "crbs", "diap", "dora", "drdd", "dsyn",
        "edac", "eehu", "elii", "emod", "emst", "enty", "enzy", "euka",
        "evnt", "famg", "ffas", "fish", "fndg", "fngs", "food", "ftcn",
        "genf", "geoa", "gngm", "gora", "grpa", "grup", "hcpp", "hcro",
        "hlca", "hops", "horm", "humn", "idcn", "imft", "inbe", "inch",
        "inpo", "inpr", "irda", "lang", "lbpr", "lbtr", "mamm", "mbrt",
        "mcha", "medd", "menp", "mnob", "mobd", "moft", "mosq", "neop",
        "nnon", "npop", "nusq", "ocac", "ocdi", "orch", "orga", "orgf",
        "orgm", "orgt", "ortf", "patf", "phob", "phpr", "phsf", "phsu",
        "plnt", "podg", "popg", "prog", "pros", "qlco", "qnco", "rcpt",
        "rept", "resa", "resd", "rnlw", "sbst", "shro", "socb", "sosy",
        "spco", "tisu", "tmco", "topp", "virs", "vita", "vtbt",
    ] {
        set.insert(*label);
    }
    set
});

/// The index key concepts with a recognized semantic type bucket under.
pub const CONCEPT_KEY: &str = "__concept__";

/// Inverse index of one sentence's tokens and concepts by lexical key.
#[derive(Debug, Clone)]
pub struct SpanIndex {
    spans: HashMap<String, Vec<Span>>,
    concept_tokens: HashSet<usize>,
}

impl SpanIndex {
    /// Index every concept and token of the sentence.
    pub fn build(sentence: &Sentence) -> Self {
        let mut spans: HashMap<String, Vec<Span>> = HashMap::new();
        let mut concept_tokens = HashSet::new();

        for concept in sentence.concepts() {
            tracing::trace!(concept = ?concept, "indexing concept");
            let key = if CONCEPT_TYPES.contains(concept.semantic_type()) {
                CONCEPT_KEY.to_string()
            } else {
                format!("__{}__", concept.semantic_type())
            };
            spans.entry(key).or_default().push(concept.span());
            concept_tokens.extend(concept.span().offsets());
        }

        for token in sentence.tokens() {
            let key = token.text().to_lowercase();
            spans
                .entry(key)
                .or_default()
                .push(Span::token(token.offset()));
        }

        SpanIndex {
            spans,
            concept_tokens,
        }
    }

    /// The candidate spans for a lexical key, if any.
    pub fn get(&self, key: &str) -> Option<&[Span]> {
        self.spans.get(key).map(|spans| spans.as_slice())
    }

    /// Whether the token at `offset` lies inside any concept annotation.
    pub fn is_concept_token(&self, offset: usize) -> bool {
        self.concept_tokens.contains(&offset)
    }

    /// All token offsets covered by concept annotations.
    pub fn concept_tokens(&self) -> &HashSet<usize> {
        &self.concept_tokens
    }
}
