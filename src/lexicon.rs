//! Lexicon entries and the pattern compiler.
//!
//! A lexicon entry maps a small labeled dependency sub-graph onto a
//! logical-form template. Patterns are written `head(rel:phrase, ...)` with
//! chaining: the head of each subsequent parenthesized fragment is the text
//! after the last `:` of the previous one, so
//! `have(dobj:call(prep_from:__concept__))` yields the edges
//! `(have, dobj, call)` and `(call, prep_from, __concept__)`.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// The logical form of entries with no semantic contribution.
pub const NULL_FORM: &str = "null";

/// A labeled edge of a lexicon pattern graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternEdge {
    pub head: String,
    pub relation: String,
    pub tail: String,
}

/// An entry in the semantic parsing lexicon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LexiconEntry {
    id: String,
    pattern: String,
    nodes: Vec<String>,
    edges: Vec<PatternEdge>,
    logical_form: String,
    line: i32,
}

impl LexiconEntry {
    /// Compile a pattern string into an entry.
    ///
    /// A pattern without `(` is a single node with no edges; otherwise the
    /// node set is the head plus every edge tail, insertion-ordered and
    /// deduplicated.
    pub fn new(
        id: impl Into<String>,
        pattern: impl Into<String>,
        logical_form: impl Into<String>,
        line: i32,
    ) -> Result<Self> {
        let pattern = pattern.into();
        let (nodes, edges) = if pattern.contains('(') {
            compile_pattern(&pattern, line)?
        } else {
            (vec![pattern.clone()], Vec::new())
        };
        Ok(LexiconEntry {
            id: id.into(),
            pattern,
            nodes,
            edges,
            logical_form: logical_form.into(),
            line,
        })
    }

    /// A synthetic single-token entry with a `null` logical form, used to
    /// cover tokens the lexicon says nothing about. Synthetic entries carry
    /// negative line numbers.
    pub fn null_for_token(line: i32, text: &str) -> Self {
        LexiconEntry {
            id: format!("{}:{}", line, text),
            pattern: text.to_string(),
            nodes: vec![text.to_string()],
            edges: Vec::new(),
            logical_form: NULL_FORM.to_string(),
            line,
        }
    }

    /// The ID of this entry (`"line:op"` for file entries).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The source pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The pattern node labels, insertion-ordered.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// The pattern edges.
    pub fn edges(&self) -> &[PatternEdge] {
        &self.edges
    }

    /// The logical-form template of this entry.
    pub fn logical_form(&self) -> &str {
        &self.logical_form
    }

    /// The lexicon file line this entry came from (negative for synthetic
    /// default-null entries).
    pub fn line(&self) -> i32 {
        self.line
    }

    /// Whether this entry contributes no semantics.
    pub fn is_null(&self) -> bool {
        self.logical_form == NULL_FORM
    }
}

impl fmt::Display for LexiconEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.pattern, self.logical_form)
    }
}

/// Truncate a pattern fragment at its first closing parenthesis.
fn strip_close(fragment: &str) -> &str {
    match fragment.find(')') {
        Some(index) => &fragment[..index],
        None => fragment,
    }
}

/// Split a `rel:phrase` sub-pattern, reassembling quoted relations that
/// themselves contain a colon (`"rel1:rel2":phrase`).
fn parse_sub_pattern(sub_pattern: &str, line: i32) -> Result<(String, String)> {
    let trimmed = strip_close(sub_pattern);
    let parts: Vec<&str> = trimmed.split(':').collect();
    match parts.as_slice() {
        [relation, phrase] => Ok((relation.to_string(), phrase.to_string())),
        [first, second, phrase] if first.starts_with('"') && second.ends_with('"') => {
            let relation = format!("{}:{}", &first[1..], &second[..second.len() - 1]);
            Ok((relation, phrase.to_string()))
        }
        _ => Err(Error::Pattern {
            line,
            message: format!(
                "sub-pattern should have 2 or 3 colon-delimited parts (found {}): {}",
                parts.len(),
                sub_pattern
            ),
        }),
    }
}

fn compile_pattern(pattern: &str, line: i32) -> Result<(Vec<String>, Vec<PatternEdge>)> {
    let mut nodes: Vec<String> = Vec::new();
    let mut edges = Vec::new();
    let mut push_node = |nodes: &mut Vec<String>, label: &str| {
        if !nodes.iter().any(|n| n == label) {
            nodes.push(label.to_string());
        }
    };

    let mut fragments = pattern.split('(');
    let mut head = fragments.next().unwrap_or_default().to_string();
    push_node(&mut nodes, &head);

    for fragment in fragments {
        let stripped = strip_close(fragment);
        let pairs: Vec<&str> = if stripped.contains(", ") {
            stripped.split(", ").collect()
        } else {
            vec![stripped]
        };
        for pair in pairs {
            let (relation, phrase) = parse_sub_pattern(pair, line)?;
            push_node(&mut nodes, &phrase);
            edges.push(PatternEdge {
                head: head.clone(),
                relation,
                tail: phrase,
            });
        }
        // Chained dependency: the next fragment hangs off the last phrase.
        head = match stripped.rfind(':') {
            Some(index) => stripped[index + 1..].to_string(),
            None => stripped.to_string(),
        };
    }

    Ok((nodes, edges))
}

/// Parse lexicon text in the `pattern<TAB>op1/op2/.../opN` line format.
///
/// `#`-comment and blank lines are skipped. Each `opK` becomes a separate
/// entry sharing the pattern, with id `"line:k"`.
pub fn parse_lexicon(text: &str) -> Result<Vec<LexiconEntry>> {
    let mut entries = Vec::new();
    for (index, raw_line) in text.lines().enumerate() {
        let line_num = (index + 1) as i32;
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 2 {
            return Err(Error::LexiconFormat {
                line: line_num,
                message: format!("should be just 2 fields (found {}): {}", fields.len(), line),
            });
        }
        let pattern = fields[0];
        for (op_index, op) in fields[1].split('/').enumerate() {
            let id = format!("{}:{}", line_num, op_index + 1);
            entries.push(LexiconEntry::new(id, pattern, op, line_num)?);
        }
    }
    tracing::info!(entries = entries.len(), "loaded lexicon entries");
    Ok(entries)
}

/// Load and parse a lexicon file.
pub fn load_lexicon(path: &Path) -> Result<Vec<LexiconEntry>> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_lexicon(&text)
}
