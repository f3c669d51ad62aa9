//! The sentence-side interface consumed by the matcher.
//!
//! The core does not tokenize or parse: callers build a [`Sentence`] (tokens
//! plus concept annotations) and a [`DependencyTree`] from their own parser
//! output. The only capabilities the engine relies on are token text/offsets,
//! concept semantic types, the depth-bounded dependency path query, and the
//! relation-stripped "typeless" tree view.

use crate::tree::Tree;
use serde::Serialize;
use std::fmt;

/// Delimiter prefixed to a relation in a downward dependency path.
pub const DOWN_DELIM: &str = "↓";

/// A single sentence token: raw text plus sentence-relative offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    text: String,
    offset: usize,
}

impl Token {
    /// The raw text of the token.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The sentence-relative token offset.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// An inclusive range of token offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// A span covering a single token.
    pub fn token(offset: usize) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    /// The token offsets covered by this span, in order.
    pub fn offsets(&self) -> impl Iterator<Item = usize> {
        self.start..=self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A concept annotation attached to a span of tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Concept {
    span: Span,
    semantic_type: String,
}

impl Concept {
    /// The tokens this concept covers.
    pub fn span(&self) -> Span {
        self.span
    }

    /// The semantic type label of this concept.
    pub fn semantic_type(&self) -> &str {
        &self.semantic_type
    }
}

/// An ordered token sequence with concept annotations.
#[derive(Debug, Clone, Serialize)]
pub struct Sentence {
    tokens: Vec<Token>,
    concepts: Vec<Concept>,
}

impl Sentence {
    /// Build a sentence from whitespace-free word strings.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = words
            .into_iter()
            .enumerate()
            .map(|(offset, text)| Token {
                text: text.into(),
                offset,
            })
            .collect();
        Sentence {
            tokens,
            concepts: Vec::new(),
        }
    }

    /// Annotate the tokens `start..=end` as a concept of the given semantic
    /// type.
    pub fn add_concept(&mut self, start: usize, end: usize, semantic_type: impl Into<String>) {
        debug_assert!(end < self.tokens.len() && start <= end);
        self.concepts.push(Concept {
            span: Span { start, end },
            semantic_type: semantic_type.into(),
        });
    }

    /// The tokens of the sentence, in order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The concept annotations of the sentence.
    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the sentence has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The raw text of the token at `offset`.
    pub fn token_text(&self, offset: usize) -> &str {
        &self.tokens[offset].text
    }

    /// The final token, if any.
    pub fn last_token(&self) -> Option<&Token> {
        self.tokens.last()
    }

    /// The sentence rejoined with single spaces, for logging.
    pub fn text(&self) -> String {
        let words: Vec<&str> = self.tokens.iter().map(|t| t.text.as_str()).collect();
        words.join(" ")
    }
}

/// A dependency parse over one sentence: one head arc per non-root token.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyTree {
    /// Per token offset: `Some((head_offset, relation))`, `None` for the root.
    arcs: Vec<Option<(usize, String)>>,
}

impl DependencyTree {
    /// Build a dependency tree for a sentence of `len` tokens from
    /// `(dependent, head, relation)` arcs. Tokens without an arc are roots.
    pub fn new(len: usize, arcs: Vec<(usize, usize, &str)>) -> Self {
        let mut table = vec![None; len];
        for (dependent, head, relation) in arcs {
            debug_assert!(dependent < len && head < len);
            table[dependent] = Some((head, relation.to_string()));
        }
        DependencyTree { arcs: table }
    }

    /// The head arc of `token`, or `None` if it is the root.
    pub fn head(&self, token: usize) -> Option<(usize, &str)> {
        self.arcs[token]
            .as_ref()
            .map(|(head, relation)| (*head, relation.as_str()))
    }

    /// The directed downward dependency path from `from` to `to`, rendered
    /// as one `"↓relation"` segment per hop, or `None` if `to` is not a
    /// descendant of `from` within `max_depth` hops.
    pub fn path(&self, from: usize, to: usize, max_depth: usize) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = to;
        while current != from {
            if segments.len() >= max_depth {
                return None;
            }
            let (head, relation) = self.arcs[current].as_ref()?;
            segments.push(relation.as_str());
            current = *head;
        }
        if segments.is_empty() {
            return None;
        }
        let mut path = String::new();
        for relation in segments.iter().rev() {
            path.push_str(DOWN_DELIM);
            path.push_str(relation);
        }
        Some(path)
    }

    /// The relation-stripped ownership view of the parse: one node per
    /// token, children attached in token order under their head. Returns the
    /// tree together with the node owning each token offset.
    pub fn typeless_tree(&self) -> (Tree<Span>, Vec<crate::tree::NodeId>) {
        let root_offset = self
            .arcs
            .iter()
            .position(|arc| arc.is_none())
            .unwrap_or(0);
        let mut tree = Tree::new(Span::token(root_offset));
        let mut node_of = vec![None; self.arcs.len()];
        node_of[root_offset] = Some(tree.root());

        // Tokens attach under their head; a pass per remaining depth level
        // keeps children in token order.
        let mut remaining: Vec<usize> = (0..self.arcs.len())
            .filter(|&offset| offset != root_offset && self.arcs[offset].is_some())
            .collect();
        while !remaining.is_empty() {
            let mut next = Vec::new();
            for &offset in &remaining {
                let head = match self.arcs[offset].as_ref() {
                    Some((head, _)) => *head,
                    None => continue,
                };
                match node_of[head] {
                    Some(head_node) => {
                        let node = tree.add_child(head_node, Span::token(offset));
                        node_of[offset] = Some(node);
                    }
                    None => next.push(offset),
                }
            }
            if next.len() == remaining.len() {
                // Unreachable arcs (cycle or dangling head); stop rather
                // than loop forever.
                break;
            }
            remaining = next;
        }

        let owners = node_of
            .into_iter()
            .map(|node| node.unwrap_or_else(|| tree.root()))
            .collect();
        (tree, owners)
    }
}
