//! Error types for lexicon loading, type-rule configuration, and generation.
//!
//! Configuration errors (malformed lexicon, inconsistent type tables) should
//! abort the whole run: the lexicon and type rules are static configuration,
//! not runtime input. Internal-consistency errors indicate a bug in the
//! covering assembly and are surfaced rather than silently skipped. A
//! sentence for which no covering survives is *not* an error; it simply
//! yields an empty candidate list.

use thiserror::Error;

/// Errors that can occur while loading configuration or generating trees.
#[derive(Debug, Error)]
pub enum Error {
    /// A lexicon pattern sub-expression did not have 2 or 3 colon-delimited
    /// parts.
    #[error("invalid pattern at lexicon line {line}: {message}")]
    Pattern { line: i32, message: String },

    /// A lexicon line did not have the `pattern<TAB>ops` shape.
    #[error("malformed lexicon line {line}: {message}")]
    LexiconFormat { line: i32, message: String },

    /// A type-rule line did not have the `function<TAB>input<TAB>output`
    /// shape.
    #[error("malformed type rule at line {line}: {message}")]
    TypeRuleFormat { line: usize, message: String },

    /// A function was defined twice in the type table.
    #[error("function has multiple type constraints: {0}")]
    DuplicateFunction(String),

    /// A function appeared in a tree or lexicon entry with no type rule.
    /// The type table and lexicon must be kept in sync.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// A `lambda.*` logical form with no known predicate expansion.
    #[error("unhandled logical form: {0}")]
    UnknownLogicalForm(String),

    /// More than three simultaneous lambda variables in one tree.
    #[error("more than three lambda variables in one logical tree")]
    TooManyVariables,

    /// A token was claimed by two matches within a single covering. The
    /// candidate assembler must never construct such a covering.
    #[error("token at offset {token} claimed by more than one match in a covering")]
    TokenCollision { token: usize },

    /// A covering left sentence tokens uncovered.
    #[error("tokens left uncovered by a candidate covering: {0:?}")]
    IncompleteCovering(Vec<usize>),

    /// Failure reading a lexicon or type-rule file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for lexform operations.
pub type Result<T> = std::result::Result<T, Error>;
