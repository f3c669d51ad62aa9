//! The function type table: each logical function's input and output type.
//!
//! The table is external configuration (`function<TAB>input<TAB>output`
//! lines) and must stay in sync with the lexicon: looking up a function the
//! table does not know is a configuration error, never a silent reject.

use crate::error::{Error, Result};
use crate::lexicon::NULL_FORM;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// The input type of functions that require no input (leaves).
pub const NULL_TYPE: &str = "NULL";
/// The externally-supplied record type; consumable without a producer.
pub const EVENT_TYPE: &str = "Event";
/// The boolean result type; exempt from input/output count balancing.
pub const TRUE_FALSE_TYPE: &str = "TrueFalse";

/// Input and output type of one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionTypes {
    pub input: String,
    pub output: String,
}

/// Mapping from function name to its type signature.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    rules: HashMap<String, FunctionTypes>,
}

impl TypeTable {
    /// Parse type-rule text. `#`-comment and blank lines are skipped;
    /// duplicate function definitions are fatal.
    pub fn parse(text: &str) -> Result<Self> {
        let mut rules = HashMap::new();
        for (index, raw_line) in text.lines().enumerate() {
            let line_num = index + 1;
            let line = raw_line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 3 {
                return Err(Error::TypeRuleFormat {
                    line: line_num,
                    message: format!("does not have 3 items: {}", line),
                });
            }
            let function = fields[0].to_string();
            let types = FunctionTypes {
                input: fields[1].to_string(),
                output: fields[2].to_string(),
            };
            if let Some(prev) = rules.insert(function.clone(), types.clone()) {
                tracing::error!(
                    function = %function,
                    first = ?prev,
                    second = ?types,
                    "function has multiple type constraints"
                );
                return Err(Error::DuplicateFunction(function));
            }
        }
        Ok(TypeTable { rules })
    }

    /// Load and parse a type-rule file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Whether the table knows the function behind `op`.
    pub fn contains(&self, op: &str) -> bool {
        self.rules.contains_key(function_name(op))
    }

    /// The type signature of the function behind `op`, if known.
    pub fn get(&self, op: &str) -> Option<&FunctionTypes> {
        self.rules.get(function_name(op))
    }

    /// The type signature of the function behind `op`; unknown functions are
    /// a fatal configuration error.
    pub fn types(&self, op: &str) -> Result<&FunctionTypes> {
        self.get(op)
            .ok_or_else(|| Error::UnknownFunction(function_name(op).to_string()))
    }
}

/// Extract the function name from an op label: a `lambda ...` label is the
/// `lambda` function, and any argument-list suffix is stripped.
pub fn function_name(op: &str) -> &str {
    if op.starts_with("lambda ") {
        return "lambda";
    }
    match op.find('(') {
        Some(index) => &op[..index],
        None => op,
    }
}

/// The predicate a `lambda.*` logical-form template wraps.
pub fn lambda_predicate(form: &str) -> Option<&'static str> {
    match form {
        "lambda.concept" => Some("has_concept"),
        "lambda.hascall" => Some("has_call"),
        "lambda.hasrelative" => Some("is_relative"),
        _ => None,
    }
}

/// The functions a logical-form template contributes to a covering:
/// `lambda.*` templates expand to `lambda` plus their predicate, `null`
/// contributes nothing, and everything else is itself.
pub fn expand_functions(form: &str) -> Result<Vec<&str>> {
    if form == NULL_FORM {
        return Ok(Vec::new());
    }
    if form.starts_with("lambda.") {
        let predicate = lambda_predicate(form)
            .ok_or_else(|| Error::UnknownLogicalForm(form.to_string()))?;
        return Ok(vec!["lambda", predicate]);
    }
    Ok(vec![form])
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = "# test rules\n\
        lambda\tEvent\tEvent\n\
        has_concept\tNULL\tEvent\n\
        is_problem\tEvent\tTrueFalse\n";

    #[test]
    fn parse_and_lookup() {
        let table = TypeTable::parse(RULES).unwrap();
        let types = table.types("is_problem").unwrap();
        assert_eq!(types.input, "Event");
        assert_eq!(types.output, "TrueFalse");
    }

    #[test]
    fn lookup_normalizes_op_labels() {
        let table = TypeTable::parse(RULES).unwrap();
        assert!(table.contains("lambda x"));
        assert!(table.contains("has_concept(x)"));
        assert_eq!(table.types("is_problem(_1)").unwrap().output, "TrueFalse");
    }

    #[test]
    fn unknown_function_is_fatal() {
        let table = TypeTable::parse(RULES).unwrap();
        match table.types("mystery(x)").unwrap_err() {
            Error::UnknownFunction(name) => assert_eq!(name, "mystery"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn duplicate_function_is_fatal() {
        let text = "latest\tEvent\tEvent\nlatest\tEvent\tTrueFalse\n";
        match TypeTable::parse(text).unwrap_err() {
            Error::DuplicateFunction(name) => assert_eq!(name, "latest"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn malformed_line() {
        match TypeTable::parse("latest\tEvent\n").unwrap_err() {
            Error::TypeRuleFormat { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn function_name_extraction() {
        assert_eq!(function_name("lambda x"), "lambda");
        assert_eq!(function_name("has_concept(x)"), "has_concept");
        assert_eq!(function_name("and"), "and");
    }

    #[test]
    fn expansion() {
        assert_eq!(
            expand_functions("lambda.concept").unwrap(),
            vec!["lambda", "has_concept"]
        );
        assert_eq!(expand_functions("is_problem").unwrap(), vec!["is_problem"]);
        assert!(expand_functions("null").unwrap().is_empty());
        assert!(matches!(
            expand_functions("lambda.unknown"),
            Err(Error::UnknownLogicalForm(_))
        ));
    }
}
