//! Compiled expression types.

use super::text_match::prefix_wildcard_matches;

/// Which attribute of an item a term is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermScope {
    Name,
    Tag,
    /// Matches the name or any tag.
    Both,
}

/// How a term's result is combined with the rest of the expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermOperation {
    #[default]
    Conjunct,
    Disjunct,
}

/// A single compiled unit of a search expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pattern: String,
    scope: TermScope,
    operation: TermOperation,
    negated: bool,
}

impl Term {
    /// Creates a term from raw text. The text is lowercased for
    /// case-insensitive matching.
    pub fn new(text: &str, scope: TermScope, operation: TermOperation, negated: bool) -> Self {
        Self {
            pattern: text.to_lowercase(),
            scope,
            operation,
            negated,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn scope(&self) -> TermScope {
        self.scope
    }

    pub fn operation(&self) -> TermOperation {
        self.operation
    }

    pub fn negated(&self) -> bool {
        self.negated
    }

    /// Tests the pattern against a single lowercased candidate.
    pub(crate) fn pattern_matches(&self, candidate: &str) -> bool {
        prefix_wildcard_matches(&self.pattern, candidate)
    }
}

/// The result of compiling a raw query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledExpression {
    source: String,
    terms: Vec<Term>,
    parameters: Vec<String>,
}

impl CompiledExpression {
    pub(crate) fn new(source: &str, terms: Vec<Term>, parameters: Vec<String>) -> Self {
        Self {
            source: source.to_string(),
            terms,
            parameters,
        }
    }

    /// The raw query this expression was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Free tokens, in order, available for link template substitution.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
