//! Search expression compilation and matching.
//!
//! This module provides the launcher's query language:
//! - Expression types (terms with scope, operation and negation)
//! - Whitespace tokenization and compilation of raw queries
//! - Prefix-anchored wildcard matching
//! - Evaluation of compiled expressions against name and tags

mod expression;
mod matcher;
mod parser;
mod text_match;

// Re-export public types
pub use expression::{CompiledExpression, Term, TermOperation, TermScope};
pub use matcher::SearchExpressionMatcher;
pub use parser::SearchExpressionCompiler;
pub use text_match::{prefix_wildcard_matches, wildcard_matches};
