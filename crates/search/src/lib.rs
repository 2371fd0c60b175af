//! Search expression and link template library.
//!
//! This crate provides the pure, synchronous half of the launcher:
//! - Search expression compilation (keywords, scopes, wildcards, parameters)
//! - Matching compiled expressions against an item's name and tags
//! - Link template placeholder counting, substitution and arity checks

pub mod error;
pub mod link;
pub mod query;

// Re-export main types
pub use error::{LinkError, Result};
pub use link::{LinkArity, LinkTemplate};
pub use query::{
    CompiledExpression, SearchExpressionCompiler, SearchExpressionMatcher, Term, TermOperation,
    TermScope,
};
