//! Expression matcher for catalog rows.

use std::sync::Arc;

use super::expression::{CompiledExpression, Term, TermOperation, TermScope};
use super::parser::SearchExpressionCompiler;

/// A compiled search expression ready for matching.
#[derive(Debug, Clone, Default)]
pub struct SearchExpressionMatcher {
    expression: Arc<CompiledExpression>,
}

impl SearchExpressionMatcher {
    /// Compiles a raw query string into a matcher.
    pub fn compile(raw_query: &str) -> Self {
        Self::from_expression(Arc::new(SearchExpressionCompiler::compile(raw_query)))
    }

    /// Wraps an already compiled (for example cached) expression.
    pub fn from_expression(expression: Arc<CompiledExpression>) -> Self {
        Self { expression }
    }

    pub fn expression(&self) -> &CompiledExpression {
        &self.expression
    }

    /// Parameters extracted from the query for link substitution.
    pub fn parameters(&self) -> &[String] {
        self.expression.parameters()
    }

    /// Evaluates the expression against an item's name and tags.
    ///
    /// Conjunct terms form an AND chain seeded by the first of them; disjunct
    /// terms are ORed independently. The item matches when the AND chain
    /// holds or any disjunct term holds. An expression without terms matches
    /// everything.
    pub fn matches<S: AsRef<str>>(&self, name: &str, tags: &[S]) -> bool {
        let terms = self.expression.terms();
        if terms.is_empty() {
            return true;
        }

        let name = name.to_lowercase();
        let tags = tags
            .iter()
            .map(|tag| tag.as_ref().to_lowercase())
            .collect::<Vec<_>>();

        let mut conjunct: Option<bool> = None;
        let mut disjunct = false;
        for term in terms {
            let is_term_match = evaluate_term(term, &name, &tags) != term.negated();
            match term.operation() {
                TermOperation::Conjunct => {
                    conjunct = Some(conjunct.unwrap_or(true) && is_term_match);
                }
                TermOperation::Disjunct => disjunct = disjunct || is_term_match,
            }
        }

        conjunct.unwrap_or(false) || disjunct
    }
}

fn evaluate_term(term: &Term, name: &str, tags: &[String]) -> bool {
    match term.scope() {
        TermScope::Name => term.pattern_matches(name),
        TermScope::Tag => tags.iter().any(|tag| term.pattern_matches(tag)),
        TermScope::Both => {
            term.pattern_matches(name) || tags.iter().any(|tag| term.pattern_matches(tag))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_TAGS: [&str; 0] = [];

    #[test]
    fn bare_word_matches_name_prefix_case_insensitively() {
        let matcher = SearchExpressionMatcher::compile("foo");
        assert!(matcher.matches("foobar", &NO_TAGS));
        assert!(matcher.matches("FooBar", &NO_TAGS));
        assert!(!matcher.matches("barfoo", &NO_TAGS));
    }

    #[test]
    fn tag_scope_ignores_name() {
        let matcher = SearchExpressionMatcher::compile("@work");
        assert!(matcher.matches("anything", &["Work"]));
        assert!(matcher.matches("", &["home", "workshop"]));
        assert!(!matcher.matches("work", &["home"]));
    }

    #[test]
    fn name_and_negated_tag_form_a_conjunct_chain() {
        let matcher = SearchExpressionMatcher::compile(":exact not @home");
        assert!(matcher.matches("exact match", &["work"]));
        assert!(matcher.matches("exact", &NO_TAGS));
        assert!(!matcher.matches("exact", &["home"]));
        assert!(!matcher.matches("other", &["work"]));
    }

    #[test]
    fn disjunct_term_matches_on_its_own() {
        let matcher = SearchExpressionMatcher::compile("foo or @bar");
        assert!(matcher.matches("foozle", &NO_TAGS));
        assert!(matcher.matches("", &["bar"]));
        assert!(!matcher.matches("other", &["baz"]));
    }

    #[test]
    fn conjunct_chain_or_any_disjunct() {
        // (a AND b) OR c
        let matcher = SearchExpressionMatcher::compile(":a and @b or @c");
        assert!(matcher.matches("alpha", &["beta"]));
        assert!(!matcher.matches("alpha", &["delta"]));
        assert!(matcher.matches("zeta", &["charlie"]));
    }

    #[test]
    fn only_disjunct_terms_require_one_to_hold() {
        let matcher = SearchExpressionMatcher::compile("or @a or @b");
        assert!(matcher.matches("x", &["b"]));
        assert!(!matcher.matches("x", &["c"]));
    }

    #[test]
    fn both_scope_checks_name_and_tags() {
        let matcher = SearchExpressionMatcher::compile(":zzz or mail");
        assert!(matcher.matches("mailbox", &NO_TAGS));
        assert!(matcher.matches("inbox", &["Mail"]));
    }

    #[test]
    fn empty_expression_matches_everything() {
        let matcher = SearchExpressionMatcher::compile("");
        assert!(matcher.matches("", &NO_TAGS));
        assert!(matcher.matches("whatever", &["tag"]));
        assert!(SearchExpressionMatcher::default().matches("x", &NO_TAGS));
    }

    #[test]
    fn wildcards_apply_inside_terms() {
        let matcher = SearchExpressionMatcher::compile("g*b");
        assert!(matcher.matches("github", &NO_TAGS));
        assert!(matcher.matches("gitlab", &NO_TAGS));
        assert!(!matcher.matches("gitea", &NO_TAGS));
        assert!(!matcher.matches("bgit", &NO_TAGS));
    }

    #[test]
    fn recompiling_gives_equivalent_results() {
        let first = SearchExpressionMatcher::compile("foo or @bar not @baz");
        let second = SearchExpressionMatcher::compile("foo or @bar not @baz");
        let candidates: [(&str, &[&str]); 5] = [
            ("foo", &[]),
            ("x", &["bar"]),
            ("x", &["baz"]),
            ("foobaz", &["baz"]),
            ("", &[]),
        ];
        for (name, tags) in candidates {
            assert_eq!(first.matches(name, tags), second.matches(name, tags));
        }
        assert_eq!(first.expression(), second.expression());
    }

    #[test]
    fn parameters_do_not_affect_matching() {
        let matcher = SearchExpressionMatcher::compile("wiki rust ownership");
        assert!(matcher.matches("wikipedia", &NO_TAGS));
        assert_eq!(matcher.parameters(), &["rust", "ownership"]);
    }
}
