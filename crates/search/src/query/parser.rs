//! Search expression tokenizer and compiler.

use super::expression::{CompiledExpression, Term, TermOperation, TermScope};

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct QueryToken<'a> {
    kind: QueryTokenKind<'a>,
    position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryTokenKind<'a> {
    And,
    Or,
    Not,
    /// `@tag`, prefix stripped.
    Tag(&'a str),
    /// `:name`, prefix stripped.
    Name(&'a str),
    Word(&'a str),
}

const AND_KEYWORDS: [&str; 3] = ["and", "&&", "&"];
const OR_KEYWORDS: [&str; 3] = ["or", "||", "|"];
const NOT_KEYWORDS: [&str; 3] = ["not", "!!", "!"];

fn is_keyword(raw: &str, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|keyword| raw.eq_ignore_ascii_case(keyword))
}

fn classify_token(raw: &str) -> QueryTokenKind<'_> {
    if is_keyword(raw, &AND_KEYWORDS) {
        QueryTokenKind::And
    } else if is_keyword(raw, &OR_KEYWORDS) {
        QueryTokenKind::Or
    } else if is_keyword(raw, &NOT_KEYWORDS) {
        QueryTokenKind::Not
    } else if let Some(tag) = raw.strip_prefix('@') {
        QueryTokenKind::Tag(tag)
    } else if let Some(name) = raw.strip_prefix(':') {
        QueryTokenKind::Name(name)
    } else {
        QueryTokenKind::Word(raw)
    }
}

fn tokenize_query_input(input: &str) -> Vec<QueryToken<'_>> {
    let mut tokens = Vec::new();
    let mut cursor = 0usize;

    while cursor < input.len() {
        let rest = &input[cursor..];
        let Some(ch) = rest.chars().next() else {
            break;
        };
        if ch.is_whitespace() {
            cursor += ch.len_utf8();
            continue;
        }

        let position = cursor;
        let end = rest
            .char_indices()
            .find(|(_, next)| next.is_whitespace())
            .map(|(offset, _)| cursor + offset)
            .unwrap_or(input.len());

        tokens.push(QueryToken {
            kind: classify_token(&input[position..end]),
            position,
        });
        cursor = end;
    }

    tokens
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Compiles raw query strings into [`CompiledExpression`]s.
///
/// Each whitespace-separated token is, in priority order, a conjunction
/// keyword, a disjunction keyword, a negation keyword, a tag-scoped term
/// (`@tag`), a name-scoped term (`:name`), or a bare word. A bare word
/// becomes a term scoped to name and tags when an operator keyword precedes
/// it, and a name-scoped term when no term has been emitted yet. Any other
/// bare word is a link parameter.
pub struct SearchExpressionCompiler {
    terms: Vec<Term>,
    parameters: Vec<String>,
    pending_operation: Option<TermOperation>,
    pending_negation: bool,
}

impl SearchExpressionCompiler {
    pub fn compile(input: &str) -> CompiledExpression {
        let mut compiler = Self {
            terms: Vec::new(),
            parameters: Vec::new(),
            pending_operation: None,
            pending_negation: false,
        };

        for token in tokenize_query_input(input) {
            compiler.accept(token);
        }

        log::trace!(
            "compiled search expression {:?}: {} term(s), {} parameter(s)",
            input,
            compiler.terms.len(),
            compiler.parameters.len()
        );
        CompiledExpression::new(input, compiler.terms, compiler.parameters)
    }

    fn accept(&mut self, token: QueryToken<'_>) {
        match token.kind {
            QueryTokenKind::And => self.pending_operation = Some(TermOperation::Conjunct),
            QueryTokenKind::Or => self.pending_operation = Some(TermOperation::Disjunct),
            QueryTokenKind::Not => self.pending_negation = true,
            QueryTokenKind::Tag(text) => self.emit_term(text, TermScope::Tag),
            QueryTokenKind::Name(text) => self.emit_term(text, TermScope::Name),
            QueryTokenKind::Word(text) => {
                if self.pending_operation.is_some() {
                    self.emit_term(text, TermScope::Both);
                } else if self.terms.is_empty() {
                    self.emit_term(text, TermScope::Name);
                } else {
                    log::trace!("query token at byte {} is a parameter", token.position);
                    self.parameters.push(text.to_string());
                }
            }
        }
    }

    fn emit_term(&mut self, text: &str, scope: TermScope) {
        if text.is_empty() {
            return;
        }

        let operation = self.pending_operation.take().unwrap_or_default();
        let negated = std::mem::take(&mut self.pending_negation);
        self.terms.push(Term::new(text, scope, operation, negated));
    }
}
