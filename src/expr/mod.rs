//! Trigger-rule expression language.

/// `source.name` references and comma-separated argument lists.
pub mod arguments;
/// Tokenizer for expression source text.
pub mod lexer;
/// Recursive-descent rule parser.
pub mod parser;

use crate::ast::{ArgumentReference, Rule};
use crate::error::{RuleError, SyntaxError, SyntaxErrorKind};

use lexer::{Token, TokenKind};

const EOF_MARKER: &str = "<EOF>";

/// Compiles trigger-rule source text into a rule tree.
pub fn parse_rule(input: &str) -> Result<Rule, RuleError> {
    let tokens = lexer::tokenize(input)?;
    let result = parser::parse(&tokens);
    log::debug!(
        "compiled trigger rule from {} tokens: {}",
        tokens.len(),
        if result.is_ok() { "ok" } else { "failed" }
    );
    Ok(result?)
}

/// Compiles a comma-separated list of `source.name` literals.
pub fn parse_arguments(input: &str) -> Result<Vec<ArgumentReference>, RuleError> {
    let tokens = lexer::tokenize(input)?;
    let result = arguments::parse_argument_list(&tokens);
    log::debug!(
        "compiled argument list from {} tokens: {}",
        tokens.len(),
        if result.is_ok() { "ok" } else { "failed" }
    );
    Ok(result?)
}

/// Read-only view over a token sequence used to anchor diagnostics.
pub(crate) struct TokenCursor<'a> {
    tokens: &'a [Token],
}

impl<'a> TokenCursor<'a> {
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        Self { tokens }
    }

    pub(crate) fn kind_at(&self, idx: usize) -> Option<TokenKind> {
        self.tokens.get(idx).map(|t| t.kind)
    }

    pub(crate) fn is_at(&self, idx: usize, kind: TokenKind) -> bool {
        self.kind_at(idx) == Some(kind)
    }

    pub(crate) fn is_literal_at(&self, idx: usize) -> bool {
        self.kind_at(idx).is_some_and(TokenKind::is_literal)
    }

    pub(crate) fn text_at(&self, idx: usize) -> &'a str {
        self.tokens.get(idx).map_or("", |t| t.text.as_str())
    }

    /// Offset of token `idx`, reconstructed from the texts of the tokens before it.
    pub(crate) fn offset_of(&self, idx: usize) -> usize {
        self.tokens
            .iter()
            .take(idx)
            .map(|t| t.text.chars().count())
            .sum()
    }

    pub(crate) fn error(&self, kind: SyntaxErrorKind, idx: usize, depth: usize) -> SyntaxError {
        let token = match self.tokens.get(idx) {
            Some(t) if t.kind != TokenKind::Eof => t.text.clone(),
            _ => EOF_MARKER.to_string(),
        };
        SyntaxError {
            kind,
            token,
            position: self.offset_of(idx),
            depth,
        }
    }
}
