//! Error definitions for every rule compilation stage.

use std::fmt;

use thiserror::Error;

use crate::ast::Source;
use crate::expr::parser::MAX_DEPTH;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Top-level error type returned by public APIs.
pub enum RuleError {
    /// The input could not be tokenized.
    #[error("error while parsing input string:\n\t{0}")]
    Lex(#[from] LexError),
    /// The token stream does not form a valid rule or argument list.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// A regex-match rule carries a pattern that does not compile.
    #[error("invalid regex for parameter '{parameter}': {message}")]
    Pattern { parameter: String, message: String },
    /// Output serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Tokenizer failure. Positions are 0-based character offsets into the input.
pub enum LexError {
    /// A `'` literal runs to the end of the input.
    #[error("missing closing single quotation mark at position: {position}")]
    UnterminatedSingleQuote { position: usize },
    /// A `"` literal runs to the end of the input.
    #[error("missing closing double quotation mark at position: {position}")]
    UnterminatedDoubleQuote { position: usize },
    /// More `(` than `)` by the end of the input.
    #[error("missing closing parenthesis at position: {position}")]
    MissingClosingParenthesis { position: usize },
    /// A `)` with no open group to close.
    #[error("unexpected closing parenthesis at position: {position}")]
    UnexpectedClosingParenthesis { position: usize },
    /// A character that starts no token.
    #[error("unexpected token {found} at position: {position}")]
    UnexpectedCharacter { found: char, position: usize },
}

impl LexError {
    /// Character offset at which the error was detected.
    pub fn position(&self) -> usize {
        match self {
            LexError::UnterminatedSingleQuote { position }
            | LexError::UnterminatedDoubleQuote { position }
            | LexError::MissingClosingParenthesis { position }
            | LexError::UnexpectedClosingParenthesis { position }
            | LexError::UnexpectedCharacter { position, .. } => *position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Failure to read a `source.name` argument literal.
pub enum ArgumentError {
    /// No `.` separating source and name.
    #[error("argument literal must be in format: source.name")]
    InvalidFormat,
    /// Source is not one of the known request parts.
    #[error("parameter source must be one of [{}]", Source::names().join(", "))]
    InvalidSource(String),
    /// Nothing after the `.`.
    #[error("parameter name cannot be blank")]
    InvalidName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Classification of a parser failure.
pub enum SyntaxErrorKind {
    /// Token that no production accepts at this point.
    UnexpectedToken,
    /// Level closed without any rule in it.
    InvalidRule,
    /// Level closed right after `&&` or `||`.
    ExpectedValidRule,
    /// Argument list ended where a reference was required.
    ExpectedArgument,
    /// Two argument references without a comma between them.
    ExpectedComma,
    /// Parameter literal is not a valid `source.name` reference.
    Argument(ArgumentError),
    /// The hash target of `sha1(...)` is not the payload.
    InvalidSha1Target,
    /// A group or `!(` would open a level beyond `MAX_DEPTH`.
    NestingTooDeep,
    /// Failure inside a parenthesised group.
    Group(Box<SyntaxError>),
    /// Failure inside a `!( ... )` rule.
    Not(Box<SyntaxError>),
}

impl SyntaxErrorKind {
    fn phrase(&self) -> &'static str {
        match self {
            SyntaxErrorKind::UnexpectedToken => "unexpected token",
            SyntaxErrorKind::InvalidRule => "invalid rule",
            SyntaxErrorKind::ExpectedValidRule => "expected valid rule",
            SyntaxErrorKind::ExpectedArgument => "expected argument",
            SyntaxErrorKind::ExpectedComma => "expected comma",
            SyntaxErrorKind::Argument(_) | SyntaxErrorKind::InvalidSha1Target => "syntax error",
            SyntaxErrorKind::NestingTooDeep => "rule nesting too deep",
            SyntaxErrorKind::Group(_) => "error parsing expression group",
            SyntaxErrorKind::Not(_) => "error parsing not rule",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Parser failure anchored at a token.
///
/// `position` is the sum of the character lengths of all token texts preceding
/// the offending token. `depth` is the nesting level the error was raised at and
/// controls the indentation of detail lines and nested errors.
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub token: String,
    pub position: usize,
    pub depth: usize,
}

impl SyntaxError {
    /// Innermost error of a nested group/not chain.
    pub fn innermost(&self) -> &SyntaxError {
        match &self.kind {
            SyntaxErrorKind::Group(inner) | SyntaxErrorKind::Not(inner) => inner.innermost(),
            _ => self,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (token: {}, pos: {})",
            self.kind.phrase(),
            self.token,
            self.position
        )?;

        let indent = "\t".repeat(self.depth);
        match &self.kind {
            SyntaxErrorKind::Argument(detail) => write!(f, "\n{indent}{detail}"),
            SyntaxErrorKind::InvalidSha1Target => write!(f, "\n{indent}sha1 target must be payload"),
            SyntaxErrorKind::NestingTooDeep => {
                write!(f, "\n{indent}rules may nest at most {MAX_DEPTH} levels")
            }
            SyntaxErrorKind::Group(inner) | SyntaxErrorKind::Not(inner) => {
                write!(f, "\n{indent}{inner}")
            }
            _ => Ok(()),
        }
    }
}

impl std::error::Error for SyntaxError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(kind: SyntaxErrorKind, token: &str, position: usize, depth: usize) -> SyntaxError {
        SyntaxError {
            kind,
            token: token.to_string(),
            position,
            depth,
        }
    }

    #[test]
    fn nested_errors_indent_per_depth() {
        let inner = at(
            SyntaxErrorKind::Argument(ArgumentError::InvalidName),
            "header.",
            1,
            2,
        );
        let outer = at(SyntaxErrorKind::Group(Box::new(inner)), "(", 0, 1);

        assert_eq!(
            outer.to_string(),
            "error parsing expression group (token: (, pos: 0)\n\tsyntax error (token: header., pos: 1)\n\t\tparameter name cannot be blank"
        );
        assert_eq!(outer.innermost().token, "header.");
    }

    #[test]
    fn invalid_source_lists_known_sources() {
        let err = ArgumentError::InvalidSource("body".to_string());
        assert_eq!(
            err.to_string(),
            "parameter source must be one of [header, payload, query, string]"
        );
    }

    #[test]
    fn lex_errors_are_prefixed_at_top_level() {
        let err = RuleError::from(LexError::UnexpectedCharacter {
            found: '#',
            position: 3,
        });
        assert_eq!(
            err.to_string(),
            "error while parsing input string:\n\tunexpected token # at position: 3"
        );
    }
}
