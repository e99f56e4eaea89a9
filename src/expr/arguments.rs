//! `source.name` argument references and comma-separated argument lists.

use crate::ast::{ArgumentReference, Source};
use crate::error::{ArgumentError, SyntaxError, SyntaxErrorKind};

use super::lexer::{Token, TokenKind};
use super::TokenCursor;

/// Parses a `source.name` literal, splitting at the first `.`.
///
/// Everything after the first dot is the name, so `payload.a.b` names the
/// nested payload field `a.b`.
pub fn parse_argument(literal: &str) -> Result<ArgumentReference, ArgumentError> {
    let (source, name) = literal
        .split_once('.')
        .ok_or(ArgumentError::InvalidFormat)?;
    let source: Source = source.parse()?;
    if name.is_empty() {
        return Err(ArgumentError::InvalidName);
    }
    Ok(ArgumentReference::new(source, name))
}

/// Parses a token stream of the form `literal (, literal)*`.
pub fn parse_argument_list(tokens: &[Token]) -> Result<Vec<ArgumentReference>, SyntaxError> {
    let cursor = TokenCursor::new(tokens);
    let mut arguments = Vec::new();
    let mut expecting_argument = true;

    for (idx, token) in tokens.iter().enumerate() {
        match token.kind {
            kind if kind.is_literal() => {
                if !expecting_argument {
                    return Err(cursor.error(SyntaxErrorKind::ExpectedComma, idx, 1));
                }
                let argument = parse_argument(&token.text)
                    .map_err(|e| cursor.error(SyntaxErrorKind::Argument(e), idx, 1))?;
                arguments.push(argument);
                expecting_argument = false;
            }
            TokenKind::Comma => {
                if expecting_argument {
                    return Err(cursor.error(SyntaxErrorKind::UnexpectedToken, idx, 1));
                }
                expecting_argument = true;
            }
            TokenKind::Eof => {
                if expecting_argument {
                    return Err(cursor.error(SyntaxErrorKind::ExpectedArgument, idx, 1));
                }
                return Ok(arguments);
            }
            _ => return Err(cursor.error(SyntaxErrorKind::UnexpectedToken, idx, 1)),
        }
    }

    // Only reachable for a stream without an end-of-input token.
    Err(cursor.error(SyntaxErrorKind::ExpectedArgument, tokens.len(), 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_dot_only() {
        let arg = parse_argument("payload.commits.0.id").unwrap();
        assert_eq!(arg.source, Source::Payload);
        assert_eq!(arg.name, "commits.0.id");
    }

    #[test]
    fn rejects_malformed_literals_in_order() {
        assert_eq!(parse_argument("header"), Err(ArgumentError::InvalidFormat));
        assert_eq!(
            parse_argument("body.x"),
            Err(ArgumentError::InvalidSource("body".to_string()))
        );
        assert_eq!(parse_argument("bogus."), Err(ArgumentError::InvalidSource("bogus".to_string())));
        assert_eq!(parse_argument("query."), Err(ArgumentError::InvalidName));
    }
}
