//! Recursive-descent parser producing [`Rule`] trees from tokens.
//!
//! Each nesting level (the whole input, a parenthesised group, or the body of
//! `!( ... )`) is parsed by one call of [`Parser::parse_level`], which keeps its
//! operands and pending operator on its own stack frame, so nesting is capped
//! at [`MAX_DEPTH`]. Productions are recognized by fixed-length token
//! lookahead; the first one that matches wins.

use std::mem;

use crate::ast::{ArgumentReference, MatchRule, Rule, Source};
use crate::error::{SyntaxError, SyntaxErrorKind};

use super::arguments::parse_argument;
use super::lexer::{Token, TokenKind};
use super::TokenCursor;

/// Deepest nesting level a rule may reach. The whole input is level 1 and
/// every group or `!( ... )` adds one.
pub const MAX_DEPTH: usize = 128;

/// Parses a complete token stream (as produced by the lexer) into a rule.
pub fn parse(tokens: &[Token]) -> Result<Rule, SyntaxError> {
    let mut parser = Parser {
        cursor: TokenCursor::new(tokens),
        pos: 0,
    };
    parser.parse_level(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Production {
    And,
    Or,
    GroupEnd,
    Operand(Operand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    NotGroup,
    MatchValue,
    MatchRegex,
    MatchHashSha1,
    GroupStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
}

/// Operands collected for one nesting level.
///
/// `&&` binds tighter than `||`: while an and-run follows earlier or-operands,
/// those operands wait in `held` until the run is closed.
#[derive(Debug, Default)]
struct Level {
    siblings: Vec<Rule>,
    held: Vec<Rule>,
    operator: Option<Operator>,
    expecting_operand: bool,
}

impl Level {
    fn accepts_operator(&self) -> bool {
        !self.siblings.is_empty() && !self.expecting_operand
    }

    fn accepts_operand(&self) -> bool {
        self.siblings.is_empty() || self.expecting_operand
    }

    fn push(&mut self, rule: Rule) {
        self.siblings.push(rule);
        self.expecting_operand = false;
    }

    fn and(&mut self) {
        if self.operator == Some(Operator::Or) {
            if let Some(last) = self.siblings.pop() {
                self.held = mem::take(&mut self.siblings);
                self.siblings.push(last);
            }
        }
        self.operator = Some(Operator::And);
        self.expecting_operand = true;
    }

    fn or(&mut self) {
        if self.operator == Some(Operator::And) {
            let run = mem::take(&mut self.siblings);
            self.siblings = mem::take(&mut self.held);
            self.siblings.push(Rule::And(run));
        }
        self.operator = Some(Operator::Or);
        self.expecting_operand = true;
    }

    fn close(mut self) -> Result<Rule, SyntaxErrorKind> {
        if self.siblings.is_empty() {
            return Err(SyntaxErrorKind::InvalidRule);
        }
        if self.expecting_operand {
            return Err(SyntaxErrorKind::ExpectedValidRule);
        }

        match self.operator {
            Some(_) if self.siblings.len() == 1 => Err(SyntaxErrorKind::UnexpectedToken),
            Some(Operator::And) => {
                let run = Rule::And(self.siblings);
                if self.held.is_empty() {
                    Ok(run)
                } else {
                    self.held.push(run);
                    Ok(Rule::Or(self.held))
                }
            }
            Some(Operator::Or) => Ok(Rule::Or(self.siblings)),
            None => match self.siblings.pop() {
                Some(rule) if self.siblings.is_empty() => Ok(rule),
                _ => Err(SyntaxErrorKind::UnexpectedToken),
            },
        }
    }
}

struct Parser<'a> {
    cursor: TokenCursor<'a>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_level(&mut self, depth: usize) -> Result<Rule, SyntaxError> {
        let mut level = Level::default();

        let end = loop {
            let start = self.pos;
            let Some(production) = self.recognize() else {
                if self.cursor.is_at(start, TokenKind::Eof) && depth == 1 {
                    break start;
                }
                return Err(self.cursor.error(SyntaxErrorKind::UnexpectedToken, start, depth));
            };

            match production {
                Production::And | Production::Or => {
                    if !level.accepts_operator() {
                        return Err(self.cursor.error(SyntaxErrorKind::UnexpectedToken, start, depth));
                    }
                    if production == Production::And {
                        level.and();
                    } else {
                        level.or();
                    }
                    self.pos += 1;
                }
                Production::GroupEnd => {
                    if depth == 1 {
                        return Err(self.cursor.error(SyntaxErrorKind::UnexpectedToken, start, depth));
                    }
                    self.pos += 1;
                    break start;
                }
                Production::Operand(operand) => {
                    if !level.accepts_operand() {
                        return Err(self.cursor.error(SyntaxErrorKind::UnexpectedToken, start, depth));
                    }
                    let rule = self.parse_operand(operand, start, depth)?;
                    level.push(rule);
                }
            }
        };

        level
            .close()
            .map_err(|kind| self.cursor.error(kind, end, depth))
    }

    fn parse_operand(
        &mut self,
        operand: Operand,
        start: usize,
        depth: usize,
    ) -> Result<Rule, SyntaxError> {
        let rule = match operand {
            Operand::NotGroup => {
                self.descend(start, depth)?;
                self.pos += 2;
                let inner = self.parse_level(depth + 1).map_err(|e| {
                    self.cursor
                        .error(SyntaxErrorKind::Not(Box::new(e)), start, depth)
                })?;
                Rule::Not(Box::new(inner))
            }
            Operand::GroupStart => {
                self.descend(start, depth)?;
                self.pos += 1;
                self.parse_level(depth + 1).map_err(|e| {
                    self.cursor
                        .error(SyntaxErrorKind::Group(Box::new(e)), start, depth)
                })?
            }
            Operand::MatchValue => {
                let parameter = self.parameter(start, depth)?;
                let value = self.cursor.text_at(start + 2).to_string();
                self.pos += 3;
                Rule::Match(MatchRule::Value { parameter, value })
            }
            Operand::MatchRegex => {
                let parameter = self.parameter(start, depth)?;
                let regex = self.cursor.text_at(start + 2).to_string();
                self.pos += 3;
                Rule::Match(MatchRule::Regex { parameter, regex })
            }
            Operand::MatchHashSha1 => {
                if !is_payload_target(self.cursor.text_at(start + 4)) {
                    return Err(self.cursor.error(
                        SyntaxErrorKind::InvalidSha1Target,
                        start + 4,
                        depth,
                    ));
                }
                let parameter = self.parameter(start, depth)?;
                let secret = self.cursor.text_at(start + 6).to_string();
                self.pos += 8;
                Rule::Match(MatchRule::PayloadHashSha1 { parameter, secret })
            }
        };
        Ok(rule)
    }

    /// Refuses to open another level once `MAX_DEPTH` is reached, reporting
    /// at the opening token.
    fn descend(&self, start: usize, depth: usize) -> Result<(), SyntaxError> {
        if depth >= MAX_DEPTH {
            return Err(self.cursor.error(SyntaxErrorKind::NestingTooDeep, start, depth));
        }
        Ok(())
    }

    fn recognize(&self) -> Option<Production> {
        use TokenKind as K;

        let p = self.pos;
        let c = &self.cursor;
        let production = if c.is_at(p, K::And) {
            Production::And
        } else if c.is_at(p, K::Or) {
            Production::Or
        } else if c.is_at(p, K::Not) && c.is_at(p + 1, K::LParen) {
            Production::Operand(Operand::NotGroup)
        } else if c.is_literal_at(p) && c.is_at(p + 1, K::StringEqual) && c.is_literal_at(p + 2) {
            Production::Operand(Operand::MatchValue)
        } else if c.is_literal_at(p) && c.is_at(p + 1, K::RegexEqual) && c.is_literal_at(p + 2) {
            Production::Operand(Operand::MatchRegex)
        } else if c.is_literal_at(p)
            && c.is_at(p + 1, K::StringEqual)
            && c.is_at(p + 2, K::Sha1)
            && c.is_at(p + 3, K::LParen)
            && c.is_literal_at(p + 4)
            && c.is_at(p + 5, K::Comma)
            && c.is_literal_at(p + 6)
            && c.is_at(p + 7, K::RParen)
        {
            Production::Operand(Operand::MatchHashSha1)
        } else if c.is_at(p, K::LParen) {
            Production::Operand(Operand::GroupStart)
        } else if c.is_at(p, K::RParen) {
            Production::GroupEnd
        } else {
            return None;
        };
        Some(production)
    }

    fn parameter(&self, idx: usize, depth: usize) -> Result<ArgumentReference, SyntaxError> {
        parse_argument(self.cursor.text_at(idx))
            .map_err(|e| self.cursor.error(SyntaxErrorKind::Argument(e), idx, depth))
    }
}

/// The hash of a sha1 match is always taken over the request payload, written
/// either as `payload` or as a `payload.*` reference.
fn is_payload_target(target: &str) -> bool {
    target == Source::Payload.as_str()
        || parse_argument(target).is_ok_and(|arg| arg.source == Source::Payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> Rule {
        Rule::Match(MatchRule::Value {
            parameter: ArgumentReference::new(Source::Query, name),
            value: "1".to_string(),
        })
    }

    #[test]
    fn and_after_or_detaches_last_operand() {
        let mut level = Level::default();
        level.push(leaf("a"));
        level.or();
        level.push(leaf("b"));
        level.and();
        level.push(leaf("c"));
        level.or();
        level.push(leaf("d"));

        assert_eq!(
            level.close().unwrap(),
            Rule::Or(vec![
                leaf("a"),
                Rule::And(vec![leaf("b"), leaf("c")]),
                leaf("d")
            ])
        );
    }

    #[test]
    fn empty_and_dangling_levels_fail_to_close() {
        assert_eq!(
            Level::default().close(),
            Err(SyntaxErrorKind::InvalidRule)
        );

        let mut level = Level::default();
        level.push(leaf("a"));
        level.and();
        assert_eq!(level.close(), Err(SyntaxErrorKind::ExpectedValidRule));
    }

    #[test]
    fn sha1_target_accepts_payload_forms_only() {
        assert!(is_payload_target("payload"));
        assert!(is_payload_target("payload.body"));
        assert!(!is_payload_target("payload."));
        assert!(!is_payload_target("query.q"));
        assert!(!is_payload_target("Payload"));
    }
}
