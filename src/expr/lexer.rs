//! Tokenizer for trigger-rule and argument-list source text.
//!
//! The scanner is a small state machine: every step consumes input from the
//! current position, emits at most one token and names the next state. Scanning
//! stops at the first unrecoverable character.

use crate::error::LexError;

const LEFT_PARENTHESIS: &str = "(";
const RIGHT_PARENTHESIS: &str = ")";
const COMMA: &str = ",";
const STRING_EQUAL: &str = "==";
const REGEX_EQUAL: &str = "~=";
const AND: &str = "&&";
const OR: &str = "||";
const NOT: &str = "!";
const SHA1: &str = "sha1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input; always the last token.
    Eof,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `~=`
    RegexEqual,
    /// `==`
    StringEqual,
    /// `!`
    Not,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `'...'` literal; the text holds the unescaped contents.
    SingleQuoted,
    /// `"..."` literal; the text holds the unescaped contents.
    DoubleQuoted,
    /// `sha1`, in any letter case.
    Sha1,
}

impl TokenKind {
    pub fn is_literal(self) -> bool {
        matches!(self, TokenKind::SingleQuoted | TokenKind::DoubleQuoted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token; for literals, the unescaped content between
    /// the quotes. Empty for `Eof`.
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single,
    Double,
}

impl Quote {
    fn mark(self) -> char {
        match self {
            Quote::Single => '\'',
            Quote::Double => '"',
        }
    }

    fn kind(self) -> TokenKind {
        match self {
            Quote::Single => TokenKind::SingleQuoted,
            Quote::Double => TokenKind::DoubleQuoted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Begin,
    /// Fixed-text token whose text is already known to be at the cursor.
    Fixed(TokenKind, &'static str),
    Quoted(Quote),
}

/// Single-use scanner over one input string.
pub struct Lexer<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
    /// Byte offset of the cursor.
    pos: usize,
    open_parentheses: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            tokens: Vec::new(),
            errors: Vec::new(),
            pos: 0,
            open_parentheses: 0,
        }
    }

    /// Runs the scanner to completion and returns the tokens and errors.
    pub fn scan(mut self) -> (Vec<Token>, Vec<LexError>) {
        let mut state = Some(State::Begin);
        while let Some(current) = state {
            state = self.step(current);
        }

        if self.open_parentheses > 0 {
            let err = LexError::MissingClosingParenthesis {
                position: self.char_offset(),
            };
            self.errors.push(err);
        }

        (self.tokens, self.errors)
    }

    fn step(&mut self, state: State) -> Option<State> {
        match state {
            State::Begin => self.lex_begin(),
            State::Fixed(kind, text) => self.lex_fixed(kind, text),
            State::Quoted(quote) => self.lex_quoted(quote),
        }
    }

    fn lex_begin(&mut self) -> Option<State> {
        self.skip_whitespace();

        let rest = self.remaining();
        let Some(ch) = rest.chars().next() else {
            self.emit(Token::new(TokenKind::Eof, ""));
            return None;
        };

        let fixed = [
            (LEFT_PARENTHESIS, TokenKind::LParen),
            (RIGHT_PARENTHESIS, TokenKind::RParen),
            (COMMA, TokenKind::Comma),
        ];
        if let Some((text, kind)) = fixed.into_iter().find(|(text, _)| rest.starts_with(text)) {
            return Some(State::Fixed(kind, text));
        }

        match ch {
            '\'' => return Some(State::Quoted(Quote::Single)),
            '"' => return Some(State::Quoted(Quote::Double)),
            _ => {}
        }

        let operators = [
            (STRING_EQUAL, TokenKind::StringEqual),
            (REGEX_EQUAL, TokenKind::RegexEqual),
            (AND, TokenKind::And),
            (OR, TokenKind::Or),
            (NOT, TokenKind::Not),
        ];
        if let Some((text, kind)) = operators.into_iter().find(|(text, _)| rest.starts_with(text)) {
            return Some(State::Fixed(kind, text));
        }

        if rest
            .get(..SHA1.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SHA1))
        {
            return Some(State::Fixed(TokenKind::Sha1, SHA1));
        }

        self.fail(LexError::UnexpectedCharacter {
            found: ch,
            position: self.char_offset(),
        })
    }

    fn lex_fixed(&mut self, kind: TokenKind, text: &'static str) -> Option<State> {
        match kind {
            TokenKind::LParen => self.open_parentheses += 1,
            TokenKind::RParen => {
                if self.open_parentheses == 0 {
                    return self.fail(LexError::UnexpectedClosingParenthesis {
                        position: self.char_offset(),
                    });
                }
                self.open_parentheses -= 1;
            }
            _ => {}
        }

        // `sha1` keeps the case it was written with.
        let end = self.pos + text.len();
        let token = Token::new(kind, &self.input[self.pos..end]);
        self.pos = end;
        self.emit(token);
        Some(State::Begin)
    }

    fn lex_quoted(&mut self, quote: Quote) -> Option<State> {
        let mark = quote.mark();
        self.pos += mark.len_utf8();

        let mut text = String::new();
        let mut chars = self.remaining().chars().peekable();
        let mut consumed = 0;
        loop {
            match chars.next() {
                None => {
                    self.pos += consumed;
                    self.emit(Token::new(TokenKind::Eof, ""));
                    let position = self.char_offset();
                    return self.fail(match quote {
                        Quote::Single => LexError::UnterminatedSingleQuote { position },
                        Quote::Double => LexError::UnterminatedDoubleQuote { position },
                    });
                }
                Some('\\') if chars.peek() == Some(&mark) => {
                    chars.next();
                    consumed += 1 + mark.len_utf8();
                    text.push(mark);
                }
                Some(c) if c == mark => {
                    consumed += mark.len_utf8();
                    break;
                }
                Some(c) => {
                    consumed += c.len_utf8();
                    text.push(c);
                }
            }
        }

        self.pos += consumed;
        self.emit(Token::new(quote.kind(), text));
        Some(State::Begin)
    }

    fn skip_whitespace(&mut self) {
        let rest = self.remaining();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn char_offset(&self) -> usize {
        self.input[..self.pos].chars().count()
    }

    fn emit(&mut self, token: Token) {
        log::trace!("token {:?} {:?}", token.kind, token.text);
        self.tokens.push(token);
    }

    fn fail(&mut self, err: LexError) -> Option<State> {
        self.errors.push(err);
        None
    }
}

/// Tokenizes `input`, returning every emitted token and the lexical errors.
pub fn scan(input: &str) -> (Vec<Token>, Vec<LexError>) {
    Lexer::new(input).scan()
}

/// Tokenizes `input`, failing with the first lexical error.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let (tokens, errors) = scan(input);
    match errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(tokens),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn multi_character_operators_win_over_not() {
        assert_eq!(
            kinds("! == ~= && ||"),
            vec![
                TokenKind::Not,
                TokenKind::StringEqual,
                TokenKind::RegexEqual,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn whitespace_is_not_required_between_tokens() {
        assert_eq!(
            kinds("('a'=='b')"),
            vec![
                TokenKind::LParen,
                TokenKind::SingleQuoted,
                TokenKind::StringEqual,
                TokenKind::SingleQuoted,
                TokenKind::RParen,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn char_offsets_count_characters_not_bytes() {
        let err = tokenize("'é' #").unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                found: '#',
                position: 4
            }
        );
    }
}
