//! Compiler for webhook trigger-rule expressions.
//!
//! A trigger rule such as
//!
//! ```text
//! "header.X-Hub-Signature" == sha1("payload", "s3cret") && "payload.ref" ~= "^refs/heads/main$"
//! ```
//!
//! is tokenized and parsed into a [`Rule`] tree that an evaluator can later
//! run against a request. Argument lists (`"payload.head_commit.id", "header.X"`)
//! compile into [`ArgumentReference`]s.

pub mod ast;
pub mod error;
pub mod expr;
pub mod validate;

pub use ast::{arguments_to_json_string, ArgumentReference, MatchRule, Rule, Source};
pub use error::{ArgumentError, LexError, RuleError, SyntaxError, SyntaxErrorKind};
pub use expr::arguments::parse_argument;
pub use expr::lexer::{scan, Token, TokenKind};
pub use expr::{parse_arguments, parse_rule};
pub use validate::validate_patterns;

/// Compiles a trigger rule and checks that its regex patterns compile.
pub fn compile_rule(input: &str) -> Result<Rule, RuleError> {
    let rule = parse_rule(input)?;
    validate_patterns(&rule)?;
    Ok(rule)
}

/// Compiles a trigger rule straight to webhook trigger-rule JSON.
pub fn compile_rule_to_json(input: &str, pretty: bool) -> Result<String, RuleError> {
    parse_rule(input)?.to_json_string(pretty)
}
