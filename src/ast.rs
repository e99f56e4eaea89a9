//! Compiled rule model shared by the parser, serializers and callers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ArgumentError, RuleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Where a runtime parameter value is taken from.
pub enum Source {
    /// HTTP request header.
    Header,
    /// Request body.
    Payload,
    /// URL query string.
    Query,
    /// The reference name itself, used as a literal string.
    String,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::Header, Source::Payload, Source::Query, Source::String];

    pub fn as_str(self) -> &'static str {
        match self {
            Source::Header => "header",
            Source::Payload => "payload",
            Source::Query => "query",
            Source::String => "string",
        }
    }

    /// Accepted source names, in declaration order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.as_str()).collect()
    }
}

impl FromStr for Source {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| ArgumentError::InvalidSource(s.to_string()))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Validated `source.name` parameter reference.
pub struct ArgumentReference {
    pub source: Source,
    pub name: String,
}

impl ArgumentReference {
    pub fn new(source: Source, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
        }
    }
}

impl fmt::Display for ArgumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.source, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
/// Leaf predicate comparing a parameter against a literal, regex or keyed hash.
pub enum MatchRule {
    /// Exact string equality.
    #[serde(rename = "value")]
    Value {
        parameter: ArgumentReference,
        value: String,
    },
    /// Regular expression test; the pattern is kept uncompiled.
    #[serde(rename = "regex")]
    Regex {
        parameter: ArgumentReference,
        regex: String,
    },
    /// Signature check: `parameter` must hold the sha1 HMAC of the payload
    /// keyed with `secret`.
    #[serde(rename = "payload-hash-sha1")]
    PayloadHashSha1 {
        parameter: ArgumentReference,
        secret: String,
    },
}

impl MatchRule {
    pub fn parameter(&self) -> &ArgumentReference {
        match self {
            MatchRule::Value { parameter, .. }
            | MatchRule::Regex { parameter, .. }
            | MatchRule::PayloadHashSha1 { parameter, .. } => parameter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Compiled trigger rule.
///
/// `And` and `Or` produced by the parser always hold at least two children.
pub enum Rule {
    /// A single parameter comparison.
    Match(MatchRule),
    /// Holds when every child holds.
    And(Vec<Rule>),
    /// Holds when any child holds.
    Or(Vec<Rule>),
    /// Holds when the child does not.
    Not(Box<Rule>),
}

impl Rule {
    /// Serializes the rule to webhook trigger-rule JSON.
    ///
    /// When `pretty` is `true`, output is formatted with indentation.
    pub fn to_json_string(&self, pretty: bool) -> Result<String, RuleError> {
        to_json_string(self, pretty)
    }

    /// Visits every match leaf, depth first, left to right.
    pub fn for_each_match<'a, E>(
        &'a self,
        visit: &mut impl FnMut(&'a MatchRule) -> Result<(), E>,
    ) -> Result<(), E> {
        match self {
            Rule::Match(rule) => visit(rule),
            Rule::And(children) | Rule::Or(children) => {
                for child in children {
                    child.for_each_match(visit)?;
                }
                Ok(())
            }
            Rule::Not(child) => child.for_each_match(visit),
        }
    }
}

/// Serializes a parsed argument list to JSON.
pub fn arguments_to_json_string(
    arguments: &[ArgumentReference],
    pretty: bool,
) -> Result<String, RuleError> {
    to_json_string(arguments, pretty)
}

fn to_json_string<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, RuleError> {
    if pretty {
        serde_json::to_string_pretty(value).map_err(|e| RuleError::Serialization(e.to_string()))
    } else {
        serde_json::to_string(value).map_err(|e| RuleError::Serialization(e.to_string()))
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Value { parameter, value } => {
                write!(f, "{} == {}", quoted(&parameter.to_string()), quoted(value))
            }
            MatchRule::Regex { parameter, regex } => {
                write!(f, "{} ~= {}", quoted(&parameter.to_string()), quoted(regex))
            }
            MatchRule::PayloadHashSha1 { parameter, secret } => write!(
                f,
                "{} == sha1({}, {})",
                quoted(&parameter.to_string()),
                quoted(Source::Payload.as_str()),
                quoted(secret)
            ),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Match(rule) => write!(f, "{rule}"),
            Rule::And(children) => write_joined(f, children, " && "),
            Rule::Or(children) => write_joined(f, children, " || "),
            Rule::Not(child) => match child.as_ref() {
                Rule::And(_) | Rule::Or(_) => write!(f, "!{child}"),
                _ => write!(f, "!({child})"),
            },
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Rule], separator: &str) -> fmt::Result {
    f.write_str("(")?;
    for (idx, child) in children.iter().enumerate() {
        if idx > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}

/// Double-quotes a literal so the lexer reads back the same text.
pub(crate) fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\\\""))
}
