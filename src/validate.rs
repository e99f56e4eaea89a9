//! Validation passes over compiled rules.

use regex::Regex;

use crate::ast::{MatchRule, Rule};
use crate::error::RuleError;

/// Compiles every regex-match pattern in `rule`.
///
/// Parsing keeps patterns as plain text; this pass lets callers reject a rule
/// before storing it rather than when the first request is evaluated. Fails on
/// the first pattern that does not compile, in left-to-right order.
pub fn validate_patterns(rule: &Rule) -> Result<(), RuleError> {
    rule.for_each_match(&mut |leaf| match leaf {
        MatchRule::Regex { parameter, regex } => Regex::new(regex)
            .map(|_| ())
            .map_err(|e| RuleError::Pattern {
                parameter: parameter.to_string(),
                message: e.to_string(),
            }),
        _ => Ok(()),
    })
}
