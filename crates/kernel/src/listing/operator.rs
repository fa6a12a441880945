//! Filter operator vocabulary.
//!
//! Operator tokens are looked up in a constant table; only the resolved enum
//! ever selects SQL text.

use std::fmt;

use super::error::{FilterError, FilterResult};

/// Comparison applied by a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Implicit equality (bare value, no operator key).
    Eq,
    /// `$in`: value in list.
    In,
    /// `$nin`: value not in list.
    NotIn,
}

/// Wire tokens for the explicit operators.
const OPERATOR_TOKENS: [(&str, Operator); 2] = [("$in", Operator::In), ("$nin", Operator::NotIn)];

impl Operator {
    /// Resolve a client-supplied operator token.
    pub fn resolve(token: &str) -> FilterResult<Self> {
        OPERATOR_TOKENS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, op)| *op)
            .ok_or_else(|| FilterError::UnsupportedOperator(token.to_string()))
    }

    /// SQL following the column name.
    pub fn sql_template(self) -> &'static str {
        match self {
            Operator::Eq => "= ?",
            Operator::In => "IN (?)",
            Operator::NotIn => "NOT IN (?)",
        }
    }

    /// Whether the operator takes a value list.
    pub fn is_list(self) -> bool {
        !matches!(self, Operator::Eq)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Eq => f.write_str("equality"),
            Operator::In => f.write_str("$in"),
            Operator::NotIn => f.write_str("$nin"),
        }
    }
}
