//! Filter conditions and their compilation to a WHERE fragment.
//!
//! A [`Condition`] is built from a raw filter by validating every value
//! against the field's [`ValueKind`]. [`compile_conditions`] then turns a
//! list of conditions into one conjunctive fragment with `?` placeholders;
//! list arguments stay unexpanded until the query is rebound.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::args::RawExpr;
use super::error::{FilterError, FilterResult};
use super::operator::Operator;
use super::types::{Arg, BindValue, FilterField, FilterValue, Fragment, TimeRange, ValueKind};

/// One validated field/operator/values triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    field: &'static FilterField,
    operator: Operator,
    values: Vec<FilterValue>,
}

impl Condition {
    /// Build a condition, enforcing that values are non-empty, that equality
    /// has exactly one value, and that every value fits the field's kind.
    pub fn new(
        field: &'static FilterField,
        operator: Operator,
        values: Vec<FilterValue>,
    ) -> FilterResult<Self> {
        let kind = field.value_kind;

        if operator.is_list() && !kind.accepts_lists() {
            return Err(FilterError::OperatorNotAllowed {
                field: field.name.to_string(),
                operator: operator.to_string(),
            });
        }

        let mismatched: Vec<String> = values
            .iter()
            .filter(|v| !v.matches(kind))
            .map(|v| format!("{v:?}"))
            .collect();
        check_validity(field, values.len() - mismatched.len(), mismatched)?;

        if operator == Operator::Eq && values.len() != 1 {
            return Err(FilterError::MalformedFilter {
                field: field.name.to_string(),
                reason: "equality takes exactly one value".to_string(),
            });
        }

        Ok(Self {
            field,
            operator,
            values,
        })
    }

    /// Validate a raw client filter against `field`.
    pub fn from_raw(field: &'static FilterField, expr: &RawExpr) -> FilterResult<Self> {
        let kind = field.value_kind;

        match expr {
            RawExpr::Text(text) => {
                let value = coerce_text(kind, text).ok_or_else(|| no_valid_values(field))?;
                Self::new(field, Operator::Eq, vec![value])
            }
            RawExpr::Json(json) => {
                let value = coerce_json(kind, json).ok_or_else(|| no_valid_values(field))?;
                Self::new(field, Operator::Eq, vec![value])
            }
            RawExpr::Operators(ops) => {
                // Resolve every token first so an unknown operator is reported
                // even when it appears next to a valid one.
                let mut resolved = Vec::with_capacity(ops.len());
                for (token, value) in ops {
                    resolved.push((Operator::resolve(token)?, value));
                }

                let (operator, raw) = match resolved.as_slice() {
                    [] => return Err(no_valid_values(field)),
                    [single] => *single,
                    _ => {
                        return Err(FilterError::TooManyConditions {
                            field: field.name.to_string(),
                        });
                    }
                };

                if !kind.accepts_lists() {
                    return Err(FilterError::OperatorNotAllowed {
                        field: field.name.to_string(),
                        operator: operator.to_string(),
                    });
                }

                let items: Vec<&Value> = match raw {
                    Value::Array(items) => items.iter().collect(),
                    scalar => vec![scalar],
                };

                let mut values = Vec::with_capacity(items.len());
                let mut invalid = Vec::new();
                for item in items {
                    match coerce_json(kind, item) {
                        Some(value) => values.push(value),
                        None => invalid.push(item.to_string()),
                    }
                }
                check_validity(field, values.len(), invalid)?;

                Self::new(field, operator, values)
            }
        }
    }

    pub fn field(&self) -> &'static FilterField {
        self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn values(&self) -> &[FilterValue] {
        &self.values
    }

    /// Compile to a single predicate and its arguments.
    fn compile(&self) -> Fragment {
        let column = self.field.sql_column;

        match (self.operator, self.values.as_slice()) {
            (Operator::Eq, [FilterValue::TimeRange(range)]) => range_predicate(column, range),
            (Operator::Eq, values) => Fragment {
                sql: format!("{column} {}", Operator::Eq.sql_template()),
                args: values
                    .iter()
                    .filter_map(FilterValue::as_bind)
                    .map(Arg::Scalar)
                    .collect(),
            },
            (operator, values) => Fragment {
                sql: format!("{column} {}", operator.sql_template()),
                args: vec![Arg::List(
                    values.iter().filter_map(FilterValue::as_bind).collect(),
                )],
            },
        }
    }
}

/// Compile conditions into a conjunctive WHERE fragment (without the
/// `WHERE` keyword). No conditions yield an empty fragment.
pub fn compile_conditions(conditions: &[Condition]) -> FilterResult<Fragment> {
    let mut seen = HashSet::with_capacity(conditions.len());
    let mut predicates = Vec::with_capacity(conditions.len());
    let mut args = Vec::with_capacity(conditions.len());

    for condition in conditions {
        if !seen.insert(condition.field.name) {
            return Err(FilterError::TooManyConditions {
                field: condition.field.name.to_string(),
            });
        }

        let fragment = condition.compile();
        if fragment.is_empty() {
            continue;
        }
        predicates.push(fragment.sql);
        args.extend(fragment.args);
    }

    Ok(Fragment {
        sql: predicates.join(" AND "),
        args,
    })
}

fn range_predicate(column: &str, range: &TimeRange) -> Fragment {
    let ts = |t: DateTime<Utc>| Arg::Scalar(BindValue::Timestamp(t));

    match (range.start(), range.end()) {
        (Some(start), Some(end)) => Fragment {
            sql: format!("{column} BETWEEN ? AND ?"),
            args: vec![ts(start), ts(end)],
        },
        (Some(start), None) => Fragment {
            sql: format!("{column} >= ?"),
            args: vec![ts(start)],
        },
        (None, Some(end)) => Fragment {
            sql: format!("{column} <= ?"),
            args: vec![ts(end)],
        },
        (None, None) => Fragment::default(),
    }
}

fn no_valid_values(field: &FilterField) -> FilterError {
    FilterError::NoValidValues {
        field: field.name.to_string(),
        expected: field.value_kind.label(),
    }
}

/// Reject value lists where nothing, or only part, passed validation.
fn check_validity(field: &FilterField, valid: usize, invalid: Vec<String>) -> FilterResult<()> {
    if valid == 0 {
        return Err(no_valid_values(field));
    }
    if !invalid.is_empty() {
        return Err(FilterError::PartiallyValidValues {
            field: field.name.to_string(),
            expected: field.value_kind.label(),
            invalid,
        });
    }
    Ok(())
}

/// Type a bare query-string value.
fn coerce_text(kind: ValueKind, text: &str) -> Option<FilterValue> {
    match kind {
        ValueKind::Int | ValueKind::IntList => text.trim().parse().ok().map(FilterValue::Int),
        ValueKind::String | ValueKind::StringList => Some(FilterValue::Text(text.to_string())),
        ValueKind::TimeRange => None,
    }
}

/// Type a JSON value. Integers must be JSON integers and strings JSON
/// strings; no cross-type coercion.
fn coerce_json(kind: ValueKind, value: &Value) -> Option<FilterValue> {
    match kind {
        ValueKind::Int | ValueKind::IntList => value.as_i64().map(FilterValue::Int),
        ValueKind::String | ValueKind::StringList => {
            value.as_str().map(|s| FilterValue::Text(s.to_string()))
        }
        ValueKind::TimeRange => parse_time_range(value).map(FilterValue::TimeRange),
    }
}

/// Parse `{"from": <rfc3339>, "to": <rfc3339>}`; either bound may be omitted.
fn parse_time_range(value: &Value) -> Option<TimeRange> {
    let object = value.as_object()?;
    let mut from = None;
    let mut to = None;

    for (key, bound) in object {
        let parsed = DateTime::parse_from_rfc3339(bound.as_str()?)
            .ok()?
            .with_timezone(&Utc);
        match key.as_str() {
            "from" => from = Some(parsed),
            "to" => to = Some(parsed),
            _ => return None,
        }
    }

    TimeRange::new(from, to)
}
