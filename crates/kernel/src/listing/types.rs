//! Listing query types.
//!
//! Provides the value types shared by the listing compilers:
//! - FilterField / ValueKind: static column descriptors
//! - FilterValue: typed scalar carried by a condition
//! - BindValue / Arg: bound arguments before and after array expansion
//! - CompiledQuery / BoundQuery: compiler output
//! - ListingResult: a page of rows returned by the listing service

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::FilterError;

/// Value type accepted by a filterable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Single integer, equality only.
    Int,
    /// Integer column that also accepts `$in` / `$nin` lists.
    IntList,
    /// Single string, equality only.
    String,
    /// String column that also accepts `$in` / `$nin` lists.
    StringList,
    /// Timestamp column filtered by a `{from, to}` range.
    TimeRange,
}

impl ValueKind {
    /// Whether `$in` / `$nin` may be applied to this kind.
    pub fn accepts_lists(self) -> bool {
        matches!(self, ValueKind::IntList | ValueKind::StringList)
    }

    /// Human-readable element type, used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            ValueKind::Int | ValueKind::IntList => "integer",
            ValueKind::String | ValueKind::StringList => "string",
            ValueKind::TimeRange => "time range",
        }
    }
}

/// A filterable/sortable column of one resource.
///
/// Descriptors live in static catalog tables and are never built at runtime,
/// so a client-supplied name can only ever select one of these columns.
#[derive(Debug, PartialEq, Eq)]
pub struct FilterField {
    /// Name used in query strings and sort expressions.
    pub name: &'static str,

    /// Column emitted into SQL.
    pub sql_column: &'static str,

    /// Accepted value type.
    pub value_kind: ValueKind,

    /// Whether the field may appear in a sort expression.
    pub sortable: bool,
}

/// Typed scalar attached to a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Int(i64),
    Text(String),
    TimeRange(TimeRange),
}

impl FilterValue {
    /// Whether this value has the element type required by `kind`.
    pub fn matches(&self, kind: ValueKind) -> bool {
        match self {
            FilterValue::Int(_) => matches!(kind, ValueKind::Int | ValueKind::IntList),
            FilterValue::Text(_) => matches!(kind, ValueKind::String | ValueKind::StringList),
            FilterValue::TimeRange(_) => kind == ValueKind::TimeRange,
        }
    }

    /// Convert to a single bindable scalar. Ranges bind as two values and
    /// have no single-scalar form.
    pub fn as_bind(&self) -> Option<BindValue> {
        match self {
            FilterValue::Int(v) => Some(BindValue::Int(*v)),
            FilterValue::Text(v) => Some(BindValue::Text(v.clone())),
            FilterValue::TimeRange(_) => None,
        }
    }
}

/// Inclusive timestamp range. At least one bound is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Build a range, rejecting unbounded or inverted ranges.
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Option<Self> {
        match (from, to) {
            (None, None) => None,
            (Some(f), Some(t)) if f > t => None,
            _ => Some(Self { from, to }),
        }
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.from
    }

    /// Inclusive upper bound.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.to
    }
}

/// One bindable SQL scalar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BindValue {
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

/// Positional argument before dialect rebinding.
///
/// Each `Arg` corresponds to exactly one `?` in a [`CompiledQuery`]; a
/// `List` is expanded into one placeholder per element by
/// [`CompiledQuery::rebind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Arg {
    Scalar(BindValue),
    List(Vec<BindValue>),
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Scalar(BindValue::Int(value))
    }
}

/// SQL fragment with the arguments for its placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub sql: String,
    pub args: Vec<Arg>,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Parameterized query with `?` placeholders, array arguments unexpanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledQuery {
    sql: String,
    args: Vec<Arg>,
}

impl CompiledQuery {
    /// Pair a statement with its arguments, verifying one argument per `?`.
    pub fn new(sql: String, args: Vec<Arg>) -> Result<Self, FilterError> {
        let placeholders = count_placeholders(&sql);
        if placeholders != args.len() {
            return Err(FilterError::PlaceholderMismatch {
                placeholders,
                args: args.len(),
            });
        }
        Ok(Self { sql, args })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }
}

/// Query ready for execution: placeholders in the target dialect's style,
/// one flat value per placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundQuery {
    pub sql: String,
    pub values: Vec<BindValue>,
}

/// Count `?` placeholders in a statement.
pub(crate) fn count_placeholders(sql: &str) -> usize {
    sql.bytes().filter(|b| *b == b'?').count()
}

/// A page of listing rows.
#[derive(Debug, Clone, Serialize)]
pub struct ListingResult {
    /// Rows as JSON objects.
    pub items: Vec<serde_json::Value>,

    /// Total matching rows (before paging).
    pub total: u64,

    /// Current page number (1-indexed).
    pub page: u32,

    /// Rows per page; 0 means unbounded.
    pub per_page: u32,

    /// Total number of pages.
    pub total_pages: u32,

    /// Whether there's a next page.
    pub has_next: bool,

    /// Whether there's a previous page.
    pub has_prev: bool,
}

impl ListingResult {
    /// Create a new result with paging calculations.
    pub fn new(items: Vec<serde_json::Value>, total: u64, page: u32, per_page: u32) -> Self {
        let total_pages = if per_page > 0 {
            u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
        } else {
            1
        };

        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}
