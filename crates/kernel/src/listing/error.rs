//! Listing filter error types.
//!
//! Every variant except `PlaceholderMismatch` describes a bad client request
//! and carries enough context to be shown back to the caller.

use thiserror::Error;

/// Errors raised while validating filter arguments or compiling a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The resource has no catalog.
    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    /// A filter references a field absent from the resource's catalog.
    #[error("resource '{resource}' has no filterable field '{field}'")]
    UnknownField { resource: String, field: String },

    /// Operator token outside `$in` / `$nin`.
    #[error("unsupported operator '{0}', expected $in or $nin")]
    UnsupportedOperator(String),

    /// List operator applied to a single-valued field.
    #[error("field '{field}' does not accept {operator}")]
    OperatorNotAllowed { field: String, operator: String },

    /// More than one condition for the same field in one request.
    #[error("too many conditions for '{field}'")]
    TooManyConditions { field: String },

    /// No supplied value has the field's type.
    #[error("no valid {expected} value for '{field}'")]
    NoValidValues {
        field: String,
        expected: &'static str,
    },

    /// Some supplied values do not have the field's type.
    #[error("invalid {expected} values for '{field}': {}", invalid.join(", "))]
    PartiallyValidValues {
        field: String,
        expected: &'static str,
        invalid: Vec<String>,
    },

    /// The raw filter value could not be parsed.
    #[error("malformed filter for '{field}': {reason}")]
    MalformedFilter { field: String, reason: String },

    /// Sort expression names an unknown or unsortable field.
    #[error("invalid sort '{0}'")]
    InvalidSort(String),

    /// Page or page size is out of range or not a number.
    #[error("invalid paging: {0}")]
    InvalidPage(String),

    /// Compiled placeholders and bound arguments disagree.
    #[error("placeholder mismatch: {placeholders} placeholders, {args} arguments")]
    PlaceholderMismatch { placeholders: usize, args: usize },
}

impl FilterError {
    /// Whether this error is a defect in query compilation rather than a
    /// bad request. Internal errors must not be shown to clients.
    pub fn is_internal(&self) -> bool {
        matches!(self, FilterError::PlaceholderMismatch { .. })
    }
}

/// Result type alias using FilterError.
pub type FilterResult<T> = Result<T, FilterError>;
