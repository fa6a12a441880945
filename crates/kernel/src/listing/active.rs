//! Default visibility rule for soft-deleted rows.
//!
//! Resources with an [`ActiveRule`](super::catalog::ActiveRule) hide rows in
//! their "deactive" state unless the caller filters on the flag explicitly.

use std::collections::HashMap;

use super::catalog::{Catalog, Resource};
use super::condition::Condition;
use super::error::FilterResult;
use super::operator::Operator;
use super::types::FilterValue;

/// Configured deactive sentinels, keyed by resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveDefaults {
    overrides: HashMap<Resource, i64>,
}

impl ActiveDefaults {
    pub fn new(overrides: HashMap<Resource, i64>) -> Self {
        Self { overrides }
    }

    /// Sentinel for `catalog`, or `None` when the resource has no active flag.
    pub fn sentinel(&self, catalog: &Catalog) -> Option<i64> {
        let rule = catalog.active?;
        Some(
            self.overrides
                .get(&catalog.resource)
                .copied()
                .unwrap_or(rule.deactive),
        )
    }

    /// Apply the default for `catalog` using the configured sentinel.
    pub fn apply(&self, catalog: &Catalog, conditions: Vec<Condition>) -> FilterResult<Vec<Condition>> {
        match self.sentinel(catalog) {
            Some(sentinel) => apply_active_default(catalog, conditions, sentinel),
            None => Ok(conditions),
        }
    }
}

/// Insert `active NOT IN (sentinel)` when no condition targets the active
/// field.
///
/// The new condition lands at the field's catalog position, so conditions
/// already in catalog order stay in catalog order. Applying twice is the
/// same as applying once.
pub fn apply_active_default(
    catalog: &Catalog,
    mut conditions: Vec<Condition>,
    sentinel: i64,
) -> FilterResult<Vec<Condition>> {
    let Some(rule) = catalog.active else {
        return Ok(conditions);
    };
    if conditions.iter().any(|c| c.field().name == rule.field) {
        return Ok(conditions);
    }

    let field = catalog.field(rule.field)?;
    let default = Condition::new(field, Operator::NotIn, vec![FilterValue::Int(sentinel)])?;

    let rank = catalog.position(rule.field);
    let at = conditions
        .iter()
        .position(|c| catalog.position(c.field().name) > rank)
        .unwrap_or(conditions.len());
    conditions.insert(at, default);

    tracing::trace!(resource = %catalog.resource, sentinel, "applied active default");
    Ok(conditions)
}
