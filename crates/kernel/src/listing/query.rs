//! Request-scoped listing query.
//!
//! Ties the compilers together: raw arguments are resolved against the
//! resource's catalog, validated into conditions, defaulted, and finally
//! assembled into the data and count statements.

use super::active::ActiveDefaults;
use super::args::FilterArgs;
use super::assembler::{assemble, assemble_count};
use super::catalog::Catalog;
use super::condition::Condition;
use super::error::{FilterError, FilterResult};
use super::pagination::{PageSpec, SortSpec};
use super::types::CompiledQuery;

/// Page size used when a request does not set `max_result`.
pub const DEFAULT_MAX_RESULT: u32 = 20;

/// Defaults applied to every listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDefaults {
    pub default_max_result: u32,
    pub active: ActiveDefaults,
}

impl Default for ListingDefaults {
    fn default() -> Self {
        Self {
            default_max_result: DEFAULT_MAX_RESULT,
            active: ActiveDefaults::default(),
        }
    }
}

/// A validated listing request for one resource.
#[derive(Debug, Clone)]
pub struct ListingQuery {
    catalog: &'static Catalog,
    conditions: Vec<Condition>,
    sort: SortSpec,
    page: PageSpec,
}

impl ListingQuery {
    /// Validate `args` against `catalog`.
    ///
    /// Conditions are kept in catalog field order whatever order the client
    /// sent them in. The first invalid argument aborts the whole request.
    pub fn from_args(
        catalog: &'static Catalog,
        args: &FilterArgs,
        defaults: &ListingDefaults,
    ) -> FilterResult<Self> {
        let mut conditions = Vec::with_capacity(args.filters.len() + 1);
        for raw in &args.filters {
            let field = catalog.field(&raw.field)?;
            if conditions.iter().any(|c: &Condition| c.field().name == field.name) {
                return Err(FilterError::TooManyConditions {
                    field: raw.field.clone(),
                });
            }
            conditions.push(Condition::from_raw(field, &raw.expr)?);
        }
        conditions.sort_by_key(|c| catalog.position(c.field().name));

        let conditions = defaults.active.apply(catalog, conditions)?;

        let sort = match args.sort.as_deref() {
            Some(expr) if !expr.trim().is_empty() => SortSpec::parse(catalog, expr)?,
            _ => SortSpec::parse(catalog, catalog.default_sort)?,
        };

        let page = PageSpec::new(
            args.max_result.unwrap_or(defaults.default_max_result),
            args.page.unwrap_or(1),
        )?;

        tracing::debug!(
            resource = %catalog.resource,
            conditions = conditions.len(),
            max_result = page.max_result(),
            page = page.page(),
            "listing query validated"
        );

        Ok(Self {
            catalog,
            conditions,
            sort,
            page,
        })
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn page(&self) -> PageSpec {
        self.page
    }

    /// The paged data statement.
    pub fn data_query(&self) -> FilterResult<CompiledQuery> {
        assemble(
            self.catalog.base_select,
            &self.conditions,
            &self.sort,
            &self.page,
        )
    }

    /// The COUNT statement over the same conditions.
    pub fn count_query(&self) -> FilterResult<CompiledQuery> {
        assemble_count(self.catalog.count_select, &self.conditions)
    }
}
