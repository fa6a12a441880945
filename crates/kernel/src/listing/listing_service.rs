//! Listing service for executing compiled listing queries.
//!
//! Runs the count and data statements of a [`ListingQuery`] against
//! PostgreSQL in one transaction and returns a page of rows as JSON.

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryScalar;

use super::args::FilterArgs;
use super::assembler::Dialect;
use super::catalog::FieldCatalog;
use super::error::FilterResult;
use super::query::{ListingDefaults, ListingQuery};
use super::types::{BindValue, ListingResult};
use crate::error::AppResult;

/// Default per-transaction statement timeout, in seconds.
pub const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 10;

/// Service for listing resources with client-supplied filters.
pub struct ListingService {
    pool: PgPool,
    defaults: ListingDefaults,
    statement_timeout_secs: u64,
}

impl ListingService {
    /// Create a new ListingService.
    pub fn new(pool: PgPool, defaults: ListingDefaults, statement_timeout_secs: u64) -> Arc<Self> {
        Arc::new(Self {
            pool,
            defaults,
            statement_timeout_secs,
        })
    }

    /// Validate `args` for `resource` without touching the database.
    pub fn prepare(&self, resource: &str, args: &FilterArgs) -> FilterResult<ListingQuery> {
        let catalog = FieldCatalog::catalog(resource)?;
        ListingQuery::from_args(catalog, args, &self.defaults)
    }

    /// List one page of `resource`.
    pub async fn list(&self, resource: &str, args: &FilterArgs) -> AppResult<ListingResult> {
        let query = self.prepare(resource, args)?;
        let count = query.count_query()?.rebind(Dialect::Postgres)?;
        let data = query.data_query()?.rebind(Dialect::Postgres)?;

        tracing::debug!(
            resource,
            sql = %data.sql,
            args = data.values.len(),
            "executing listing query"
        );

        // SET LOCAL only lasts until the transaction ends.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{}s'",
            self.statement_timeout_secs
        ))
        .execute(&mut *tx)
        .await
        .context("failed to set statement timeout")?;

        // Query failures (timeouts included) surface as database errors.
        let total: i64 = bind_values(sqlx::query_scalar(&count.sql), &count.values)
            .fetch_one(&mut *tx)
            .await?;

        let wrapped = format!("SELECT row_to_json(t) FROM ({}) t", data.sql);
        let rows: Vec<serde_json::Value> = bind_values(sqlx::query_scalar(&wrapped), &data.values)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit()
            .await
            .context("failed to commit listing transaction")?;

        let page = query.page();
        Ok(ListingResult::new(
            rows,
            u64::try_from(total).unwrap_or(0),
            page.page(),
            page.max_result(),
        ))
    }
}

fn bind_values<'q, O>(
    mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    values: &'q [BindValue],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for value in values {
        query = match value {
            BindValue::Int(v) => query.bind(*v),
            BindValue::Text(v) => query.bind(v.as_str()),
            BindValue::Timestamp(v) => query.bind(*v),
        };
    }
    query
}
