//! Query assembly and dialect rebinding.
//!
//! [`assemble`] joins a base statement with the condition and pagination
//! fragments, always in that order. [`CompiledQuery::rebind`] is the single
//! pass that expands list arguments and rewrites placeholders for the target
//! dialect; it runs once, on the finished statement.

use std::str::FromStr;

use sea_query::{MysqlQueryBuilder, PostgresQueryBuilder, QueryBuilder, SqliteQueryBuilder};

use super::condition::{Condition, compile_conditions};
use super::error::{FilterError, FilterResult};
use super::pagination::{PageSpec, SortSpec, compile_pagination};
use super::types::{Arg, BindValue, BoundQuery, CompiledQuery, Fragment, count_placeholders};

/// Target SQL dialect for placeholder rebinding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// Numbered placeholders (`$1, $2`).
    #[default]
    Postgres,
    /// Positional `?` placeholders.
    MySql,
    /// Positional `?` placeholders.
    Sqlite,
}

impl Dialect {
    /// Placeholder marker and whether it is numbered, as the matching
    /// SeaQuery backend renders it.
    fn placeholder_style(self) -> (String, bool) {
        match self {
            Dialect::Postgres => style_of(&PostgresQueryBuilder),
            Dialect::MySql => style_of(&MysqlQueryBuilder),
            Dialect::Sqlite => style_of(&SqliteQueryBuilder),
        }
    }
}

fn style_of<B: QueryBuilder>(builder: &B) -> (String, bool) {
    let (marker, numbered) = builder.placeholder();
    (marker.to_string(), numbered)
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(format!("unknown SQL dialect '{other}'")),
        }
    }
}

/// Assemble a listing query from a `SELECT … FROM …` skeleton.
///
/// `WHERE` is only emitted when there are conditions.
pub fn assemble(
    base: &str,
    conditions: &[Condition],
    sort: &SortSpec,
    page: &PageSpec,
) -> FilterResult<CompiledQuery> {
    let filter = compile_conditions(conditions)?;
    let tail = compile_pagination(sort, page);
    join(base, filter, tail)
}

/// Assemble the COUNT companion of a listing query: same conditions, no
/// ordering or paging.
pub fn assemble_count(base: &str, conditions: &[Condition]) -> FilterResult<CompiledQuery> {
    let filter = compile_conditions(conditions)?;
    join(base, filter, Fragment::default())
}

fn join(base: &str, filter: Fragment, tail: Fragment) -> FilterResult<CompiledQuery> {
    let mut sql = base.trim_end().to_string();
    let mut args = Vec::with_capacity(filter.args.len() + tail.args.len());

    if !filter.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&filter.sql);
        args.extend(filter.args);
    }
    if !tail.is_empty() {
        sql.push(' ');
        sql.push_str(&tail.sql);
        args.extend(tail.args);
    }

    CompiledQuery::new(sql, args)
}

impl CompiledQuery {
    /// Expand list arguments and rewrite placeholders for `dialect`.
    ///
    /// Each `?` consumes the next argument; a list of N values becomes N
    /// comma-separated placeholders. Any disagreement between placeholders
    /// and arguments, including an empty list, is a `PlaceholderMismatch`.
    pub fn rebind(&self, dialect: Dialect) -> FilterResult<BoundQuery> {
        let placeholders = count_placeholders(self.sql());
        let mismatch = || FilterError::PlaceholderMismatch {
            placeholders,
            args: self.args().len(),
        };
        if placeholders != self.args().len() {
            return Err(mismatch());
        }

        let (marker, numbered) = dialect.placeholder_style();
        let mut sql = String::with_capacity(self.sql().len() + 4 * placeholders);
        let mut values = Vec::with_capacity(self.args().len());
        let mut args = self.args().iter();

        for ch in self.sql().chars() {
            if ch != '?' {
                sql.push(ch);
                continue;
            }

            let Some(arg) = args.next() else {
                return Err(mismatch());
            };
            let items: &[BindValue] = match arg {
                Arg::Scalar(value) => std::slice::from_ref(value),
                Arg::List(items) => items,
            };
            if items.is_empty() {
                return Err(mismatch());
            }

            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&marker);
                if numbered {
                    sql.push_str(&(values.len() + 1).to_string());
                }
                values.push(item.clone());
            }
        }

        Ok(BoundQuery { sql, values })
    }
}
