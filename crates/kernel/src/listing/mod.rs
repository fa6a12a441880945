//! Listing query builder.
//!
//! Turns client filter arguments into parameterized SQL for the newsroom's
//! listable resources:
//! - FieldCatalog: static per-resource filterable columns
//! - Operator / Condition: validated filter predicates
//! - SortSpec / PageSpec: ORDER BY and LIMIT/OFFSET
//! - assemble / rebind: final statement and dialect placeholders
//! - ListingService: executes a listing against PostgreSQL
//!
//! Client input never reaches SQL text. Column names come from the catalogs
//! and every value travels as a bound argument.

pub mod active;
pub mod args;
pub mod assembler;
pub mod catalog;
pub mod condition;
pub mod error;
pub mod listing_service;
pub mod operator;
pub mod pagination;
pub mod query;
pub mod types;

pub use active::{ActiveDefaults, apply_active_default};
pub use args::{FilterArgs, RawExpr, RawFilter};
pub use assembler::{Dialect, assemble, assemble_count};
pub use catalog::{ActiveRule, Catalog, FieldCatalog, Resource};
pub use condition::{Condition, compile_conditions};
pub use error::{FilterError, FilterResult};
pub use listing_service::ListingService;
pub use operator::Operator;
pub use pagination::{PageSpec, SortKey, SortSpec, compile_pagination};
pub use query::{ListingDefaults, ListingQuery};
pub use types::{
    Arg, BindValue, BoundQuery, CompiledQuery, FilterField, FilterValue, Fragment,
    ListingResult, TimeRange, ValueKind,
};
