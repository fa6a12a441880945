//! Newsroom Listing Kernel Library
//!
//! Exposes the listing query builder and its application plumbing.
//! The command-line entry point is the `newsroom` binary.

pub mod config;
pub mod db;
pub mod error;
pub mod listing;

pub use error::{AppError, AppResult};
