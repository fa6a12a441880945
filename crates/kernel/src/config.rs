//! Configuration loaded from environment variables.

use std::collections::HashMap;
use std::env;

use anyhow::{Context, Result};

use crate::listing::{ActiveDefaults, ListingDefaults, Resource};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL. Only needed to execute listings.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Page size when a request sets no `max_result` (default: 20).
    pub default_max_result: u32,

    /// Statement timeout for listing transactions, in seconds (default: 10).
    pub statement_timeout_secs: u64,

    /// Per-resource deactive sentinels (from DEACTIVE_SENTINELS, e.g.
    /// `assets=0,posts=2`). Resources not listed use their built-in value.
    pub deactive_sentinels: HashMap<Resource, i64>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").ok();

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let default_max_result = env::var("DEFAULT_MAX_RESULT")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .context("DEFAULT_MAX_RESULT must be a valid u32")?;

        let statement_timeout_secs = env::var("STATEMENT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("STATEMENT_TIMEOUT_SECS must be a valid u64")?;

        let deactive_sentinels = match env::var("DEACTIVE_SENTINELS") {
            Ok(raw) => parse_sentinels(&raw)?,
            Err(_) => HashMap::new(),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            default_max_result,
            statement_timeout_secs,
            deactive_sentinels,
        })
    }

    /// The database URL, or an error naming the missing variable.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL environment variable is required")
    }

    /// Listing defaults derived from this configuration.
    pub fn listing_defaults(&self) -> ListingDefaults {
        ListingDefaults {
            default_max_result: self.default_max_result,
            active: ActiveDefaults::new(self.deactive_sentinels.clone()),
        }
    }
}

/// Parse `resource=value` pairs separated by commas.
fn parse_sentinels(raw: &str) -> Result<HashMap<Resource, i64>> {
    let mut sentinels = HashMap::new();

    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, value) = entry
            .split_once('=')
            .with_context(|| format!("DEACTIVE_SENTINELS entry '{entry}' must be resource=value"))?;
        let resource: Resource = name
            .trim()
            .parse()
            .with_context(|| format!("DEACTIVE_SENTINELS names unknown resource '{}'", name.trim()))?;
        let value: i64 = value
            .trim()
            .parse()
            .with_context(|| format!("DEACTIVE_SENTINELS value for '{resource}' must be an integer"))?;
        sentinels.insert(resource, value);
    }

    Ok(sentinels)
}
