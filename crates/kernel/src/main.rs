//! Newsroom listing kernel
//!
//! Compiles listing filters to SQL and runs listings against PostgreSQL.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use newsroom_kernel::config::Config;
use newsroom_kernel::db;
use newsroom_kernel::listing::{Dialect, FieldCatalog, FilterArgs, ListingQuery, ListingService};

#[derive(Parser, Debug)]
#[command(name = "newsroom", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the SQL and arguments a listing request compiles to.
    Compile {
        /// Resource to list (assets, posts, projects, members, memos, reports, tags).
        resource: String,

        /// Query string, e.g. 'active={"$in":[1]}&sort=-updated_at'.
        #[arg(default_value = "")]
        query: String,

        /// Placeholder style of the bound statement.
        #[arg(long, default_value = "postgres")]
        dialect: Dialect,
    },

    /// Run a listing against the database and print the result page.
    List {
        resource: String,

        #[arg(default_value = "")]
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match cli.command {
        Command::Compile {
            resource,
            query,
            dialect,
        } => compile(&config, &resource, &query, dialect),
        Command::List { resource, query } => list(&config, &resource, &query).await,
    }
}

fn compile(config: &Config, resource: &str, query: &str, dialect: Dialect) -> Result<()> {
    let args = FilterArgs::parse_query(query)?;
    let catalog = FieldCatalog::catalog(resource)?;
    let listing = ListingQuery::from_args(catalog, &args, &config.listing_defaults())?;

    let data = listing.data_query()?;
    let bound = data.rebind(dialect)?;
    let count = listing.count_query()?.rebind(dialect)?;

    let output = serde_json::json!({
        "sql": data.sql(),
        "args": data.args(),
        "bound_sql": bound.sql,
        "bound_values": bound.values,
        "count_sql": count.sql,
        "count_values": count.values,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

async fn list(config: &Config, resource: &str, query: &str) -> Result<()> {
    let args = FilterArgs::parse_query(query)?;

    let pool = db::create_pool(config).await?;
    info!("Database connection established");

    let service = ListingService::new(
        pool,
        config.listing_defaults(),
        config.statement_timeout_secs,
    );
    let result = service
        .list(resource, &args)
        .await
        .with_context(|| format!("failed to list {resource}"))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
