//! Drop and recreate the Sparkify tables.
//!
//! Usage: create-tables [--database sparkify.db] [--recreate]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sparkify_etl::config;
use sparkify_etl::safety::remove_database;
use sparkify_etl::{schema, store};

#[derive(Parser)]
#[command(name = "create-tables")]
#[command(about = "Drop (if present) and create the Sparkify star schema")]
struct Args {
    #[arg(long, default_value = config::DEFAULT_DATABASE)]
    database: PathBuf,

    /// Delete the database file first instead of dropping tables in place
    #[arg(long)]
    recreate: bool,

    /// Data roots the database must not live in (checked with --recreate)
    #[arg(long, default_value = config::DEFAULT_SONG_DATA)]
    song_data: PathBuf,

    #[arg(long, default_value = config::DEFAULT_LOG_DATA)]
    log_data: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    if args.recreate {
        let removed = remove_database(&args.database, &[&args.song_data, &args.log_data])
            .context("Failed to remove existing database files")?;
        info!("Removed {} existing database file(s)", removed.len());
    }

    let conn = store::open(&args.database).context("Failed to open database")?;
    schema::reset(&conn).context("Failed to reset schema")?;

    info!("Schema ready in {:?}", args.database);
    Ok(())
}
