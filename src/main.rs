use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sparkify_etl::config::{self, EtlConfig};
use sparkify_etl::pipeline::Pipeline;
use sparkify_etl::progress::{format_duration, ProgressMode};
use sparkify_etl::store;

#[derive(Parser)]
#[command(name = "sparkify-etl")]
#[command(about = "Load song metadata and activity logs into the Sparkify star schema")]
struct Args {
    /// SQLite database created by `create-tables`
    #[arg(long, default_value = config::DEFAULT_DATABASE)]
    database: PathBuf,

    #[arg(long, default_value = config::DEFAULT_SONG_DATA)]
    song_data: PathBuf,

    #[arg(long, default_value = config::DEFAULT_LOG_DATA)]
    log_data: PathBuf,

    /// Data file extension
    #[arg(long, default_value = config::DEFAULT_EXTENSION)]
    extension: String,

    /// Hide progress bars and log one line per file instead
    #[arg(long)]
    log_only: bool,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = EtlConfig {
        database: args.database,
        song_data: args.song_data,
        log_data: args.log_data,
        extension: args.extension,
        progress: ProgressMode::from_log_only(args.log_only),
    };
    config.validate().context("Invalid configuration")?;

    info!("Opening database: {:?}", config.database);
    let mut conn = store::open_existing(&config.database)
        .context("Failed to open database (run create-tables first)")?;

    let summary = Pipeline::new(&config)
        .run(&mut conn)
        .context("ETL run failed")?;

    println!("\n{:=<60}", "");
    println!("Load complete!");
    println!(
        "  Song files: {}/{}",
        summary.songs.processed, summary.songs.found
    );
    println!("  Log files: {}/{}", summary.logs.processed, summary.logs.found);
    println!(
        "  Song plays: {} ({} resolved to catalog)",
        summary.song_plays, summary.resolved
    );
    for (table, count) in &summary.row_counts {
        println!("  {}: {} rows", table, count);
    }
    println!("  Elapsed: {}", format_duration(summary.elapsed));
    println!("{:=<60}", "");
    println!("Finished processing and loading");

    Ok(())
}
