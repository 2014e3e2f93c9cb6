use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use propfeed::config::Config;
use propfeed::export;
use propfeed::storage::Database;
use propfeed::validator;

/// Execution mode. Anything outside this set is a usage error rejected by
/// clap before any work starts.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Run the export pipeline: store → per-category XML feeds.
    Parse,
    /// Re-open generated feeds and check every listing URL over HTTP.
    Test,
}

#[derive(Parser, Debug)]
#[command(name = "propfeed", about = "Property-listing XML feed exporter")]
struct Args {
    /// What to run
    #[arg(value_enum)]
    mode: Mode,

    /// Configuration file
    #[arg(long, value_name = "FILE", default_value = "propfeed.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let started = Instant::now();
    let args = Args::parse();
    let config = Config::load(&args.config).context("Failed to load configuration")?;

    match args.mode {
        Mode::Parse => run_export(&config).await?,
        Mode::Test => validator::check_feeds(&config)
            .await
            .context("Link validation failed")?,
    }

    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "Done");
    Ok(())
}

async fn run_export(config: &Config) -> Result<()> {
    // each run starts from a clean feeds directory; prior contents are stale
    if config.feeds_dir.exists() {
        std::fs::remove_dir_all(&config.feeds_dir).with_context(|| {
            format!(
                "Failed to clear feeds directory '{}'",
                config.feeds_dir.display()
            )
        })?;
    }
    std::fs::create_dir_all(&config.feeds_dir).with_context(|| {
        format!(
            "Failed to create feeds directory '{}'",
            config.feeds_dir.display()
        )
    })?;

    let db = Database::open(&config.database_url)
        .await
        .context("Failed to open the listing store")?;
    db.migrate().await.context("Failed to run migrations")?;

    let summaries = export::run_export(&db, config)
        .await
        .context("Export pipeline failed")?;
    let total: usize = summaries.iter().map(|s| s.parsed).sum();
    println!("Exported {total} adverts across {} categories", summaries.len());

    if config.export_enabled {
        export::publish_feeds(config).context("Failed to publish feeds")?;
    }

    Ok(())
}
