//! The extract-transform-aggregate pipeline.
//!
//! Categories run strictly sequentially; within a category, page workers
//! fan out through a bounded concurrency pool and join before the
//! post-export update runs. Any worker error aborts the whole run — store
//! and file failures are systemic, not per-record noise.

use std::io::Write;
use std::path::Path;

use chrono::Local;
use futures::stream::{self, StreamExt};

use super::transform::{decode_gallery, to_advert};
use super::writer::{FeedWriter, RunSummary};
use super::ExportError;
use crate::category::Category;
use crate::config::Config;
use crate::storage::Database;

/// Run the full export pipeline: every category, fetch → transform →
/// aggregate → update, one category at a time.
///
/// Returns one [`RunSummary`] per category in driver order.
pub async fn run_export(db: &Database, config: &Config) -> Result<Vec<RunSummary>, ExportError> {
    let mut summaries = Vec::with_capacity(Category::ALL.len());

    for category in Category::ALL {
        let summary = run_category(db, config, category).await?;

        if !summary.ledger.is_empty() {
            let marked = db.mark_exported(category, &summary.ledger).await?;
            tracing::info!(category = %category, marked, "Marked exported rows");
        }
        if summary.parsed > 0 {
            append_run_log(&config.log_file, category, summary.parsed)?;
        }

        tracing::info!(
            category = %category,
            parsed = summary.parsed,
            "Category export complete"
        );
        summaries.push(summary);
    }

    Ok(summaries)
}

/// Run one category to completion: count eligible rows, fan out one worker
/// per page (bounded by `max_concurrent_pages`), join, and return the run
/// summary. The first worker error wins and aborts the category.
async fn run_category(
    db: &Database,
    config: &Config,
    category: Category,
) -> Result<RunSummary, ExportError> {
    let today = Local::now().format("%Y-%m-%d").to_string();
    let page_size = config.page_size.max(1);

    let total = db.count_eligible(category, &today).await?;
    let pages = (total + page_size - 1) / page_size;
    tracing::info!(category = %category, eligible = total, pages, "Starting category export");

    let writer = FeedWriter::new(category, &config.feeds_dir);

    let results: Vec<Result<(), ExportError>> = stream::iter(0..pages)
        .map(|page| {
            let db = db.clone();
            let writer = &writer;
            let today = today.as_str();
            async move { process_page(&db, config, category, today, page, page_size, writer).await }
        })
        .buffer_unordered(config.max_concurrent_pages.max(1))
        .collect()
        .await;

    for result in results {
        result?;
    }

    writer.finish().await
}

/// One page worker: re-query the page, resolve each row's display city,
/// decode its gallery, transform, and append priced rows to the feed.
async fn process_page(
    db: &Database,
    config: &Config,
    category: Category,
    today: &str,
    page: i64,
    page_size: i64,
    writer: &FeedWriter,
) -> Result<(), ExportError> {
    let rows = db.fetch_page(category, today, page, page_size).await?;
    tracing::debug!(category = %category, page, rows = rows.len(), "Fetched page");

    for row in rows {
        let display_city = match db.city_by_postcode(&row.postcode).await? {
            Some(city) => city,
            None => row.city.clone(),
        };
        let images = decode_gallery(&row.property_images);

        if let Some(advert) = to_advert(&row, category, &display_city, images, &config.app_url)? {
            writer.append(&advert).await?;
        } else {
            tracing::debug!(category = %category, listing_id = row.id, "Skipping unpriced listing");
        }
    }

    Ok(())
}

/// Append the per-category audit line:
/// `[<timestamp>] - Total <CATEGORY> properties parsed - <count>`.
fn append_run_log(path: &Path, category: Category, parsed: usize) -> Result<(), ExportError> {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    writeln!(
        file,
        "[{now}] - Total {} properties parsed - {parsed}",
        category.key().to_uppercase()
    )?;
    Ok(())
}
