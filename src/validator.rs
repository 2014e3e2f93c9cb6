//! The feed link validator (`test` mode).
//!
//! Re-opens every feed file in the working directory, re-parses its advert
//! fragments, and issues one GET per listing URL, sequentially. Failing
//! URLs are appended to the error log; the validator reports, it never
//! gates — a feed full of dead links still exits successfully.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use thiserror::Error;
use url::Url;

use crate::advert;
use crate::category::Category;
use crate::config::Config;
use crate::export::list_feed_files;

/// Errors that abort the validation pass. Per-URL failures are not here —
/// they are logged and skipped.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// The feeds directory holds nothing to check.
    #[error("No feed files to check in {0}")]
    NoFeeds(PathBuf),

    /// Log or feed file I/O failure.
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// A feed file's fragments could not be re-parsed.
    #[error("Feed parse error in {file}: {source}")]
    Parse {
        file: String,
        source: quick_xml::DeError,
    },

    /// HTTP client construction failure.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Directory listing failure, surfaced through the export helpers.
    #[error(transparent)]
    Export(#[from] crate::export::ExportError),
}

/// Check every listing URL in every feed file under the configured feeds
/// directory.
///
/// The error log is truncated at the start of the pass. Each file gets a
/// category section header (written even when every link passes), followed
/// by one line per failing URL: `[<timestamp>] [<status>] - <url>`.
/// Transport failures log `ERR` in place of a status code.
pub async fn check_feeds(config: &Config) -> Result<(), ValidateError> {
    std::fs::create_dir_all(&config.feeds_dir)?;
    // fresh log per pass
    std::fs::write(&config.url_error_log, "")?;

    let files = list_feed_files(&config.feeds_dir)?;
    if files.is_empty() {
        return Err(ValidateError::NoFeeds(config.feeds_dir.clone()));
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;

    for file in &files {
        write_section_header(&config.url_error_log, file)?;

        let content = std::fs::read_to_string(config.feeds_dir.join(file))?;
        let adverts = advert::parse_fragments(&content).map_err(|source| ValidateError::Parse {
            file: file.clone(),
            source,
        })?;
        tracing::info!(file = %file, adverts = adverts.len(), "Checking feed links");

        for (index, ad) in adverts.iter().enumerate() {
            check_one(&client, &config.url_error_log, index, &ad.url).await?;
        }
    }

    Ok(())
}

/// Issue one GET and log any non-200 outcome. Only log-write failures
/// propagate; the request itself never fails the pass.
async fn check_one(
    client: &reqwest::Client,
    log_path: &Path,
    index: usize,
    url: &str,
) -> Result<(), ValidateError> {
    if Url::parse(url).is_err() {
        tracing::warn!(index, url = %url, "Skipping malformed listing URL");
        append_failure(log_path, "ERR", url)?;
        return Ok(());
    }

    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            tracing::debug!(index, status = status.as_u16(), url = %url, "Checked URL");
            if status.as_u16() != 200 {
                append_failure(log_path, &status.as_u16().to_string(), url)?;
            }
        }
        Err(e) => {
            tracing::warn!(index, url = %url, error = %e, "Request failed");
            append_failure(log_path, "ERR", url)?;
        }
    }
    Ok(())
}

/// Write the category banner for a feed file, mirroring the set of files
/// present even when no failures follow. Unrecognized file names fall back
/// to the uppercased file name.
fn write_section_header(log_path: &Path, file: &str) -> Result<(), ValidateError> {
    let label = match Category::from_feed_file(file) {
        Some(category) => category.key().to_uppercase(),
        None => file.to_uppercase(),
    };
    let mut log = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_path)?;
    writeln!(log, "\n---------- {label} ----------\n")?;
    Ok(())
}

fn append_failure(log_path: &Path, status: &str, url: &str) -> Result<(), ValidateError> {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut log = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_path)?;
    writeln!(log, "[{now}] [{status}] - {url}")?;
    Ok(())
}
