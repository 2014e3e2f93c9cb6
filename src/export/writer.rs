//! Serialized feed appends and the per-category export ledger.
//!
//! All page workers for a category share one [`FeedWriter`]. The writer is
//! the single append capability for the run: one lock covers the fragment
//! write and the ledger push, so the feed document and the ledger cannot
//! diverge.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::ExportError;
use crate::advert::{self, Advert};
use crate::category::Category;

#[derive(Default)]
struct WriterInner {
    /// Opened lazily on the first append so empty categories produce no
    /// feed file.
    file: Option<tokio::fs::File>,
    ledger: Vec<i64>,
    parsed: usize,
}

/// The run context for one category: owns the feed file handle and the
/// export ledger behind a single mutex.
pub struct FeedWriter {
    category: Category,
    path: PathBuf,
    inner: Mutex<WriterInner>,
}

/// What a completed category run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub category: Category,
    /// Source ids appended to the feed, in append order.
    pub ledger: Vec<i64>,
    pub parsed: usize,
}

impl FeedWriter {
    /// Create a writer targeting `feeds_dir/<category feed file>`. Nothing
    /// touches the filesystem until the first append.
    pub fn new(category: Category, feeds_dir: &Path) -> Self {
        Self {
            category,
            path: feeds_dir.join(category.feed_file()),
            inner: Mutex::new(WriterInner::default()),
        }
    }

    /// Append one advert fragment to the feed and record its source id in
    /// the ledger.
    ///
    /// The write and the ledger push happen under one lock acquisition, so
    /// concurrent workers interleave whole adverts and ledger membership
    /// stays in 1:1 correspondence with feed entries.
    pub async fn append(&self, advert: &Advert) -> Result<(), ExportError> {
        let fragment = advert::to_fragment(advert)?;

        let mut inner = self.inner.lock().await;
        if inner.file.is_none() {
            inner.file = Some(
                OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(&self.path)
                    .await?,
            );
        }
        if let Some(file) = inner.file.as_mut() {
            file.write_all(fragment.as_bytes()).await?;
            file.write_all(b"\n").await?;
        }
        inner.ledger.push(advert.id);
        inner.parsed += 1;

        tracing::debug!(
            category = %self.category,
            listing_id = advert.id,
            "Appended advert to feed"
        );
        Ok(())
    }

    /// Flush and close the feed file, yielding the run's ledger and counts.
    /// Callable only after every worker holding `&self` has finished.
    pub async fn finish(self) -> Result<RunSummary, ExportError> {
        let mut inner = self.inner.into_inner();
        if let Some(file) = inner.file.as_mut() {
            file.flush().await?;
        }
        Ok(RunSummary {
            category: self.category,
            ledger: inner.ledger,
            parsed: inner.parsed,
        })
    }
}
