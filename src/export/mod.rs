mod pipeline;
mod publish;
mod transform;
mod writer;

pub use pipeline::run_export;
pub use publish::{list_feed_files, publish_feeds};
pub use transform::{decode_gallery, to_advert};
pub use writer::{FeedWriter, RunSummary};

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that abort an export run.
///
/// The tolerant cases from the error taxonomy (malformed gallery blobs,
/// validator HTTP failures) never surface here — they are absorbed at the
/// point of occurrence. Everything below is systemic breakage and fatal.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Store connectivity or query failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Feed or log file write failure.
    #[error("Feed write failed: {0}")]
    Io(#[from] std::io::Error),

    /// Advert fragment serialization failure.
    #[error("Advert serialization failed: {0}")]
    Xml(#[from] quick_xml::SeError),

    /// A non-null price column that does not parse as a decimal.
    #[error("Unparseable price {value:?} on listing {id}")]
    Price { id: i64, value: String },
}
