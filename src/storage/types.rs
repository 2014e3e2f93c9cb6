use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Store-level errors. Any occurrence is fatal to the run — the pipeline
/// never retries or skips past a failed query.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Query(#[from] sqlx::Error),
}

// ============================================================================
// Row Types
// ============================================================================

/// A raw listing row joined with its agent branch, as fetched by a page
/// worker.
///
/// Nullable store columns stay `Option` — several transformation rules
/// distinguish "present but zero" from "absent" (bedroom counts) and
/// "present" from "null" (price), so nullability must survive the fetch.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingRow {
    pub id: i64,
    pub agent_branch_id: i64,
    pub property_type: String,
    /// Price as stored, text-preserving. `None` excludes the row from the
    /// feed entirely.
    pub price: Option<String>,
    pub price_type: Option<String>,
    pub postcode: String,
    pub address_line1: String,
    pub short_description: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub bed: Option<i64>,
    pub bathroom: Option<i64>,
    /// Serialized image-gallery blob (JSON with a "Gallery" list).
    pub property_images: String,
    pub thumbnail: String,
    pub branch_id: i64,
    pub branch_name: String,
    pub contact_phone: Option<String>,
}
