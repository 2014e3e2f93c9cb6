mod db;
mod listings;
mod types;

pub use db::Database;
pub use types::{ListingRow, StorageError};
