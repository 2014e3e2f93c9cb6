use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use super::types::StorageError;
use crate::category::Category;

/// Handle to the listing store.
///
/// Wraps a connection pool shared by all page workers; cloning is cheap.
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open a connection pool for the given sqlx URL.
    pub async fn open(url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new().max_connections(8).connect(url).await?;
        Ok(Self { pool })
    }

    /// The underlying pool, exposed for integration tests that seed rows.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the listing tables, agent branches, and the postcode lookup
    /// table if they do not exist. Idempotent.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        for category in Category::ALL {
            let ddl = format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY,
                    agent_branch_id INTEGER NOT NULL,
                    property_type TEXT NOT NULL DEFAULT '',
                    price TEXT,
                    price_type TEXT,
                    postcode TEXT NOT NULL DEFAULT '',
                    address_line1 TEXT NOT NULL DEFAULT '',
                    short_description TEXT NOT NULL DEFAULT '',
                    city TEXT NOT NULL DEFAULT '',
                    lat REAL NOT NULL DEFAULT 0,
                    lng REAL NOT NULL DEFAULT 0,
                    bed INTEGER,
                    bathroom INTEGER,
                    property_images TEXT NOT NULL DEFAULT '',
                    thumbnail TEXT NOT NULL DEFAULT '',
                    is_sold INTEGER,
                    is_xml_parsed INTEGER NOT NULL DEFAULT 0,
                    published_at TEXT,
                    expired_at TEXT,
                    active_at TEXT,
                    deleted_at TEXT,
                    is_synced INTEGER NOT NULL DEFAULT 0
                )
            "#,
                category.table()
            );
            sqlx::query(&ddl).execute(&self.pool).await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS agent_branches (
                id INTEGER PRIMARY KEY,
                branch_name TEXT NOT NULL,
                contact_phone TEXT
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS geolytix_locations (
                place TEXT NOT NULL,
                searchable_keyword TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_geolytix_keyword ON geolytix_locations(searchable_keyword)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
