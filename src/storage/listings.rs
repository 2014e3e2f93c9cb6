//! Listing queries: eligibility counting, page fetches, the postcode city
//! lookup, and the post-export bulk update.
//!
//! Table names are interpolated from the closed [`Category`] enum, never
//! from user input; all values go through bound parameters.

use super::db::Database;
use super::types::{ListingRow, StorageError};
use crate::category::Category;

/// Eligibility predicate shared by the count and page queries.
///
/// A row is eligible when it is published, not expired as of today, active,
/// not deleted, not sold, synced, and not yet exported. The last clause
/// keeps repeat runs from re-emitting rows the post-export updater already
/// marked.
const ELIGIBLE: &str = "published_at IS NOT NULL \
    AND date(expired_at) > date(?1) \
    AND active_at IS NOT NULL \
    AND deleted_at IS NULL \
    AND is_sold IS NULL \
    AND is_synced = 1 \
    AND is_xml_parsed = 0";

impl Database {
    /// Count the rows eligible for export in a category as of `today`
    /// (`YYYY-MM-DD`).
    pub async fn count_eligible(
        &self,
        category: Category,
        today: &str,
    ) -> Result<i64, StorageError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {table} WHERE {ELIGIBLE}",
            table = category.table()
        );
        let (count,): (i64,) = sqlx::query_as(&sql).bind(today).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Fetch one page of eligible rows joined with their agent branch.
    ///
    /// Paging is offset-based: `LIMIT page_size OFFSET page * page_size`.
    /// The predicate matches [`count_eligible`](Self::count_eligible) so the
    /// page partition covers exactly the counted rows.
    pub async fn fetch_page(
        &self,
        category: Category,
        today: &str,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<ListingRow>, StorageError> {
        let sql = format!(
            "SELECT p.id, p.agent_branch_id, p.property_type, p.price, p.price_type, \
                    p.postcode, p.address_line1, p.short_description, p.city, \
                    p.lat, p.lng, p.bed, p.bathroom, p.property_images, p.thumbnail, \
                    ab.id AS branch_id, ab.branch_name, ab.contact_phone \
             FROM {table} AS p \
             JOIN agent_branches AS ab ON p.agent_branch_id = ab.id \
             WHERE {ELIGIBLE} \
             ORDER BY p.id \
             LIMIT ?2 OFFSET ?3",
            table = category.table()
        );
        let rows = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(today)
            .bind(page_size)
            .bind(page * page_size)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Resolve a display city name for a postcode.
    ///
    /// The lookup key is the postcode lowercased with whitespace stripped.
    /// A matching `place` is a comma-separated list such as
    /// "Locality, City, Country"; the second segment is the city. No match
    /// or a single-segment place yields `None` and the caller falls back to
    /// the row's own city.
    pub async fn city_by_postcode(&self, postcode: &str) -> Result<Option<String>, StorageError> {
        let keyword: String = postcode
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let row: Option<(String,)> =
            sqlx::query_as("SELECT place FROM geolytix_locations WHERE searchable_keyword = ?1")
                .bind(&keyword)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(place,)| {
            place
                .split(", ")
                .nth(1)
                .map(str::to_string)
                .filter(|city| !city.is_empty())
        }))
    }

    /// Mark every ledgered row as exported.
    ///
    /// Called once per category after all page workers have joined. Failure
    /// here aborts the run: a partially marked ledger would re-emit the
    /// unmarked subset next run, breaking at-most-once export.
    pub async fn mark_exported(
        &self,
        category: Category,
        ids: &[i64],
    ) -> Result<u64, StorageError> {
        // SQLite caps bound parameters per statement, so large ledgers go
        // through in batches.
        const MARK_BATCH: usize = 500;
        self.mark_exported_batched(category, ids, MARK_BATCH).await
    }

    async fn mark_exported_batched(
        &self,
        category: Category,
        ids: &[i64],
        batch: usize,
    ) -> Result<u64, StorageError> {
        let mut affected = 0;
        for chunk in ids.chunks(batch.max(1)) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "UPDATE {table} SET is_xml_parsed = 1 WHERE id IN ({placeholders})",
                table = category.table()
            );
            let mut query = sqlx::query(&sql);
            for id in chunk {
                query = query.bind(id);
            }
            let result = query.execute(&self.pool).await?;
            affected += result.rows_affected();
        }
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::open("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn seed_branch(db: &Database, id: i64, name: &str) {
        sqlx::query("INSERT INTO agent_branches (id, branch_name, contact_phone) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind("07700 900000")
            .execute(db.pool())
            .await
            .unwrap();
    }

    async fn seed_listing(db: &Database, category: Category, id: i64, price: Option<&str>) {
        let sql = format!(
            "INSERT INTO {} (id, agent_branch_id, property_type, price, postcode, city, \
                             published_at, expired_at, active_at, is_synced) \
             VALUES (?, 1, 'flat', ?, 'AB1 2CD', 'Anytown', \
                     '2024-01-01 00:00:00', '2099-01-01 00:00:00', '2024-01-01 00:00:00', 1)",
            category.table()
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(price)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_count_excludes_expired_rows() {
        let db = test_db().await;
        seed_branch(&db, 1, "Acme Homes").await;
        seed_listing(&db, Category::ResidentialForSale, 1, Some("100000.00")).await;

        // expired yesterday relative to the probe date
        let count = db
            .count_eligible(Category::ResidentialForSale, "2098-12-31")
            .await
            .unwrap();
        assert_eq!(count, 1);
        let count = db
            .count_eligible(Category::ResidentialForSale, "2099-01-01")
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_fetch_page_joins_branch_fields() {
        let db = test_db().await;
        seed_branch(&db, 1, "Acme Homes").await;
        seed_listing(&db, Category::ResidentialForSale, 7, Some("100000.00")).await;

        let rows = db
            .fetch_page(Category::ResidentialForSale, "2024-06-01", 0, 1000)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 7);
        assert_eq!(rows[0].branch_name, "Acme Homes");
        assert_eq!(rows[0].contact_phone.as_deref(), Some("07700 900000"));
    }

    #[tokio::test]
    async fn test_mark_exported_hides_rows_from_next_fetch() {
        let db = test_db().await;
        seed_branch(&db, 1, "Acme Homes").await;
        seed_listing(&db, Category::ResidentialToRent, 1, Some("900.00")).await;
        seed_listing(&db, Category::ResidentialToRent, 2, Some("950.00")).await;

        let affected = db
            .mark_exported(Category::ResidentialToRent, &[1])
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let rows = db
            .fetch_page(Category::ResidentialToRent, "2024-06-01", 0, 1000)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 2);
    }

    #[tokio::test]
    async fn test_city_lookup_normalizes_postcode() {
        let db = test_db().await;
        sqlx::query("INSERT INTO geolytix_locations (place, searchable_keyword) VALUES (?, ?)")
            .bind("Anytown, Springfield")
            .bind("ab12cd")
            .execute(db.pool())
            .await
            .unwrap();

        let city = db.city_by_postcode("AB1 2CD").await.unwrap();
        assert_eq!(city.as_deref(), Some("Springfield"));
    }

    #[tokio::test]
    async fn test_city_lookup_takes_only_the_second_place_segment() {
        let db = test_db().await;
        sqlx::query("INSERT INTO geolytix_locations (place, searchable_keyword) VALUES (?, ?)")
            .bind("Anytown, Springfield, United Kingdom")
            .bind("ab12cd")
            .execute(db.pool())
            .await
            .unwrap();

        // trailing segments after the city are not part of the name
        let city = db.city_by_postcode("AB1 2CD").await.unwrap();
        assert_eq!(city.as_deref(), Some("Springfield"));
    }

    #[tokio::test]
    async fn test_city_lookup_misses_fall_through() {
        let db = test_db().await;
        assert_eq!(db.city_by_postcode("ZZ9 9ZZ").await.unwrap(), None);

        // single-segment place has no city component
        sqlx::query("INSERT INTO geolytix_locations (place, searchable_keyword) VALUES (?, ?)")
            .bind("Springfield")
            .bind("zz99zz")
            .execute(db.pool())
            .await
            .unwrap();
        assert_eq!(db.city_by_postcode("ZZ9 9ZZ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mark_exported_batches_cover_the_whole_ledger() {
        let db = test_db().await;
        seed_branch(&db, 1, "Acme Homes").await;
        for id in 1..=5 {
            seed_listing(&db, Category::CommercialToRent, id, Some("1200.00")).await;
        }

        // batch smaller than the ledger forces multiple statements
        let affected = db
            .mark_exported_batched(Category::CommercialToRent, &[1, 2, 3, 4, 5], 2)
            .await
            .unwrap();
        assert_eq!(affected, 5);

        let rows = db
            .fetch_page(Category::CommercialToRent, "2024-06-01", 0, 1000)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_mark_exported_empty_ledger_is_a_no_op() {
        let db = test_db().await;
        let affected = db
            .mark_exported(Category::CommercialForSale, &[])
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }
}
