//! # Base Price Repository
//!
//! Named unit rates (`box-monthly`, `service-monthly`, `boost-daily`).
//! One row per name; admin changes update it in place.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stallplass_core::validation::{validate_price, validate_rate_name};
use stallplass_core::{BasePrice, Money};

#[derive(Debug, sqlx::FromRow)]
struct BasePriceRow {
    id: String,
    name: String,
    price: i64,
    description: Option<String>,
    is_active: bool,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BasePriceRow> for BasePrice {
    type Error = DbError;

    fn try_from(row: BasePriceRow) -> DbResult<Self> {
        if row.price < 0 {
            return Err(DbError::invalid_data(
                "base_prices",
                format!("negative price {} for '{}'", row.price, row.name),
            ));
        }

        Ok(BasePrice {
            id: row.id,
            name: row.name,
            price: Money::from_ore(row.price),
            description: row.description,
            is_active: row.is_active,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for base price operations.
#[derive(Debug, Clone)]
pub struct BasePriceRepository {
    pool: SqlitePool,
}

impl BasePriceRepository {
    /// Creates a new BasePriceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BasePriceRepository { pool }
    }

    /// Gets the active row for `name`.
    ///
    /// ## Returns
    /// * `Ok(Some(BasePrice))` - Active row found
    /// * `Ok(None)` - Missing or deactivated
    pub async fn get_active(&self, name: &str) -> DbResult<Option<BasePrice>> {
        let row: Option<BasePriceRow> = sqlx::query_as(
            r#"
            SELECT id, name, price, description, is_active, updated_at
            FROM base_prices
            WHERE name = ?1 AND is_active = 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BasePrice::try_from).transpose()
    }

    /// Lists every base price, active or not, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<BasePrice>> {
        let rows: Vec<BasePriceRow> = sqlx::query_as(
            r#"
            SELECT id, name, price, description, is_active, updated_at
            FROM base_prices
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BasePrice::try_from).collect()
    }

    /// Creates or updates the row for `name`.
    ///
    /// An existing row keeps its id; `description` is only replaced when given.
    pub async fn upsert(
        &self,
        name: &str,
        price: Money,
        description: Option<&str>,
        is_active: bool,
    ) -> DbResult<BasePrice> {
        validate_rate_name(name)?;
        validate_price(price.ore())?;

        let name = name.trim();
        let now = Utc::now();

        debug!(name = %name, price = price.ore(), is_active, "Upserting base price");

        let row: BasePriceRow = sqlx::query_as(
            r#"
            INSERT INTO base_prices (id, name, price, description, is_active, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (name) DO UPDATE SET
                price = excluded.price,
                description = COALESCE(excluded.description, base_prices.description),
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            RETURNING id, name, price, description, is_active, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(price.ore())
        .bind(description)
        .bind(is_active)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        BasePrice::try_from(row)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::repository::test_support::test_db;
    use stallplass_core::Money;

    #[tokio::test]
    async fn test_upsert_then_get_active() {
        let db = test_db().await;
        let repo = db.base_prices();

        assert!(repo.get_active("box-monthly").await.unwrap().is_none());

        let created = repo
            .upsert("box-monthly", Money::from_ore(9900), Some("Per box per month"), true)
            .await
            .unwrap();
        let fetched = repo.get_active("box-monthly").await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.price.ore(), 9900);
    }

    #[tokio::test]
    async fn test_upsert_updates_in_place() {
        let db = test_db().await;
        let repo = db.base_prices();

        let first = repo
            .upsert("boost-daily", Money::from_ore(1000), Some("Daily boost"), true)
            .await
            .unwrap();
        let second = repo
            .upsert("boost-daily", Money::from_ore(1200), None, true)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.price.ore(), 1200);
        assert_eq!(second.description.as_deref(), Some("Daily boost"));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_inactive_row_is_not_authoritative() {
        let db = test_db().await;
        let repo = db.base_prices();

        repo.upsert("service-monthly", Money::from_ore(5000), None, false)
            .await
            .unwrap();
        assert!(repo.get_active("service-monthly").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let db = test_db().await;
        let repo = db.base_prices();

        assert!(repo
            .upsert("box-monthly", Money::from_ore(-1), None, true)
            .await
            .is_err());
        assert!(repo
            .upsert("Box Monthly", Money::from_ore(100), None, true)
            .await
            .is_err());
    }
}
