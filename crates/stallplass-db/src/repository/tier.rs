//! # Discount Tier Repository
//!
//! Reads and writes the three tier tables and converts their stored
//! percentages into [`DiscountRate`].
//!
//! ## Table Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  (family, kind)        table                      stored percentage     │
//! │  ───────────────────   ────────────────────────   ──────────────────    │
//! │  (box, quantity)       quantity_discount_tiers    INTEGER 0-100         │
//! │  (box, duration)       duration_discount_tiers    REAL 0.0-1.0          │
//! │  (service, duration)   duration_discount_tiers    REAL 0.0-1.0          │
//! │  (boost, duration)     boost_discount_tiers       INTEGER 0-100 (days)  │
//! │  (service, quantity)   ─ none ─                                         │
//! │  (boost, quantity)     ─ none ─                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything above this module sees basis points only.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stallplass_core::validation::validate_tier_table;
use stallplass_core::{DiscountRate, DiscountTier, PricingFamily, TierKind, ValidationError};

// =============================================================================
// Table Descriptors
// =============================================================================

/// How a table stores its percentage column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StoredPercent {
    /// INTEGER 0-100
    Whole,
    /// REAL 0.0-1.0
    Fraction,
}

/// One physical tier table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TierTable {
    name: &'static str,
    min_column: &'static str,
    max_column: &'static str,
    rate_column: &'static str,
    stored: StoredPercent,
    /// `false` for tables that belong to one family only.
    has_family_column: bool,
}

const QUANTITY_TIERS: TierTable = TierTable {
    name: "quantity_discount_tiers",
    min_column: "min_quantity",
    max_column: "max_quantity",
    rate_column: "discount_percentage",
    stored: StoredPercent::Whole,
    has_family_column: true,
};

const DURATION_TIERS: TierTable = TierTable {
    name: "duration_discount_tiers",
    min_column: "min_months",
    max_column: "max_months",
    rate_column: "discount_fraction",
    stored: StoredPercent::Fraction,
    has_family_column: true,
};

const BOOST_TIERS: TierTable = TierTable {
    name: "boost_discount_tiers",
    min_column: "min_days",
    max_column: "max_days",
    rate_column: "discount_percentage",
    stored: StoredPercent::Whole,
    has_family_column: false,
};

impl TierTable {
    /// The table holding `(family, kind)` tiers, if that family has any.
    pub(crate) fn for_family(family: PricingFamily, kind: TierKind) -> Option<TierTable> {
        match (family, kind) {
            (PricingFamily::Box, TierKind::Quantity) => Some(QUANTITY_TIERS),
            (PricingFamily::Box | PricingFamily::Service, TierKind::Duration) => {
                Some(DURATION_TIERS)
            }
            (PricingFamily::Boost, TierKind::Duration) => Some(BOOST_TIERS),
            (PricingFamily::Service | PricingFamily::Boost, TierKind::Quantity) => None,
        }
    }

    fn select_sql(&self) -> String {
        let filter = if self.has_family_column {
            "WHERE family = ?"
        } else {
            ""
        };
        format!(
            "SELECT id, {min} AS min_value, {max} AS max_value, {rate} AS rate, is_active \
             FROM {table} {filter} ORDER BY {min}",
            min = self.min_column,
            max = self.max_column,
            rate = self.rate_column,
            table = self.name,
            filter = filter,
        )
    }

    fn insert_sql(&self) -> String {
        let (family_column, family_param) = if self.has_family_column {
            ("family, ", "?, ")
        } else {
            ("", "")
        };
        format!(
            "INSERT INTO {table} (id, {family_column}{min}, {max}, {rate}, is_active, created_at) \
             VALUES (?, {family_param}?, ?, ?, ?, ?)",
            table = self.name,
            min = self.min_column,
            max = self.max_column,
            rate = self.rate_column,
        )
    }

    /// Loads every row of this table that belongs to `family`.
    async fn fetch<'c, E>(
        &self,
        executor: E,
        family: PricingFamily,
        kind: TierKind,
    ) -> DbResult<Vec<DiscountTier>>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let sql = self.select_sql();
        let mut query = sqlx::query(&sql);
        if self.has_family_column {
            query = query.bind(family);
        }

        let rows = query.fetch_all(executor).await?;
        rows.iter().map(|row| self.decode(row, family, kind)).collect()
    }

    /// Reads the rate column of `row` into basis points.
    fn decode_rate(&self, row: &SqliteRow) -> DbResult<DiscountRate> {
        match self.stored {
            StoredPercent::Whole => {
                let percent: i64 = row.try_get("rate")?;
                DiscountRate::try_from_percent(percent).ok_or_else(|| {
                    DbError::invalid_data(
                        self.name,
                        format!("{} {} is outside 0-100", self.rate_column, percent),
                    )
                })
            }
            StoredPercent::Fraction => {
                let fraction: f64 = row.try_get("rate")?;
                DiscountRate::try_from_fraction(fraction).ok_or_else(|| {
                    DbError::invalid_data(
                        self.name,
                        format!("{} {} is outside 0.0-1.0", self.rate_column, fraction),
                    )
                })
            }
        }
    }

    fn decode(
        &self,
        row: &SqliteRow,
        family: PricingFamily,
        kind: TierKind,
    ) -> DbResult<DiscountTier> {
        Ok(DiscountTier {
            id: row.try_get("id")?,
            family,
            kind,
            min_value: row.try_get("min_value")?,
            max_value: row.try_get("max_value")?,
            discount_percentage: self.decode_rate(row)?,
            is_active: row.try_get("is_active")?,
        })
    }
}

/// A rate in the form a table stores it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum StoredRate {
    Whole(i64),
    Fraction(f64),
}

impl StoredPercent {
    /// Converts basis points to the stored form.
    ///
    /// Whole-percent tables cannot hold 12.5%; that is a validation error.
    pub(crate) fn encode(self, rate: DiscountRate) -> Result<StoredRate, ValidationError> {
        match self {
            StoredPercent::Whole => {
                if rate.bps() % 100 != 0 {
                    return Err(ValidationError::InvalidFormat {
                        field: "discountPercentage".to_string(),
                        reason: format!("{} is not a whole percent", rate),
                    });
                }
                Ok(StoredRate::Whole(i64::from(rate.bps() / 100)))
            }
            StoredPercent::Fraction => Ok(StoredRate::Fraction(rate.fraction())),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for discount tier operations.
#[derive(Debug, Clone)]
pub struct TierRepository {
    pool: SqlitePool,
}

impl TierRepository {
    /// Creates a new TierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TierRepository { pool }
    }

    /// Lists all tiers (active and inactive) for `family`/`kind`, ordered by
    /// `min_value`.
    ///
    /// Families without such a table return an empty list.
    pub async fn list(&self, family: PricingFamily, kind: TierKind) -> DbResult<Vec<DiscountTier>> {
        let Some(table) = TierTable::for_family(family, kind) else {
            return Ok(Vec::new());
        };

        let tiers = table.fetch(&self.pool, family, kind).await?;

        debug!(%family, ?kind, count = tiers.len(), "Loaded discount tiers");
        Ok(tiers)
    }

    /// Inserts a tier after checking it against the active bands of its table.
    ///
    /// ## Returns
    /// * `Ok(DiscountTier)` - Stored tier with its generated id
    /// * `Err(DbError::Validation)` - Bad bounds, overlap, no such table,
    ///   or a fractional percent for a whole-percent table
    pub async fn insert(&self, tier: &DiscountTier) -> DbResult<DiscountTier> {
        let table = TierTable::for_family(tier.family, tier.kind).ok_or_else(|| {
            ValidationError::InvalidFormat {
                field: "kind".to_string(),
                reason: format!("{} has no {:?} tiers", tier.family, tier.kind),
            }
        })?;
        let stored = table.stored.encode(tier.discount_percentage)?;

        let mut tier = tier.clone();
        tier.id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        // Read and write in one transaction so two admins cannot both pass
        // the overlap check.
        let existing = table.fetch(&mut *tx, tier.family, tier.kind).await?;
        validate_tier_table(&existing, &tier)?;

        debug!(
            table = table.name,
            min = tier.min_value,
            max = ?tier.max_value,
            rate = %tier.discount_percentage,
            "Inserting discount tier"
        );

        let sql = table.insert_sql();
        let mut query = sqlx::query(&sql).bind(&tier.id);
        if table.has_family_column {
            query = query.bind(tier.family);
        }
        query = query.bind(tier.min_value).bind(tier.max_value);
        query = match stored {
            StoredRate::Whole(percent) => query.bind(percent),
            StoredRate::Fraction(fraction) => query.bind(fraction),
        };
        query
            .bind(tier.is_active)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(tier)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    fn tier(
        family: PricingFamily,
        kind: TierKind,
        min: i64,
        max: Option<i64>,
        bps: u32,
    ) -> DiscountTier {
        DiscountTier {
            id: String::new(),
            family,
            kind,
            min_value: min,
            max_value: max,
            discount_percentage: DiscountRate::from_bps(bps),
            is_active: true,
        }
    }

    #[test]
    fn test_table_mapping() {
        assert_eq!(
            TierTable::for_family(PricingFamily::Box, TierKind::Quantity).map(|t| t.name),
            Some("quantity_discount_tiers")
        );
        assert_eq!(
            TierTable::for_family(PricingFamily::Service, TierKind::Duration).map(|t| t.name),
            Some("duration_discount_tiers")
        );
        assert_eq!(
            TierTable::for_family(PricingFamily::Boost, TierKind::Duration).map(|t| t.name),
            Some("boost_discount_tiers")
        );
        assert!(TierTable::for_family(PricingFamily::Service, TierKind::Quantity).is_none());
    }

    #[test]
    fn test_encode_stored_percent() {
        let rate = DiscountRate::from_bps(1500);
        assert_eq!(StoredPercent::Whole.encode(rate), Ok(StoredRate::Whole(15)));
        assert_eq!(StoredPercent::Fraction.encode(rate), Ok(StoredRate::Fraction(0.15)));
        assert!(StoredPercent::Whole.encode(DiscountRate::from_bps(1250)).is_err());
    }

    #[tokio::test]
    async fn test_every_table_round_trips_to_basis_points() {
        let db = test_db().await;
        let repo = db.tiers();

        repo.insert(&tier(PricingFamily::Box, TierKind::Quantity, 5, Some(9), 1000))
            .await
            .unwrap();
        repo.insert(&tier(PricingFamily::Box, TierKind::Duration, 12, None, 1500))
            .await
            .unwrap();
        repo.insert(&tier(PricingFamily::Boost, TierKind::Duration, 7, Some(13), 500))
            .await
            .unwrap();

        let quantity = repo.list(PricingFamily::Box, TierKind::Quantity).await.unwrap();
        let duration = repo.list(PricingFamily::Box, TierKind::Duration).await.unwrap();
        let boost = repo.list(PricingFamily::Boost, TierKind::Duration).await.unwrap();

        assert_eq!(quantity[0].discount_percentage.bps(), 1000);
        assert_eq!(duration[0].discount_percentage.bps(), 1500);
        assert_eq!(duration[0].max_value, None);
        assert_eq!(boost[0].discount_percentage.bps(), 500);
        assert_eq!(boost[0].family, PricingFamily::Boost);
    }

    #[tokio::test]
    async fn test_families_share_duration_table_without_mixing() {
        let db = test_db().await;
        let repo = db.tiers();

        repo.insert(&tier(PricingFamily::Box, TierKind::Duration, 1, None, 1000))
            .await
            .unwrap();
        // Same band for another family is not an overlap
        repo.insert(&tier(PricingFamily::Service, TierKind::Duration, 1, None, 2000))
            .await
            .unwrap();

        let service = repo.list(PricingFamily::Service, TierKind::Duration).await.unwrap();
        assert_eq!(service.len(), 1);
        assert_eq!(service[0].discount_percentage.bps(), 2000);
    }

    #[tokio::test]
    async fn test_insert_rejects_overlap() {
        let db = test_db().await;
        let repo = db.tiers();

        repo.insert(&tier(PricingFamily::Box, TierKind::Quantity, 5, Some(9), 1000))
            .await
            .unwrap();
        let err = repo
            .insert(&tier(PricingFamily::Box, TierKind::Quantity, 9, None, 2000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::Overlap { min: 9, .. })
        ));

        let mut inactive = tier(PricingFamily::Box, TierKind::Quantity, 9, None, 2000);
        inactive.is_active = false;
        assert!(repo.insert(&inactive).await.is_ok());
    }

    #[tokio::test]
    async fn test_insert_rejects_missing_table_and_fractional_percent() {
        let db = test_db().await;
        let repo = db.tiers();

        assert!(repo
            .insert(&tier(PricingFamily::Service, TierKind::Quantity, 1, None, 1000))
            .await
            .is_err());
        assert!(repo
            .insert(&tier(PricingFamily::Box, TierKind::Quantity, 1, None, 1250))
            .await
            .is_err());
        assert!(repo
            .list(PricingFamily::Boost, TierKind::Quantity)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_row_is_invalid_data() {
        let db = test_db().await;

        sqlx::query(
            "INSERT INTO duration_discount_tiers \
             (id, family, min_months, max_months, discount_fraction, is_active, created_at) \
             VALUES ('bad', 'box', 1, NULL, 15.0, 1, '2026-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = db
            .tiers()
            .list(PricingFamily::Box, TierKind::Duration)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidData { .. }));
    }
}
