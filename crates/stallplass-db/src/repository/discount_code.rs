//! # Discount Code Repository
//!
//! Lookup, creation and usage consumption for discount codes.
//!
//! ## Why Consumption Is One Statement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  usage_limit = 10, usage_count = 9, two checkouts at once               │
//! │                                                                         │
//! │  ❌ read-check-write                                                    │
//! │     A: SELECT usage_count → 9      B: SELECT usage_count → 9            │
//! │     A: 9 < 10, UPDATE → 10         B: 9 < 10, UPDATE → 11  (over!)      │
//! │                                                                         │
//! │  ✅ conditional increment                                               │
//! │     UPDATE discount_codes SET usage_count = usage_count + 1             │
//! │     WHERE id = ? AND is_active = 1 AND not expired                      │
//! │       AND (usage_limit IS NULL OR usage_count < usage_limit)            │
//! │                                                                         │
//! │     A: rows_affected = 1 → consumed                                     │
//! │     B: rows_affected = 0 → UsageLimitReached                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stallplass_core::validation::validate_code_format;
use stallplass_core::{normalize_code, DiscountCode, DiscountKind, DiscountType, ItemType};

const TABLE: &str = "discount_codes";

#[derive(Debug, sqlx::FromRow)]
struct DiscountCodeRow {
    id: String,
    code: String,
    name: Option<String>,
    discount_type: DiscountType,
    discount_value: i64,
    max_discount: Option<i64>,
    applicable_item_types: String,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    usage_limit: Option<i64>,
    usage_count: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<DiscountCodeRow> for DiscountCode {
    type Error = DbError;

    fn try_from(row: DiscountCodeRow) -> DbResult<Self> {
        let kind = DiscountKind::from_parts(row.discount_type, row.discount_value, row.max_discount)
            .map_err(|e| DbError::invalid_data(TABLE, format!("code {}: {}", row.code, e)))?;

        let applicable_item_types: Vec<ItemType> =
            serde_json::from_str(&row.applicable_item_types).map_err(|e| {
                DbError::invalid_data(
                    TABLE,
                    format!("code {}: applicable_item_types: {}", row.code, e),
                )
            })?;

        Ok(DiscountCode {
            id: row.id,
            code: row.code,
            name: row.name,
            kind,
            applicable_item_types,
            is_active: row.is_active,
            expires_at: row.expires_at,
            usage_limit: row.usage_limit,
            usage_count: row.usage_count,
            created_at: row.created_at,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, code, name, discount_type, discount_value, max_discount,
           applicable_item_types, is_active, expires_at, usage_limit,
           usage_count, created_at
    FROM discount_codes
"#;

/// Repository for discount code operations.
#[derive(Debug, Clone)]
pub struct DiscountCodeRepository {
    pool: SqlitePool,
}

impl DiscountCodeRepository {
    /// Creates a new DiscountCodeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountCodeRepository { pool }
    }

    /// Finds a code as typed by a user.
    ///
    /// The input is trimmed and uppercased first, so `" summer20"` finds
    /// `SUMMER20`. Never modifies the row.
    pub async fn find_by_code(&self, raw: &str) -> DbResult<Option<DiscountCode>> {
        let code = normalize_code(raw);

        debug!(code = %code, "Looking up discount code");

        let row: Option<DiscountCodeRow> =
            sqlx::query_as(&format!("{} WHERE code = ?1", SELECT_COLUMNS))
                .bind(&code)
                .fetch_optional(&self.pool)
                .await?;

        row.map(DiscountCode::try_from).transpose()
    }

    /// Gets a code by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<DiscountCode>> {
        let row: Option<DiscountCodeRow> =
            sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(DiscountCode::try_from).transpose()
    }

    /// Inserts a new code.
    ///
    /// `code.code` is normalized; `id`, `usage_count` and `created_at` are
    /// assigned here.
    ///
    /// ## Returns
    /// * `Ok(DiscountCode)` - The stored code
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    pub async fn insert(&self, code: &DiscountCode) -> DbResult<DiscountCode> {
        validate_code_format(&code.code)?;

        let mut stored = code.clone();
        stored.id = Uuid::new_v4().to_string();
        stored.code = normalize_code(&code.code);
        stored.usage_count = 0;
        stored.created_at = Utc::now();

        let (discount_type, discount_value, max_discount) = stored.kind.to_parts();
        let item_types = serde_json::to_string(&stored.applicable_item_types)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        debug!(code = %stored.code, ?discount_type, discount_value, "Inserting discount code");

        let result = sqlx::query(
            r#"
            INSERT INTO discount_codes (
                id, code, name, discount_type, discount_value, max_discount,
                applicable_item_types, is_active, expires_at, usage_limit,
                usage_count, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.code)
        .bind(&stored.name)
        .bind(discount_type)
        .bind(discount_value)
        .bind(max_discount)
        .bind(&item_types)
        .bind(stored.is_active)
        .bind(stored.expires_at)
        .bind(stored.usage_limit)
        .bind(stored.usage_count)
        .bind(stored.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(stored),
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { .. } => Err(DbError::duplicate("code", &stored.code)),
                other => Err(other),
            },
        }
    }

    /// Atomically uses up one redemption of the code.
    ///
    /// ## Returns
    /// * `Ok(true)` - Usage counter incremented
    /// * `Ok(false)` - Limit reached, code inactive or expired, or unknown id
    pub async fn consume(&self, id: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        try_consume(&mut *conn, id, Utc::now()).await
    }
}

/// The conditional increment, on a caller-provided connection so it can run
/// inside the invoice transaction.
///
/// `rows_affected() == 1` is the only success signal; a prior read is never
/// trusted. A code that expired after validation is refused here too.
pub(crate) async fn try_consume(
    conn: &mut SqliteConnection,
    id: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE discount_codes
        SET usage_count = usage_count + 1
        WHERE id = ?1
          AND is_active = 1
          AND (expires_at IS NULL OR julianday(expires_at) > julianday(?2))
          AND (usage_limit IS NULL OR usage_count < usage_limit)
        "#,
    )
    .bind(id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let consumed = result.rows_affected() == 1;
    if consumed {
        debug!(id = %id, "Consumed discount code use");
    } else {
        warn!(id = %id, "Discount code consumption refused");
    }

    Ok(consumed)
}

// =============================================================================
// Unit Tests
// =============================================================================
