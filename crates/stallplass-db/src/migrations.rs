//! Schema migrations, embedded at build time from `migrations/sqlite/`.
//!
//! ```text
//! 001_pricing_schema.sql   base_prices, the three tier tables, discount_codes
//! 002_invoices.sql         invoices (frozen price figures, code reference)
//! ```
//!
//! Applied files are tracked in `_sqlx_migrations`. Files are append-only:
//! a changed checksum on an applied file fails startup.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static PRICING_SCHEMA: Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Brings the schema up to date. A no-op once everything is applied.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (known, applied_before) = migration_status(pool).await?;
    debug!(known, applied = applied_before, "Migrating pricing schema");

    PRICING_SCHEMA.run(pool).await?;

    if applied_before < known {
        info!(
            newly_applied = known - applied_before,
            "Pricing schema migrated"
        );
    }
    Ok(())
}

/// `(known, applied)` migration counts.
///
/// Before the first run the tracking table does not exist yet; that counts
/// as nothing applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let known = PRICING_SCHEMA.iter().count();

    let tracking_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    if !tracking_exists {
        return Ok((known, 0));
    }

    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok((known, usize::try_from(applied).unwrap_or(0)))
}
