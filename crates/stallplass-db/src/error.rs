//! # Persistence Errors
//!
//! Every repository returns [`DbResult`]. Raw `sqlx` failures are folded into
//! [`DbError`] here so callers can match on what went wrong with the pricing
//! data rather than on driver internals.
//!
//! ```text
//! sqlx::Error ──┐
//! bad stored row ┼──► DbError ──► ApiError (pricing-api) ──► HTTP status
//! bad input ─────┘
//! ```

use stallplass_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Lookup by id found nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// No active base price row for a rate name.
    ///
    /// ## When This Occurs
    /// - `box-monthly` was never seeded
    /// - An admin deactivated the row
    ///
    /// Charges must fail on this; only display paths may substitute a fallback.
    #[error("No active base price named '{name}'")]
    RateNotFound { name: String },

    /// A stored row breaks a pricing rule.
    ///
    /// ## When This Occurs
    /// - `discount_percentage` outside 0-100 in a whole-percent table
    /// - `discount_fraction` outside 0.0-1.0
    /// - Unparseable `applicable_item_types` JSON
    #[error("Invalid data in {table}: {reason}")]
    InvalidData { table: String, reason: String },

    /// The conditional consume updated no row.
    ///
    /// ## When This Occurs
    /// - Two checkouts raced for the last use of a code and this one lost
    /// - The code was deactivated between validation and checkout
    #[error("Discount code '{code}' has no remaining uses")]
    UsageLimitReached { code: String },

    /// Input rejected before any SQL ran.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// ## When This Occurs
    /// - Creating a discount code whose normalized text already exists
    /// - Invoice number collision
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// An invoice pointed at a discount code that does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite rejected the statement (CHECK constraint, syntax, busy).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No pooled connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn invalid_data(table: impl Into<String>, reason: impl Into<String>) -> Self {
        DbError::InvalidData {
            table: table.into(),
            reason: reason.into(),
        }
    }
}

/// Column named in a SQLite constraint message,
/// e.g. `UNIQUE constraint failed: discount_codes.code` gives `discount_codes.code`.
fn constrained_column(message: &str) -> String {
    message
        .rsplit_once(": ")
        .map(|(_, column)| column.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    DbError::duplicate(constrained_column(db_err.message()), "unknown")
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        message: db_err.message().to_string(),
                    }
                } else {
                    DbError::QueryFailed(db_err.message().to_string())
                }
            }

            sqlx::Error::ColumnDecode { index, source } => {
                DbError::invalid_data(format!("column {}", index), source.to_string())
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
