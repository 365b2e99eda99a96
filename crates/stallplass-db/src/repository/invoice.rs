//! # Invoice Repository
//!
//! Advertising invoices with their frozen price figures.
//!
//! ## Creation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── code applied?  ── try_consume(code id) ── refused? ── ROLLBACK   │
//! │    │                                                  → UsageLimitReached│
//! │    ▼                                                                    │
//! │    INSERT INTO invoices (... total, discount, final ...)                │
//! │    │                                                                    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The usage increment and the invoice row succeed or fail together.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::discount_code::try_consume;
use stallplass_core::{
    AppliedDiscount, Invoice, InvoiceStatus, ItemType, Money, PricingBreakdown, PricingFamily,
};

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    family: PricingFamily,
    item_type: ItemType,
    quantity: i64,
    duration: i64,
    total_price: i64,
    discount_code_id: Option<String>,
    discount_amount: i64,
    final_price: i64,
    status: InvoiceStatus,
    created_at: DateTime<Utc>,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Invoice {
            id: row.id,
            invoice_number: row.invoice_number,
            family: row.family,
            item_type: row.item_type,
            quantity: row.quantity,
            duration: row.duration,
            duration_unit: row.family.duration_unit(),
            total_price: Money::from_ore(row.total_price),
            discount_code_id: row.discount_code_id,
            discount_amount: Money::from_ore(row.discount_amount),
            final_price: Money::from_ore(row.final_price),
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// Repository for invoice operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Creates a pending invoice from a breakdown, consuming one use of
    /// `discount` if given.
    ///
    /// `discount` must have been validated against `breakdown.total_price`
    /// just before this call.
    ///
    /// ## Returns
    /// * `Ok(Invoice)` - Invoice stored (and code consumed)
    /// * `Err(DbError::UsageLimitReached)` - Another checkout took the last
    ///   use; nothing was written
    pub async fn create(
        &self,
        breakdown: &PricingBreakdown,
        discount: Option<&AppliedDiscount>,
    ) -> DbResult<Invoice> {
        let priced = match discount {
            Some(applied) => breakdown.clone().apply_discount(applied),
            None => breakdown.clone(),
        };

        let now = Utc::now();
        let invoice = Invoice {
            id: Uuid::new_v4().to_string(),
            invoice_number: generate_invoice_number(now),
            family: priced.family,
            item_type: priced.family.item_type(),
            quantity: priced.quantity,
            duration: priced.duration,
            duration_unit: priced.duration_unit,
            total_price: priced.total_price,
            discount_code_id: discount.map(|d| d.discount_code_id.clone()),
            discount_amount: priced.code_discount_amount,
            final_price: priced.final_price,
            status: InvoiceStatus::Pending,
            created_at: now,
        };

        debug!(
            invoice_number = %invoice.invoice_number,
            family = %invoice.family,
            final_price = invoice.final_price.ore(),
            "Creating invoice"
        );

        let mut tx = self.pool.begin().await?;

        if let Some(applied) = discount {
            if !try_consume(&mut *tx, &applied.discount_code_id, now).await? {
                // Dropping the transaction rolls it back
                return Err(DbError::UsageLimitReached {
                    code: applied.code.clone(),
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, family, item_type, quantity, duration,
                total_price, discount_code_id, discount_amount, final_price,
                status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(invoice.family)
        .bind(invoice.item_type)
        .bind(invoice.quantity)
        .bind(invoice.duration)
        .bind(invoice.total_price.ore())
        .bind(&invoice.discount_code_id)
        .bind(invoice.discount_amount.ore())
        .bind(invoice.final_price.ore())
        .bind(invoice.status)
        .bind(invoice.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            invoice_number = %invoice.invoice_number,
            discount_code_id = ?invoice.discount_code_id,
            "Invoice created"
        );

        Ok(invoice)
    }

    /// Gets an invoice by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let row: Option<InvoiceRow> = sqlx::query_as(
            r#"
            SELECT id, invoice_number, family, item_type, quantity, duration,
                   total_price, discount_code_id, discount_amount, final_price,
                   status, created_at
            FROM invoices
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Invoice::from))
    }
}

/// Format: `SP-YYYYMMDD-XXXXXXXX` (eight random hex digits).
fn generate_invoice_number(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect();
    format!("SP-{}-{}", now.format("%Y%m%d"), suffix.to_uppercase())
}

// =============================================================================
// Unit Tests
// =============================================================================
