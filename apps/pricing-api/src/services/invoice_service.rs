//! # Invoice Service
//!
//! Checkout: price the order, apply an optional discount code, and store a
//! pending invoice while consuming one use of the code.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CreateInvoiceRequest { family, quantity, duration, discountCode }      │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  quote() ──────────────────────────────► PricingBreakdown               │
//! │     │                                         │ totalPrice              │
//! │     ▼                                         ▼                         │
//! │  find_by_code() → validate_discount_code(record, totalPrice, itemType)  │
//! │     │   rejected → 400 DISCOUNT_CODE_REJECTED                           │
//! │     ▼                                                                   │
//! │  invoices().create(breakdown, applied)                                  │
//! │     one transaction: conditional usage increment + INSERT               │
//! │     lost the race → 400 DISCOUNT_CODE_REJECTED, nothing written         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The read-only validation here only produces the discount amount; the
//! usage limit is enforced again, atomically, by the insert transaction.

use chrono::Utc;
use serde::Deserialize;
use stallplass_core::{
    validate_discount_code, AppliedDiscount, Invoice, Money, PricingFamily, ValidationError,
};
use stallplass_db::{Database, RateSource};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::services::pricing_service::quote;

/// Body of `POST /api/invoices`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub family: PricingFamily,
    /// Boxes; defaults to 1. Service listings are always a single unit.
    #[serde(default = "one")]
    pub quantity: i64,
    /// Months for box/service, days for boost.
    pub duration: i64,
    #[serde(default)]
    pub discount_code: Option<String>,
}

fn one() -> i64 {
    1
}

/// Prices and stores a pending invoice.
pub async fn create_invoice<S: RateSource + ?Sized>(
    db: &Database,
    rates: &S,
    request: &CreateInvoiceRequest,
) -> ApiResult<Invoice> {
    if request.family == PricingFamily::Service && request.quantity != 1 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: 1,
        }
        .into());
    }

    let breakdown = quote(rates, request.family, request.quantity, request.duration).await?;

    let applied = match request.discount_code.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            Some(apply_code(db, raw, breakdown.total_price, request.family).await?)
        }
        _ => None,
    };

    let invoice = db.invoices().create(&breakdown, applied.as_ref()).await?;

    info!(
        invoice_number = %invoice.invoice_number,
        family = %invoice.family,
        final_price = invoice.final_price.ore(),
        "Checkout completed"
    );
    Ok(invoice)
}

async fn apply_code(
    db: &Database,
    raw: &str,
    amount: Money,
    family: PricingFamily,
) -> ApiResult<AppliedDiscount> {
    let record = db.discount_codes().find_by_code(raw).await?;

    validate_discount_code(record.as_ref(), amount, family.item_type(), Utc::now())?
        .map_err(ApiError::rejected)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use stallplass_core::{DiscountCode, DiscountKind, ItemType};
    use stallplass_db::DbConfig;

    async fn priced_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for family in PricingFamily::ALL {
            db.base_prices()
                .upsert(family.base_rate_name(), Money::from_ore(1000), None, true)
                .await
                .unwrap();
        }
        db
    }

    fn request(family: PricingFamily, quantity: i64, code: Option<&str>) -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            family,
            quantity,
            duration: 1,
            discount_code: code.map(str::to_string),
        }
    }

    async fn insert_code(db: &Database, code: &str, item_types: Vec<ItemType>) -> DiscountCode {
        db.discount_codes()
            .insert(&DiscountCode {
                id: String::new(),
                code: code.to_string(),
                name: None,
                kind: DiscountKind::Percentage {
                    percent: 20,
                    max_discount: Some(Money::from_ore(50)),
                },
                applicable_item_types: item_types,
                is_active: true,
                expires_at: None,
                usage_limit: Some(1),
                usage_count: 0,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_checkout_applies_capped_code() {
        let db = priced_db().await;
        insert_code(&db, "SUMMER20", vec![ItemType::BoxAdvertising]).await;

        let invoice = create_invoice(&db, &db, &request(PricingFamily::Box, 1, Some(" summer20 ")))
            .await
            .unwrap();

        assert_eq!(invoice.total_price.ore(), 1000);
        assert_eq!(invoice.discount_amount.ore(), 50);
        assert_eq!(invoice.final_price.ore(), 950);
    }

    #[tokio::test]
    async fn test_checkout_rejects_ineligible_and_exhausted_codes() {
        let db = priced_db().await;
        insert_code(&db, "BOXONLY", vec![ItemType::BoxAdvertising]).await;

        let err = create_invoice(&db, &db, &request(PricingFamily::Boost, 1, Some("BOXONLY")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountCodeRejected);

        create_invoice(&db, &db, &request(PricingFamily::Box, 1, Some("BOXONLY")))
            .await
            .unwrap();
        let err = create_invoice(&db, &db, &request(PricingFamily::Box, 1, Some("BOXONLY")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountCodeRejected);
    }

    #[tokio::test]
    async fn test_blank_code_is_ignored_and_service_quantity_is_fixed() {
        let db = priced_db().await;

        let invoice = create_invoice(&db, &db, &request(PricingFamily::Service, 1, Some("  ")))
            .await
            .unwrap();
        assert!(invoice.discount_code_id.is_none());

        let err = create_invoice(&db, &db, &request(PricingFamily::Service, 2, None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
