//! # Pricing Service
//!
//! Quotes for the three pricing families, plus the display-only base prices.
//!
//! ## Charge vs Display
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  quote(Box, 5, 12)                  display_base_price(Box)             │
//! │     │                                  │                                │
//! │     ▼                                  ▼                                │
//! │  rates.family_rates(Box)            rates.base_price("box-monthly")     │
//! │     │                                  │                                │
//! │     ├─ RateNotFound → 500              ├─ RateNotFound → fallback       │
//! │     ▼                                  │   (warn log, isFallback=true)  │
//! │  calculate_pricing(...)                ▼                                │
//! │                                     price shown on the landing page     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use stallplass_core::validation::{validate_duration, validate_quantity};
use stallplass_core::{
    calculate_pricing, DiscountTier, DurationUnit, Money, PricingBreakdown, PricingFamily,
    TierKind,
};
use stallplass_db::{DbError, RateSource};
use tracing::{debug, warn};

use crate::error::ApiResult;

/// Display-only stand-in when a base price row is missing.
pub const fn fallback_base_price(family: PricingFamily) -> Money {
    match family {
        PricingFamily::Box => Money::from_ore(10_000),
        PricingFamily::Service => Money::from_ore(10_000),
        PricingFamily::Boost => Money::from_ore(1_000),
    }
}

/// A base price as shown to visitors.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayBasePrice {
    pub family: PricingFamily,
    pub name: &'static str,
    pub price: Money,
    pub duration_unit: DurationUnit,
    /// `true` when `price` is the built-in fallback.
    pub is_fallback: bool,
}

/// Prices an order. Never falls back: a missing rate is an error.
///
/// Inputs are checked before any rate is read, so a bad request is a 400
/// even on an unconfigured database.
pub async fn quote<S: RateSource + ?Sized>(
    rates: &S,
    family: PricingFamily,
    quantity: i64,
    duration: i64,
) -> ApiResult<PricingBreakdown> {
    validate_quantity(quantity)?;
    validate_duration(duration, family.duration_unit())?;

    let family_rates = rates.family_rates(family).await?;
    let breakdown = calculate_pricing(&family_rates, quantity, duration)?;

    debug!(
        %family,
        quantity,
        duration,
        total = breakdown.total_price.ore(),
        "Quoted price"
    );
    Ok(breakdown)
}

/// The base price of `family` for display, substituting the fallback if no
/// active row exists.
pub async fn display_base_price<S: RateSource + ?Sized>(
    rates: &S,
    family: PricingFamily,
) -> ApiResult<DisplayBasePrice> {
    let name = family.base_rate_name();

    let (price, is_fallback) = match rates.base_price(name).await {
        Ok(price) => (price, false),
        Err(DbError::RateNotFound { .. }) => {
            let fallback = fallback_base_price(family);
            warn!(rate = name, fallback = fallback.ore(), "Base price missing, showing fallback");
            (fallback, true)
        }
        Err(e) => return Err(e.into()),
    };

    Ok(DisplayBasePrice {
        family,
        name,
        price,
        duration_unit: family.duration_unit(),
        is_fallback,
    })
}

/// Display base prices for every family.
pub async fn display_base_prices<S: RateSource + ?Sized>(
    rates: &S,
) -> ApiResult<Vec<DisplayBasePrice>> {
    let mut prices = Vec::with_capacity(PricingFamily::ALL.len());
    for family in PricingFamily::ALL {
        prices.push(display_base_price(rates, family).await?);
    }
    Ok(prices)
}

/// Duration tiers of `family`, ordered by `min_value`, for price tables.
pub async fn display_duration_tiers<S: RateSource + ?Sized>(
    rates: &S,
    family: PricingFamily,
) -> ApiResult<Vec<DiscountTier>> {
    let mut tiers = rates.tiers(family, TierKind::Duration).await?;
    tiers.sort_by_key(|tier| tier.min_value);
    Ok(tiers)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use stallplass_db::{Database, DbConfig};

    async fn empty_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_quote_refuses_to_guess_missing_rate() {
        let db = empty_db().await;

        let err = quote(&db, PricingFamily::Box, 1, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigurationError);
    }

    #[tokio::test]
    async fn test_quote_validates_before_reading_rates() {
        let db = empty_db().await;

        let err = quote(&db, PricingFamily::Box, 0, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = quote(&db, PricingFamily::Boost, 1, 366).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_display_falls_back_only_for_missing_rows() {
        let db = empty_db().await;
        db.base_prices()
            .upsert("boost-daily", Money::from_ore(1500), None, true)
            .await
            .unwrap();

        let prices = display_base_prices(&db).await.unwrap();
        assert_eq!(prices.len(), 3);

        let boost = prices.iter().find(|p| p.family == PricingFamily::Boost).unwrap();
        assert_eq!(boost.price.ore(), 1500);
        assert!(!boost.is_fallback);

        let service = prices.iter().find(|p| p.family == PricingFamily::Service).unwrap();
        assert_eq!(service.price, fallback_base_price(PricingFamily::Service));
        assert!(service.is_fallback);
    }
}
