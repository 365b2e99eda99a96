//! # Pricing Composer
//!
//! Turns a family's rates plus a quantity and a duration into an itemized
//! [`PricingBreakdown`]. Box, service and boost pricing all run through
//! [`calculate_pricing`]; only the inputs differ.
//!
//! ## Composition Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  base_price × quantity                    = total_monthly_price         │
//! │       │                                                                 │
//! │       ▼  × duration                       = gross_price                 │
//! │       │                                                                 │
//! │       ▼  duration tier  round(gross × (1 - d))      = after_duration    │
//! │       │                                                                 │
//! │       ▼  quantity tier  round(after × (1 - q))      = total_price       │
//! │       │                                                                 │
//! │       ▼  (optional, caller) apply_discount(code)    = final_price       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Discounts multiply; they are never added. Duration is applied before
//! quantity and each step rounds half up, so swapping the order can move
//! the total by an øre. Invoices depend on this exact order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount_code::AppliedDiscount;
use crate::error::{CoreError, CoreResult};
use crate::money::{DiscountRate, Money};
use crate::tier::resolve_rate;
use crate::types::{DiscountTier, DurationUnit, PricingFamily};
use crate::validation::{validate_duration, validate_quantity};

// =============================================================================
// Inputs
// =============================================================================

/// Everything the composer needs to price one family.
///
/// Built by a rate source (database, cache, or a test) and passed in, so
/// the composer itself never performs I/O.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FamilyRates {
    pub family: PricingFamily,
    pub base_price: Money,
    pub quantity_tiers: Vec<DiscountTier>,
    pub duration_tiers: Vec<DiscountTier>,
}

impl FamilyRates {
    /// Rates with no discount tiers.
    pub fn new(family: PricingFamily, base_price: Money) -> Self {
        FamilyRates {
            family,
            base_price,
            quantity_tiers: Vec::new(),
            duration_tiers: Vec::new(),
        }
    }

    pub fn with_quantity_tiers(mut self, tiers: Vec<DiscountTier>) -> Self {
        self.quantity_tiers = tiers;
        self
    }

    pub fn with_duration_tiers(mut self, tiers: Vec<DiscountTier>) -> Self {
        self.duration_tiers = tiers;
        self
    }
}

// =============================================================================
// Breakdown
// =============================================================================

/// Itemized result of a pricing calculation.
///
/// Money fields are øre. Percentage fields serialize as fractions (0.0-1.0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub family: PricingFamily,
    pub quantity: i64,
    pub duration: i64,
    pub duration_unit: DurationUnit,
    /// Unit rate per box per period. "Monthly" names the period; for
    /// boosts the period is one day.
    pub base_monthly_price: Money,
    /// `base_monthly_price × quantity`, one period.
    pub total_monthly_price: Money,
    /// `total_monthly_price × duration`, before any discount.
    pub gross_price: Money,
    pub duration_discount_percentage: DiscountRate,
    pub duration_discount_amount: Money,
    pub quantity_discount_percentage: DiscountRate,
    pub quantity_discount_amount: Money,
    pub subtotal_after_tiered_discounts: Money,
    /// What is charged when no discount code is applied.
    pub total_price: Money,
    pub code_discount_amount: Money,
    pub final_price: Money,
}

impl PricingBreakdown {
    /// Records a discount code the caller validated against `total_price`.
    ///
    /// The composer never applies codes on its own.
    pub fn apply_discount(mut self, applied: &AppliedDiscount) -> Self {
        let discount = applied.discount_amount.min(self.total_price);
        self.code_discount_amount = discount;
        self.final_price = self.total_price.saturating_sub_to_zero(discount);
        self
    }

    /// Effective price per box per period after tiered discounts, in øre.
    ///
    /// Used for comparing offers; fractional øre are kept.
    pub fn effective_unit_price(&self) -> f64 {
        self.total_price.ore() as f64 / (self.quantity * self.duration) as f64
    }
}

// =============================================================================
// Composer
// =============================================================================

/// Prices `quantity` units for `duration` periods of `rates.family`.
///
/// ## Errors
/// * `CoreError::InvalidInput` - quantity or duration below 1 or above the
///   family's limit
/// * `CoreError::Overflow` - figures do not fit in i64 øre
///
/// ## Example
/// ```rust
/// use stallplass_core::money::{DiscountRate, Money};
/// use stallplass_core::pricing::{calculate_pricing, FamilyRates};
/// use stallplass_core::types::{DiscountTier, PricingFamily, TierKind};
///
/// let twelve_months = DiscountTier {
///     id: "12m".into(),
///     family: PricingFamily::Box,
///     kind: TierKind::Duration,
///     min_value: 12,
///     max_value: None,
///     discount_percentage: DiscountRate::from_percent(15),
///     is_active: true,
/// };
/// let rates = FamilyRates::new(PricingFamily::Box, Money::from_ore(100))
///     .with_duration_tiers(vec![twelve_months]);
///
/// let breakdown = calculate_pricing(&rates, 5, 12).unwrap();
/// assert_eq!(breakdown.total_monthly_price.ore(), 500);
/// assert_eq!(breakdown.total_price.ore(), 5100);
/// ```
pub fn calculate_pricing(
    rates: &FamilyRates,
    quantity: i64,
    duration: i64,
) -> CoreResult<PricingBreakdown> {
    let unit = rates.family.duration_unit();
    validate_quantity(quantity)?;
    validate_duration(duration, unit)?;

    let overflow = || CoreError::Overflow {
        context: format!(
            "{} x{} for {} {:?}",
            rates.family, quantity, duration, unit
        ),
    };

    let total_monthly_price = rates.base_price.checked_mul(quantity).ok_or_else(overflow)?;
    let gross_price = total_monthly_price.checked_mul(duration).ok_or_else(overflow)?;

    let duration_rate = resolve_rate(&rates.duration_tiers, duration);
    let after_duration = gross_price.discounted_by(duration_rate);

    let quantity_rate = resolve_rate(&rates.quantity_tiers, quantity);
    let total_price = after_duration.discounted_by(quantity_rate);

    Ok(PricingBreakdown {
        family: rates.family,
        quantity,
        duration,
        duration_unit: unit,
        base_monthly_price: rates.base_price,
        total_monthly_price,
        gross_price,
        duration_discount_percentage: duration_rate,
        duration_discount_amount: gross_price - after_duration,
        quantity_discount_percentage: quantity_rate,
        quantity_discount_amount: after_duration - total_price,
        subtotal_after_tiered_discounts: total_price,
        total_price,
        code_discount_amount: Money::zero(),
        final_price: total_price,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TierKind;

    fn band(kind: TierKind, min: i64, max: Option<i64>, bps: u32) -> DiscountTier {
        DiscountTier {
            id: format!("{:?}-{}", kind, min),
            family: PricingFamily::Box,
            kind,
            min_value: min,
            max_value: max,
            discount_percentage: DiscountRate::from_bps(bps),
            is_active: true,
        }
    }

    fn box_rates() -> FamilyRates {
        FamilyRates::new(PricingFamily::Box, Money::from_ore(100))
            .with_quantity_tiers(vec![
                band(TierKind::Quantity, 1, Some(4), 0),
                band(TierKind::Quantity, 5, Some(9), 1000),
                band(TierKind::Quantity, 10, None, 2000),
            ])
            .with_duration_tiers(vec![
                band(TierKind::Duration, 3, Some(5), 500),
                band(TierKind::Duration, 6, Some(11), 1000),
                band(TierKind::Duration, 12, None, 1500),
            ])
    }

    #[test]
    fn test_no_tiers_is_plain_multiplication() {
        let rates = FamilyRates::new(PricingFamily::Box, Money::from_ore(100));
        let breakdown = calculate_pricing(&rates, 5, 1).unwrap();

        assert_eq!(breakdown.total_monthly_price.ore(), 500);
        assert_eq!(breakdown.total_price.ore(), 500);
        assert_eq!(breakdown.final_price.ore(), 500);
        assert!(breakdown.duration_discount_percentage.is_zero());
        assert!(breakdown.quantity_discount_amount.is_zero());
    }

    #[test]
    fn test_duration_discount_for_twelve_months() {
        let rates = FamilyRates::new(PricingFamily::Box, Money::from_ore(100))
            .with_duration_tiers(vec![DiscountTier {
                discount_percentage: DiscountRate::try_from_fraction(0.15).unwrap(),
                ..band(TierKind::Duration, 1, None, 0)
            }]);

        let breakdown = calculate_pricing(&rates, 5, 12).unwrap();
        assert_eq!(breakdown.total_monthly_price.ore(), 500);
        assert_eq!(breakdown.gross_price.ore(), 6000);
        assert_eq!(breakdown.subtotal_after_tiered_discounts.ore(), 5100);
        assert_eq!(breakdown.duration_discount_amount.ore(), 900);
    }

    #[test]
    fn test_discounts_multiply_duration_then_quantity() {
        let breakdown = calculate_pricing(&box_rates(), 7, 12).unwrap();

        // 100 * 7 * 12 = 8400; * 0.85 = 7140; * 0.90 = 6426
        assert_eq!(breakdown.gross_price.ore(), 8400);
        assert_eq!(breakdown.duration_discount_amount.ore(), 1260);
        assert_eq!(breakdown.quantity_discount_percentage.bps(), 1000);
        assert_eq!(breakdown.quantity_discount_amount.ore(), 714);
        assert_eq!(breakdown.total_price.ore(), 6426);

        // Additive stacking would give 8400 * 0.75 = 6300
        assert_ne!(breakdown.total_price.ore(), 6300);
    }

    #[test]
    fn test_rounding_happens_after_each_step() {
        // 333 * 3 = 999; * 0.95 = 949.05 -> 949; * 0.90 = 854.1 -> 854
        let rates = FamilyRates::new(PricingFamily::Box, Money::from_ore(333))
            .with_quantity_tiers(vec![band(TierKind::Quantity, 1, None, 1000)])
            .with_duration_tiers(vec![band(TierKind::Duration, 3, None, 500)]);
        let breakdown = calculate_pricing(&rates, 1, 3).unwrap();
        assert_eq!(breakdown.gross_price.ore(), 999);
        assert_eq!(breakdown.total_price.ore(), 854);
        assert_eq!(
            breakdown.duration_discount_amount + breakdown.quantity_discount_amount
                + breakdown.total_price,
            breakdown.gross_price
        );
    }

    #[test]
    fn test_rejects_zero_quantity_and_duration() {
        let rates = box_rates();
        assert!(matches!(
            calculate_pricing(&rates, 0, 1),
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            calculate_pricing(&rates, 1, 0),
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            calculate_pricing(&rates, -2, 1),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_boost_uses_day_limits() {
        let rates = FamilyRates::new(PricingFamily::Boost, Money::from_ore(1000))
            .with_duration_tiers(vec![DiscountTier {
                family: PricingFamily::Boost,
                ..band(TierKind::Duration, 30, None, 2000)
            }]);

        let breakdown = calculate_pricing(&rates, 2, 30).unwrap();
        assert_eq!(breakdown.duration_unit, DurationUnit::Days);
        assert_eq!(breakdown.gross_price.ore(), 60_000);
        assert_eq!(breakdown.total_price.ore(), 48_000);

        // 200 days is fine for boosts, 200 months is not for boxes
        assert!(calculate_pricing(&rates, 1, 200).is_ok());
        assert!(calculate_pricing(&box_rates(), 1, 200).is_err());
        assert!(calculate_pricing(&rates, 1, 366).is_err());
    }

    #[test]
    fn test_overflow_is_reported() {
        let rates = FamilyRates::new(PricingFamily::Box, Money::from_ore(i64::MAX / 2));
        assert!(matches!(
            calculate_pricing(&rates, 3, 1),
            Err(CoreError::Overflow { .. })
        ));
    }

    #[test]
    fn test_idempotent() {
        let rates = box_rates();
        let first = serde_json::to_vec(&calculate_pricing(&rates, 8, 7).unwrap()).unwrap();
        let second = serde_json::to_vec(&calculate_pricing(&rates, 8, 7).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unit_price_never_increases_with_quantity_or_months() {
        let rates = box_rates();
        for months in 1..=24 {
            let mut previous = f64::MAX;
            for quantity in 1..=30 {
                let unit = calculate_pricing(&rates, quantity, months)
                    .unwrap()
                    .effective_unit_price();
                assert!(unit <= previous + 0.5, "q={quantity} m={months}");
                previous = unit;
            }
        }
        for quantity in 1..=30 {
            let mut previous = f64::MAX;
            for months in 1..=24 {
                let unit = calculate_pricing(&rates, quantity, months)
                    .unwrap()
                    .effective_unit_price();
                assert!(unit <= previous + 0.5, "q={quantity} m={months}");
                previous = unit;
            }
        }
    }

    #[test]
    fn test_apply_discount_sets_final_price() {
        let breakdown = calculate_pricing(&box_rates(), 1, 1).unwrap();
        let applied = AppliedDiscount {
            discount_code_id: "c".to_string(),
            code: "TEN".to_string(),
            discount_amount: Money::from_ore(10),
            final_amount: Money::from_ore(90),
        };

        let with_code = breakdown.clone().apply_discount(&applied);
        assert_eq!(with_code.total_price, breakdown.total_price);
        assert_eq!(with_code.code_discount_amount.ore(), 10);
        assert_eq!(with_code.final_price.ore(), 90);
    }

    #[test]
    fn test_breakdown_wire_format() {
        let json = serde_json::to_value(calculate_pricing(&box_rates(), 5, 12).unwrap()).unwrap();
        assert_eq!(json["family"], "box");
        assert_eq!(json["baseMonthlyPrice"], 100);
        assert_eq!(json["totalMonthlyPrice"], 500);
        assert_eq!(json["subtotalAfterTieredDiscounts"], json["totalPrice"]);
        assert!(json.get("basePrice").is_none());
        assert_eq!(json["durationUnit"], "months");
        assert_eq!(json["durationDiscountPercentage"], 0.15);
        assert_eq!(json["quantityDiscountPercentage"], 0.1);
        assert!(json["totalPrice"].is_i64());
    }
}
