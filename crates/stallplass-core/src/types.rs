//! # Domain Types
//!
//! Core domain types used throughout Stallplass pricing.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   BasePrice     │   │  DiscountTier   │   │  DiscountCode   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name (unique)  │   │  family + kind  │   │  code (upper)   │       │
//! │  │  price (øre)    │   │  min..=max      │   │  kind + value   │       │
//! │  │  is_active      │   │  rate (bps)     │   │  usage / expiry │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ PricingFamily   │   │    ItemType     │   │    Invoice      │       │
//! │  │  Box            │   │ BOX_ADVERTISING │   │  breakdown      │       │
//! │  │  Service        │   │ SERVICE_ADV...  │   │  code + amount  │       │
//! │  │  Boost          │   │ BOX_SPONSORED   │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{DiscountRate, Money};

// =============================================================================
// Pricing Family
// =============================================================================

/// One pricing domain with its own base rate and tier tables.
///
/// All families share the same composition algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PricingFamily {
    /// Stable box advertising, priced per box per month.
    Box,
    /// Service provider listings, priced per month.
    Service,
    /// Sponsored placement of a box, priced per box per day.
    Boost,
}

impl PricingFamily {
    pub const ALL: [PricingFamily; 3] =
        [PricingFamily::Box, PricingFamily::Service, PricingFamily::Boost];

    /// Name of the `BasePrice` row that holds this family's unit rate.
    pub const fn base_rate_name(&self) -> &'static str {
        match self {
            PricingFamily::Box => "box-monthly",
            PricingFamily::Service => "service-monthly",
            PricingFamily::Boost => "boost-daily",
        }
    }

    pub const fn duration_unit(&self) -> DurationUnit {
        match self {
            PricingFamily::Box | PricingFamily::Service => DurationUnit::Months,
            PricingFamily::Boost => DurationUnit::Days,
        }
    }

    /// The discount-code item type that a purchase in this family is billed as.
    pub const fn item_type(&self) -> ItemType {
        match self {
            PricingFamily::Box => ItemType::BoxAdvertising,
            PricingFamily::Service => ItemType::ServiceAdvertising,
            PricingFamily::Boost => ItemType::BoxSponsored,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PricingFamily::Box => "box",
            PricingFamily::Service => "service",
            PricingFamily::Boost => "boost",
        }
    }
}

impl fmt::Display for PricingFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingFamily {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "box" => Ok(PricingFamily::Box),
            "service" => Ok(PricingFamily::Service),
            "boost" => Ok(PricingFamily::Boost),
            other => Err(ValidationError::InvalidFormat {
                field: "family".to_string(),
                reason: format!("unknown pricing family '{}'", other),
            }),
        }
    }
}

/// Unit of the duration axis for a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Months,
    Days,
}

// =============================================================================
// Item Type
// =============================================================================

/// What a discount code may be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    BoxAdvertising,
    ServiceAdvertising,
    BoxSponsored,
}

// =============================================================================
// Base Price
// =============================================================================

/// A named unit rate, e.g. `box-monthly`.
///
/// Exactly one row per name exists; admin updates happen in place.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BasePrice {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub description: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Discount Tier
// =============================================================================

/// Which axis a tier is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TierKind {
    /// Number of boxes in the order.
    Quantity,
    /// Months for box/service advertising, days for boosts.
    Duration,
}

/// A band over an integer axis mapped to a discount.
///
/// `min_value` is inclusive. `max_value` is inclusive; `None` is unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountTier {
    pub id: String,
    pub family: PricingFamily,
    pub kind: TierKind,
    pub min_value: i64,
    pub max_value: Option<i64>,
    pub discount_percentage: DiscountRate,
    pub is_active: bool,
}

impl DiscountTier {
    /// Whether `value` falls inside the band.
    #[inline]
    pub fn contains(&self, value: i64) -> bool {
        value >= self.min_value && self.max_value.map_or(true, |max| value <= max)
    }

    /// Whether two bands share at least one value.
    pub fn overlaps(&self, other: &DiscountTier) -> bool {
        let self_max = self.max_value.unwrap_or(i64::MAX);
        let other_max = other.max_value.unwrap_or(i64::MAX);
        self.min_value <= other_max && other.min_value <= self_max
    }
}

// =============================================================================
// Discount Code
// =============================================================================

/// Wire/persistence tag for the discount kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
}

/// How a discount code reduces an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "discountType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// A whole percent of the amount, optionally capped.
    #[serde(rename_all = "camelCase")]
    Percentage {
        percent: u32,
        max_discount: Option<Money>,
    },
    /// A fixed reduction, never more than the amount.
    #[serde(rename_all = "camelCase")]
    FixedAmount { amount: Money },
}

impl DiscountKind {
    /// Builds a kind from the flat `discountType`/`discountValue`/`maxDiscount`
    /// shape used by the admin API and the database.
    ///
    /// ## Rules
    /// - `PERCENTAGE`: value 0..=100, optional `max_discount` >= 0
    /// - `FIXED_AMOUNT`: value >= 0, `max_discount` must be absent
    pub fn from_parts(
        discount_type: DiscountType,
        value: i64,
        max_discount: Option<i64>,
    ) -> Result<Self, ValidationError> {
        match discount_type {
            DiscountType::Percentage => {
                if !(0..=100).contains(&value) {
                    return Err(ValidationError::OutOfRange {
                        field: "discountValue".to_string(),
                        min: 0,
                        max: 100,
                    });
                }
                if let Some(cap) = max_discount {
                    if cap < 0 {
                        return Err(ValidationError::OutOfRange {
                            field: "maxDiscount".to_string(),
                            min: 0,
                            max: i64::MAX,
                        });
                    }
                }
                Ok(DiscountKind::Percentage {
                    percent: value as u32,
                    max_discount: max_discount.map(Money::from_ore),
                })
            }
            DiscountType::FixedAmount => {
                if value < 0 {
                    return Err(ValidationError::OutOfRange {
                        field: "discountValue".to_string(),
                        min: 0,
                        max: i64::MAX,
                    });
                }
                if max_discount.is_some() {
                    return Err(ValidationError::InvalidFormat {
                        field: "maxDiscount".to_string(),
                        reason: "only applies to PERCENTAGE codes".to_string(),
                    });
                }
                Ok(DiscountKind::FixedAmount {
                    amount: Money::from_ore(value),
                })
            }
        }
    }

    /// Splits back into `(type, value, max_discount)` for persistence.
    pub fn to_parts(&self) -> (DiscountType, i64, Option<i64>) {
        match *self {
            DiscountKind::Percentage {
                percent,
                max_discount,
            } => (
                DiscountType::Percentage,
                percent as i64,
                max_discount.map(|m| m.ore()),
            ),
            DiscountKind::FixedAmount { amount } => (DiscountType::FixedAmount, amount.ore(), None),
        }
    }
}

/// A user-enterable discount code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    pub id: String,
    /// Stored trimmed and uppercased.
    pub code: String,
    pub name: Option<String>,
    pub kind: DiscountKind,
    pub applicable_item_types: Vec<ItemType>,
    pub is_active: bool,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` means unlimited.
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl DiscountCode {
    pub fn applies_to(&self, item_type: ItemType) -> bool {
        self.applicable_item_types.contains(&item_type)
    }

    pub fn has_remaining_uses(&self) -> bool {
        self.usage_limit.map_or(true, |limit| self.usage_count < limit)
    }

    /// Expired when `now` is at or past `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expires| now >= expires)
    }
}

// =============================================================================
// Invoice
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Created, waiting for payment.
    Pending,
    Paid,
    Cancelled,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Pending
    }
}

/// An advertising invoice with its frozen price figures.
///
/// Figures are snapshotted at creation so later rate changes never alter it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub family: PricingFamily,
    pub item_type: ItemType,
    pub quantity: i64,
    pub duration: i64,
    pub duration_unit: DurationUnit,
    /// Price after tiered discounts, before any discount code.
    pub total_price: Money,
    pub discount_code_id: Option<String>,
    pub discount_amount: Money,
    pub final_price: Money,
    pub status: InvoiceStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(min: i64, max: Option<i64>) -> DiscountTier {
        DiscountTier {
            id: format!("t-{}", min),
            family: PricingFamily::Box,
            kind: TierKind::Quantity,
            min_value: min,
            max_value: max,
            discount_percentage: DiscountRate::zero(),
            is_active: true,
        }
    }

    #[test]
    fn test_family_metadata() {
        assert_eq!(PricingFamily::Box.base_rate_name(), "box-monthly");
        assert_eq!(PricingFamily::Boost.duration_unit(), DurationUnit::Days);
        assert_eq!(PricingFamily::Service.item_type(), ItemType::ServiceAdvertising);
        assert_eq!(" Boost ".parse::<PricingFamily>().unwrap(), PricingFamily::Boost);
        assert!("stable".parse::<PricingFamily>().is_err());
    }

    #[test]
    fn test_tier_contains() {
        let bounded = tier(5, Some(9));
        assert!(!bounded.contains(4));
        assert!(bounded.contains(5));
        assert!(bounded.contains(9));
        assert!(!bounded.contains(10));

        let open = tier(10, None);
        assert!(open.contains(10));
        assert!(open.contains(i64::MAX));
    }

    #[test]
    fn test_tier_overlaps() {
        assert!(!tier(1, Some(4)).overlaps(&tier(5, Some(9))));
        assert!(tier(1, Some(5)).overlaps(&tier(5, Some(9))));
        assert!(tier(10, None).overlaps(&tier(20, Some(30))));
        assert!(!tier(1, Some(9)).overlaps(&tier(10, None)));
    }

    #[test]
    fn test_discount_kind_from_parts() {
        let kind = DiscountKind::from_parts(DiscountType::Percentage, 20, Some(50)).unwrap();
        assert_eq!(
            kind,
            DiscountKind::Percentage {
                percent: 20,
                max_discount: Some(Money::from_ore(50))
            }
        );
        assert_eq!(kind.to_parts(), (DiscountType::Percentage, 20, Some(50)));

        assert!(DiscountKind::from_parts(DiscountType::Percentage, 101, None).is_err());
        assert!(DiscountKind::from_parts(DiscountType::FixedAmount, -1, None).is_err());
        assert!(DiscountKind::from_parts(DiscountType::FixedAmount, 100, Some(10)).is_err());
    }

    #[test]
    fn test_discount_kind_wire_format() {
        let kind = DiscountKind::FixedAmount {
            amount: Money::from_ore(2500),
        };
        let json = serde_json::to_value(kind).unwrap();
        assert_eq!(json["discountType"], "FIXED_AMOUNT");
        assert_eq!(json["amount"], 2500);
    }

    #[test]
    fn test_invoice_status_default() {
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Pending);
    }
}
