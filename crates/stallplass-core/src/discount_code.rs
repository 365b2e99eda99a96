//! # Discount Code Validator
//!
//! Decides whether a discount code applies to an amount and what it takes off.
//!
//! ## Check Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "  summer20 " ── normalize_code ──► "SUMMER20" ── lookup (caller) ──┐  │
//! │                                                                      │  │
//! │  validate_discount_code(record, amount, item_type, now)  ◄───────────┘  │
//! │       │                                                                 │
//! │       ├── no record?            → CodeNotFound                          │
//! │       ├── !is_active?           → CodeInactive                          │
//! │       ├── now >= expires_at?    → CodeExpired                           │
//! │       ├── item type not listed? → ItemTypeNotEligible                   │
//! │       ├── usage_count >= limit? → UsageLimitReached                     │
//! │       │                                                                 │
//! │       └── AppliedDiscount { discount_amount, final_amount }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation is read-only. Usage is only incremented by the atomic consume
//! step that runs when an invoice is created (`stallplass-db`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CodeRejection, CoreResult};
use crate::money::{DiscountRate, Money};
use crate::types::{DiscountCode, DiscountKind, ItemType};
use crate::validation::validate_amount;

/// A code that passed validation, with the figures it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    pub discount_code_id: String,
    pub code: String,
    pub discount_amount: Money,
    /// `amount - discount_amount`, never negative.
    pub final_amount: Money,
}

/// Trims and uppercases user input so `" summer20"` finds `SUMMER20`.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Computes the reduction a code kind gives on `amount`.
///
/// - Percentage: `round(amount * percent / 100)`, capped by `max_discount`
/// - Fixed: `min(value, amount)`
///
/// The result is always within `0..=amount` for non-negative amounts.
pub fn discount_for(kind: &DiscountKind, amount: Money) -> Money {
    let raw = match *kind {
        DiscountKind::Percentage {
            percent,
            max_discount,
        } => {
            let share = amount.portion(DiscountRate::from_percent(percent));
            match max_discount {
                Some(cap) if share > cap => cap,
                _ => share,
            }
        }
        DiscountKind::FixedAmount { amount: value } => value.min(amount),
    };

    raw.max(Money::zero()).min(amount.max(Money::zero()))
}

/// Validates `record` (the result of looking up the normalized code) for a
/// purchase of `amount` of `item_type` at time `now`.
///
/// ## Returns
/// * `Ok(Ok(AppliedDiscount))` - code applies
/// * `Ok(Err(CodeRejection))` - code does not apply; show the reason inline
/// * `Err(CoreError::InvalidInput)` - `amount` is negative
///
/// ```rust
/// use chrono::Utc;
/// use stallplass_core::discount_code::validate_discount_code;
/// use stallplass_core::money::Money;
/// use stallplass_core::types::ItemType;
/// use stallplass_core::CodeRejection;
///
/// let outcome = validate_discount_code(None, Money::from_ore(1000), ItemType::BoxAdvertising, Utc::now());
/// assert_eq!(outcome.unwrap(), Err(CodeRejection::CodeNotFound));
/// ```
pub fn validate_discount_code(
    record: Option<&DiscountCode>,
    amount: Money,
    item_type: ItemType,
    now: DateTime<Utc>,
) -> CoreResult<Result<AppliedDiscount, CodeRejection>> {
    validate_amount(amount.ore())?;

    Ok(check_code(record, item_type, now).map(|code| {
        let discount_amount = discount_for(&code.kind, amount);
        AppliedDiscount {
            discount_code_id: code.id.clone(),
            code: code.code.clone(),
            discount_amount,
            final_amount: amount.saturating_sub_to_zero(discount_amount),
        }
    }))
}

fn check_code(
    record: Option<&DiscountCode>,
    item_type: ItemType,
    now: DateTime<Utc>,
) -> Result<&DiscountCode, CodeRejection> {
    let code = record.ok_or(CodeRejection::CodeNotFound)?;

    if !code.is_active {
        return Err(CodeRejection::CodeInactive);
    }
    if code.is_expired_at(now) {
        return Err(CodeRejection::CodeExpired);
    }
    if !code.applies_to(item_type) {
        return Err(CodeRejection::ItemTypeNotEligible);
    }
    if !code.has_remaining_uses() {
        return Err(CodeRejection::UsageLimitReached);
    }

    Ok(code)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn summer20() -> DiscountCode {
        DiscountCode {
            id: "code-1".to_string(),
            code: "SUMMER20".to_string(),
            name: Some("Sommerkampanje".to_string()),
            kind: DiscountKind::Percentage {
                percent: 20,
                max_discount: Some(Money::from_ore(50)),
            },
            applicable_item_types: vec![ItemType::BoxAdvertising, ItemType::BoxSponsored],
            is_active: true,
            expires_at: None,
            usage_limit: Some(10),
            usage_count: 3,
            created_at: Utc::now(),
        }
    }

    fn fixed(value: i64) -> DiscountCode {
        DiscountCode {
            kind: DiscountKind::FixedAmount {
                amount: Money::from_ore(value),
            },
            ..summer20()
        }
    }

    fn validate(code: Option<&DiscountCode>, amount: i64) -> Result<AppliedDiscount, CodeRejection> {
        validate_discount_code(code, Money::from_ore(amount), ItemType::BoxAdvertising, Utc::now())
            .unwrap()
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  summer20 "), "SUMMER20");
        assert_eq!(normalize_code("Sommer-Ø"), "SOMMER-Ø");
    }

    #[test]
    fn test_percentage_capped_by_max_discount() {
        let code = summer20();
        let applied = validate(Some(&code), 1000).unwrap();
        assert_eq!(applied.discount_amount.ore(), 50);
        assert_eq!(applied.final_amount.ore(), 950);
        assert_eq!(applied.discount_code_id, "code-1");
    }

    #[test]
    fn test_percentage_below_cap() {
        let code = summer20();
        let applied = validate(Some(&code), 200).unwrap();
        assert_eq!(applied.discount_amount.ore(), 40);
        assert_eq!(applied.final_amount.ore(), 160);
    }

    #[test]
    fn test_fixed_amount_never_exceeds_amount() {
        let code = fixed(2500);
        for amount in [0, 1, 999, 2500, 2501, 100_000] {
            let applied = validate(Some(&code), amount).unwrap();
            assert!(applied.final_amount.ore() >= 0);
            assert_eq!(applied.final_amount.ore(), (amount - 2500).max(0));
            assert_eq!(
                applied.discount_amount + applied.final_amount,
                Money::from_ore(amount)
            );
        }
    }

    #[test]
    fn test_not_found() {
        assert_eq!(validate(None, 1000), Err(CodeRejection::CodeNotFound));
    }

    #[test]
    fn test_inactive() {
        let mut code = summer20();
        code.is_active = false;
        assert_eq!(validate(Some(&code), 1000), Err(CodeRejection::CodeInactive));
    }

    #[test]
    fn test_expired_yesterday_wins_over_everything_else() {
        let mut code = summer20();
        code.expires_at = Some(Utc::now() - Duration::days(1));
        code.usage_count = 10; // also exhausted
        code.applicable_item_types = vec![ItemType::ServiceAdvertising]; // also ineligible
        assert_eq!(validate(Some(&code), 1000), Err(CodeRejection::CodeExpired));
    }

    #[test]
    fn test_not_yet_expired() {
        let mut code = summer20();
        code.expires_at = Some(Utc::now() + Duration::days(1));
        assert!(validate(Some(&code), 1000).is_ok());
    }

    #[test]
    fn test_item_type_not_eligible() {
        let code = summer20();
        let outcome = validate_discount_code(
            Some(&code),
            Money::from_ore(1000),
            ItemType::ServiceAdvertising,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(outcome, Err(CodeRejection::ItemTypeNotEligible));
    }

    #[test]
    fn test_usage_limit_reached() {
        let mut code = summer20();
        code.usage_count = 10;
        assert_eq!(validate(Some(&code), 1000), Err(CodeRejection::UsageLimitReached));

        code.usage_limit = None;
        assert!(validate(Some(&code), 1000).is_ok());
    }

    #[test]
    fn test_validation_is_read_only() {
        let code = summer20();
        for _ in 0..20 {
            assert!(validate(Some(&code), 1000).is_ok());
        }
        assert_eq!(code.usage_count, 3);
    }

    #[test]
    fn test_negative_amount_is_invalid_input() {
        let code = summer20();
        let result = validate_discount_code(
            Some(&code),
            Money::from_ore(-1),
            ItemType::BoxAdvertising,
            Utc::now(),
        );
        assert!(result.is_err());
    }
}
