//! # Discount Tier Resolver
//!
//! Picks the discount band that applies to a quantity or a duration.
//!
//! ## Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tiers: {1-4: 0%}  {5-9: 10%}  {10-∞: 20%}      value: 7               │
//! │                                                                         │
//! │  1. keep active tiers                                                   │
//! │  2. keep tiers whose band contains 7     → {5-9: 10%}                   │
//! │  3. none left?  → None (no discount)                                    │
//! │  4. highest rate wins                                                   │
//! │     equal rates → lowest min_value wins                                 │
//! │     still equal → first in the slice                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bands are not required to be sorted, and a correctly maintained table
//! never has two active bands matching the same value. The tie-break only
//! makes the answer deterministic when a table is misconfigured.

use std::cmp::Ordering;

use crate::money::DiscountRate;
use crate::types::DiscountTier;

/// Finds the applicable tier for `value`.
///
/// ```rust
/// use stallplass_core::money::DiscountRate;
/// use stallplass_core::tier::resolve_tier;
/// use stallplass_core::types::{DiscountTier, PricingFamily, TierKind};
///
/// let band = |min, max, pct| DiscountTier {
///     id: format!("{min}"),
///     family: PricingFamily::Box,
///     kind: TierKind::Quantity,
///     min_value: min,
///     max_value: max,
///     discount_percentage: DiscountRate::from_percent(pct),
///     is_active: true,
/// };
/// let tiers = vec![band(1, Some(4), 0), band(5, Some(9), 10), band(10, None, 20)];
///
/// let hit = resolve_tier(&tiers, 7).unwrap();
/// assert_eq!(hit.min_value, 5);
/// assert!(resolve_tier(&tiers, 0).is_none());
/// ```
pub fn resolve_tier(tiers: &[DiscountTier], value: i64) -> Option<&DiscountTier> {
    tiers
        .iter()
        .filter(|tier| tier.is_active && tier.contains(value))
        .min_by(|a, b| precedence(a, b))
}

/// The rate of the applicable tier, or zero when nothing matches.
#[inline]
pub fn resolve_rate(tiers: &[DiscountTier], value: i64) -> DiscountRate {
    resolve_tier(tiers, value)
        .map(|tier| tier.discount_percentage)
        .unwrap_or_default()
}

/// `Less` means `a` wins.
fn precedence(a: &DiscountTier, b: &DiscountTier) -> Ordering {
    b.discount_percentage
        .cmp(&a.discount_percentage)
        .then(a.min_value.cmp(&b.min_value))
}

/// Returns the first pair of active tiers whose bands intersect.
pub fn find_overlap(tiers: &[DiscountTier]) -> Option<(&DiscountTier, &DiscountTier)> {
    let active: Vec<&DiscountTier> = tiers.iter().filter(|t| t.is_active).collect();

    for (i, a) in active.iter().enumerate() {
        for b in &active[i + 1..] {
            if a.overlaps(b) {
                return Some((*a, *b));
            }
        }
    }

    None
}

// =============================================================================
// Unit Tests
// =============================================================================
