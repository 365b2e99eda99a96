//! # Money Module
//!
//! `Money` for NOK amounts and `DiscountRate` for percentages.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004      ❌                               │
//! │                                                                         │
//! │  OUR SOLUTION: Integer øre + basis points                               │
//! │    (6000 * 8500 + 5000) / 10000 = 5100   ✅                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Percentage Convention
//! Internally every discount percentage is a [`DiscountRate`] in basis points
//! (1 bp = 0.01%, 1500 bp = 15%). On the JSON wire a rate is a fraction
//! `0.0..=1.0`. The database keeps whatever form each table was created with
//! and converts at the adapter (see `stallplass-db`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in øre (1/100 NOK).
///
/// Serialized as a bare integer; no floats ever cross the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from øre.
    ///
    /// ```rust
    /// use stallplass_core::money::Money;
    ///
    /// let price = Money::from_ore(9900); // 99,00 kr
    /// assert_eq!(price.ore(), 9900);
    /// ```
    #[inline]
    pub const fn from_ore(ore: i64) -> Self {
        Money(ore)
    }

    /// Creates a Money value from whole kroner.
    #[inline]
    pub const fn from_kroner(kroner: i64) -> Self {
        Money(kroner * 100)
    }

    /// Returns the value in øre.
    #[inline]
    pub const fn ore(&self) -> i64 {
        self.0
    }

    /// Returns the whole-krone portion.
    #[inline]
    pub const fn kroner(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the øre portion (always 0-99).
    #[inline]
    pub const fn ore_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies by a count, returning `None` on overflow.
    ///
    /// ```rust
    /// use stallplass_core::money::Money;
    ///
    /// assert_eq!(Money::from_ore(100).checked_mul(5), Some(Money::from_ore(500)));
    /// assert_eq!(Money::from_ore(i64::MAX).checked_mul(2), None);
    /// ```
    #[inline]
    pub fn checked_mul(&self, count: i64) -> Option<Money> {
        self.0.checked_mul(count).map(Money)
    }

    /// The share of this amount given by `rate`, rounded half up.
    ///
    /// ```rust
    /// use stallplass_core::money::{DiscountRate, Money};
    ///
    /// let amount = Money::from_ore(1000);
    /// assert_eq!(amount.portion(DiscountRate::from_percent(20)).ore(), 200);
    /// // 0.825 øre rounds to 1
    /// assert_eq!(Money::from_ore(11).portion(DiscountRate::from_bps(750)).ore(), 1);
    /// ```
    pub fn portion(&self, rate: DiscountRate) -> Money {
        // i128 keeps amount * 10_000 from overflowing; the result never
        // exceeds the amount itself because rate <= 100%.
        let share = (self.0 as i128 * rate.bps() as i128 + 5000) / 10_000;
        Money(share as i64)
    }

    /// What remains after taking `rate` off, rounded half up.
    ///
    /// This is `round(amount * (1 - rate))`, which is not always
    /// `amount - portion(rate)` when both round at exactly one half.
    ///
    /// ```rust
    /// use stallplass_core::money::{DiscountRate, Money};
    ///
    /// let gross = Money::from_ore(6000);
    /// assert_eq!(gross.discounted_by(DiscountRate::from_bps(1500)).ore(), 5100);
    /// ```
    pub fn discounted_by(&self, rate: DiscountRate) -> Money {
        let kept = (self.0 as i128 * rate.complement_bps() as i128 + 5000) / 10_000;
        Money(kept as i64)
    }

    /// Subtracts, flooring at zero.
    #[inline]
    pub fn saturating_sub_to_zero(&self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }
}

/// Display in Norwegian style, e.g. `99,00 kr`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{},{:02} kr", sign, self.kroner().abs(), self.ore_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Discount Rate
// =============================================================================

/// A discount percentage in basis points (0..=10_000).
///
/// ## Why Basis Points?
/// The source tables store 15% either as `15` or as `0.15`. Basis points hold
/// both exactly (and fractions like 12.5%) in an integer.
///
/// Ordered by size, so `max` picks the biggest discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// 100% in basis points.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a rate from basis points, clamped to 100%.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        if bps > Self::MAX_BPS {
            DiscountRate(Self::MAX_BPS)
        } else {
            DiscountRate(bps)
        }
    }

    /// Creates a rate from a whole percent (0-100), clamped to 100%.
    #[inline]
    pub const fn from_percent(percent: u32) -> Self {
        if percent > 100 {
            DiscountRate(Self::MAX_BPS)
        } else {
            DiscountRate(percent * 100)
        }
    }

    /// Parses a whole percent from an untrusted integer.
    ///
    /// Returns `None` outside 0..=100.
    pub fn try_from_percent(percent: i64) -> Option<Self> {
        if (0..=100).contains(&percent) {
            Some(DiscountRate(percent as u32 * 100))
        } else {
            None
        }
    }

    /// Parses a fraction (`0.15` = 15%), rounding to the nearest basis point.
    ///
    /// Returns `None` for NaN or values outside 0.0..=1.0.
    ///
    /// ```rust
    /// use stallplass_core::money::DiscountRate;
    ///
    /// assert_eq!(DiscountRate::try_from_fraction(0.15), Some(DiscountRate::from_bps(1500)));
    /// assert_eq!(DiscountRate::try_from_fraction(1.5), None);
    /// ```
    pub fn try_from_fraction(fraction: f64) -> Option<Self> {
        if !(0.0..=1.0).contains(&fraction) {
            return None;
        }
        Some(DiscountRate((fraction * Self::MAX_BPS as f64).round() as u32))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// `10_000 - bps`, the share that is kept.
    #[inline]
    pub const fn complement_bps(&self) -> u32 {
        Self::MAX_BPS - self.0
    }

    /// The rate as a fraction, for the wire format and display.
    #[inline]
    pub fn fraction(&self) -> f64 {
        self.0 as f64 / Self::MAX_BPS as f64
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for DiscountRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.fraction())
    }
}

impl<'de> Deserialize<'de> for DiscountRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fraction = f64::deserialize(deserializer)?;
        DiscountRate::try_from_fraction(fraction).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "discount percentage must be a fraction between 0.0 and 1.0, got {}",
                fraction
            ))
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
