//! # stallplass-core: Pure Pricing Logic for Stallplass
//!
//! This crate holds the pricing and discount rules behind Stallplass
//! advertising (stable boxes, service listings and sponsored boosts).
//! Every function is pure: rates, tiers and codes are handed in by the caller.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Stallplass Pricing Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 pricing-api (axum handlers)                     │   │
//! │  │   /pricing/calculate  /pricing/boost-calculate  /invoices       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stallplass-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌───────────────┐  ┌──────────┐  │   │
//! │  │   │  money   │  │   tier   │  │ discount_code │  │ pricing  │  │   │
//! │  │   │  Money   │  │ resolver │  │   validator   │  │ composer │  │   │
//! │  │   └──────────┘  └──────────┘  └───────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              stallplass-db (RateSource, repositories)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money in øre and basis-point discount rates
//! - [`types`] - Domain types (BasePrice, DiscountTier, DiscountCode, ...)
//! - [`tier`] - Discount tier resolution
//! - [`discount_code`] - Read-only discount code validation
//! - [`pricing`] - The pricing composer and its breakdown
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stallplass_core::money::{DiscountRate, Money};
//! use stallplass_core::pricing::{calculate_pricing, FamilyRates};
//! use stallplass_core::types::PricingFamily;
//!
//! let rates = FamilyRates::new(PricingFamily::Box, Money::from_ore(100));
//! let breakdown = calculate_pricing(&rates, 5, 1).unwrap();
//! assert_eq!(breakdown.total_price.ore(), 500);
//! assert_eq!(breakdown.duration_discount_percentage, DiscountRate::zero());
//! ```

pub mod discount_code;
pub mod error;
pub mod money;
pub mod pricing;
pub mod tier;
pub mod types;
pub mod validation;

pub use discount_code::{normalize_code, validate_discount_code, AppliedDiscount};
pub use error::{CodeRejection, CoreError, CoreResult, ValidationError};
pub use money::{DiscountRate, Money};
pub use pricing::{calculate_pricing, FamilyRates, PricingBreakdown};
pub use tier::resolve_tier;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of boxes in one advertising order.
pub const MAX_QUANTITY: i64 = 999;

/// Longest bookable advertising period in months.
pub const MAX_MONTHS: i64 = 120;

/// Longest bookable boost period in days.
pub const MAX_DAYS: i64 = 365;
