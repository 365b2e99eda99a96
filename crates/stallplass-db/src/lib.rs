//! # stallplass-db: Database Layer for Stallplass Pricing
//!
//! Persistence for base prices, discount tiers, discount codes and invoices,
//! plus the [`RateSource`] the pricing composer is fed from.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Stallplass Pricing Data Flow                        │
//! │                                                                         │
//! │  pricing-api handler (GET /api/pricing/calculate)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stallplass-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  RateSource   │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (+ TTL cache) │───►│ base_price    │    │  (embedded)  │  │   │
//! │  │   │               │    │ tier          │    │              │  │   │
//! │  │   │ FamilyRates   │    │ discount_code │    │ 001_pricing  │  │   │
//! │  │   │               │    │ invoice       │    │ 002_invoices │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                                │   │
//! │  └────────────────────────────────┼────────────────────────────────┘   │
//! │                                   ▼                                     │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ./stallplass.db                                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`pool`]: opening SQLite, [`Database`] handle
//! - [`migrations`]: schema files compiled into the binary
//! - [`error`]: [`DbError`]
//! - [`repository`]: one repository per table
//! - [`rate_source`]: per-family rates, read straight or through a TTL cache
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stallplass_db::{Database, DbConfig, RateSource};
//! use stallplass_core::{calculate_pricing, PricingFamily};
//!
//! let db = Database::new(DbConfig::new("./stallplass.db")).await?;
//! let rates = db.family_rates(PricingFamily::Box).await?;
//! let breakdown = calculate_pricing(&rates, 5, 12)?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod rate_source;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use rate_source::{CachedRateSource, RateSource};

pub use repository::base_price::BasePriceRepository;
pub use repository::discount_code::DiscountCodeRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::tier::TierRepository;
