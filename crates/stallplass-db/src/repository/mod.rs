//! # Repository Module
//!
//! Database repository implementations for Stallplass pricing.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  axum handler / RateSource                                              │
//! │       │                                                                 │
//! │       │  db.discount_codes().find_by_code(" summer20 ")                 │
//! │       ▼                                                                 │
//! │  DiscountCodeRepository                                                 │
//! │  ├── find_by_code(&self, raw)                                           │
//! │  ├── insert(&self, code)                                                │
//! │  └── consume(&self, id)  ← atomic conditional UPDATE                    │
//! │       │                                                                 │
//! │       │  SQL Query (row structs → domain types)                         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`base_price::BasePriceRepository`] - Named unit rates
//! - [`tier::TierRepository`] - Quantity, duration and boost tiers
//! - [`discount_code::DiscountCodeRepository`] - Codes and usage consumption
//! - [`invoice::InvoiceRepository`] - Invoices with code consumption

pub mod base_price;
pub mod discount_code;
pub mod invoice;
pub mod tier;
