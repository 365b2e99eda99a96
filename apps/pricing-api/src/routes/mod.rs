//! HTTP route modules.
//!
//! Each module exposes `router()` returning a `Router<AppState>`; they are
//! merged under `/api` in [`crate::build_router`], except `health`.

pub mod admin;
pub mod discount_codes;
pub mod health;
pub mod invoices;
pub mod pricing;
