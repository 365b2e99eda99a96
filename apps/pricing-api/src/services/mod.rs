//! Orchestration between the HTTP handlers and the pricing/storage crates.
//!
//! Handlers stay thin: extract, call a service function, return JSON.

pub mod invoice_service;
pub mod pricing_service;
