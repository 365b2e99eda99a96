//! # Stallplass Pricing API
//!
//! HTTP server for advertising prices, discount codes and invoices.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Pricing API Routes                              │
//! │                                                                         │
//! │  ┌────────────────────────┐  ┌────────────────────┐  ┌───────────────┐ │
//! │  │  /api/pricing          │  │ /api/discount-codes│  │ /api/invoices │ │
//! │  │                        │  │                    │  │               │ │
//! │  │ • calculate            │  │ • validate         │  │ • POST        │ │
//! │  │ • service              │  │   (read-only)      │  │ • GET {id}    │ │
//! │  │ • boost-calculate      │  │                    │  │               │ │
//! │  │ • base                 │  │                    │  │               │ │
//! │  └────────────────────────┘  └────────────────────┘  └───────────────┘ │
//! │                                                                         │
//! │  ┌────────────────────────────────────────┐  ┌──────────────────────┐  │
//! │  │  /api/admin  (Bearer admin_token)      │  │  /health             │  │
//! │  │                                        │  │                      │  │
//! │  │ • PUT  base-prices/{name}  ─┐          │  │ • database ping      │  │
//! │  │ • POST discount-tiers      ─┴► rate    │  │                      │  │
//! │  │ • POST discount-codes        cache     │  │                      │  │
//! │  │                              invalidate│  │                      │  │
//! │  └────────────────────────────────────────┘  └──────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Environment variables:
//! - `STALLPLASS_HTTP_PORT` - listen port (default: 8080)
//! - `STALLPLASS_DATABASE_PATH` - SQLite file (default: ./stallplass.db)
//! - `STALLPLASS_MAX_CONNECTIONS` - pool size (default: 5)
//! - `STALLPLASS_RATE_CACHE_TTL_SECS` - rate cache lifetime (default: 30)
//! - `STALLPLASS_ADMIN_TOKEN` - enables the admin routes
//! - `STALLPLASS_CONFIG` - TOML file path (default: pricing-api.toml)

pub mod config;
pub mod error;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::http::{header, Method};
use axum::Router;
use stallplass_db::{CachedRateSource, Database};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;

/// Shared application state.
///
/// Cheap to clone; handlers get their own copy per request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    /// Rates for pricing, cached for `rate_cache_ttl_secs`.
    pub rates: Arc<CachedRateSource<Database>>,
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(db: Database, config: &ApiConfig) -> Self {
        AppState {
            rates: Arc::new(CachedRateSource::new(db.clone(), config.rate_cache_ttl())),
            db,
            admin_token: config.admin_token.as_deref().map(Arc::from),
        }
    }
}

/// Builds the full router with tracing and CORS layers.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::pricing::router())
        .merge(routes::discount_codes::router())
        .merge(routes::invoices::router())
        .merge(routes::admin::router(state.clone()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api", api)
        .merge(routes::health::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
