//! Admin maintenance of rates, tiers and discount codes.
//!
//! Every route requires `Authorization: Bearer <admin_token>`. Without a
//! configured token the whole group answers 403.
//!
//! Writes that change pricing inputs drop the rate cache so the next quote
//! sees them immediately.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use stallplass_core::{
    BasePrice, DiscountCode, DiscountKind, DiscountRate, DiscountTier, DiscountType, ItemType,
    Money, PricingFamily, TierKind, ValidationError,
};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/base-prices/{name}", put(upsert_base_price))
        .route("/admin/discount-tiers", post(create_tier))
        .route("/admin/discount-codes", post(create_code))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

/// Rejects requests without the configured bearer token.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(ApiError::forbidden("Admin API is disabled"));
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if provided != Some(expected) {
        warn!(path = %request.uri().path(), "Rejected admin request");
        return Err(ApiError::forbidden("Invalid admin token"));
    }

    Ok(next.run(request).await)
}

fn active() -> bool {
    true
}

// =============================================================================
// Base Prices
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertBasePriceRequest {
    /// Øre.
    pub price: i64,
    pub description: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
}

/// PUT /api/admin/base-prices/{name}
pub async fn upsert_base_price(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpsertBasePriceRequest>, JsonRejection>,
) -> ApiResult<Json<BasePrice>> {
    let Path(name) = path?;
    let Json(request) = payload?;

    let stored = state
        .db
        .base_prices()
        .upsert(
            &name,
            Money::from_ore(request.price),
            request.description.as_deref(),
            request.is_active,
        )
        .await?;
    state.rates.invalidate().await;

    info!(name = %stored.name, price = stored.price.ore(), "Base price updated");
    Ok(Json(stored))
}

// =============================================================================
// Discount Tiers
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTierRequest {
    pub family: PricingFamily,
    pub kind: TierKind,
    pub min_value: i64,
    pub max_value: Option<i64>,
    /// Fraction 0.0-1.0.
    pub discount_percentage: DiscountRate,
    #[serde(default = "active")]
    pub is_active: bool,
}

/// POST /api/admin/discount-tiers
pub async fn create_tier(
    State(state): State<AppState>,
    payload: Result<Json<CreateTierRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DiscountTier>)> {
    let Json(request) = payload?;

    let tier = state
        .db
        .tiers()
        .insert(&DiscountTier {
            id: String::new(),
            family: request.family,
            kind: request.kind,
            min_value: request.min_value,
            max_value: request.max_value,
            discount_percentage: request.discount_percentage,
            is_active: request.is_active,
        })
        .await?;
    state.rates.invalidate().await;

    info!(
        family = %tier.family,
        kind = ?tier.kind,
        min = tier.min_value,
        max = ?tier.max_value,
        rate = %tier.discount_percentage,
        "Discount tier created"
    );
    Ok((StatusCode::CREATED, Json(tier)))
}

// =============================================================================
// Discount Codes
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCodeRequest {
    pub code: String,
    pub name: Option<String>,
    pub discount_type: DiscountType,
    /// Whole percent for `PERCENTAGE`, øre for `FIXED_AMOUNT`.
    pub discount_value: i64,
    /// Øre cap, `PERCENTAGE` only.
    pub max_discount: Option<i64>,
    pub applicable_item_types: Vec<ItemType>,
    #[serde(default = "active")]
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<i64>,
}

/// POST /api/admin/discount-codes
pub async fn create_code(
    State(state): State<AppState>,
    payload: Result<Json<CreateCodeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DiscountCode>)> {
    let Json(request) = payload?;

    let kind = DiscountKind::from_parts(
        request.discount_type,
        request.discount_value,
        request.max_discount,
    )?;
    if request.applicable_item_types.is_empty() {
        return Err(ValidationError::Required {
            field: "applicableItemTypes".to_string(),
        }
        .into());
    }
    if matches!(request.usage_limit, Some(limit) if limit < 1) {
        return Err(ValidationError::MustBePositive {
            field: "usageLimit".to_string(),
        }
        .into());
    }

    let code = state
        .db
        .discount_codes()
        .insert(&DiscountCode {
            id: String::new(),
            code: request.code,
            name: request.name,
            kind,
            applicable_item_types: request.applicable_item_types,
            is_active: request.is_active,
            expires_at: request.expires_at,
            usage_limit: request.usage_limit,
            usage_count: 0,
            created_at: Utc::now(),
        })
        .await?;

    info!(code = %code.code, "Discount code created");
    Ok((StatusCode::CREATED, Json(code)))
}

// =============================================================================
// Unit Tests
// =============================================================================
