//! Pricing API handlers.
//!
//! | Route                          | Family  | Rates               |
//! |--------------------------------|---------|---------------------|
//! | `GET /pricing/calculate`       | box     | must exist          |
//! | `GET /pricing/service`         | service | fallback w/o months |
//! | `GET /pricing/boost-calculate` | boost   | must exist          |
//! | `GET /pricing/base`            | all     | fallback            |

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use stallplass_core::{DiscountTier, PricingBreakdown, PricingFamily};

use crate::error::ApiResult;
use crate::services::pricing_service::{
    display_base_price, display_base_prices, display_duration_tiers, quote, DisplayBasePrice,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pricing/calculate", get(calculate))
        .route("/pricing/service", get(service))
        .route("/pricing/boost-calculate", get(boost_calculate))
        .route("/pricing/base", get(base))
}

#[derive(Debug, Deserialize)]
pub struct BoxPricingQuery {
    pub boxes: i64,
    pub months: i64,
}

#[derive(Debug, Deserialize)]
pub struct ServicePricingQuery {
    pub months: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BoostPricingQuery {
    pub days: i64,
    #[serde(default = "one_box")]
    pub boxes: i64,
}

fn one_box() -> i64 {
    1
}

/// Either a quote or the data for a service price table.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ServicePricingResponse {
    Calculation { calculation: PricingBreakdown },
    #[serde(rename_all = "camelCase")]
    Display {
        base_price: DisplayBasePrice,
        tiers: Vec<DiscountTier>,
    },
}

/// GET /api/pricing/calculate?boxes=N&months=M
pub async fn calculate(
    State(state): State<AppState>,
    query: Result<Query<BoxPricingQuery>, QueryRejection>,
) -> ApiResult<Json<PricingBreakdown>> {
    let Query(params) = query?;
    let breakdown = quote(&*state.rates, PricingFamily::Box, params.boxes, params.months).await?;
    Ok(Json(breakdown))
}

/// GET /api/pricing/service[?months=M]
pub async fn service(
    State(state): State<AppState>,
    query: Result<Query<ServicePricingQuery>, QueryRejection>,
) -> ApiResult<Json<ServicePricingResponse>> {
    let Query(params) = query?;

    let response = match params.months {
        Some(months) => ServicePricingResponse::Calculation {
            calculation: quote(&*state.rates, PricingFamily::Service, 1, months).await?,
        },
        None => ServicePricingResponse::Display {
            base_price: display_base_price(&*state.rates, PricingFamily::Service).await?,
            tiers: display_duration_tiers(&*state.rates, PricingFamily::Service).await?,
        },
    };
    Ok(Json(response))
}

/// GET /api/pricing/boost-calculate?days=D[&boxes=N]
pub async fn boost_calculate(
    State(state): State<AppState>,
    query: Result<Query<BoostPricingQuery>, QueryRejection>,
) -> ApiResult<Json<PricingBreakdown>> {
    let Query(params) = query?;
    let breakdown = quote(&*state.rates, PricingFamily::Boost, params.boxes, params.days).await?;
    Ok(Json(breakdown))
}

/// GET /api/pricing/base
pub async fn base(State(state): State<AppState>) -> ApiResult<Json<Vec<DisplayBasePrice>>> {
    Ok(Json(display_base_prices(&*state.rates).await?))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, get, seeded_db};
    use axum::http::StatusCode;
    use stallplass_db::{Database, DbConfig};

    #[tokio::test]
    async fn test_box_calculation_composes_duration_then_quantity() {
        let app = app(seeded_db().await, None);

        let (status, body) = get(&app, "/api/pricing/calculate?boxes=5&months=12").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalMonthlyPrice"], 500);
        assert_eq!(body["durationDiscountPercentage"], 0.15);
        assert_eq!(body["quantityDiscountPercentage"], 0.1);
        // round(500 * 12 * 0.85) = 5100, then 10% off
        assert_eq!(body["totalPrice"], 4590);
        assert_eq!(body["finalPrice"], 4590);
    }

    #[tokio::test]
    async fn test_box_calculation_rejects_bad_input() {
        let app = app(seeded_db().await, None);

        for uri in [
            "/api/pricing/calculate?boxes=0&months=1",
            "/api/pricing/calculate?boxes=1&months=121",
            "/api/pricing/calculate?boxes=abc&months=1",
            "/api/pricing/calculate?months=1",
        ] {
            let (status, body) = get(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["code"], "VALIDATION_ERROR", "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_service_quote_and_display() {
        let app = app(seeded_db().await, None);

        let (status, body) = get(&app, "/api/pricing/service?months=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["calculation"]["quantity"], 1);
        assert_eq!(body["calculation"]["totalPrice"], 3000);

        let (status, body) = get(&app, "/api/pricing/service").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["basePrice"]["price"], 1000);
        assert_eq!(body["basePrice"]["isFallback"], false);
        assert!(body["tiers"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_boost_defaults_to_one_box() {
        let app = app(seeded_db().await, None);

        let (status, body) = get(&app, "/api/pricing/boost-calculate?days=7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["durationUnit"], "days");
        assert_eq!(body["totalPrice"], 350);

        let (status, body) = get(&app, "/api/pricing/boost-calculate?days=7&boxes=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalPrice"], 700);

        let (status, _) = get(&app, "/api/pricing/boost-calculate?days=366").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unconfigured_rates_fail_charges_but_not_display() {
        let app = app(Database::new(DbConfig::in_memory()).await.unwrap(), None);

        let (status, body) = get(&app, "/api/pricing/calculate?boxes=1&months=1").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "CONFIGURATION_ERROR");

        let (status, body) = get(&app, "/api/pricing/base").await;
        assert_eq!(status, StatusCode::OK);
        let prices = body.as_array().unwrap();
        assert_eq!(prices.len(), 3);
        assert!(prices.iter().all(|p| p["isFallback"] == true));
        assert_eq!(prices[0]["price"], 10000);

        let (status, body) = get(&app, "/api/pricing/service").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["basePrice"]["price"], 10000);
    }
}
