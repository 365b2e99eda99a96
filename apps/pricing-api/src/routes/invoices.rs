//! Invoice handlers.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use stallplass_core::Invoice;

use crate::error::{ApiError, ApiResult};
use crate::services::invoice_service::{create_invoice, CreateInvoiceRequest};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invoices", post(create))
        .route("/invoices/{id}", get(get_by_id))
}

/// POST /api/invoices
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Invoice>)> {
    let Json(request) = payload?;
    let invoice = create_invoice(&state.db, &*state.rates, &request).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /api/invoices/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Invoice>> {
    let Path(id) = path?;
    let invoice = state
        .db
        .invoices()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", &id))?;
    Ok(Json(invoice))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, get, post_json, seeded_db};
    use axum::http::StatusCode;
    use chrono::Utc;
    use serde_json::json;
    use stallplass_core::{DiscountCode, DiscountKind, ItemType, Money};

    #[tokio::test]
    async fn test_create_and_fetch_invoice() {
        let app = app(seeded_db().await, None);

        let (status, created) = post_json(
            &app,
            "/api/invoices",
            json!({ "family": "box", "quantity": 5, "duration": 12 }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["itemType"], "BOX_ADVERTISING");
        assert_eq!(created["status"], "pending");
        assert_eq!(created["totalPrice"], 4590);
        assert_eq!(created["finalPrice"], 4590);

        let id = created["id"].as_str().unwrap();
        let (status, fetched) = get(&app, &format!("/api/invoices/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["invoiceNumber"], created["invoiceNumber"]);

        let (status, body) = get(&app, "/api/invoices/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_last_use_of_a_code_goes_to_one_checkout() {
        let db = seeded_db().await;
        db.discount_codes()
            .insert(&DiscountCode {
                id: String::new(),
                code: "ONCE".to_string(),
                name: None,
                kind: DiscountKind::FixedAmount {
                    amount: Money::from_ore(10_000),
                },
                applicable_item_types: vec![ItemType::BoxAdvertising],
                is_active: true,
                expires_at: None,
                usage_limit: Some(1),
                usage_count: 0,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let app = app(db, None);
        let order = json!({ "family": "box", "quantity": 1, "duration": 1, "discountCode": "once" });

        let (status, first) = post_json(&app, "/api/invoices", order.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        // Fixed discount larger than the price clamps to zero
        assert_eq!(first["discountAmount"], 100);
        assert_eq!(first["finalPrice"], 0);

        let (status, second) = post_json(&app, "/api/invoices", order).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(second["code"], "DISCOUNT_CODE_REJECTED");
    }

    #[tokio::test]
    async fn test_unknown_family_is_rejected() {
        let app = app(seeded_db().await, None);

        let (status, body) = post_json(
            &app,
            "/api/invoices",
            json!({ "family": "stable", "duration": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
