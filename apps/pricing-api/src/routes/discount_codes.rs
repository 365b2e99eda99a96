//! Discount code validation handler.
//!
//! Validation is read-only: it never touches `usage_count`. A rejected code
//! is a normal `200` answer with `isValid: false` so the checkout form can
//! show the reason inline.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use stallplass_core::{validate_discount_code, AppliedDiscount, CodeRejection, ItemType, Money};
use tracing::debug;

use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/discount-codes/validate", post(validate))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCodeRequest {
    pub code: String,
    /// Amount in øre the code would be applied to.
    pub amount: i64,
    pub item_type: ItemType,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCodeResponse {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_code_id: Option<String>,
    /// Stable rejection name, e.g. `CodeExpired`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<AppliedDiscount> for ValidateCodeResponse {
    fn from(applied: AppliedDiscount) -> Self {
        ValidateCodeResponse {
            is_valid: true,
            discount_amount: Some(applied.discount_amount),
            final_amount: Some(applied.final_amount),
            discount_code_id: Some(applied.discount_code_id),
            ..Default::default()
        }
    }
}

impl From<CodeRejection> for ValidateCodeResponse {
    fn from(rejection: CodeRejection) -> Self {
        ValidateCodeResponse {
            is_valid: false,
            error_code: Some(rejection.code()),
            error_message: Some(rejection.to_string()),
            ..Default::default()
        }
    }
}

/// POST /api/discount-codes/validate
pub async fn validate(
    State(state): State<AppState>,
    payload: Result<Json<ValidateCodeRequest>, JsonRejection>,
) -> ApiResult<Json<ValidateCodeResponse>> {
    let Json(request) = payload?;

    let record = state.db.discount_codes().find_by_code(&request.code).await?;
    let outcome = validate_discount_code(
        record.as_ref(),
        Money::from_ore(request.amount),
        request.item_type,
        Utc::now(),
    )?;

    debug!(
        code = %request.code.trim(),
        item_type = ?request.item_type,
        valid = outcome.is_ok(),
        "Validated discount code"
    );

    Ok(Json(match outcome {
        Ok(applied) => applied.into(),
        Err(rejection) => rejection.into(),
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, post_json, seeded_db};
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use stallplass_core::{DiscountCode, DiscountKind, ItemType, Money};
    use stallplass_db::Database;

    async fn insert(db: &Database, code: &str, expires_in_days: i64, limit: Option<i64>) {
        db.discount_codes()
            .insert(&DiscountCode {
                id: String::new(),
                code: code.to_string(),
                name: None,
                kind: DiscountKind::Percentage {
                    percent: 20,
                    max_discount: Some(Money::from_ore(50)),
                },
                applicable_item_types: vec![ItemType::BoxAdvertising],
                is_active: true,
                expires_at: Some(Utc::now() + Duration::days(expires_in_days)),
                usage_limit: limit,
                usage_count: 0,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_valid_code_is_capped_and_not_consumed() {
        let db = seeded_db().await;
        insert(&db, "SUMMER20", 30, Some(1)).await;
        let app = app(db.clone(), None);

        for _ in 0..3 {
            let (status, body) = post_json(
                &app,
                "/api/discount-codes/validate",
                json!({ "code": " summer20", "amount": 1000, "itemType": "BOX_ADVERTISING" }),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["isValid"], true);
            assert_eq!(body["discountAmount"], 50);
            assert_eq!(body["finalAmount"], 950);
            assert!(body.get("errorMessage").is_none());
        }

        let code = db.discount_codes().find_by_code("SUMMER20").await.unwrap().unwrap();
        assert_eq!(code.usage_count, 0);
    }

    #[tokio::test]
    async fn test_rejections_are_ok_responses() {
        let db = seeded_db().await;
        insert(&db, "OLD", -1, None).await;
        let app = app(db, None);

        let (status, body) = post_json(
            &app,
            "/api/discount-codes/validate",
            json!({ "code": "OLD", "amount": 1000, "itemType": "BOX_ADVERTISING" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isValid"], false);
        assert_eq!(body["errorCode"], "CodeExpired");
        assert!(body.get("discountAmount").is_none());

        let (_, body) = post_json(
            &app,
            "/api/discount-codes/validate",
            json!({ "code": "NOPE", "amount": 1000, "itemType": "BOX_ADVERTISING" }),
        )
        .await;
        assert_eq!(body["errorCode"], "CodeNotFound");
    }

    #[tokio::test]
    async fn test_malformed_requests_are_client_errors() {
        let app = app(seeded_db().await, None);

        let (status, body) = post_json(
            &app,
            "/api/discount-codes/validate",
            json!({ "code": "X", "amount": "lots", "itemType": "BOX_ADVERTISING" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = post_json(
            &app,
            "/api/discount-codes/validate",
            json!({ "code": "X", "amount": -5, "itemType": "BOX_ADVERTISING" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
