//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Where Errors Come From
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Pricing API                        │
//! │                                                                         │
//! │  Handler  Result<Json<T>, ApiError>                                     │
//! │     │                                                                   │
//! │     ├── bad query / body ─────── Query/JsonRejection ──┐                │
//! │     ├── boxes=0, months=500 ──── CoreError::InvalidInput ┤              │
//! │     ├── code rejected at checkout ─ CodeRejection ──────┤              │
//! │     ├── box-monthly not seeded ── DbError::RateNotFound ┤              │
//! │     └── sqlite failure ────────── DbError::QueryFailed ─┤              │
//! │                                                         ▼              │
//! │                                   ApiError { code, message }           │
//! │                                         │ IntoResponse                 │
//! │                                         ▼                              │
//! │                     status from ErrorCode + JSON body                  │
//! │                     { "code": "VALIDATION_ERROR", "message": "..." }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! 5xx messages are generic; the underlying error is logged, not returned.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use stallplass_core::{CodeRejection, CoreError, ValidationError};
use stallplass_db::DbError;
use tracing::error;

/// Error body returned by every failing endpoint.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Invoice not found: 3f2c..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

/// Stable codes clients switch on. Each maps to one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// 404
    NotFound,

    /// Bad query, body or path parameter (400)
    ValidationError,

    /// Discount code refused during checkout (400)
    DiscountCodeRejected,

    /// Unique constraint hit, e.g. existing discount code (409)
    Conflict,

    /// Admin route without a valid token (403)
    Forbidden,

    /// Missing or broken rate configuration (500)
    ConfigurationError,

    /// SQLite unreachable or failing (500)
    DatabaseError,

    /// Arithmetic overflow and other bugs (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::DiscountCodeRejected => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::ConfigurationError | ErrorCode::DatabaseError | ErrorCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// `"Invoice not found: <id>"`.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// A discount code that cannot be applied to a purchase.
    pub fn rejected(rejection: CodeRejection) -> Self {
        ApiError::new(ErrorCode::DiscountCodeRejected, rejection.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::RateNotFound { name } => {
                error!(rate = %name, "Base price missing, refusing to price");
                ApiError::new(ErrorCode::ConfigurationError, "Pricing is not configured")
            }
            DbError::InvalidData { table, reason } => {
                error!(%table, %reason, "Stored pricing data is invalid");
                ApiError::new(ErrorCode::ConfigurationError, "Pricing configuration is invalid")
            }
            DbError::UsageLimitReached { .. } => ApiError::rejected(CodeRejection::UsageLimitReached),
            DbError::Validation(e) => ApiError::validation(e.to_string()),
            DbError::UniqueViolation { field, value } => {
                ApiError::new(ErrorCode::Conflict, format!("{field} '{value}' is taken"))
            }
            DbError::ForeignKeyViolation { message } => {
                error!(%message, "Dangling discount code reference");
                ApiError::validation("Unknown discount code reference")
            }
            storage @ (DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::PoolExhausted
            | DbError::Internal(_)) => {
                error!(error = %storage, "Pricing storage failure");
                ApiError::new(ErrorCode::DatabaseError, "Pricing storage is unavailable")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(e) => ApiError::validation(e.to_string()),
            CoreError::Overflow { context } => {
                error!(%context, "Price calculation overflowed");
                ApiError::internal("Price could not be calculated")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::ValidationError.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::DiscountCodeRejected.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorCode::ConfigurationError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_rate_is_a_server_error() {
        let err = ApiError::from(DbError::RateNotFound {
            name: "box-monthly".to_string(),
        });
        assert_eq!(err.code, ErrorCode::ConfigurationError);
        assert!(!err.message.contains("box-monthly"));
    }

    #[test]
    fn test_lost_consume_race_reads_as_rejected_code() {
        let err = ApiError::from(DbError::UsageLimitReached {
            code: "SUMMER20".to_string(),
        });
        assert_eq!(err.code, ErrorCode::DiscountCodeRejected);
        assert_eq!(err.message, CodeRejection::UsageLimitReached.to_string());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::validation("months must be positive")).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "months must be positive");
    }
}
