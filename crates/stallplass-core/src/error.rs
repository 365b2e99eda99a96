//! # Error Types
//!
//! Domain-specific error types for stallplass-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stallplass-core errors (this file)                                    │
//! │  ├── CoreError        - Pricing failures (bad input, overflow)         │
//! │  ├── ValidationError  - Field-level input validation                   │
//! │  └── CodeRejection    - Why a discount code does not apply             │
//! │                                                                         │
//! │  stallplass-db errors (separate crate)                                 │
//! │  └── DbError          - Database and rate lookup failures              │
//! │                                                                         │
//! │  pricing-api errors (in app)                                           │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `CodeRejection` is deliberately not a `CoreError` variant. A rejected code
//! is an expected outcome that the frontend renders inline, not a failure.

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Core Error
// =============================================================================

/// Pricing errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Quantity or duration outside the bookable range.
    ///
    /// ## When This Occurs
    /// - `boxes=0` or `months=0` on a pricing request
    /// - Negative amount passed to code validation
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Intermediate arithmetic left the i64 range.
    #[error("Price calculation overflowed for {context}")]
    Overflow { context: String },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., unknown family, malformed code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two active tiers cover the same value.
    #[error("Tier {min}-{max} overlaps an existing active tier")]
    Overlap { min: i64, max: String },
}

// =============================================================================
// Code Rejection
// =============================================================================

/// Reasons a discount code cannot be applied.
///
/// Checked in declaration order; the first failing check wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, TS)]
#[ts(export)]
pub enum CodeRejection {
    #[error("Discount code not found")]
    CodeNotFound,

    #[error("Discount code is no longer active")]
    CodeInactive,

    #[error("Discount code has expired")]
    CodeExpired,

    #[error("Discount code does not apply to this purchase")]
    ItemTypeNotEligible,

    #[error("Discount code has reached its usage limit")]
    UsageLimitReached,
}

impl CodeRejection {
    /// Stable machine-readable name, e.g. `"CodeExpired"`.
    pub fn code(&self) -> &'static str {
        match self {
            CodeRejection::CodeNotFound => "CodeNotFound",
            CodeRejection::CodeInactive => "CodeInactive",
            CodeRejection::CodeExpired => "CodeExpired",
            CodeRejection::ItemTypeNotEligible => "ItemTypeNotEligible",
            CodeRejection::UsageLimitReached => "UsageLimitReached",
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::OutOfRange {
            field: "months".to_string(),
            min: 1,
            max: 120,
        };
        assert_eq!(err.to_string(), "months must be between 1 and 120");

        let err = ValidationError::Overlap {
            min: 5,
            max: "unbounded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Tier 5-unbounded overlaps an existing active tier"
        );
    }

    #[test]
    fn test_validation_converts_to_invalid_input() {
        let err: CoreError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert_eq!(err.to_string(), "Invalid input: quantity must be positive");
    }

    #[test]
    fn test_rejection_codes() {
        assert_eq!(CodeRejection::CodeExpired.code(), "CodeExpired");
        assert_eq!(
            CodeRejection::UsageLimitReached.to_string(),
            "Discount code has reached its usage limit"
        );
    }
}
