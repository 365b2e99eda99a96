//! # Validation Module
//!
//! Input validation for pricing requests and admin writes.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum)                                        │
//! │  └── Type validation (deserialization, fraction range)                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business range checks (quantity, months, days, tiers)             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── CHECK / UNIQUE constraints                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::tier::find_overlap;
use crate::types::{DiscountTier, DurationUnit};
use crate::{MAX_DAYS, MAX_MONTHS, MAX_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn check_range(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    if value < 1 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Validates an order quantity (number of boxes).
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed MAX_QUANTITY (999)
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    check_range("quantity", quantity, MAX_QUANTITY)
}

/// Validates a duration against the limit for its unit.
///
/// ```rust
/// use stallplass_core::types::DurationUnit;
/// use stallplass_core::validation::validate_duration;
///
/// assert!(validate_duration(12, DurationUnit::Months).is_ok());
/// assert!(validate_duration(0, DurationUnit::Months).is_err());
/// assert!(validate_duration(200, DurationUnit::Days).is_ok());
/// assert!(validate_duration(400, DurationUnit::Days).is_err());
/// ```
pub fn validate_duration(duration: i64, unit: DurationUnit) -> ValidationResult<()> {
    match unit {
        DurationUnit::Months => check_range("months", duration, MAX_MONTHS),
        DurationUnit::Days => check_range("days", duration, MAX_DAYS),
    }
}

/// Validates an amount in øre. Zero is allowed.
pub fn validate_amount(ore: i64) -> ValidationResult<()> {
    if ore < 0 {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a base price in øre.
pub fn validate_price(ore: i64) -> ValidationResult<()> {
    if ore < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount code as typed by the user (before normalization).
///
/// ## Rules
/// - Not empty after trimming
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_code_format(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.chars().count() > 50 {
        return Err(ValidationError::OutOfRange {
            field: "code length".to_string(),
            min: 1,
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a base rate name such as `box-monthly`.
pub fn validate_rate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "name".to_string(),
            reason: "must be lowercase kebab-case".to_string(),
        });
    }

    Ok(())
}

/// Validates a single tier's bounds.
pub fn validate_tier_bounds(min_value: i64, max_value: Option<i64>) -> ValidationResult<()> {
    if min_value < 1 {
        return Err(ValidationError::MustBePositive {
            field: "minValue".to_string(),
        });
    }

    if let Some(max) = max_value {
        if max < min_value {
            return Err(ValidationError::OutOfRange {
                field: "maxValue".to_string(),
                min: min_value,
                max: i64::MAX,
            });
        }
    }

    Ok(())
}

/// Validates that `candidate` can join `existing` without overlapping an
/// active band of the same family and kind.
///
/// Inactive tiers never conflict.
pub fn validate_tier_table(
    existing: &[DiscountTier],
    candidate: &DiscountTier,
) -> ValidationResult<()> {
    validate_tier_bounds(candidate.min_value, candidate.max_value)?;

    if !candidate.is_active {
        return Ok(());
    }

    let same_table: Vec<DiscountTier> = existing
        .iter()
        .filter(|t| t.family == candidate.family && t.kind == candidate.kind)
        .cloned()
        .chain(std::iter::once(candidate.clone()))
        .collect();

    if find_overlap(&same_table).is_some() {
        return Err(ValidationError::Overlap {
            min: candidate.min_value,
            max: candidate
                .max_value
                .map(|m| m.to_string())
                .unwrap_or_else(|| "unbounded".to_string()),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
