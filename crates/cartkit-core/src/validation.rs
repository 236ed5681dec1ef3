//! # Validation Module
//!
//! Input checks run before the manager or a cart mutates anything.
//!
//! ```rust
//! use cartkit_core::validation::{validate_cart_id, validate_quantity};
//!
//! assert!(validate_cart_id("main").is_ok());
//! assert!(validate_cart_id("").is_err());
//! assert!(validate_quantity(0, 999).is_err());
//! ```

use crate::error::ValidationError;
use crate::MAX_PRICE_CENTS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a cart identifier for creation.
///
/// Ids are opaque: any non-empty string is accepted. The empty id is
/// reserved for "no context". Storage drivers escape whatever they can't
/// use verbatim.
///
/// Lookups never validate: an unknown or empty id simply isn't live.
pub fn validate_cart_id(id: &str) -> ValidationResult<()> {
    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "cart id".to_string(),
        });
    }

    Ok(())
}

/// Validates a line-item SKU: non-empty after trimming, at most 50 characters.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    Ok(())
}

/// Validates a quantity against a cart's configured maximum.
pub fn validate_quantity(qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Validates a unit price in cents.
///
/// ## Rules
/// - Must be non-negative (zero is a free item)
/// - At most [`MAX_PRICE_CENTS`]
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}
