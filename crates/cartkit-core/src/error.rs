//! # Error Types
//!
//! Domain error types for cartkit-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cartkit-core errors (this file)                                       │
//! │  ├── CoreError        - Cart rules, snapshot and config failures       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cartkit-storage errors                                                │
//! │  └── StorageError     - Driver failures (I/O, session not started)     │
//! │                                                                         │
//! │  cartkit-manager errors                                                │
//! │  └── ManagerError     - Registry failures, wraps both of the above     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ManagerError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart and snapshot errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cart has reached its configured number of distinct items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds the configured maximum.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Line item is not in the cart.
    #[error("Item {0} not in cart")]
    ItemNotInCart(String),

    /// Two lines share a SKU (only possible in restored state).
    #[error("Item {0} appears more than once")]
    DuplicateItem(String),

    /// A line total, subtotal, tax or total leaves the i64 cent range.
    #[error("Cart amount out of range")]
    AmountOverflow,

    /// Persisted snapshot could not be encoded or decoded.
    ///
    /// ## When This Occurs
    /// - Stored blob was written by something other than this crate
    /// - Stored blob was truncated
    /// - The cart state type changed shape incompatibly
    #[error("Snapshot error: {0}")]
    Snapshot(#[source] serde_json::Error),

    /// Snapshot was written with a schema version this build cannot read.
    #[error("Unsupported snapshot version {found} (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },

    /// Configuration document could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
