//! # Manager Error Types
//!
//! ## Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InvalidCartInstance          id not in the registry                   │
//! │  DuplicateCartInstance        new_cart(overwrite = false) on a live id │
//! │  InvalidStorageImplementation driver name unknown / none configured    │
//! │  Storage                      a driver operation failed                │
//! │  Core                         validation, cart limits, snapshot decode │
//! │  Teardown                     destroy_all_carts: per-cart failures     │
//! │                                                                         │
//! │  All are returned to the caller immediately. No retries.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use cartkit_core::{CoreError, ValidationError};
use cartkit_storage::StorageError;
use thiserror::Error;

/// Errors returned by [`CartManager`](crate::CartManager).
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The id does not name a live cart.
    ///
    /// ## When This Occurs
    /// - `set_context` / `get_cart` with an unknown id
    /// - `get_cart(None)` while no context is set (looks up `""`)
    /// - `save_cart_state` / `restore_cart_state` on a destroyed cart
    #[error("Invalid cart instance: '{0}'")]
    InvalidCartInstance(String),

    /// `new_cart` without overwrite on an id that is already live.
    #[error("Cart instance '{0}' already exists")]
    DuplicateCartInstance(String),

    /// A cart's `storage.driver` can't be resolved to a registered driver.
    ///
    /// `scope` is the cart id, or `defaults` for the default config.
    #[error("Invalid storage implementation for '{scope}': {reason}")]
    InvalidStorageImplementation { scope: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// One or more carts failed while tearing everything down. Every cart
    /// was still attempted and removed from the registry.
    #[error("{} cart(s) failed during teardown", .failures.len())]
    Teardown { failures: Vec<CartFailure> },
}

impl From<ValidationError> for ManagerError {
    fn from(err: ValidationError) -> Self {
        ManagerError::Core(err.into())
    }
}

/// A failure attributed to one cart in a bulk operation.
#[derive(Debug)]
pub struct CartFailure {
    pub cart_id: String,
    pub error: ManagerError,
}

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ManagerError::InvalidCartInstance("main".to_string()).to_string(),
            "Invalid cart instance: 'main'"
        );
        assert_eq!(
            ManagerError::DuplicateCartInstance("main".to_string()).to_string(),
            "Cart instance 'main' already exists"
        );

        let err = ManagerError::Teardown {
            failures: vec![CartFailure {
                cart_id: "a".to_string(),
                error: ManagerError::Storage(StorageError::Poisoned),
            }],
        };
        assert_eq!(err.to_string(), "1 cart(s) failed during teardown");
    }

    #[test]
    fn test_validation_converts_to_core() {
        let err: ManagerError = ValidationError::Required {
            field: "cart id".to_string(),
        }
        .into();
        assert!(matches!(err, ManagerError::Core(CoreError::Validation(_))));
    }
}
