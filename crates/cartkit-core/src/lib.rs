//! # cartkit-core: Pure Types for the Cart Instance Manager
//!
//! Everything here is deterministic and free of I/O. Storage drivers live in
//! `cartkit-storage`, the registry itself lives in `cartkit-manager`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CartKit Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Request / session handler (cart-session)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ CartSession (scope guard)              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │       cartkit-manager: registry, context, save / restore        │   │
//! │  └──────────────┬──────────────────────────────────┬───────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼──────────────────┐  ┌────────────▼───────────────┐   │
//! │  │  ★ cartkit-core (THIS CRATE) ★  │  │  cartkit-storage           │   │
//! │  │                                 │  │  CartStorage trait         │   │
//! │  │  cart · config · snapshot       │  │  SessionStorage            │   │
//! │  │  money · validation · error     │  │  FileStorage               │   │
//! │  └─────────────────────────────────┘  └────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`cart`] - `ManagedCart` contract and the built-in line-item `Cart`
//! - [`config`] - `CartConfig`, overrides and the shallow merge rule
//! - [`snapshot`] - Versioned envelope for persisted cart state
//! - [`money`] - Integer money and tax rates
//! - [`validation`] - Input checks for ids, quantities and prices
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use cartkit_core::config::{CartConfig, CartConfigOverride, StorageConfig};
//!
//! let defaults = CartConfig::default();
//! let partial = CartConfigOverride {
//!     storage: Some(StorageConfig::with_driver("session")),
//!     ..Default::default()
//! };
//!
//! let effective = defaults.merge(&partial);
//! assert_eq!(effective.storage.driver.as_deref(), Some("session"));
//! assert_eq!(effective.storage_key("main"), "main");
//! ```

pub mod cart;
pub mod config;
pub mod error;
pub mod money;
pub mod snapshot;
pub mod validation;

pub use cart::{Cart, CartContents, CartItem, CartTotals, ManagedCart};
pub use config::{CartConfig, CartConfigOverride, ManagerConfig, StorageConfig};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, TaxRate};
pub use snapshot::SnapshotEnvelope;

/// Default maximum number of distinct items in one cart.
pub const DEFAULT_MAX_CART_ITEMS: usize = 100;

/// Default maximum quantity of a single line item.
///
/// Catches typing 1000 instead of 10.
pub const DEFAULT_MAX_ITEM_QUANTITY: i64 = 999;

/// Highest accepted unit price: $10,000,000.00.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;
