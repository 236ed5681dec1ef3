//! # cartkit-manager: Cart Instance Manager
//!
//! Creates, tracks and tears down named carts, each with its own effective
//! configuration and optional persistence through a storage driver.
//!
//! ## Module Organization
//! ```text
//! cartkit_manager/
//! ├── lib.rs          ◄─── You are here
//! ├── manager.rs      ◄─── CartManager: registry, context, config, storage
//! ├── session.rs      ◄─── CartSession: request scope, autosave on exit
//! └── error.rs        ◄─── ManagerError
//! ```
//!
//! ## Example
//! ```rust
//! use cartkit_core::{CartConfigOverride, ManagerConfig, Money, StorageConfig};
//! use cartkit_manager::{CartSession, NewCart};
//! use cartkit_storage::{DriverRegistry, SessionStorage};
//!
//! let mut config = ManagerConfig::default()
//!     .with_cart("main", CartConfigOverride::default());
//! config.defaults.storage = StorageConfig::with_driver("session").prefix("shop_");
//!
//! let drivers = DriverRegistry::new()
//!     .with_driver("session", SessionStorage::new())
//!     .unwrap();
//!
//! let mut session: CartSession = CartSession::open(config, drivers).unwrap();
//! session
//!     .get_cart_mut(None)
//!     .unwrap()
//!     .add_item("COKE-330", "Coca-Cola 330ml", Money::from_cents(199), 2)
//!     .unwrap();
//!
//! session.new_cart("wishlist", NewCart::new().switch_context(false)).unwrap();
//! assert_eq!(session.context(), Some("main"));
//! assert_eq!(session.get_cart_storage_key("main"), "shop_main");
//! session.save_cart_state("main").unwrap();
//! ```

pub mod error;
pub mod manager;
pub mod session;

pub use error::{CartFailure, ManagerError, ManagerResult};
pub use manager::{CartManager, NewCart};
pub use session::CartSession;
