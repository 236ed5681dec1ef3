//! # cartkit-storage: Storage Drivers for Managed Carts
//!
//! Pluggable persistence behind a four-operation trait.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CartKit Data Flow                                │
//! │                                                                         │
//! │  CartManager::save_cart_state("main")                                  │
//! │       │  key = prefix + "main" + suffix, blob = snapshot bytes          │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  cartkit-storage (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────┐   ┌────────────────┐   ┌───────────────┐  │   │
//! │  │   │ DriverRegistry │──►│ SessionStorage │   │  FileStorage  │  │   │
//! │  │   │ name → driver  │──►│ (in-memory)    │   │ (one file per │  │   │
//! │  │   │                │──────────────────────►│  key)         │  │   │
//! │  │   └────────────────┘   └────────────────┘   └───────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`driver`] - The `CartStorage` trait
//! - [`session`] - Session-scoped in-memory driver
//! - [`file`] - Directory-backed driver
//! - [`registry`] - Name → driver lookup used by the manager
//! - [`error`] - Storage error types
//!
//! ## Example
//! ```rust
//! use cartkit_storage::{CartStorage, DriverRegistry, SessionStorage};
//!
//! let registry = DriverRegistry::new()
//!     .with_driver("session", SessionStorage::new())
//!     .unwrap();
//!
//! let session = registry.get("session").unwrap();
//! session.save("app_main", b"snapshot").unwrap();
//! assert_eq!(session.restore("app_main").unwrap().as_deref(), Some(&b"snapshot"[..]));
//! ```

pub mod driver;
pub mod error;
pub mod file;
pub mod registry;
pub mod session;

pub use driver::{CartStorage, SharedStorage};
pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use registry::DriverRegistry;
pub use session::SessionStorage;
