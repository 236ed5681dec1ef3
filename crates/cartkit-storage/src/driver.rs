//! # Storage Capability
//!
//! The four operations a cart storage backend provides. Blobs are opaque:
//! drivers never look inside them.

use std::sync::Arc;

use crate::error::StorageResult;

/// A persistence backend for cart snapshots.
///
/// ## Contract
/// - `init` is idempotent; the registry calls it once at registration
/// - `restore` of a key never saved (or cleared) is `Ok(None)`
/// - `save` replaces whatever was stored under `key`
/// - `clear` of a missing key is `Ok(())`
pub trait CartStorage: Send + Sync {
    fn init(&self) -> StorageResult<()>;

    fn restore(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    fn save(&self, key: &str, data: &[u8]) -> StorageResult<()>;

    fn clear(&self, key: &str) -> StorageResult<()>;
}

/// A driver shared between the registry and any number of managers.
pub type SharedStorage = Arc<dyn CartStorage>;

impl<S: CartStorage + ?Sized> CartStorage for Arc<S> {
    fn init(&self) -> StorageResult<()> {
        (**self).init()
    }

    fn restore(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).restore(key)
    }

    fn save(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        (**self).save(key, data)
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        (**self).clear(key)
    }
}
