//! # Driver Registry
//!
//! Maps driver names (as written in `storage.driver`) to live driver
//! instances. Names are resolved once, when the configuration is loaded;
//! nothing is looked up by type name at call time.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Startup                                                                │
//! │    registry.register("session", SessionStorage::new())  ─► init()       │
//! │    registry.register("file", FileStorage::new(dir))     ─► init()       │
//! │                                                                         │
//! │  CartManager::new(config, registry)                                     │
//! │    every `storage.driver` in config ─► registry.get(name)               │
//! │    unknown name ─► InvalidStorageImplementation                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::driver::{CartStorage, SharedStorage};
use crate::error::{StorageError, StorageResult};

/// Named, initialized storage drivers.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    drivers: IndexMap<String, SharedStorage>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes `driver` and registers it under `name`.
    ///
    /// ## Errors
    /// - `DuplicateDriver` if `name` is taken
    /// - `InitFailed` if the driver's `init()` fails
    pub fn register<S>(&mut self, name: impl Into<String>, driver: S) -> StorageResult<()>
    where
        S: CartStorage + 'static,
    {
        self.register_shared(name, Arc::new(driver))
    }

    /// Like [`register`](Self::register) for an already shared driver.
    pub fn register_shared(
        &mut self,
        name: impl Into<String>,
        driver: SharedStorage,
    ) -> StorageResult<()> {
        let name = name.into();
        if self.drivers.contains_key(&name) {
            return Err(StorageError::DuplicateDriver(name));
        }

        driver.init().map_err(|e| StorageError::InitFailed {
            driver: name.clone(),
            reason: e.to_string(),
        })?;

        debug!(driver = %name, "Storage driver registered");
        self.drivers.insert(name, driver);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_driver<S>(mut self, name: impl Into<String>, driver: S) -> StorageResult<Self>
    where
        S: CartStorage + 'static,
    {
        self.register(name, driver)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&SharedStorage> {
        self.drivers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.drivers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.drivers.keys().collect::<Vec<_>>())
            .finish()
    }
}
