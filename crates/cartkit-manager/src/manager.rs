//! # Cart Manager
//!
//! Registry of named carts, the current-context pointer, the configuration
//! table and the save/restore lifecycle against storage drivers.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation               Registry           Context        Storage      │
//! │  ─────────               ────────           ───────        ───────      │
//! │  new(config, drivers)    create each        first id       restore each │
//! │  new_cart(id, opts)      insert/replace     id (default)   restore      │
//! │  set_context(id)         (read)             id             -            │
//! │  get_cart(None)          (read)             (read)         -            │
//! │  destroy_cart(id)        remove             unset if id    clear        │
//! │  destroy_all_carts()     remove all         unset          clear all    │
//! │  save_cart_state(id)     (read)             -              save         │
//! │  restore_cart_state(id)  import             -              restore      │
//! │  clear_cart_state(id)    -                  -              clear        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Registry keys are unique; a key present in the registry is a live cart
//! - If the context is set, it names a live cart
//! - A cart's effective config is computed once (at init or creation) and
//!   stored; [`CartManager::get_cart_config`] never re-merges
//!
//! One manager serves one request or session. It is not meant to be shared
//! across threads.

use cartkit_core::snapshot::{decode_state, encode_state};
use cartkit_core::validation::validate_cart_id;
use cartkit_core::{Cart, CartConfig, ManagedCart, ManagerConfig};
use cartkit_storage::{CartStorage, DriverRegistry, SharedStorage};
use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::error::{CartFailure, ManagerError, ManagerResult};

/// Scope name used in errors about the default config.
const DEFAULTS_SCOPE: &str = "defaults";

// =============================================================================
// New Cart Options
// =============================================================================

/// Options for [`CartManager::new_cart`].
///
/// Defaults: config looked up from the configuration table, overwrite an
/// existing cart, switch context to the new cart.
#[derive(Debug, Clone)]
pub struct NewCart {
    pub config: Option<CartConfig>,
    pub overwrite: bool,
    pub switch_context: bool,
}

impl Default for NewCart {
    fn default() -> Self {
        NewCart {
            config: None,
            overwrite: true,
            switch_context: true,
        }
    }
}

impl NewCart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `config` as the cart's effective config (no merge with defaults).
    pub fn config(mut self, config: CartConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn switch_context(mut self, switch_context: bool) -> Self {
        self.switch_context = switch_context;
        self
    }
}

// =============================================================================
// Cart Manager
// =============================================================================

/// Creates, tracks and tears down named carts.
///
/// ## Example
/// ```rust
/// use cartkit_core::{ManagerConfig, CartConfigOverride};
/// use cartkit_manager::CartManager;
/// use cartkit_storage::DriverRegistry;
///
/// let config = ManagerConfig::default()
///     .with_cart("a", CartConfigOverride::default())
///     .with_cart("b", CartConfigOverride::default());
///
/// let mut manager: CartManager = CartManager::new(config, DriverRegistry::new()).unwrap();
/// assert_eq!(manager.context(), Some("a"));
///
/// manager.destroy_cart(Some("a"), true).unwrap();
/// assert_eq!(manager.context(), None);
/// assert!(manager.get_cart(None).is_err());
/// ```
#[derive(Debug)]
pub struct CartManager<C: ManagedCart = Cart> {
    carts: IndexMap<String, C>,
    context: Option<String>,
    defaults: CartConfig,
    configs: IndexMap<String, CartConfig>,
    drivers: DriverRegistry,
    autosave: Vec<String>,
}

impl<C: ManagedCart> CartManager<C> {
    /// Builds a manager from a config document and a set of drivers.
    ///
    /// ## Startup Sequence
    /// 1. Resolve the default driver (fails fast on an unknown name)
    /// 2. For each declared cart, in order: merge defaults with its override,
    ///    resolve its driver, store the effective config
    /// 3. Create every declared cart (restoring saved state) without
    ///    switching context
    /// 4. Context = first declared cart, or unset when none are declared
    pub fn new(config: ManagerConfig, drivers: DriverRegistry) -> ManagerResult<Self> {
        let ManagerConfig { defaults, carts } = config;

        let mut manager = CartManager {
            carts: IndexMap::with_capacity(carts.len()),
            context: None,
            defaults,
            configs: IndexMap::with_capacity(carts.len()),
            drivers,
            autosave: Vec::new(),
        };

        manager.resolve_driver(DEFAULTS_SCOPE, &manager.defaults)?;

        for (id, partial) in &carts {
            let effective = manager.defaults.merge(partial);
            manager.resolve_driver(id, &effective)?;
            manager.configs.insert(id.clone(), effective);
        }

        for id in carts.keys() {
            manager.new_cart(id, NewCart::new().switch_context(false))?;
        }

        manager.context = carts.keys().next().cloned();

        info!(
            carts = manager.carts.len(),
            context = ?manager.context,
            "Cart manager initialized"
        );
        Ok(manager)
    }

    // -------------------------------------------------------------------------
    // Context
    // -------------------------------------------------------------------------

    /// Current context, if any.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Switches context to a live cart.
    ///
    /// ## Errors
    /// `InvalidCartInstance` if `id` is not live; the context is unchanged.
    pub fn set_context(&mut self, id: &str) -> ManagerResult<&str> {
        if !self.carts.contains_key(id) {
            return Err(ManagerError::InvalidCartInstance(id.to_string()));
        }

        debug!(cart_id = id, "Context switched");
        Ok(self.context.insert(id.to_string()).as_str())
    }

    // -------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------

    pub fn cart_exists(&self, id: &str) -> bool {
        self.carts.contains_key(id)
    }

    /// Returns a live cart. `None` or `Some("")` means the current context;
    /// with no context set that resolves to `""`, which is never live.
    pub fn get_cart(&self, id: Option<&str>) -> ManagerResult<&C> {
        let id = self.resolve_id(id);
        self.carts
            .get(id)
            .ok_or_else(|| ManagerError::InvalidCartInstance(id.to_string()))
    }

    /// Mutable form of [`get_cart`](Self::get_cart).
    pub fn get_cart_mut(&mut self, id: Option<&str>) -> ManagerResult<&mut C> {
        let id = self.resolve_id(id).to_string();
        self.carts
            .get_mut(&id)
            .ok_or(ManagerError::InvalidCartInstance(id))
    }

    /// Creates a cart and registers it under `id`.
    ///
    /// ## Flow
    /// ```text
    /// exists && !overwrite ──► DuplicateCartInstance (registry unchanged)
    ///      │
    ///      ▼
    /// config = opts.config, else get_cart_config(id)
    ///      │
    ///      ▼
    /// resolve driver ──► InvalidStorageImplementation
    ///      │
    ///      ▼
    /// C::create(id, config) ──► restore saved state (if driver)
    ///      │
    ///      ▼
    /// autosave? register id ──► switch context? ──► insert (replaces old)
    /// ```
    ///
    /// Nothing is registered if any step fails.
    pub fn new_cart(&mut self, id: &str, options: NewCart) -> ManagerResult<&mut C> {
        validate_cart_id(id)?;

        if !options.overwrite && self.carts.contains_key(id) {
            return Err(ManagerError::DuplicateCartInstance(id.to_string()));
        }

        let explicit_config = options.config.is_some();
        let config = match options.config {
            Some(config) => config,
            None => self.get_cart_config(id).clone(),
        };

        let storage = self.resolve_driver(id, &config)?;

        let mut cart = C::create(id, &config);
        if let Some(storage) = &storage {
            restore_into(&mut cart, &**storage, &config.storage_key(id))?;
        }

        if config.storage.autosave && !self.autosave.iter().any(|a| a == id) {
            self.autosave.push(id.to_string());
        }

        if explicit_config {
            self.configs.insert(id.to_string(), config);
        }

        if options.switch_context {
            self.context = Some(id.to_string());
        }

        debug!(
            cart_id = id,
            switch_context = options.switch_context,
            "Cart created"
        );

        Ok(match self.carts.entry(id.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(cart);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(cart),
        })
    }

    /// Removes a cart. `None` means the current context. Unknown ids are a
    /// no-op.
    ///
    /// The registry and context are updated before storage is touched, so a
    /// failing clear still leaves the cart destroyed; the failure is then
    /// returned.
    pub fn destroy_cart(&mut self, id: Option<&str>, clear_storage: bool) -> ManagerResult<()> {
        let id = self.resolve_id(id).to_string();

        if self.carts.shift_remove(&id).is_none() {
            return Ok(());
        }

        if self.context.as_deref() == Some(id.as_str()) {
            self.context = None;
        }
        self.autosave.retain(|a| a != &id);

        debug!(cart_id = %id, clear_storage, "Cart destroyed");

        if clear_storage {
            let config = self.get_cart_config(&id);
            if let Some(storage) = self.resolve_driver(&id, config)? {
                storage.clear(&config.storage_key(&id))?;
            }
        }

        Ok(())
    }

    /// Destroys every cart in registry order.
    ///
    /// Every cart is attempted even if an earlier one fails. Failures are
    /// collected into `ManagerError::Teardown`.
    pub fn destroy_all_carts(&mut self, clear_storage: bool) -> ManagerResult<()> {
        let ids: Vec<String> = self.carts.keys().cloned().collect();
        let mut failures = Vec::new();

        for id in ids {
            if let Err(error) = self.destroy_cart(Some(&id), clear_storage) {
                warn!(cart_id = %id, %error, "Failed to destroy cart");
                failures.push(CartFailure { cart_id: id, error });
            }
        }

        info!(failed = failures.len(), "All carts destroyed");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ManagerError::Teardown { failures })
        }
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    /// Stored effective config for `id`, or the defaults. Never merges.
    pub fn get_cart_config(&self, id: &str) -> &CartConfig {
        self.configs.get(id).unwrap_or(&self.defaults)
    }

    pub fn defaults(&self) -> &CartConfig {
        &self.defaults
    }

    // -------------------------------------------------------------------------
    // Storage
    // -------------------------------------------------------------------------

    /// prefix + id + suffix, from the cart's effective config.
    pub fn get_cart_storage_key(&self, id: &str) -> String {
        self.get_cart_config(id).storage_key(id)
    }

    /// Exports a live cart and writes it to its driver.
    pub fn save_cart_state(&self, id: &str) -> ManagerResult<()> {
        let cart = self
            .carts
            .get(id)
            .ok_or_else(|| ManagerError::InvalidCartInstance(id.to_string()))?;
        let (storage, key) = self.require_storage(id)?;

        let bytes = encode_state(id, cart.export())?;
        storage.save(&key, &bytes)?;

        debug!(cart_id = id, key = %key, bytes = bytes.len(), "Cart state saved");
        Ok(())
    }

    /// Reads a live cart's saved state and imports it.
    ///
    /// Returns `false` when nothing was stored under the cart's key.
    pub fn restore_cart_state(&mut self, id: &str) -> ManagerResult<bool> {
        if !self.carts.contains_key(id) {
            return Err(ManagerError::InvalidCartInstance(id.to_string()));
        }
        let (storage, key) = self.require_storage(id)?;

        let cart = self
            .carts
            .get_mut(id)
            .ok_or_else(|| ManagerError::InvalidCartInstance(id.to_string()))?;
        restore_into(cart, &*storage, &key)
    }

    /// Deletes whatever is stored under the cart's key. The cart itself does
    /// not need to be live.
    pub fn clear_cart_state(&self, id: &str) -> ManagerResult<()> {
        let (storage, key) = self.require_storage(id)?;
        storage.clear(&key)?;

        debug!(cart_id = id, key = %key, "Cart state cleared");
        Ok(())
    }

    /// Saves every cart registered for autosave, in registration order.
    ///
    /// Runs at most once per registration: the list is drained, so a second
    /// call saves only carts created since. Carts destroyed in the meantime
    /// are skipped.
    pub fn run_autosave(&mut self) -> Vec<CartFailure> {
        let ids = std::mem::take(&mut self.autosave);
        let mut failures = Vec::new();

        for id in ids {
            if !self.carts.contains_key(&id) {
                debug!(cart_id = %id, "Autosave skipped, cart no longer live");
                continue;
            }
            if let Err(error) = self.save_cart_state(&id) {
                failures.push(CartFailure { cart_id: id, error });
            }
        }

        failures
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    /// Live cart ids in registry order.
    pub fn cart_ids(&self) -> impl Iterator<Item = &str> {
        self.carts.keys().map(String::as_str)
    }

    /// Ids currently registered for autosave.
    pub fn autosave_ids(&self) -> &[String] {
        &self.autosave
    }

    pub fn len(&self) -> usize {
        self.carts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carts.is_empty()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn resolve_id<'a>(&'a self, id: Option<&'a str>) -> &'a str {
        match id {
            Some(id) if !id.is_empty() => id,
            _ => self.context.as_deref().unwrap_or(""),
        }
    }

    /// Looks up the driver named by `config`. `Ok(None)` means persistence
    /// is disabled.
    fn resolve_driver(
        &self,
        scope: &str,
        config: &CartConfig,
    ) -> ManagerResult<Option<SharedStorage>> {
        let Some(name) = config.driver() else {
            return Ok(None);
        };

        self.drivers.get(name).cloned().map(Some).ok_or_else(|| {
            ManagerError::InvalidStorageImplementation {
                scope: scope.to_string(),
                reason: format!("driver '{name}' is not registered"),
            }
        })
    }

    /// Driver and key for a cart that must have persistence configured.
    fn require_storage(&self, id: &str) -> ManagerResult<(SharedStorage, String)> {
        let config = self.get_cart_config(id);
        let storage = self.resolve_driver(id, config)?.ok_or_else(|| {
            ManagerError::InvalidStorageImplementation {
                scope: id.to_string(),
                reason: "no storage driver configured".to_string(),
            }
        })?;
        Ok((storage, config.storage_key(id)))
    }
}

/// Restores the blob stored under `key` into `cart`, if there is one.
fn restore_into<C: ManagedCart>(
    cart: &mut C,
    storage: &dyn CartStorage,
    key: &str,
) -> ManagerResult<bool> {
    let Some(bytes) = storage.restore(key)? else {
        return Ok(false);
    };

    let state = decode_state::<C::State>(&bytes)?;
    cart.import(state)?;

    debug!(cart_id = cart.id(), key, "Cart state restored");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartkit_core::{CartConfigOverride, CoreError, Money, StorageConfig};
    use cartkit_storage::SessionStorage;
    use std::sync::Arc;

    fn session_registry() -> (Arc<SessionStorage>, DriverRegistry) {
        let session = Arc::new(SessionStorage::new());
        let mut registry = DriverRegistry::new();
        registry.register("session", session.clone()).unwrap();
        (session, registry)
    }

    fn empty_manager() -> CartManager {
        CartManager::new(ManagerConfig::default(), DriverRegistry::new()).unwrap()
    }

    #[test]
    fn test_new_without_carts_has_no_context() {
        let manager = empty_manager();
        assert_eq!(manager.context(), None);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_set_context_unknown_leaves_context() {
        let mut manager = empty_manager();
        manager.new_cart("main", NewCart::new()).unwrap();

        let err = manager.set_context("missing").unwrap_err();
        assert!(matches!(err, ManagerError::InvalidCartInstance(id) if id == "missing"));
        assert_eq!(manager.context(), Some("main"));
    }

    #[test]
    fn test_new_cart_without_switch_keeps_context() {
        let mut manager = empty_manager();
        manager.new_cart("main", NewCart::new()).unwrap();
        manager
            .new_cart("other", NewCart::new().switch_context(false))
            .unwrap();

        assert_eq!(manager.context(), Some("main"));
        assert_eq!(manager.set_context("other").unwrap(), "other");
    }

    #[test]
    fn test_new_cart_rejects_empty_id() {
        let mut manager = empty_manager();
        let err = manager.new_cart("", NewCart::new()).unwrap_err();
        assert!(matches!(err, ManagerError::Core(CoreError::Validation(_))));
    }

    #[test]
    fn test_overwrite_replaces_instance_in_place() {
        let mut manager = empty_manager();
        manager.new_cart("a", NewCart::new()).unwrap();
        manager.new_cart("b", NewCart::new()).unwrap();
        manager
            .get_cart_mut(Some("a"))
            .unwrap()
            .add_item("SKU-1", "Item", Money::from_cents(100), 1)
            .unwrap();

        manager.new_cart("a", NewCart::new()).unwrap();

        assert!(manager.get_cart(Some("a")).unwrap().is_empty());
        assert_eq!(manager.cart_ids().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn test_unknown_driver_fails_init() {
        let config = ManagerConfig::default().with_cart(
            "main",
            CartConfigOverride {
                storage: Some(StorageConfig::with_driver("redis")),
                ..Default::default()
            },
        );

        let err = CartManager::<Cart>::new(config, DriverRegistry::new()).unwrap_err();
        assert!(matches!(
            err,
            ManagerError::InvalidStorageImplementation { ref scope, .. } if scope == "main"
        ));
    }

    #[test]
    fn test_unknown_default_driver_fails_init() {
        let mut config = ManagerConfig::default();
        config.defaults.storage = StorageConfig::with_driver("redis");

        let err = CartManager::<Cart>::new(config, DriverRegistry::new()).unwrap_err();
        assert!(matches!(
            err,
            ManagerError::InvalidStorageImplementation { ref scope, .. } if scope == DEFAULTS_SCOPE
        ));
    }

    #[test]
    fn test_new_cart_with_unknown_driver_registers_nothing() {
        let mut manager = empty_manager();
        let config = CartConfig {
            storage: StorageConfig::with_driver("nope"),
            ..Default::default()
        };

        assert!(manager.new_cart("main", NewCart::new().config(config)).is_err());
        assert!(!manager.cart_exists("main"));
        assert_eq!(manager.context(), None);
        assert_eq!(manager.get_cart_config("main"), manager.defaults());
    }

    #[test]
    fn test_explicit_config_is_stored() {
        let (session, registry) = session_registry();
        let mut manager: CartManager =
            CartManager::new(ManagerConfig::default(), registry).unwrap();

        let config = CartConfig {
            storage: StorageConfig::with_driver("session").prefix("tmp_"),
            ..Default::default()
        };
        manager.new_cart("main", NewCart::new().config(config.clone())).unwrap();

        assert_eq!(manager.get_cart_config("main"), &config);
        assert_eq!(manager.get_cart_storage_key("main"), "tmp_main");

        manager.save_cart_state("main").unwrap();
        assert!(session.restore("tmp_main").unwrap().is_some());
    }

    #[test]
    fn test_storage_ops_without_driver() {
        let mut manager = empty_manager();
        manager.new_cart("main", NewCart::new()).unwrap();

        assert!(matches!(
            manager.save_cart_state("main"),
            Err(ManagerError::InvalidStorageImplementation { .. })
        ));
        assert!(matches!(
            manager.clear_cart_state("main"),
            Err(ManagerError::InvalidStorageImplementation { .. })
        ));
        // Destroy with clear is fine: nothing to clear
        manager.destroy_cart(Some("main"), true).unwrap();
    }

    #[test]
    fn test_save_requires_live_cart() {
        let (_session, registry) = session_registry();
        let mut config = ManagerConfig::default();
        config.defaults.storage = StorageConfig::with_driver("session");
        let mut manager: CartManager = CartManager::new(config, registry).unwrap();

        assert!(matches!(
            manager.save_cart_state("ghost"),
            Err(ManagerError::InvalidCartInstance(_))
        ));
        assert!(matches!(
            manager.restore_cart_state("ghost"),
            Err(ManagerError::InvalidCartInstance(_))
        ));
        // Clearing by key works for carts that aren't live
        manager.clear_cart_state("ghost").unwrap();
    }

    #[test]
    fn test_autosave_registration_once_per_id() {
        let (_session, registry) = session_registry();
        let mut config = ManagerConfig::default();
        config.defaults.storage = StorageConfig::with_driver("session").autosave(true);
        let mut manager: CartManager = CartManager::new(config, registry).unwrap();

        manager.new_cart("main", NewCart::new()).unwrap();
        manager.new_cart("main", NewCart::new()).unwrap();
        manager.new_cart("other", NewCart::new()).unwrap();

        assert_eq!(manager.autosave_ids(), ["main", "other"]);

        manager.destroy_cart(Some("other"), false).unwrap();
        assert_eq!(manager.autosave_ids(), ["main"]);

        assert!(manager.run_autosave().is_empty());
        assert!(manager.autosave_ids().is_empty());
    }

    #[test]
    fn test_save_requires_a_driver() {
        let (session, registry) = session_registry();
        let config = ManagerConfig::default()
            .with_cart("plain", CartConfigOverride::default())
            .with_cart(
                "stored",
                CartConfigOverride {
                    storage: Some(StorageConfig::with_driver("session")),
                    ..Default::default()
                },
            );
        let manager: CartManager = CartManager::new(config, registry).unwrap();

        assert!(matches!(
            manager.save_cart_state("plain"),
            Err(ManagerError::InvalidStorageImplementation { .. })
        ));
        manager.save_cart_state("stored").unwrap();
        assert_eq!(session.len(), 1);
        assert!(session.restore("stored").unwrap().is_some());
    }
}
