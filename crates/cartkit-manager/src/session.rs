//! # Session Scope
//!
//! Owns a [`CartManager`] for the lifetime of one request or session and
//! runs autosave when that lifetime ends.
//!
//! ## Scope Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CartSession::open(config, drivers)                                    │
//! │       │   carts restored from storage                                  │
//! │       ▼                                                                 │
//! │  session.get_cart_mut(None)?.add_item(...)   ◄── Deref to CartManager  │
//! │       │                                                                 │
//! │       ├──► session.finish()  → failures returned to the caller         │
//! │       │                                                                 │
//! │       └──► drop (early return, `?`, panic) → failures logged           │
//! │                                                                         │
//! │  Either way each autosave cart is saved exactly once.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::ops::{Deref, DerefMut};

use cartkit_core::{Cart, ManagedCart, ManagerConfig};
use cartkit_storage::DriverRegistry;
use tracing::{info, warn};

use crate::error::{CartFailure, ManagerResult};
use crate::manager::CartManager;

/// Request/session-scoped owner of a cart manager.
#[derive(Debug)]
pub struct CartSession<C: ManagedCart = Cart> {
    manager: CartManager<C>,
}

impl<C: ManagedCart> CartSession<C> {
    /// Builds the manager and opens the scope.
    pub fn open(config: ManagerConfig, drivers: DriverRegistry) -> ManagerResult<Self> {
        Ok(Self::new(CartManager::new(config, drivers)?))
    }

    pub fn new(manager: CartManager<C>) -> Self {
        CartSession { manager }
    }

    pub fn manager(&self) -> &CartManager<C> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut CartManager<C> {
        &mut self.manager
    }

    /// Ends the scope, returning any autosave failures instead of logging
    /// them.
    pub fn finish(mut self) -> Vec<CartFailure> {
        let failures = self.manager.run_autosave();
        info!(failed = failures.len(), "Cart session finished");
        failures
    }
}

impl<C: ManagedCart> Deref for CartSession<C> {
    type Target = CartManager<C>;

    fn deref(&self) -> &Self::Target {
        &self.manager
    }
}

impl<C: ManagedCart> DerefMut for CartSession<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.manager
    }
}

impl<C: ManagedCart> Drop for CartSession<C> {
    /// Best-effort: failures are logged, never raised.
    fn drop(&mut self) {
        for failure in self.manager.run_autosave() {
            warn!(
                cart_id = %failure.cart_id,
                error = %failure.error,
                "Autosave failed"
            );
        }
    }
}
