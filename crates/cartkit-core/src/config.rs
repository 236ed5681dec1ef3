//! # Cart Configuration
//!
//! Configuration for managed carts and the rule that turns defaults plus a
//! per-cart override into a cart's effective configuration.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Per-cart overrides (`carts.<id>` in the config document)
//! 2. Environment variables (`CARTKIT_*`, applied to the defaults)
//! 3. Config document `defaults`
//! 4. Built-in defaults (this file)
//!
//! ## Shallow Merge
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  defaults                      override "main"         effective        │
//! │  ────────                      ───────────────         ─────────        │
//! │  storage: { driver: session,   storage: {              storage: {       │
//! │             autosave: true }     driver: file }          driver: file,  │
//! │                                                          autosave: false│
//! │  tax_rate_bps: 825             (absent)                tax_rate_bps: 825│
//! │                                                                         │
//! │  A present top-level key replaces the default key ENTIRELY.            │
//! │  `storage` is never merged field-by-field: an override that names      │
//! │  only `driver` loses the default `autosave`.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::TaxRate;
use crate::{DEFAULT_MAX_CART_ITEMS, DEFAULT_MAX_ITEM_QUANTITY};

// =============================================================================
// Storage Section
// =============================================================================

/// Persistence settings for one cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Name of a registered storage driver. `None` disables persistence.
    #[serde(default)]
    pub driver: Option<String>,

    /// Save the cart when the owning session scope ends.
    #[serde(default)]
    pub autosave: bool,

    /// Prepended to the cart id to form the storage key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key_prefix: Option<String>,

    /// Appended to the cart id to form the storage key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key_suffix: Option<String>,
}

impl StorageConfig {
    /// Storage section naming `driver`, everything else at its default.
    pub fn with_driver(driver: impl Into<String>) -> Self {
        StorageConfig {
            driver: Some(driver.into()),
            ..Default::default()
        }
    }

    pub fn autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_key_prefix = Some(prefix.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.storage_key_suffix = Some(suffix.into());
        self
    }
}

// =============================================================================
// Cart Config
// =============================================================================

/// Effective configuration of one cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CartConfig {
    pub storage: StorageConfig,

    /// Tax rate applied to every line, in basis points.
    pub tax_rate_bps: u32,

    /// Maximum number of distinct line items.
    pub max_items: usize,

    /// Maximum quantity of a single line item.
    pub max_item_quantity: i64,
}

impl Default for CartConfig {
    /// No persistence, no tax, default item limits.
    fn default() -> Self {
        CartConfig {
            storage: StorageConfig::default(),
            tax_rate_bps: 0,
            max_items: DEFAULT_MAX_CART_ITEMS,
            max_item_quantity: DEFAULT_MAX_ITEM_QUANTITY,
        }
    }
}

impl CartConfig {
    /// One-level override: every `Some` field of `partial` replaces the
    /// corresponding field of `self`.
    pub fn merge(&self, partial: &CartConfigOverride) -> CartConfig {
        CartConfig {
            storage: partial
                .storage
                .clone()
                .unwrap_or_else(|| self.storage.clone()),
            tax_rate_bps: partial.tax_rate_bps.unwrap_or(self.tax_rate_bps),
            max_items: partial.max_items.unwrap_or(self.max_items),
            max_item_quantity: partial.max_item_quantity.unwrap_or(self.max_item_quantity),
        }
    }

    /// Derives the external storage key: prefix + id + suffix.
    ///
    /// ```rust
    /// use cartkit_core::config::{CartConfig, StorageConfig};
    ///
    /// let config = CartConfig {
    ///     storage: StorageConfig::with_driver("session").prefix("app_"),
    ///     ..Default::default()
    /// };
    /// assert_eq!(config.storage_key("main"), "app_main");
    /// ```
    pub fn storage_key(&self, id: &str) -> String {
        let prefix = self.storage.storage_key_prefix.as_deref().unwrap_or("");
        let suffix = self.storage.storage_key_suffix.as_deref().unwrap_or("");
        format!("{prefix}{id}{suffix}")
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Storage driver name, if persistence is enabled.
    #[inline]
    pub fn driver(&self) -> Option<&str> {
        self.storage.driver.as_deref()
    }
}

/// Per-cart override as written in a config document.
///
/// Absent fields inherit from the defaults. A present `storage` section is
/// taken as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CartConfigOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate_bps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_item_quantity: Option<i64>,
}

// =============================================================================
// Manager Config
// =============================================================================

/// Top-level input for a cart manager.
///
/// ## Example Document
/// ```json
/// {
///   "defaults": { "storage": { "driver": "session", "autosave": true } },
///   "carts": {
///     "main": {},
///     "wishlist": { "storage": { "driver": "file" } }
///   }
/// }
/// ```
///
/// `carts` keeps declaration order; the first declared cart becomes the
/// manager's initial context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    pub defaults: CartConfig,
    pub carts: IndexMap<String, CartConfigOverride>,
}

impl ManagerConfig {
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::Config(e.to_string()))
    }

    pub fn from_json_slice(json: &[u8]) -> CoreResult<Self> {
        serde_json::from_slice(json).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Adds (or replaces) a declared cart, keeping its original position.
    pub fn with_cart(mut self, id: impl Into<String>, partial: CartConfigOverride) -> Self {
        self.carts.insert(id.into(), partial);
        self
    }

    /// Applies `CARTKIT_*` environment variables to the defaults.
    ///
    /// ## Environment Variables
    /// - `CARTKIT_STORAGE_DRIVER`: driver name (empty string disables storage)
    /// - `CARTKIT_AUTOSAVE`: `true`/`false`/`1`/`0`
    /// - `CARTKIT_KEY_PREFIX`, `CARTKIT_KEY_SUFFIX`: storage key affixes
    /// - `CARTKIT_TAX_RATE`: percentage, e.g. `8.25`
    pub fn apply_env(&mut self) -> CoreResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Same as [`apply_env`](Self::apply_env) with an arbitrary lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = &mut self.defaults.storage;

        if let Some(driver) = lookup("CARTKIT_STORAGE_DRIVER") {
            storage.driver = if driver.is_empty() { None } else { Some(driver) };
        }

        if let Some(raw) = lookup("CARTKIT_AUTOSAVE") {
            storage.autosave = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(CoreError::Config(format!(
                        "CARTKIT_AUTOSAVE: expected a boolean, got '{other}'"
                    )))
                }
            };
        }

        if let Some(prefix) = lookup("CARTKIT_KEY_PREFIX") {
            storage.storage_key_prefix = Some(prefix);
        }

        if let Some(suffix) = lookup("CARTKIT_KEY_SUFFIX") {
            storage.storage_key_suffix = Some(suffix);
        }

        if let Some(raw) = lookup("CARTKIT_TAX_RATE") {
            let pct: f64 = raw.trim().parse().map_err(|_| {
                CoreError::Config(format!("CARTKIT_TAX_RATE: expected a percentage, got '{raw}'"))
            })?;
            self.defaults.tax_rate_bps = TaxRate::from_percentage(pct).bps();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_merge_keeps_defaults_for_absent_keys() {
        let defaults = CartConfig {
            storage: StorageConfig::with_driver("session").autosave(true),
            tax_rate_bps: 825,
            ..Default::default()
        };

        let merged = defaults.merge(&CartConfigOverride::default());
        assert_eq!(merged, defaults);
    }

    #[test]
    fn test_merge_is_shallow() {
        let defaults = CartConfig {
            storage: StorageConfig::with_driver("session").autosave(true).prefix("app_"),
            ..Default::default()
        };
        let partial = CartConfigOverride {
            storage: Some(StorageConfig::with_driver("file")),
            max_items: Some(5),
            ..Default::default()
        };

        let merged = defaults.merge(&partial);
        assert_eq!(merged.driver(), Some("file"));
        // Whole section replaced: autosave and prefix are NOT inherited
        assert!(!merged.storage.autosave);
        assert_eq!(merged.storage.storage_key_prefix, None);
        assert_eq!(merged.max_items, 5);
        assert_eq!(merged.max_item_quantity, DEFAULT_MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_storage_key() {
        let mut config = CartConfig::default();
        assert_eq!(config.storage_key("main"), "main");

        config.storage = StorageConfig::default().prefix("app_");
        assert_eq!(config.storage_key("main"), "app_main");

        config.storage = config.storage.suffix("_v2");
        assert_eq!(config.storage_key("main"), "app_main_v2");
        assert_eq!(config.storage_key("main"), config.storage_key("main"));
    }

    #[test]
    fn test_parse_document_preserves_order() {
        let config = ManagerConfig::from_json_str(
            r#"{
                "defaults": { "storage": { "driver": null, "autosave": false } },
                "carts": { "zeta": {}, "alpha": { "tax_rate_bps": 500 } }
            }"#,
        )
        .unwrap();

        let ids: Vec<&str> = config.carts.keys().map(String::as_str).collect();
        assert_eq!(ids, ["zeta", "alpha"]);
        assert_eq!(config.carts["alpha"].tax_rate_bps, Some(500));
        assert_eq!(config.defaults.driver(), None);
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = ManagerConfig::from_json_str(r#"{ "defaults": { "storag": {} } }"#).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_apply_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CARTKIT_STORAGE_DRIVER", "file"),
            ("CARTKIT_AUTOSAVE", "1"),
            ("CARTKIT_KEY_PREFIX", "shop_"),
            ("CARTKIT_TAX_RATE", "8.25"),
        ]
        .into_iter()
        .collect();

        let mut config = ManagerConfig::default();
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.defaults.driver(), Some("file"));
        assert!(config.defaults.storage.autosave);
        assert_eq!(config.defaults.storage_key("main"), "shop_main");
        assert_eq!(config.defaults.tax_rate_bps, 825);
    }

    #[test]
    fn test_apply_overrides_rejects_bad_bool() {
        let mut config = ManagerConfig::default();
        let err = config
            .apply_overrides(|name| (name == "CARTKIT_AUTOSAVE").then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
