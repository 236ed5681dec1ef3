//! # Carts
//!
//! The contract a cart type fulfils to be managed, and the built-in
//! line-item cart.
//!
//! ## Cart Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    What the manager needs from a cart                   │
//! │                                                                         │
//! │  create(id, &config) ──► fresh instance                                 │
//! │                                                                         │
//! │  export() ──► State ──► SnapshotEnvelope ──► bytes ──► storage.save()   │
//! │                                                                         │
//! │  storage.restore() ──► bytes ──► SnapshotEnvelope ──► State ──► import()│
//! │                                                                         │
//! │  Everything else about the cart is opaque to the manager.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::CartConfig;
use crate::error::{CoreError, CoreResult};
use crate::money::{Money, TaxRate};
use crate::validation::{validate_price_cents, validate_quantity, validate_sku};

// =============================================================================
// Managed Cart Contract
// =============================================================================

/// A cart the manager can create, persist and restore.
pub trait ManagedCart: Sized {
    /// Serializable snapshot of everything that must survive a restore.
    type State: Serialize + DeserializeOwned;

    /// Builds an empty cart for `id` using its effective config.
    fn create(id: &str, config: &CartConfig) -> Self;

    fn id(&self) -> &str;

    /// Snapshot of the current state.
    fn export(&self) -> Self::State;

    /// Replaces the current state with a previously exported one.
    fn import(&mut self, state: Self::State) -> CoreResult<()>;
}

// =============================================================================
// Line Items
// =============================================================================

/// One line in the cart. Price and name are frozen when the item is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    pub sku: String,

    pub name: String,

    /// Price in cents at time of adding.
    pub unit_price_cents: i64,

    pub quantity: i64,

    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price() * self.quantity
    }
}

/// The persisted part of a [`Cart`]: its items and creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartContents {
    pub items: Vec<CartItem>,

    /// When the cart was created or last cleared.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CartContents {
    pub fn empty() -> Self {
        CartContents {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Totals summary for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

// =============================================================================
// Cart
// =============================================================================

/// Built-in shopping cart.
///
/// ## Invariants
/// - Items are unique by `sku` (adding the same SKU increases quantity)
/// - Every quantity is in `1..=config.max_item_quantity`
/// - At most `config.max_items` distinct items
#[derive(Debug, Clone)]
pub struct Cart {
    id: String,
    tax_rate: TaxRate,
    max_items: usize,
    max_item_quantity: i64,
    contents: CartContents,
}

impl Cart {
    /// Adds `quantity` of an item, or increases the quantity if the SKU is
    /// already in the cart.
    ///
    /// Nothing changes if the new cart's totals would overflow.
    pub fn add_item(
        &mut self,
        sku: &str,
        name: &str,
        unit_price: Money,
        quantity: i64,
    ) -> CoreResult<()> {
        validate_sku(sku)?;
        validate_price_cents(unit_price.cents())?;
        validate_quantity(quantity, self.max_item_quantity)?;

        let mut items = self.contents.items.clone();

        if let Some(item) = items.iter_mut().find(|i| i.sku == sku) {
            let new_qty = item.quantity.saturating_add(quantity);
            if new_qty > self.max_item_quantity {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: self.max_item_quantity,
                });
            }
            item.quantity = new_qty;
        } else {
            if items.len() >= self.max_items {
                return Err(CoreError::CartTooLarge {
                    max: self.max_items,
                });
            }
            items.push(CartItem {
                sku: sku.to_string(),
                name: name.to_string(),
                unit_price_cents: unit_price.cents(),
                quantity,
                added_at: Utc::now(),
            });
        }

        checked_totals(&items, self.tax_rate)?;
        self.contents.items = items;
        Ok(())
    }

    /// Sets the quantity of an item. Zero removes it.
    pub fn update_quantity(&mut self, sku: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(sku);
        }

        validate_quantity(quantity, self.max_item_quantity)?;

        let mut items = self.contents.items.clone();
        let item = items
            .iter_mut()
            .find(|i| i.sku == sku)
            .ok_or_else(|| CoreError::ItemNotInCart(sku.to_string()))?;
        item.quantity = quantity;

        checked_totals(&items, self.tax_rate)?;
        self.contents.items = items;
        Ok(())
    }

    pub fn remove_item(&mut self, sku: &str) -> CoreResult<()> {
        let initial_len = self.contents.items.len();
        self.contents.items.retain(|i| i.sku != sku);

        if self.contents.items.len() == initial_len {
            Err(CoreError::ItemNotInCart(sku.to_string()))
        } else {
            Ok(())
        }
    }

    /// Empties the cart and restarts its creation clock.
    pub fn clear(&mut self) {
        self.contents = CartContents::empty();
    }

    pub fn items(&self) -> &[CartItem] {
        &self.contents.items
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.contents.created_at
    }

    /// Number of distinct items.
    pub fn item_count(&self) -> usize {
        self.contents.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.contents.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.items.is_empty()
    }

    pub fn subtotal(&self) -> Money {
        self.contents.items.iter().map(CartItem::line_total).sum()
    }

    /// Tax is computed per line, then summed.
    pub fn tax(&self) -> Money {
        self.contents
            .items
            .iter()
            .map(|i| i.line_total().calculate_tax(self.tax_rate))
            .sum()
    }

    pub fn total(&self) -> Money {
        self.subtotal() + self.tax()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals {
            item_count: self.item_count(),
            total_quantity: self.total_quantity(),
            subtotal_cents: self.subtotal().cents(),
            tax_cents: self.tax().cents(),
            total_cents: self.total().cents(),
        }
    }
}

impl ManagedCart for Cart {
    type State = CartContents;

    fn create(id: &str, config: &CartConfig) -> Self {
        Cart {
            id: id.to_string(),
            tax_rate: config.tax_rate(),
            max_items: config.max_items,
            max_item_quantity: config.max_item_quantity,
            contents: CartContents::empty(),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn export(&self) -> CartContents {
        self.contents.clone()
    }

    /// Restored contents are re-checked against this cart's limits, since
    /// the config may have tightened since the snapshot was taken.
    fn import(&mut self, state: CartContents) -> CoreResult<()> {
        if state.items.len() > self.max_items {
            return Err(CoreError::CartTooLarge {
                max: self.max_items,
            });
        }

        let mut seen = HashSet::with_capacity(state.items.len());
        for item in &state.items {
            validate_sku(&item.sku)?;
            validate_price_cents(item.unit_price_cents)?;
            validate_quantity(item.quantity, self.max_item_quantity)?;
            if !seen.insert(item.sku.as_str()) {
                return Err(CoreError::DuplicateItem(item.sku.clone()));
            }
        }
        checked_totals(&state.items, self.tax_rate)?;

        self.contents = state;
        Ok(())
    }
}

/// Total of `items` including tax, failing with `AmountOverflow` instead of
/// wrapping.
///
/// Every mutation runs this first, so the unchecked accessors on [`Cart`]
/// never overflow.
fn checked_totals(items: &[CartItem], rate: TaxRate) -> CoreResult<Money> {
    let mut subtotal = Money::zero();
    let mut tax = Money::zero();

    for item in items {
        let line = item
            .unit_price()
            .checked_mul(item.quantity)
            .ok_or(CoreError::AmountOverflow)?;
        let line_tax = line.checked_tax(rate).ok_or(CoreError::AmountOverflow)?;

        subtotal = subtotal.checked_add(line).ok_or(CoreError::AmountOverflow)?;
        tax = tax.checked_add(line_tax).ok_or(CoreError::AmountOverflow)?;
    }

    subtotal.checked_add(tax).ok_or(CoreError::AmountOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::MAX_PRICE_CENTS;

    fn taxed_cart() -> Cart {
        let config = CartConfig {
            tax_rate_bps: 825,
            ..Default::default()
        };
        Cart::create("main", &config)
    }

    #[test]
    fn test_cart_add_item() {
        let mut cart = taxed_cart();
        cart.add_item("SKU-1", "Product 1", Money::from_cents(999), 2).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal().cents(), 1998);
    }

    #[test]
    fn test_cart_add_same_sku_increases_quantity() {
        let mut cart = taxed_cart();
        cart.add_item("SKU-1", "Product 1", Money::from_cents(999), 2).unwrap();
        cart.add_item("SKU-1", "Product 1", Money::from_cents(999), 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_cart_tax_calculation() {
        let mut cart = taxed_cart();
        cart.add_item("SKU-1", "Product 1", Money::from_cents(1000), 1).unwrap();

        assert_eq!(cart.tax().cents(), 83);
        assert_eq!(cart.total().cents(), 1083);
        assert_eq!(
            cart.totals(),
            CartTotals {
                item_count: 1,
                total_quantity: 1,
                subtotal_cents: 1000,
                tax_cents: 83,
                total_cents: 1083,
            }
        );
    }

    #[test]
    fn test_cart_limits_come_from_config() {
        let config = CartConfig {
            max_items: 1,
            max_item_quantity: 3,
            ..Default::default()
        };
        let mut cart = Cart::create("small", &config);

        cart.add_item("A", "A", Money::from_cents(100), 3).unwrap();
        assert!(matches!(
            cart.add_item("A", "A", Money::from_cents(100), 1),
            Err(CoreError::QuantityTooLarge { requested: 4, max: 3 })
        ));
        assert!(matches!(
            cart.add_item("B", "B", Money::from_cents(100), 1),
            Err(CoreError::CartTooLarge { max: 1 })
        ));
    }

    #[test]
    fn test_huge_price_is_rejected() {
        let mut cart = taxed_cart();
        let err = cart
            .add_item("BIG", "Big", Money::from_cents(i64::MAX / 2), 3)
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));
        assert!(cart.is_empty());
        assert_eq!(cart.total().cents(), 0);
    }

    #[test]
    fn test_overflowing_totals_leave_cart_unchanged() {
        let config = CartConfig {
            max_item_quantity: i64::MAX,
            ..Default::default()
        };
        let mut cart = Cart::create("bulk", &config);
        cart.add_item("A", "A", Money::from_cents(MAX_PRICE_CENTS), 1).unwrap();

        assert!(matches!(
            cart.add_item("B", "B", Money::from_cents(MAX_PRICE_CENTS), i64::MAX / 2),
            Err(CoreError::AmountOverflow)
        ));
        assert!(matches!(
            cart.add_item("A", "A", Money::from_cents(MAX_PRICE_CENTS), i64::MAX - 1),
            Err(CoreError::AmountOverflow)
        ));
        assert!(matches!(
            cart.update_quantity("A", i64::MAX),
            Err(CoreError::AmountOverflow)
        ));

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 1);
        assert_eq!(cart.total().cents(), MAX_PRICE_CENTS);
    }

    #[test]
    fn test_update_and_remove() {
        let mut cart = taxed_cart();
        cart.add_item("SKU-1", "Product 1", Money::from_cents(500), 1).unwrap();

        cart.update_quantity("SKU-1", 4).unwrap();
        assert_eq!(cart.total_quantity(), 4);

        cart.update_quantity("SKU-1", 0).unwrap();
        assert!(cart.is_empty());

        assert!(matches!(
            cart.remove_item("SKU-1"),
            Err(CoreError::ItemNotInCart(_))
        ));
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut cart = taxed_cart();
        cart.add_item("SKU-1", "Product 1", Money::from_cents(250), 2).unwrap();
        let state = cart.export();

        let mut restored = Cart::create("main", &CartConfig::default());
        restored.import(state.clone()).unwrap();

        assert_eq!(restored.export(), state);
        assert_eq!(restored.id(), "main");
    }

    #[test]
    fn test_import_rechecks_limits() {
        let mut big = Cart::create("big", &CartConfig::default());
        big.add_item("A", "A", Money::from_cents(1), 10).unwrap();

        let tight = CartConfig {
            max_item_quantity: 5,
            ..Default::default()
        };
        let mut small = Cart::create("small", &tight);
        assert!(small.import(big.export()).is_err());
        assert!(small.is_empty());
    }

    #[test]
    fn test_import_rejects_inconsistent_state() {
        let mut source = Cart::create("src", &CartConfig::default());
        source.add_item("A", "Apple", Money::from_cents(50), 1).unwrap();
        let line = source.export().items[0].clone();

        let mut cart = Cart::create("main", &CartConfig::default());

        let duplicated = CartContents {
            items: vec![line.clone(), line.clone()],
            created_at: Utc::now(),
        };
        assert!(matches!(
            cart.import(duplicated),
            Err(CoreError::DuplicateItem(sku)) if sku == "A"
        ));

        let negative_price = CartContents {
            items: vec![CartItem {
                unit_price_cents: -1,
                ..line.clone()
            }],
            created_at: Utc::now(),
        };
        assert!(matches!(cart.import(negative_price), Err(CoreError::Validation(_))));

        let blank_sku = CartContents {
            items: vec![CartItem {
                sku: "  ".to_string(),
                ..line
            }],
            created_at: Utc::now(),
        };
        assert!(matches!(cart.import(blank_sku), Err(CoreError::Validation(_))));

        assert!(cart.is_empty());
    }
}
