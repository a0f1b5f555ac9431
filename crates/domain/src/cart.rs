//! Client-held cart aggregate.
//!
//! The cart trusts the last product list it was given. Its stock ceilings
//! are hints only; the checkout batch is the authority on availability.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::catalogue::{Category, Product};
use crate::error::CartError;
use crate::money::{Money, Totals};

/// One cart line: a product snapshot plus the desired quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub category: Category,
    #[serde(default)]
    pub image: String,
    /// Stock observed when the line was last touched.
    pub stock: i64,
    pub quantity: u32,
}

impl CartItem {
    /// Creates a line for `product` with the given quantity.
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            category: product.category,
            image: product.image.clone(),
            stock: product.stock,
            quantity,
        }
    }

    /// Returns price * quantity.
    pub fn subtotal(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// A change made to the cart while reconciling against fresh stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAdjustment {
    /// The quantity was lowered to the available stock.
    Clamped {
        product_id: ProductId,
        from: u32,
        to: u32,
    },
    /// The line was dropped: the product is gone or sold out.
    Removed { product_id: ProductId },
}

/// Per-session mapping of product to desired quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of `product`.
    ///
    /// Fails softly when the cart already holds every unit in stock.
    pub fn add(&mut self, product: &Product) -> Result<&CartItem, CartError> {
        let position = self.position(&product.id);
        let in_cart = position
            .and_then(|i| self.items.get(i))
            .map_or(0, |item| i64::from(item.quantity));

        if product.stock <= 0 || in_cart >= product.stock {
            return Err(CartError::AllocationLimit {
                product_id: product.id.clone(),
                available: product.stock.max(0),
            });
        }

        let index = match position {
            Some(i) => {
                let item = &mut self.items[i];
                item.quantity += 1;
                item.stock = product.stock;
                i
            }
            None => {
                self.items.push(CartItem::from_product(product, 1));
                self.items.len() - 1
            }
        };
        Ok(&self.items[index])
    }

    /// Changes a line's quantity by `delta`.
    ///
    /// Increases are capped by the line's recorded stock ceiling; the
    /// result must stay at or above one.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        delta: i32,
    ) -> Result<&CartItem, CartError> {
        let index = self.position(product_id).ok_or_else(|| CartError::NotInCart {
            product_id: product_id.clone(),
        })?;
        let item = &mut self.items[index];
        let new_quantity = i64::from(item.quantity) + i64::from(delta);

        if delta > 0 && new_quantity > item.stock {
            return Err(CartError::AllocationLimit {
                product_id: product_id.clone(),
                available: item.stock.max(0),
            });
        }
        if new_quantity < 1 {
            return Err(CartError::BelowMinimum {
                product_id: product_id.clone(),
            });
        }

        item.quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);
        Ok(&self.items[index])
    }

    /// Deletes a line. Returns true if one was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product_id != product_id);
        before != self.items.len()
    }

    /// Refreshes stock ceilings and prices from a freshly fetched product list.
    ///
    /// Quantities above the new stock are clamped; lines whose product is
    /// missing or sold out are dropped.
    pub fn reconcile(&mut self, products: &[Product]) -> Vec<CartAdjustment> {
        let mut adjustments = Vec::new();

        self.items.retain_mut(|item| {
            let Some(product) = products.iter().find(|p| p.id == item.product_id) else {
                adjustments.push(CartAdjustment::Removed {
                    product_id: item.product_id.clone(),
                });
                return false;
            };

            if product.stock <= 0 {
                adjustments.push(CartAdjustment::Removed {
                    product_id: item.product_id.clone(),
                });
                return false;
            }

            item.stock = product.stock;
            item.price = product.price;
            item.name = product.name.clone();

            if i64::from(item.quantity) > product.stock {
                let to = u32::try_from(product.stock).unwrap_or(u32::MAX);
                adjustments.push(CartAdjustment::Clamped {
                    product_id: item.product_id.clone(),
                    from: item.quantity,
                    to,
                });
                item.quantity = to;
            }
            true
        });

        adjustments
    }

    /// Returns the line for a product, if any.
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Returns the lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns the number of lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Subtotal, fixed-rate tax and grand total.
    pub fn totals(&self) -> Totals {
        Totals::from_subtotal(self.items.iter().map(CartItem::subtotal).sum())
    }

    /// Empties the cart, typically after a confirmed order.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Consumes the cart, returning its lines.
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| &item.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, stock: i64) -> Product {
        Product::new(id, format!("Piece {id}"), Money::from_minor(450_000), Category::Necklaces, stock)
    }

    #[test]
    fn test_add_inserts_then_increments() {
        let mut cart = Cart::new();
        let p1 = product("p1", 5);

        assert_eq!(cart.add(&p1).unwrap().quantity, 1);
        assert_eq!(cart.add(&p1).unwrap().quantity, 2);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_add_refuses_beyond_stock() {
        let mut cart = Cart::new();
        let p3 = product("p3", 2);
        cart.add(&p3).unwrap();
        cart.add(&p3).unwrap();

        let err = cart.add(&p3).unwrap_err();
        assert_eq!(
            err,
            CartError::AllocationLimit {
                product_id: ProductId::new("p3"),
                available: 2
            }
        );
        assert_eq!(cart.get(&ProductId::new("p3")).unwrap().quantity, 2);
    }

    #[test]
    fn test_add_refuses_sold_out_product() {
        let mut cart = Cart::new();
        assert!(cart.add(&product("p4", 0)).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_respects_ceiling_and_floor() {
        let mut cart = Cart::new();
        let p1 = product("p1", 3);
        let id = p1.id.clone();
        cart.add(&p1).unwrap();

        assert_eq!(cart.update_quantity(&id, 2).unwrap().quantity, 3);
        assert!(matches!(
            cart.update_quantity(&id, 1),
            Err(CartError::AllocationLimit { .. })
        ));
        assert!(matches!(
            cart.update_quantity(&id, -3),
            Err(CartError::BelowMinimum { .. })
        ));
        assert_eq!(cart.update_quantity(&id, -2).unwrap().quantity, 1);
    }

    #[test]
    fn test_update_quantity_unknown_product() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.update_quantity(&ProductId::new("nope"), 1),
            Err(CartError::NotInCart { .. })
        ));
    }

    #[test]
    fn test_remove_is_unconditional() {
        let mut cart = Cart::new();
        let p1 = product("p1", 5);
        cart.add(&p1).unwrap();
        cart.add(&p1).unwrap();

        assert!(cart.remove(&p1.id));
        assert!(!cart.remove(&p1.id));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals_include_tax() {
        let mut cart = Cart::new();
        cart.add(&product("p1", 5)).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.subtotal.minor(), 450_000);
        assert_eq!(totals.tax.minor(), 22_500);
        assert_eq!(totals.total.minor(), 472_500);
    }

    #[test]
    fn test_reconcile_clamps_and_drops() {
        let mut cart = Cart::new();
        let p1 = product("p1", 5);
        let p2 = product("p2", 5);
        let p3 = product("p3", 5);
        for _ in 0..4 {
            cart.add(&p1).unwrap();
        }
        cart.add(&p2).unwrap();
        cart.add(&p3).unwrap();

        // p1 dropped to 2 units, p2 sold out, p3 removed from the catalogue
        let fresh = vec![product("p1", 2), product("p2", 0)];
        let adjustments = cart.reconcile(&fresh);

        assert_eq!(
            adjustments,
            vec![
                CartAdjustment::Clamped {
                    product_id: ProductId::new("p1"),
                    from: 4,
                    to: 2
                },
                CartAdjustment::Removed {
                    product_id: ProductId::new("p2")
                },
                CartAdjustment::Removed {
                    product_id: ProductId::new("p3")
                },
            ]
        );
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.unit_count(), 2);
    }
}
