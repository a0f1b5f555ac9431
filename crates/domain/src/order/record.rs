//! Order records: the staged snapshot and the persisted form.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::catalogue::Category;
use crate::error::ValidationError;
use crate::money::{Money, Totals};
use crate::shipping::ShippingDetails;

use super::OrderStatus;

/// A purchased line, copied from the cart at submission time.
///
/// Not a reference to the product: later price or stock edits never
/// change a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub category: Category,
    #[serde(default)]
    pub image: String,
}

impl OrderLine {
    /// Returns price * quantity.
    pub fn subtotal(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            category: item.category,
            image: item.image.clone(),
        }
    }
}

/// An order staged for the checkout batch, before the store stamps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_email: String,
    pub items: Vec<OrderLine>,
    pub total: Money,
    pub shipping: ShippingDetails,
    pub status: OrderStatus,
}

impl NewOrder {
    /// Builds and validates the immutable snapshot of a purchase.
    ///
    /// `total` is taken as submitted; it is not re-derived from the lines.
    pub fn from_cart(
        user_id: UserId,
        items: &[CartItem],
        total: Money,
        shipping: ShippingDetails,
    ) -> Result<Self, ValidationError> {
        validate_lines(items)?;
        shipping.validate()?;

        Ok(Self {
            id: OrderId::new(),
            user_id,
            user_email: shipping.normalized_email(),
            items: items.iter().map(OrderLine::from).collect(),
            total,
            shipping,
            status: OrderStatus::Processing,
        })
    }

    /// Totals recomputed from the line snapshots at the fixed tax rate.
    pub fn computed_totals(&self) -> Totals {
        Totals::from_subtotal(self.items.iter().map(OrderLine::subtotal).sum())
    }

    /// Stamps the server-assigned creation time.
    pub fn into_order(self, created_at: DateTime<Utc>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            user_email: self.user_email,
            items: self.items,
            total: self.total,
            shipping: self.shipping,
            status: self.status,
            tracking_number: None,
            created_at,
        }
    }
}

fn validate_lines(items: &[CartItem]) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    let mut seen = HashSet::new();
    let mut subtotal = Money::zero();
    for item in items {
        if item.quantity == 0 {
            return Err(ValidationError::InvalidQuantity {
                product_id: item.product_id.clone(),
            });
        }
        if !seen.insert(&item.product_id) {
            return Err(ValidationError::DuplicateLine {
                product_id: item.product_id.clone(),
            });
        }
        subtotal = item
            .price
            .checked_multiply(item.quantity)
            .and_then(|line| subtotal.checked_add(line))
            .ok_or_else(|| ValidationError::InvalidField {
                field: "price",
                reason: "amount too large".to_string(),
            })?;
    }
    Ok(())
}

/// A persisted order. Only `status` and `tracking_number` change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_email: String,
    pub items: Vec<OrderLine>,
    pub total: Money,
    pub shipping: ShippingDetails,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Display date, e.g. `14 Oct 2026`.
    pub fn date_label(&self) -> String {
        self.created_at.format("%-d %b %Y").to_string()
    }

    /// Total number of units across all lines.
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}
