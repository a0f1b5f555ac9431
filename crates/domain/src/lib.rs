//! Domain layer for the storefront.
//!
//! This crate provides the pure data model shared by the store and the
//! checkout services:
//! - Money and the fixed checkout tax
//! - Catalogue products and categories
//! - The client-held cart aggregate
//! - Order records and the fulfilment status lifecycle
//! - Shipping details and customer profiles

pub mod cart;
pub mod catalogue;
pub mod error;
pub mod money;
pub mod order;
pub mod profile;
pub mod shipping;

pub use cart::{Cart, CartAdjustment, CartItem};
pub use catalogue::{Category, Product, ProductSpecifications, seed_catalogue};
pub use common::{OrderId, ProductId, UserId};
pub use error::{CartError, ValidationError};
pub use money::{Money, TAX_RATE_BPS, Totals};
pub use order::{NewOrder, Order, OrderLine, OrderStatus};
pub use profile::{Address, AddressKind, ProfileUpdate, Role, UserProfile, UserStatus};
pub use shipping::{PaymentMethod, ShippingDetails};
