//! Domain error types.

use common::ProductId;
use thiserror::Error;

/// A required input was missing or malformed.
///
/// Raised before any network call so nothing is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line was submitted with a zero quantity.
    #[error("Invalid quantity for {product_id}: must be at least 1")]
    InvalidQuantity { product_id: ProductId },

    /// The same product appears on more than one line.
    #[error("Duplicate cart line for {product_id}")]
    DuplicateLine { product_id: ProductId },

    /// A required field is blank.
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    /// A field is present but malformed.
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Errors raised by cart operations.
///
/// These are soft failures: the cart is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Adding or increasing would exceed the last observed stock.
    #[error("Allocation limit reached for {product_id}: only {available} available")]
    AllocationLimit {
        product_id: ProductId,
        available: i64,
    },

    /// Decreasing would drop the line below one unit.
    #[error("Quantity for {product_id} cannot go below 1; remove the line instead")]
    BelowMinimum { product_id: ProductId },

    /// The product has no line in the cart.
    #[error("Product not in cart: {product_id}")]
    NotInCart { product_id: ProductId },
}
