//! Service error types.
//!
//! Store errors never cross this boundary as-is; each service re-expresses
//! them in its own taxonomy.

use domain::{OrderId, OrderStatus, ProductId, UserId, ValidationError};
use store::StoreError;
use thiserror::Error;

/// Message shown to shoppers when the order could not be written.
pub const RESERVATION_RETRY_MESSAGE: &str = "We were unable to secure your reservation at this moment. Please verify your details or try again shortly.";

/// Errors returned by [`CheckoutService::place_order`](crate::CheckoutService::place_order).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// No signed-in identity.
    #[error("Sign in to place an order")]
    AuthRequired,

    /// The cart or shipping details were rejected before any write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another checkout for the same user has not settled yet.
    #[error("A checkout is already in progress")]
    CheckoutInProgress,

    /// The store's access policy rejected the batch. Message is verbatim.
    #[error("{0}")]
    PermissionDenied(String),

    /// A cart line references a product that no longer exists.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A conditional decrement would have oversold a product.
    #[error("Only {available} of {product_id} left, {requested} requested")]
    StockUnavailable {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// Any other store failure. Safe to retry.
    #[error("Checkout failed: {0}")]
    Transient(String),
}

impl CheckoutError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckoutError::AuthRequired => "auth_required",
            CheckoutError::Validation(_) => "validation",
            CheckoutError::CheckoutInProgress => "in_progress",
            CheckoutError::PermissionDenied(_) => "permission_denied",
            CheckoutError::ProductNotFound(_) => "product_not_found",
            CheckoutError::StockUnavailable { .. } => "stock_unavailable",
            CheckoutError::Transient(_) => "transient",
        }
    }
}

impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PermissionDenied(message) => CheckoutError::PermissionDenied(message),
            StoreError::NotFound {
                collection: "products",
                id,
            } => CheckoutError::ProductNotFound(ProductId::new(id)),
            StoreError::PreconditionFailed {
                product_id,
                requested,
                available,
            } => CheckoutError::StockUnavailable {
                product_id,
                requested,
                available,
            },
            other => CheckoutError::Transient(other.to_string()),
        }
    }
}

/// Errors returned by the order status lifecycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Rejected under the strict transition policy.
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Tracking number must not be empty")]
    EmptyTrackingNumber,

    /// The order changed status between read and write.
    #[error("Order {order_id} is {actual}, expected {expected}")]
    StatusConflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    #[error("{0}")]
    PermissionDenied(String),

    #[error("Status update failed: {0}")]
    Transient(String),
}

impl StatusError {
    pub(crate) fn from_store(order_id: OrderId, err: StoreError) -> Self {
        match err {
            StoreError::NotFound {
                collection: "orders",
                ..
            } => StatusError::OrderNotFound(order_id),
            StoreError::PermissionDenied(message) => StatusError::PermissionDenied(message),
            StoreError::StatusConflict {
                order_id,
                expected,
                actual,
            } => StatusError::StatusConflict {
                order_id,
                expected,
                actual,
            },
            other => StatusError::Transient(other.to_string()),
        }
    }
}

/// Errors returned by the account, catalogue and customer services.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{collection} not found: {id}")]
    NotFound {
        collection: &'static str,
        id: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Administrator accounts cannot be banned.
    #[error("Administrator accounts are protected: {0}")]
    AdminProtected(UserId),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("Store error: {0}")]
    Transient(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => ServiceError::NotFound { collection, id },
            StoreError::PermissionDenied(message) => ServiceError::PermissionDenied(message),
            other => ServiceError::Transient(other.to_string()),
        }
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_checkout_kinds() {
        let denied = CheckoutError::from(StoreError::PermissionDenied(
            "Missing or insufficient permissions.".to_string(),
        ));
        assert_eq!(
            denied,
            CheckoutError::PermissionDenied("Missing or insufficient permissions.".to_string())
        );
        assert_eq!(denied.to_string(), "Missing or insufficient permissions.");

        let missing = CheckoutError::from(StoreError::NotFound {
            collection: "products",
            id: "p9".to_string(),
        });
        assert_eq!(missing, CheckoutError::ProductNotFound(ProductId::new("p9")));

        let oversold = CheckoutError::from(StoreError::PreconditionFailed {
            product_id: ProductId::new("p3"),
            requested: 3,
            available: 2,
        });
        assert_eq!(oversold.kind(), "stock_unavailable");

        let down = CheckoutError::from(StoreError::Unavailable("timeout".to_string()));
        assert_eq!(down.kind(), "transient");
    }

    #[test]
    fn test_missing_order_maps_to_order_not_found() {
        let id = OrderId::new();
        let err = StatusError::from_store(id, StoreError::NotFound {
            collection: "orders",
            id: id.to_string(),
        });
        assert_eq!(err, StatusError::OrderNotFound(id));
    }

    #[test]
    fn test_concurrent_status_change_maps_to_conflict() {
        let id = OrderId::new();
        let err = StatusError::from_store(id, StoreError::StatusConflict {
            order_id: id,
            expected: OrderStatus::Processing,
            actual: OrderStatus::Cancelled,
        });
        assert_eq!(err, StatusError::StatusConflict {
            order_id: id,
            expected: OrderStatus::Processing,
            actual: OrderStatus::Cancelled,
        });
    }
}
