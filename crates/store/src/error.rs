use domain::{OrderId, OrderStatus, ProductId};
use thiserror::Error;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's access policy rejected the operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A referenced document does not exist.
    #[error("{collection} not found: {id}")]
    NotFound {
        collection: &'static str,
        id: String,
    },

    /// A document with this id already exists.
    #[error("{collection} already exists: {id}")]
    AlreadyExists {
        collection: &'static str,
        id: String,
    },

    /// A conditional stock decrement would have gone below zero.
    #[error(
        "Insufficient stock for {product_id}: requested {requested}, available {available}"
    )]
    PreconditionFailed {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// The order's status changed between read and write.
    #[error("Order {order_id} status is {actual}, expected {expected}")]
    StatusConflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// The batch was malformed.
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// The store could not be reached or timed out.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn not_found(collection: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            collection,
            id: id.to_string(),
        }
    }
}

/// SQLSTATE for `insufficient_privilege`.
const INSUFFICIENT_PRIVILEGE: &str = "42501";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(INSUFFICIENT_PRIVILEGE) =>
            {
                StoreError::PermissionDenied(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
