use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Address, Order, OrderId, OrderStatus, Product, ProductId, ProfileUpdate, UserId, UserProfile,
    UserStatus,
};
use tokio::sync::watch;

use crate::{Result, StoreError, WriteBatch};

/// Live view of every order. Each push carries the whole set in no
/// particular order.
pub type OrderFeed = watch::Receiver<Arc<Vec<Order>>>;

/// Live view of every customer profile.
pub type ProfileFeed = watch::Receiver<Arc<Vec<UserProfile>>>;

/// Outcome of a committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Server time stamped on every document the batch created.
    pub committed_at: DateTime<Utc>,
    /// Id of the order the batch created, if it created one.
    pub order_id: Option<OrderId>,
}

/// Document store holding the catalogue, orders and customer profiles.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Lists the catalogue.
    async fn list_products(&self) -> Result<Vec<Product>>;

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Inserts or replaces a product.
    async fn upsert_product(&self, product: Product) -> Result<()>;

    /// Deletes a product. Fails with `NotFound` if absent.
    async fn remove_product(&self, id: &ProductId) -> Result<()>;

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>>;

    /// Orders owned by `user_id`, newest first.
    async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>>;

    /// Every order, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Records a courier tracking number. Fails with `NotFound` if the
    /// order does not exist.
    async fn set_tracking_number(&self, id: &OrderId, tracking_number: String) -> Result<()>;

    /// Commits a batch atomically.
    ///
    /// Every precondition is checked before anything is written. If any op
    /// fails, no op is applied.
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt>;

    async fn get_profile(&self, uid: &UserId) -> Result<Option<UserProfile>>;

    /// Creates a profile. Fails with `AlreadyExists` if one is present.
    async fn create_profile(&self, profile: UserProfile) -> Result<()>;

    async fn list_profiles(&self) -> Result<Vec<UserProfile>>;

    async fn update_profile(&self, uid: &UserId, update: ProfileUpdate) -> Result<UserProfile>;

    async fn add_address(&self, uid: &UserId, address: Address) -> Result<UserProfile>;

    async fn remove_address(&self, uid: &UserId, address_id: &str) -> Result<UserProfile>;

    async fn set_user_status(&self, uid: &UserId, status: UserStatus) -> Result<UserProfile>;

    /// Adds the product to the wishlist, or removes it if present.
    ///
    /// Returns true if the product is now wishlisted.
    async fn toggle_wishlist(&self, uid: &UserId, product_id: &ProductId) -> Result<bool>;

    /// Subscribes to the full order set.
    fn subscribe_orders(&self) -> OrderFeed;

    /// Subscribes to the full profile set.
    fn subscribe_users(&self) -> ProfileFeed;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Returns true if the catalogue has no products.
    async fn is_catalogue_empty(&self) -> Result<bool> {
        Ok(self.list_products().await?.is_empty())
    }

    /// Loads an order, failing with `NotFound` if it does not exist.
    async fn require_order(&self, id: &OrderId) -> Result<Order> {
        self.get_order(id)
            .await?
            .ok_or_else(|| StoreError::not_found("orders", id))
    }

    /// Loads a profile, failing with `NotFound` if it does not exist.
    async fn require_profile(&self, uid: &UserId) -> Result<UserProfile> {
        self.get_profile(uid)
            .await?
            .ok_or_else(|| StoreError::not_found("user_profiles", uid))
    }

    /// Overwrites an order's status and returns the updated order.
    async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order> {
        let mut batch = WriteBatch::new();
        batch.set_order_status(*id, status, None);
        self.commit(batch).await?;
        self.require_order(id).await
    }

    /// Seeds the catalogue if it is empty. Returns the number of products
    /// written.
    async fn seed_if_empty(&self, products: Vec<Product>) -> Result<usize> {
        if !self.is_catalogue_empty().await? {
            return Ok(0);
        }
        let count = products.len();
        for product in products {
            self.upsert_product(product).await?;
        }
        Ok(count)
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}

/// Sorts orders newest first.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
