use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use domain::{
    Address, Order, OrderId, Product, ProductId, ProfileUpdate, UserId, UserProfile, UserStatus,
};
use tokio::sync::{RwLock, watch};

use crate::{
    Result, StoreError,
    batch::{StockGuard, WriteBatch, WriteOp, validate_batch},
    store::{CommitReceipt, DocumentStore, OrderFeed, ProfileFeed, sort_newest_first},
};

#[derive(Debug, Default)]
struct Faults {
    deny_next_commit: Option<String>,
    fail_next_commit: bool,
    fail_profile_writes: bool,
    commit_delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct State {
    products: BTreeMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    profiles: HashMap<UserId, UserProfile>,
    commits: usize,
    faults: Faults,
}

/// In-memory document store.
///
/// Every batch runs under a single write guard, so batches are serialized
/// and readers never observe a partial commit. Used for tests and for
/// running the api without a database.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    state: Arc<RwLock<State>>,
    orders_tx: Arc<watch::Sender<Arc<Vec<Order>>>>,
    profiles_tx: Arc<watch::Sender<Arc<Vec<UserProfile>>>>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        let (orders_tx, _) = watch::channel(Arc::new(Vec::new()));
        let (profiles_tx, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            state: Arc::new(RwLock::new(State::default())),
            orders_tx: Arc::new(orders_tx),
            profiles_tx: Arc::new(profiles_tx),
        }
    }
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with `products`.
    pub async fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.write().await;
            for product in products {
                state.products.insert(product.id.clone(), product);
            }
        }
        store
    }

    /// Rejects the next commit with `PermissionDenied(message)`.
    pub async fn deny_next_commit(&self, message: impl Into<String>) {
        self.state.write().await.faults.deny_next_commit = Some(message.into());
    }

    /// Fails the next commit with `Unavailable`.
    pub async fn fail_next_commit(&self) {
        self.state.write().await.faults.fail_next_commit = true;
    }

    /// Makes every profile write fail with `Unavailable`.
    pub async fn set_fail_profile_writes(&self, fail: bool) {
        self.state.write().await.faults.fail_profile_writes = fail;
    }

    /// Delays every commit before it takes the write guard.
    pub async fn set_commit_delay(&self, delay: Option<Duration>) {
        self.state.write().await.faults.commit_delay = delay;
    }

    /// Returns the current stock of a product, if it exists.
    pub async fn stock_of(&self, id: &ProductId) -> Option<i64> {
        self.state.read().await.products.get(id).map(|p| p.stock)
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of batches committed so far.
    pub async fn commit_count(&self) -> usize {
        self.state.read().await.commits
    }

    fn publish_orders(&self, state: &State) {
        let orders: Vec<Order> = state.orders.values().cloned().collect();
        self.orders_tx.send_replace(Arc::new(orders));
    }

    fn publish_profiles(&self, state: &State) {
        let profiles: Vec<UserProfile> = state.profiles.values().cloned().collect();
        self.profiles_tx.send_replace(Arc::new(profiles));
    }

    /// Applies `mutate` to a profile under the write guard and publishes
    /// the new profile set.
    async fn modify_profile<T>(
        &self,
        uid: &UserId,
        mutate: impl FnOnce(&mut UserProfile) -> Result<T> + Send,
    ) -> Result<T> {
        let mut state = self.state.write().await;
        if state.faults.fail_profile_writes {
            return Err(StoreError::Unavailable(
                "profile writes are failing".to_string(),
            ));
        }

        let profile = state
            .profiles
            .get_mut(uid)
            .ok_or_else(|| StoreError::not_found("user_profiles", uid))?;
        let result = mutate(profile)?;

        self.publish_profiles(&state);
        Ok(result)
    }
}

/// Checks every op of a batch against the current state without writing.
fn check_batch(state: &State, batch: &WriteBatch) -> Result<()> {
    let mut projected: HashMap<&ProductId, i64> = HashMap::new();

    for op in batch.ops() {
        match op {
            WriteOp::CreateOrder(order) => {
                if state.orders.contains_key(&order.id) {
                    return Err(StoreError::AlreadyExists {
                        collection: "orders",
                        id: order.id.to_string(),
                    });
                }
            }
            WriteOp::AdjustStock {
                product_id,
                delta,
                guard,
            } => {
                let current = match projected.get(product_id) {
                    Some(stock) => *stock,
                    None => state
                        .products
                        .get(product_id)
                        .map(|p| p.stock)
                        .ok_or_else(|| StoreError::not_found("products", product_id))?,
                };
                let next = current + delta;
                if *guard == StockGuard::NonNegative && next < 0 {
                    return Err(StoreError::PreconditionFailed {
                        product_id: product_id.clone(),
                        requested: -delta,
                        available: current,
                    });
                }
                projected.insert(product_id, next);
            }
            WriteOp::SetOrderStatus {
                order_id, expected, ..
            } => {
                let order = state
                    .orders
                    .get(order_id)
                    .ok_or_else(|| StoreError::not_found("orders", order_id))?;
                if let Some(expected) = *expected
                    && order.status != expected
                {
                    return Err(StoreError::StatusConflict {
                        order_id: *order_id,
                        expected,
                        actual: order.status,
                    });
                }
            }
        }
    }

    Ok(())
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.state.read().await.products.values().cloned().collect())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(id).cloned())
    }

    async fn upsert_product(&self, product: Product) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.insert(product.id.clone(), product);
        Ok(())
    }

    async fn remove_product(&self, id: &ProductId) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .products
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("products", id))
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(id).cloned())
    }

    async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state.orders.values().cloned().collect();
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    async fn set_tracking_number(&self, id: &OrderId, tracking_number: String) -> Result<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("orders", id))?;
        order.tracking_number = Some(tracking_number);
        self.publish_orders(&state);
        Ok(())
    }

    #[tracing::instrument(skip(self, batch), fields(ops = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt> {
        validate_batch(&batch)?;

        let delay = self.state.read().await.faults.commit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().await;

        if let Some(message) = state.faults.deny_next_commit.take() {
            return Err(StoreError::PermissionDenied(message));
        }
        if std::mem::take(&mut state.faults.fail_next_commit) {
            return Err(StoreError::Unavailable("commit failed".to_string()));
        }

        check_batch(&state, &batch)?;

        let committed_at = Utc::now();
        let order_id = batch.created_order_id();
        let mut orders_changed = false;

        for op in batch.into_ops() {
            match op {
                WriteOp::CreateOrder(order) => {
                    state.orders.insert(order.id, order.into_order(committed_at));
                    orders_changed = true;
                }
                WriteOp::AdjustStock {
                    product_id, delta, ..
                } => {
                    if let Some(product) = state.products.get_mut(&product_id) {
                        product.stock += delta;
                    }
                }
                WriteOp::SetOrderStatus {
                    order_id, status, ..
                } => {
                    if let Some(order) = state.orders.get_mut(&order_id) {
                        order.status = status;
                        orders_changed = true;
                    }
                }
            }
        }
        state.commits += 1;

        if orders_changed {
            self.publish_orders(&state);
        }

        Ok(CommitReceipt {
            committed_at,
            order_id,
        })
    }

    async fn get_profile(&self, uid: &UserId) -> Result<Option<UserProfile>> {
        Ok(self.state.read().await.profiles.get(uid).cloned())
    }

    async fn create_profile(&self, profile: UserProfile) -> Result<()> {
        let mut state = self.state.write().await;
        if state.faults.fail_profile_writes {
            return Err(StoreError::Unavailable(
                "profile writes are failing".to_string(),
            ));
        }
        if state.profiles.contains_key(&profile.uid) {
            return Err(StoreError::AlreadyExists {
                collection: "user_profiles",
                id: profile.uid.to_string(),
            });
        }
        state.profiles.insert(profile.uid.clone(), profile);
        self.publish_profiles(&state);
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        Ok(self.state.read().await.profiles.values().cloned().collect())
    }

    async fn update_profile(&self, uid: &UserId, update: ProfileUpdate) -> Result<UserProfile> {
        self.modify_profile(uid, |profile| {
            update.apply_to(profile);
            Ok(profile.clone())
        })
        .await
    }

    async fn add_address(&self, uid: &UserId, address: Address) -> Result<UserProfile> {
        self.modify_profile(uid, |profile| {
            if address.is_default {
                for existing in &mut profile.addresses {
                    existing.is_default = false;
                }
            }
            profile.addresses.push(address);
            Ok(profile.clone())
        })
        .await
    }

    async fn remove_address(&self, uid: &UserId, address_id: &str) -> Result<UserProfile> {
        self.modify_profile(uid, |profile| {
            let before = profile.addresses.len();
            profile.addresses.retain(|a| a.id != address_id);
            if profile.addresses.len() == before {
                return Err(StoreError::not_found("addresses", address_id));
            }
            Ok(profile.clone())
        })
        .await
    }

    async fn set_user_status(&self, uid: &UserId, status: UserStatus) -> Result<UserProfile> {
        self.modify_profile(uid, |profile| {
            profile.status = status;
            Ok(profile.clone())
        })
        .await
    }

    async fn toggle_wishlist(&self, uid: &UserId, product_id: &ProductId) -> Result<bool> {
        self.modify_profile(uid, |profile| {
            if let Some(pos) = profile.wishlist.iter().position(|p| p == product_id) {
                profile.wishlist.remove(pos);
                Ok(false)
            } else {
                profile.wishlist.push(product_id.clone());
                Ok(true)
            }
        })
        .await
    }

    fn subscribe_orders(&self) -> OrderFeed {
        self.orders_tx.subscribe()
    }

    fn subscribe_users(&self) -> ProfileFeed {
        self.profiles_tx.subscribe()
    }
}
