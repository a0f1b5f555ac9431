use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Address, Money, Order, OrderId, OrderStatus, Product, ProductId, ProfileUpdate, UserId,
    UserProfile, UserStatus,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgListener, postgres::PgRow};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    Result, StoreError,
    batch::{StockGuard, WriteBatch, WriteOp, validate_batch},
    store::{CommitReceipt, DocumentStore, OrderFeed, ProfileFeed},
};

/// Channel the change triggers notify on. The payload is the table name.
pub const CHANGE_CHANNEL: &str = "storefront_changes";

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

const ORDER_COLUMNS: &str =
    "id, user_id, user_email, items, total, shipping, status, tracking_number, created_at";

/// PostgreSQL-backed document store.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
    orders_tx: Arc<watch::Sender<Arc<Vec<Order>>>>,
    profiles_tx: Arc<watch::Sender<Arc<Vec<UserProfile>>>>,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    ///
    /// Subscriptions stay empty until [`start_change_feed`](Self::start_change_feed)
    /// is running.
    pub fn new(pool: PgPool) -> Self {
        let (orders_tx, _) = watch::channel(Arc::new(Vec::new()));
        let (profiles_tx, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            pool,
            orders_tx: Arc::new(orders_tx),
            profiles_tx: Arc::new(profiles_tx),
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Listens for change notifications and republishes the affected set
    /// to subscribers. Both sets are published once on start.
    pub async fn start_change_feed(&self) -> Result<JoinHandle<()>> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        self.refresh_orders().await?;
        self.refresh_profiles().await?;

        let store = self.clone();
        Ok(tokio::spawn(async move {
            loop {
                let notification = match listener.recv().await {
                    Ok(notification) => notification,
                    Err(e) => {
                        tracing::error!(error = %e, "Change feed listener failed");
                        break;
                    }
                };

                let refreshed = match notification.payload() {
                    "orders" => store.refresh_orders().await,
                    "user_profiles" => store.refresh_profiles().await,
                    _ => Ok(()),
                };
                if let Err(e) = refreshed {
                    tracing::warn!(error = %e, table = notification.payload(), "Feed refresh failed");
                }
            }
        }))
    }

    async fn refresh_orders(&self) -> Result<()> {
        let orders = self.list_orders().await?;
        self.orders_tx.send_replace(Arc::new(orders));
        Ok(())
    }

    async fn refresh_profiles(&self) -> Result<()> {
        let profiles = self.list_profiles().await?;
        self.profiles_tx.send_replace(Arc::new(profiles));
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let mut product: Product = serde_json::from_value(row.try_get("data")?)?;
        product.stock = row.try_get("stock")?;
        Ok(product)
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(e.into())))?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            user_email: row.try_get("user_email")?,
            items: serde_json::from_value(row.try_get("items")?)?,
            total: Money::from_minor(row.try_get("total")?),
            shipping: serde_json::from_value(row.try_get("shipping")?)?,
            status,
            tracking_number: row.try_get("tracking_number")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    fn row_to_profile(row: PgRow) -> Result<UserProfile> {
        Ok(serde_json::from_value(row.try_get("data")?)?)
    }

    async fn apply_op(
        tx: &mut Transaction<'_, Postgres>,
        op: &WriteOp,
        committed_at: DateTime<Utc>,
    ) -> Result<()> {
        match op {
            WriteOp::CreateOrder(order) => {
                sqlx::query(
                    r#"
                    INSERT INTO orders (id, user_id, user_email, items, total, shipping, status, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(order.id.as_uuid())
                .bind(order.user_id.as_str())
                .bind(&order.user_email)
                .bind(serde_json::to_value(&order.items)?)
                .bind(order.total.minor())
                .bind(serde_json::to_value(&order.shipping)?)
                .bind(order.status.as_str())
                .bind(committed_at)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    if let sqlx::Error::Database(ref db_err) = e
                        && db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                    {
                        return StoreError::AlreadyExists {
                            collection: "orders",
                            id: order.id.to_string(),
                        };
                    }
                    StoreError::from(e)
                })?;
            }

            WriteOp::AdjustStock {
                product_id,
                delta,
                guard,
            } => {
                let sql = match guard {
                    StockGuard::None => {
                        "UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1 RETURNING stock"
                    }
                    StockGuard::NonNegative => {
                        "UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1 AND stock + $2 >= 0 RETURNING stock"
                    }
                };
                let updated: Option<i64> = sqlx::query_scalar(sql)
                    .bind(product_id.as_str())
                    .bind(*delta)
                    .fetch_optional(&mut **tx)
                    .await?;

                if updated.is_none() {
                    let available: Option<i64> =
                        sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                            .bind(product_id.as_str())
                            .fetch_optional(&mut **tx)
                            .await?;
                    return Err(match available {
                        Some(available) => StoreError::PreconditionFailed {
                            product_id: product_id.clone(),
                            requested: -delta,
                            available,
                        },
                        None => StoreError::not_found("products", product_id),
                    });
                }
            }

            WriteOp::SetOrderStatus {
                order_id,
                status,
                expected,
            } => {
                let actual: Option<String> =
                    sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                        .bind(order_id.as_uuid())
                        .fetch_optional(&mut **tx)
                        .await?;
                let actual = actual.ok_or_else(|| StoreError::not_found("orders", order_id))?;

                if let Some(expected) = *expected
                    && actual != expected.as_str()
                {
                    return Err(StoreError::StatusConflict {
                        order_id: *order_id,
                        expected,
                        actual: actual
                            .parse()
                            .map_err(|e: String| StoreError::Database(sqlx::Error::Decode(e.into())))?,
                    });
                }

                sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
                    .bind(order_id.as_uuid())
                    .bind(status.as_str())
                    .execute(&mut **tx)
                    .await?;
            }
        }
        Ok(())
    }

    /// Loads a profile under a row lock, applies `mutate` and writes it back.
    async fn modify_profile<T: Send>(
        &self,
        uid: &UserId,
        mutate: impl FnOnce(&mut UserProfile) -> Result<T> + Send,
    ) -> Result<T> {
        let mut tx = self.pool.begin().await?;

        let row: Option<PgRow> =
            sqlx::query("SELECT data FROM user_profiles WHERE uid = $1 FOR UPDATE")
                .bind(uid.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        let row = row.ok_or_else(|| StoreError::not_found("user_profiles", uid))?;
        let mut profile = Self::row_to_profile(row)?;

        let result = mutate(&mut profile)?;

        sqlx::query("UPDATE user_profiles SET data = $2, updated_at = NOW() WHERE uid = $1")
            .bind(uid.as_str())
            .bind(serde_json::to_value(&profile)?)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result)
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query("SELECT id, stock, data FROM products ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        let row: Option<PgRow> = sqlx::query("SELECT id, stock, data FROM products WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn upsert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, stock, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                stock = EXCLUDED.stock,
                data = EXCLUDED.data,
                updated_at = NOW()
            "#,
        )
        .bind(product.id.as_str())
        .bind(product.stock)
        .bind(serde_json::to_value(&product)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_product(&self, id: &ProductId) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("products", id));
        }
        Ok(())
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn set_tracking_number(&self, id: &OrderId, tracking_number: String) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET tracking_number = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(tracking_number)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("orders", id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, batch), fields(ops = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt> {
        validate_batch(&batch)?;

        let mut tx = self.pool.begin().await?;
        let committed_at: DateTime<Utc> = sqlx::query_scalar("SELECT NOW()")
            .fetch_one(&mut *tx)
            .await?;

        // Returning early drops `tx`, which rolls back every applied op.
        for op in batch.ops() {
            Self::apply_op(&mut tx, op, committed_at).await?;
        }

        tx.commit().await?;

        Ok(CommitReceipt {
            committed_at,
            order_id: batch.created_order_id(),
        })
    }

    async fn get_profile(&self, uid: &UserId) -> Result<Option<UserProfile>> {
        let row: Option<PgRow> = sqlx::query("SELECT data FROM user_profiles WHERE uid = $1")
            .bind(uid.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_profile).transpose()
    }

    async fn create_profile(&self, profile: UserProfile) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO user_profiles (uid, data) VALUES ($1, $2) ON CONFLICT (uid) DO NOTHING",
        )
        .bind(profile.uid.as_str())
        .bind(serde_json::to_value(&profile)?)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists {
                collection: "user_profiles",
                id: profile.uid.to_string(),
            });
        }
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        let rows = sqlx::query("SELECT data FROM user_profiles ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_profile).collect()
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
