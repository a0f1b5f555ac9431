//! Live order board: every order, newest first.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{Order, OrderId, OrderStatus, UserId};
use tokio::sync::RwLock;

use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;
use crate::{ProjectionError, Result};

/// Read model over the full order set, kept sorted by placement time.
///
/// Each snapshot replaces the board wholesale, so a status change made by
/// any writer shows up on the next delivery.
#[derive(Clone)]
pub struct LiveOrderBoard {
    orders: Arc<RwLock<Vec<Order>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl LiveOrderBoard {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(Vec::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// All orders, newest first.
    pub async fn orders(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }

    pub async fn get_order(&self, order_id: OrderId) -> Option<Order> {
        self.orders
            .read()
            .await
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
    }

    /// Orders in `status`, newest first.
    pub async fn orders_by_status(&self, status: OrderStatus) -> Vec<Order> {
        self.orders
            .read()
            .await
            .iter()
            .filter(|o| o.status == status)
            .cloned()
            .collect()
    }

    /// Orders placed by `user_id`, newest first.
    pub async fn orders_for_user(&self, user_id: &UserId) -> Vec<Order> {
        self.orders
            .read()
            .await
            .iter()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of orders per status, in lifecycle order.
    pub async fn status_counts(&self) -> Vec<(OrderStatus, usize)> {
        let orders = self.orders.read().await;
        OrderStatus::ALL
            .iter()
            .map(|status| (*status, orders.iter().filter(|o| o.status == *status).count()))
            .collect()
    }
}

impl Default for LiveOrderBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection<Order> for LiveOrderBoard {
    fn name(&self) -> &'static str {
        "LiveOrderBoard"
    }

    /// Rejects a snapshot that lists the same order twice; the board keeps its
    /// previous contents.
    async fn replace(&self, snapshot: &[Order]) -> Result<()> {
        let mut seen = HashSet::with_capacity(snapshot.len());
        if let Some(dup) = snapshot.iter().find(|o| !seen.insert(o.id)) {
            return Err(ProjectionError::Projection(format!(
                "duplicate order {} in snapshot",
                dup.id
            )));
        }

        let mut sorted = snapshot.to_vec();
        store::sort_newest_first(&mut sorted);

        *self.orders.write().await = sorted;
        let mut pos = self.position.write().await;
        *pos = pos.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.orders.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for LiveOrderBoard {
    fn name(&self) -> &'static str {
        "LiveOrderBoard"
    }

    fn count(&self) -> usize {
        self.orders.try_read().map(|o| o.len()).unwrap_or(0)
    }
}
