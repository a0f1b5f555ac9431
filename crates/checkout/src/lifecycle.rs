//! Order status lifecycle for administrators.

use std::sync::Arc;

use domain::{Order, OrderId, OrderStatus};
use store::{DocumentStore, DocumentStoreExt, WriteBatch};

use crate::error::StatusError;
use crate::policy::{RestockPolicy, TransitionPolicy};

/// Moves orders through fulfilment statuses.
#[derive(Clone)]
pub struct OrderStatusService {
    store: Arc<dyn DocumentStore>,
    transitions: TransitionPolicy,
    restock: RestockPolicy,
}

impl OrderStatusService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            transitions: TransitionPolicy::default(),
            restock: RestockPolicy::default(),
        }
    }

    pub fn with_transition_policy(mut self, policy: TransitionPolicy) -> Self {
        self.transitions = policy;
        self
    }

    pub fn with_restock_policy(mut self, policy: RestockPolicy) -> Self {
        self.restock = policy;
        self
    }

    /// Sets the status of an order and returns the updated order.
    ///
    /// Setting the current status again succeeds without writing. With
    /// [`RestockPolicy::OnCancel`], cancelling returns every line's units
    /// to stock in the same batch as the status change.
    #[tracing::instrument(skip(self), fields(order_id = %order_id, to = %target))]
    pub async fn set_status(
        &self,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Result<Order, StatusError> {
        let order = self
            .store
            .get_order(&order_id)
            .await
            .map_err(|e| StatusError::from_store(order_id, e))?
            .ok_or(StatusError::OrderNotFound(order_id))?;

        let from = order.status;
        if from == target {
            return Ok(order);
        }
        if !self.transitions.allows(from, target) {
            return Err(StatusError::InvalidTransition { from, to: target });
        }

        let mut batch = WriteBatch::new();
        batch.set_order_status(order_id, target, Some(from));

        let restocking = self.restock == RestockPolicy::OnCancel && target == OrderStatus::Cancelled;
        if restocking {
            for line in &order.items {
                batch.adjust_stock(
                    line.product_id.clone(),
                    i64::from(line.quantity),
                    store::StockGuard::None,
                );
            }
        }

        self.store
            .commit(batch)
            .await
            .map_err(|e| StatusError::from_store(order_id, e))?;

        tracing::info!(from = %from, restocked = restocking, "Order status updated");
        metrics::counter!("order_status_updates_total", "status" => target.as_str()).increment(1);

        self.store
            .require_order(&order_id)
            .await
            .map_err(|e| StatusError::from_store(order_id, e))
    }

    /// Records the courier tracking number for an order.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn set_tracking_number(
        &self,
        order_id: OrderId,
        tracking_number: &str,
    ) -> Result<Order, StatusError> {
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(StatusError::EmptyTrackingNumber);
        }

        self.store
            .set_tracking_number(&order_id, tracking_number.to_string())
            .await
            .map_err(|e| StatusError::from_store(order_id, e))?;

        self.store
            .require_order(&order_id)
            .await
            .map_err(|e| StatusError::from_store(order_id, e))
    }
}
