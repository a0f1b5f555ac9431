//! Atomic multi-document write batches.

use domain::{NewOrder, OrderId, OrderStatus, ProductId};

use crate::{Result, StoreError};

/// Precondition attached to a stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockGuard {
    /// Apply the delta unconditionally. Stock may go negative.
    #[default]
    None,
    /// Reject the whole batch if the resulting stock would be below zero.
    NonNegative,
}

/// A single staged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Create an order document under its id.
    CreateOrder(NewOrder),

    /// Add `delta` to a product's stock counter.
    AdjustStock {
        product_id: ProductId,
        delta: i64,
        guard: StockGuard,
    },

    /// Overwrite an order's status, optionally only if it currently
    /// holds `expected`.
    SetOrderStatus {
        order_id: OrderId,
        status: OrderStatus,
        expected: Option<OrderStatus>,
    },
}

/// Writes that commit together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages creation of `order`.
    pub fn create_order(&mut self, order: NewOrder) -> &mut Self {
        self.ops.push(WriteOp::CreateOrder(order));
        self
    }

    /// Stages a stock adjustment.
    pub fn adjust_stock(
        &mut self,
        product_id: ProductId,
        delta: i64,
        guard: StockGuard,
    ) -> &mut Self {
        self.ops.push(WriteOp::AdjustStock {
            product_id,
            delta,
            guard,
        });
        self
    }

    /// Stages a status overwrite.
    pub fn set_order_status(
        &mut self,
        order_id: OrderId,
        status: OrderStatus,
        expected: Option<OrderStatus>,
    ) -> &mut Self {
        self.ops.push(WriteOp::SetOrderStatus {
            order_id,
            status,
            expected,
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns the id of the order this batch creates, if any.
    pub fn created_order_id(&self) -> Option<OrderId> {
        self.ops.iter().find_map(|op| match op {
            WriteOp::CreateOrder(order) => Some(order.id),
            _ => None,
        })
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Validates a batch before committing.
pub fn validate_batch(batch: &WriteBatch) -> Result<()> {
    if batch.is_empty() {
        return Err(StoreError::InvalidBatch(
            "Cannot commit an empty batch".to_string(),
        ));
    }

    let creates = batch
        .ops()
        .iter()
        .filter(|op| matches!(op, WriteOp::CreateOrder(_)))
        .count();
    if creates > 1 {
        return Err(StoreError::InvalidBatch(
            "A batch may create at most one order".to_string(),
        ));
    }

    Ok(())
}
