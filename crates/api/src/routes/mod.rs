//! HTTP route handlers.

pub mod account;
pub mod admin;
pub mod catalogue;
pub mod checkout;
pub mod health;
pub mod metrics;

use domain::OrderId;

use crate::error::ApiError;

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;
    Ok(OrderId::from(uuid))
}
