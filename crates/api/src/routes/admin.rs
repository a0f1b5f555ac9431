//! Administrator endpoints.
//!
//! The order and customer listings read from the live projections, so
//! they reflect every writer once the change feed has delivered.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{Order, OrderStatus, Product, ProductId, UserId, UserProfile, UserStatus};
use projections::DashboardStats;
use serde::Deserialize;

use super::parse_order_id;
use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

#[derive(Deserialize)]
pub struct TrackingRequest {
    pub tracking_number: String,
}

#[derive(Deserialize)]
pub struct CustomerStatusRequest {
    pub status: UserStatus,
}

/// GET /admin/orders: the live order board, newest first.
pub async fn orders(State(state): State<Arc<AppState>>, _admin: AdminUser) -> Json<Vec<Order>> {
    Json(state.order_board.orders().await)
}

/// GET /admin/dashboard: headline revenue and order figures.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Json<DashboardStats> {
    let orders = state.order_board.orders().await;
    let customers = state.directory.len().await;
    Json(DashboardStats::compute(&orders, customers))
}

/// PUT /admin/orders/{id}/status
#[tracing::instrument(skip(state, admin, req), fields(admin = %admin.0.profile.uid))]
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.statuses.set_status(order_id, req.status).await?))
}

/// PUT /admin/orders/{id}/tracking
pub async fn set_tracking(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<TrackingRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(
        state
            .statuses
            .set_tracking_number(order_id, &req.tracking_number)
            .await?,
    ))
}

/// PUT /admin/products/{id}: create or replace a product.
pub async fn save_product(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(mut product): Json<Product>,
) -> Result<Json<Product>, ApiError> {
    product.id = ProductId::new(id);
    Ok(Json(state.catalogue.save_product(product).await?))
}

/// DELETE /admin/products/{id}
pub async fn remove_product(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.catalogue.remove_product(&ProductId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/customers: the live customer directory, newest first.
pub async fn customers(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Json<Vec<UserProfile>> {
    Json(state.directory.customers().await)
}

/// PUT /admin/customers/{uid}/status: ban or reinstate a customer.
#[tracing::instrument(skip(state, admin, req), fields(admin = %admin.0.profile.uid))]
pub async fn set_customer_status(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(uid): Path<String>,
    Json(req): Json<CustomerStatusRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(
        state
            .customers
            .set_status(&UserId::new(uid), req.status)
            .await?,
    ))
}
