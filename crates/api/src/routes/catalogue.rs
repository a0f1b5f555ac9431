//! Public catalogue endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::{Product, ProductId};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /products: the full catalogue.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalogue.products().await?))
}

/// GET /products/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.catalogue.product(&ProductId::new(id)).await?))
}
