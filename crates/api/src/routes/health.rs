//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;
use store::DocumentStoreExt;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health: `ok` while the store answers reads.
pub async fn check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    match state.store.is_catalogue_empty().await {
        Ok(_) => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse { status: "unavailable" }),
            )
        }
    }
}
