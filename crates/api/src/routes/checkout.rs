//! Order placement endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use checkout::CheckoutRequest;
use serde::Serialize;

use crate::auth::MaybeUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct OrderPlacedResponse {
    pub order_id: String,
}

/// POST /checkout: place an order from the submitted cart snapshot.
///
/// Guests reach the checkout service and are refused there, so the
/// refusal is counted like any other failed attempt.
#[tracing::instrument(skip(state, user, req))]
pub async fn place(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderPlacedResponse>), ApiError> {
    if user.0.as_ref().is_some_and(|u| u.profile.is_admin()) {
        return Err(ApiError::Forbidden(
            "Administrator accounts cannot place orders".to_string(),
        ));
    }

    let order_id = state.checkout.place_order(&user.session(), req).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderPlacedResponse {
            order_id: order_id.to_string(),
        }),
    ))
}
