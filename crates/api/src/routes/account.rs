//! Signed-in customer endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use checkout::AddressForm;
use domain::{Order, ProductId, ProfileUpdate, UserProfile};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct WishlistResponse {
    pub product_id: String,
    pub in_wishlist: bool,
}

/// GET /account/orders: the caller's orders, newest first.
pub async fn orders(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.accounts.orders(&user.profile.uid).await?))
}

/// GET /account/profile
pub async fn profile(user: CurrentUser) -> Json<UserProfile> {
    Json(user.profile)
}

/// PUT /account/profile: update display name and phone.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(
        state
            .accounts
            .update_profile(&user.profile.uid, update)
            .await?,
    ))
}

/// POST /account/addresses
pub async fn add_address(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(form): Json<AddressForm>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(
        state.accounts.add_address(&user.profile.uid, form).await?,
    ))
}

/// DELETE /account/addresses/{id}
pub async fn remove_address(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(address_id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(
        state
            .accounts
            .remove_address(&user.profile.uid, &address_id)
            .await?,
    ))
}

/// POST /account/wishlist/{product_id}: add or remove a wishlist entry.
pub async fn toggle_wishlist(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(product_id): Path<String>,
) -> Result<Json<WishlistResponse>, ApiError> {
    let product_id = ProductId::new(product_id);
    let in_wishlist = state
        .accounts
        .toggle_wishlist(&user.profile.uid, &product_id)
        .await?;

    Ok(Json(WishlistResponse {
        product_id: product_id.to_string(),
        in_wishlist,
    }))
}
