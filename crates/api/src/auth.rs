//! Bearer-token extractors and route gates.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use checkout::{Identity, Session};
use domain::UserProfile;

use crate::error::ApiError;
use crate::state::AppState;

/// A signed-in, non-banned user with a provisioned profile.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub identity: Identity,
    pub profile: UserProfile,
}

impl CurrentUser {
    pub fn session(&self) -> Session {
        Session::Authenticated(self.identity.clone())
    }
}

/// The caller, if a bearer token was sent.
///
/// A missing header yields `None`. A token that fails verification is
/// still rejected with 401.
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn session(&self) -> Session {
        self.0
            .as_ref()
            .map(CurrentUser::session)
            .unwrap_or_default()
    }
}

/// A signed-in administrator.
pub struct AdminUser(pub CurrentUser);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, ApiError> {
    let Some(token) = bearer_token(parts) else {
        return Ok(None);
    };

    let identity = state.identity.authenticate(token).await.map_err(|e| {
        tracing::debug!(error = %e, "Bearer token rejected");
        ApiError::AuthRequired
    })?;
    let profile = state.accounts.ensure_profile(&identity).await?;

    if profile.is_banned() {
        tracing::info!(user_id = %profile.uid, "Banned user rejected");
        return Err(ApiError::Forbidden(
            "This account has been suspended".to_string(),
        ));
    }

    Ok(Some(CurrentUser { identity, profile }))
}

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve(parts, state).await?))
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await?.ok_or(ApiError::AuthRequired)
    }
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.profile.is_admin() {
            return Err(ApiError::Forbidden(
                "Administrator access required".to_string(),
            ));
        }
        Ok(AdminUser(user))
    }
}
