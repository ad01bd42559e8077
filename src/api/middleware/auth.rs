use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use std::sync::Arc;
use crate::auth::jwt::Claims;
use crate::error::AppError;
use crate::api::AppState;

fn bearer_claims(parts: &Parts, state: &AppState) -> Option<Claims> {
    let token = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Bearer ")?;

    crate::auth::jwt::verify(token, &state.jwt_secret).ok()
}

/// Axum extractor that validates a Bearer JWT token.
/// Add this as a handler parameter to require authentication.
pub struct AuthUser(pub Claims);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        bearer_claims(parts, state)
            .map(AuthUser)
            .ok_or(AppError::AuthFailed)
    }
}

/// Session if one is presented and valid; anonymous otherwise.
pub struct MaybeAuthUser(pub Option<Claims>);

impl MaybeAuthUser {
    pub fn is_admin(&self) -> bool {
        self.0
            .as_ref()
            .is_some_and(|c| crate::db::models::user::Role::is_admin(&c.role))
    }
}

impl FromRequestParts<Arc<AppState>> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(bearer_claims(parts, state)))
    }
}
