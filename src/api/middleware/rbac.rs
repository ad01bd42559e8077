use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::Arc;
use crate::auth::jwt::Claims;
use crate::auth::rbac::{has_permission, Permission};
use crate::error::AppError;
use crate::api::AppState;
use super::auth::AuthUser;

/// Axum extractor that requires the caller to have the `ADMIN` role.
/// Returns 403 Forbidden for authenticated non-admins.
pub struct AdminUser(pub Claims);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        match claims.role.as_str() {
            "ADMIN" => Ok(AdminUser(claims)),
            _ => Err(AppError::Unauthorized("Admin role required".to_string())),
        }
    }
}

/// 403 unless `claims` grant `perm`.
pub fn require(claims: &Claims, perm: Permission) -> Result<(), AppError> {
    if has_permission(&claims.role, &perm) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!("Permission denied: {:?}", perm)))
    }
}
