use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::api::handlers::auth::{session_user, set_password};
use crate::api::middleware::json::ApiJson;
use crate::api::middleware::auth::AuthUser;
use crate::api::middleware::rbac::{require, AdminUser};
use crate::api::validators::Validate;
use crate::api::AppState;
use crate::auth::rbac::Permission;
use crate::db::audit::log_action;
use crate::db::models::user::{AdminSetPasswordRequest, ChangePasswordRequest};
use crate::error::{AppError, AppResult};

/// Change the caller's own password.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ChangeOwnPassword)?;
    body.validate()?;

    let user = session_user(&state.db, &claims).await?;
    if !crate::auth::password::verify(&body.current_password, &user.password) {
        return Err(AppError::Validation("Current password is incorrect".to_string()));
    }

    set_password(&state.db, &user.id, &body.new_password).await?;
    info!("User {} changed their password", user.email);

    Ok(Json(json!({ "message": "Password updated successfully" })))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ManageUsers)?;
    let rows: Vec<(String, String, Option<String>, String, String)> = sqlx::query_as(
        "SELECT id, email, name, role, created_at FROM users ORDER BY created_at DESC"
    )
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Value> = rows
        .into_iter()
        .map(|(id, email, name, role, created_at)| {
            json!({
                "id": id,
                "email": email,
                "name": name,
                "role": role,
                "createdAt": created_at,
            })
        })
        .collect();
    let count = data.len();
    Ok(Json(json!({ "data": data, "total": count })))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ManageUsers)?;
    if id == claims.sub {
        return Err(AppError::Validation("Cannot delete your own account".to_string()));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    info!("User {} deleted by {}", id, claims.email);
    log_action(state.db.clone(), claims.sub, claims.email, "delete", "user", Some(id), None);

    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
    })))
}

/// Admin reset of another account's password.
pub async fn set_user_password(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<AdminSetPasswordRequest>,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ManageUsers)?;
    body.validate()?;

    set_password(&state.db, &id, &body.new_password).await?;
    log_action(state.db.clone(), claims.sub, claims.email, "set_password", "user", Some(id), None);

    Ok(Json(json!({ "message": "Password updated successfully" })))
}
