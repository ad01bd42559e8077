use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::middleware::json::ApiJson;
use crate::api::middleware::auth::AuthUser;
use crate::api::validators::{non_blank, Validate};
use crate::api::AppState;
use crate::auth::jwt::Claims;
use crate::db::models::user::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, Role, User,
};
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::services::email;

pub const MAX_LOGIN_FAILURES: u32 = 5;
pub const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);

const RESET_SENT_NEUTRAL: &str = "If an account exists with this email, a reset link has been sent.";

pub(crate) async fn find_user_by_email(pool: &DbPool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, name, password, role, created_at, updated_at FROM users WHERE email = ?"
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub(crate) async fn find_user(pool: &DbPool, id: &str) -> AppResult<User> {
    sqlx::query_as::<_, User>(
        "SELECT id, email, name, password, role, created_at, updated_at FROM users WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// The account a session token was issued for. Tokens outlive deleted
/// accounts, so a missing row is an authentication failure.
pub(crate) async fn session_user(pool: &DbPool, claims: &Claims) -> AppResult<User> {
    find_user(pool, &claims.sub).await.map_err(|e| match e {
        AppError::NotFound(_) => AppError::AuthFailed,
        other => other,
    })
}

pub(crate) async fn set_password(pool: &DbPool, user_id: &str, password: &str) -> AppResult<()> {
    let hash = crate::auth::password::hash(password)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    let result = sqlx::query("UPDATE users SET password = ?, updated_at = ? WHERE id = ?")
        .bind(&hash)
        .bind(db::now_ts())
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn public_user(user: &User) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "name": user.name,
        "role": user.role,
    })
}

/// True while `ip` has used up its failures for the current window.
fn is_rate_limited(state: &AppState, ip: &str) -> bool {
    match state.login_attempts.get(ip) {
        Some(entry) => {
            let (failures, window_start) = *entry;
            failures >= MAX_LOGIN_FAILURES && window_start.elapsed() < LOGIN_WINDOW
        }
        None => false,
    }
}

fn record_failure(state: &AppState, ip: &str) {
    let mut entry = state
        .login_attempts
        .entry(ip.to_string())
        .or_insert((0, Instant::now()));
    if entry.1.elapsed() >= LOGIN_WINDOW {
        *entry = (0, Instant::now());
    }
    entry.0 += 1;
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    body.validate()?;
    let email = normalize_email(&body.email);

    if find_user_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Validation("User with this email already exists".to_string()));
    }

    let id = Uuid::new_v4().to_string();
    let hash = crate::auth::password::hash(&body.password)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
    let now = db::now_ts();

    sqlx::query(
        "INSERT INTO users (id, email, name, password, role, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&id)
    .bind(&email)
    .bind(non_blank(body.name.as_deref()))
    .bind(&hash)
    .bind(Role::User.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let user = find_user(&state.db, &id).await?;
    info!("Registered user {}", email);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": public_user(&user),
        })),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Json<Value>> {
    let ip = peer.ip().to_string();
    if is_rate_limited(&state, &ip) {
        warn!("Login rate limit hit for {}", ip);
        return Err(AppError::TooManyRequests);
    }

    req.validate()?;
    let email = normalize_email(&req.email);

    let user = match find_user_by_email(&state.db, &email).await? {
        Some(user) if crate::auth::password::verify(&req.password, &user.password) => user,
        _ => {
            record_failure(&state, &ip);
            warn!("Failed login for {} from {}", email, ip);
            return Err(AppError::AuthFailed);
        }
    };
    state.login_attempts.remove(&ip);

    let token = crate::auth::jwt::generate(
        &user.id,
        &user.email,
        &user.role,
        &state.jwt_secret,
        state.jwt_expiry_hours,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "token": token,
        "expiresIn": state.jwt_expiry_hours * 3600,
        "role": user.role,
        "user": public_user(&user),
    })))
}

pub async fn logout() -> AppResult<Json<Value>> {
    // JWT is stateless; client just discards the token.
    Ok(Json(json!({"success": true})))
}

pub async fn session(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<Value>> {
    let user = session_user(&state.db, &claims).await?;

    Ok(Json(json!({ "user": user })))
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ForgotPasswordRequest>,
) -> AppResult<Json<Value>> {
    let email = non_blank(body.email.as_deref())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;

    let Some(user) = find_user_by_email(&state.db, &email).await? else {
        info!("Password reset requested for unknown email");
        return Ok(Json(json!({ "message": RESET_SENT_NEUTRAL })));
    };

    let expiry_minutes = state.cfg.auth.reset_token_expiry_minutes;
    let token = crate::auth::jwt::generate_reset(&user.email, &state.jwt_secret, expiry_minutes)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let reset_url = format!(
        "{}/reset-password?token={}",
        state.cfg.server.public_url.trim_end_matches('/'),
        token
    );

    state
        .mailer
        .send(email::password_reset(&user.email, &reset_url, expiry_minutes))
        .await
        .map_err(|e| AppError::Email(format!("{:#}", e)))?;

    info!("Password reset link issued for {}", user.email);
    Ok(Json(json!({ "message": "Password reset email sent successfully" })))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> AppResult<Json<Value>> {
    let (Some(token), Some(password)) = (
        non_blank(body.token.as_deref()),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::Validation("Token and password are required".to_string()));
    };
    if password.chars().count() < 6 {
        return Err(AppError::Validation("Password must be at least 6 characters".to_string()));
    }

    let email = crate::auth::jwt::verify_reset(&token, &state.jwt_secret).map_err(|e| {
        info!("Invalid or expired reset token: {}", e);
        AppError::Validation("Invalid or expired reset token".to_string())
    })?;

    let user = find_user_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    set_password(&state.db, &user.id, &password).await?;
    info!("Password reset for {}", email);

    Ok(Json(json!({ "message": "Password reset successfully" })))
}
