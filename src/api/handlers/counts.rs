use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::middleware::json::ApiJson;
use crate::api::middleware::auth::AuthUser;
use crate::api::middleware::rbac::AdminUser;
use crate::api::AppState;
use crate::db;
use crate::error::{AppError, AppResult};

/// Epoch marker for sections an admin has never opened.
const NEVER_VIEWED: &str = "1970-01-01T00:00:00.000Z";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminSection {
    Jobs,
    Applications,
    Comments,
}

impl AdminSection {
    pub fn parse(s: &str) -> Option<AdminSection> {
        match s {
            "jobs" => Some(AdminSection::Jobs),
            "applications" => Some(AdminSection::Applications),
            "comments" => Some(AdminSection::Comments),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MarkViewedRequest {
    #[serde(rename = "type")]
    pub kind: String,
}

async fn count_since(state: &AppState, sql: &str, since: &str) -> AppResult<i64> {
    let (n,): (i64,) = sqlx::query_as(sql).bind(since).fetch_one(&state.db).await?;
    Ok(n)
}

/// Site activity over the past week, for signed-in users.
pub async fn user_counts(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> AppResult<Json<Value>> {
    let since = db::timestamp(Utc::now() - Duration::days(7));

    let jobs = count_since(
        &state,
        "SELECT COUNT(*) FROM job_posts WHERE status = 'APPROVED' AND created_at >= ?",
        &since,
    )
    .await?;
    let applications = count_since(
        &state,
        "SELECT COUNT(*) FROM applications WHERE created_at >= ?",
        &since,
    )
    .await?;
    let comments = count_since(
        &state,
        "SELECT COUNT(*) FROM comments WHERE status = 'APPROVED' AND created_at >= ?",
        &since,
    )
    .await?;

    Ok(Json(json!({
        "jobs": jobs,
        "applications": applications,
        "comments": comments,
    })))
}

/// New items per admin section since this admin last opened it.
pub async fn admin_counts(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
) -> AppResult<Json<Value>> {
    let marker = |section: AdminSection| -> String {
        state
            .admin_views
            .get(&(claims.sub.clone(), section))
            .map(|v| v.value().clone())
            .unwrap_or_else(|| NEVER_VIEWED.to_string())
    };

    let jobs = count_since(
        &state,
        "SELECT COUNT(*) FROM job_posts WHERE status = 'PENDING' AND created_at > ?",
        &marker(AdminSection::Jobs),
    )
    .await?;
    let applications = count_since(
        &state,
        "SELECT COUNT(*) FROM applications WHERE is_reviewed = 0 AND created_at > ?",
        &marker(AdminSection::Applications),
    )
    .await?;
    let comments = count_since(
        &state,
        "SELECT COUNT(*) FROM comments WHERE status = 'PENDING' AND created_at > ?",
        &marker(AdminSection::Comments),
    )
    .await?;

    Ok(Json(json!({
        "jobs": jobs,
        "applications": applications,
        "comments": comments,
    })))
}

pub async fn mark_viewed(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    ApiJson(body): ApiJson<MarkViewedRequest>,
) -> AppResult<Json<Value>> {
    let section = AdminSection::parse(body.kind.trim()).ok_or_else(|| {
        AppError::Validation(format!(
            "Invalid type: {}. Must be one of: jobs, applications, comments",
            body.kind
        ))
    })?;

    state.admin_views.insert((claims.sub, section), db::now_ts());
    Ok(Json(json!({ "success": true })))
}
