use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use crate::api::AppState;
use crate::api::middleware::rbac::AdminUser;
use crate::db;
use crate::error::AppResult;

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> AppResult<Json<Value>> {
    let (pending_jobs,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM job_posts WHERE status = 'PENDING'"
    )
    .fetch_one(&state.db)
    .await?;

    // Approved and not yet expired
    let (active_jobs,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM job_posts WHERE status = 'APPROVED' AND expires_at >= ?"
    )
    .bind(db::now_ts())
    .fetch_one(&state.db)
    .await?;

    let (total_applications,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM applications")
        .fetch_one(&state.db)
        .await?;

    let (unreviewed_applications,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM applications WHERE is_reviewed = 0"
    )
    .fetch_one(&state.db)
    .await?;

    let (pending_comments,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM comments WHERE status = 'PENDING'"
    )
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({
        "pendingJobs": pending_jobs,
        "activeJobs": active_jobs,
        "totalApplications": total_applications,
        "unreviewedApplications": unreviewed_applications,
        "pendingComments": pending_comments,
        "totalNotifications": pending_jobs + pending_comments + unreviewed_applications,
    })))
}
