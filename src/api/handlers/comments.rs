use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::handlers::jobs::fetch_job;
use crate::api::middleware::json::ApiJson;
use crate::api::middleware::rbac::{require, AdminUser};
use crate::api::validators::{non_blank, Validate};
use crate::api::AppState;
use crate::auth::rbac::Permission;
use crate::db::audit::log_action;
use crate::db::models::comment::{Comment, CommentStatus, CommentWithJob, CreateCommentRequest};
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::metrics::AppMetrics;

const COMMENT_COLUMNS: &str =
    "c.id, c.content, c.author_name, c.author_email, c.page_url, c.job_post_id, c.status, c.created_at";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListParams {
    pub job_post_id: Option<String>,
    pub page_url: Option<String>,
}

async fn fetch_comment(pool: &DbPool, id: &str) -> AppResult<Comment> {
    sqlx::query_as::<_, Comment>(&format!("SELECT {} FROM comments c WHERE c.id = ?", COMMENT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}

async fn set_status(pool: &DbPool, id: &str, status: CommentStatus) -> AppResult<Comment> {
    let result = sqlx::query("UPDATE comments SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }
    fetch_comment(pool, id).await
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    body.validate()?;

    let job_post_id = non_blank(body.job_post_id.as_deref());
    if let Some(ref job_id) = job_post_id {
        fetch_job(&state.db, job_id).await?;
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO comments (id, content, author_name, author_email, page_url, job_post_id, status, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&id)
    .bind(body.content.trim())
    .bind(body.author_name.trim())
    .bind(body.author_email.trim())
    .bind(non_blank(body.page_url.as_deref()))
    .bind(&job_post_id)
    .bind(CommentStatus::Pending.as_str())
    .bind(db::now_ts())
    .execute(&state.db)
    .await?;

    let comment = fetch_comment(&state.db, &id).await?;
    AppMetrics::inc(&state.metrics.comments_submitted);
    info!("Comment {} submitted, pending moderation", id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Comment submitted and is pending approval",
            "comment": comment,
        })),
    ))
}

/// Approved comments for a page or a job post.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CommentListParams>,
) -> AppResult<Json<Value>> {
    let job_post_id = non_blank(params.job_post_id.as_deref());
    let page_url = non_blank(params.page_url.as_deref());

    let mut conditions = vec!["c.status = 'APPROVED'"];
    if job_post_id.is_some() {
        conditions.push("c.job_post_id = ?");
    }
    if page_url.is_some() {
        conditions.push("c.page_url = ?");
    }
    let sql = format!(
        "SELECT {} FROM comments c WHERE {} ORDER BY c.created_at DESC",
        COMMENT_COLUMNS,
        conditions.join(" AND ")
    );

    let mut query = sqlx::query_as::<_, Comment>(&sql);
    if let Some(ref v) = job_post_id { query = query.bind(v); }
    if let Some(ref v) = page_url { query = query.bind(v); }
    let comments = query.fetch_all(&state.db).await?;

    Ok(Json(json!({ "comments": comments })))
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ModerateComments)?;
    let comment = set_status(&state.db, &id, CommentStatus::Approved).await?;
    log_action(state.db.clone(), claims.sub, claims.email, "approve", "comment", Some(id), None);
    Ok(Json(json!({ "message": "Comment approved", "comment": comment })))
}

pub async fn reject(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ModerateComments)?;
    let comment = set_status(&state.db, &id, CommentStatus::Rejected).await?;
    log_action(state.db.clone(), claims.sub, claims.email, "reject", "comment", Some(id), None);
    Ok(Json(json!({ "message": "Comment rejected", "comment": comment })))
}

pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ModerateComments)?;
    let comments = sqlx::query_as::<_, CommentWithJob>(&format!(
        "SELECT {}, j.title AS job_title FROM comments c \
         LEFT JOIN job_posts j ON j.id = c.job_post_id \
         ORDER BY c.created_at DESC",
        COMMENT_COLUMNS
    ))
    .fetch_all(&state.db)
    .await?;

    let total = comments.len();
    Ok(Json(json!({ "data": comments, "total": total })))
}
