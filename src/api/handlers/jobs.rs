use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::handlers::auth::session_user;
use crate::api::middleware::json::ApiJson;
use crate::api::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::api::middleware::rbac::{require, AdminUser};
use crate::api::validators::{non_blank, Validate};
use crate::api::AppState;
use crate::auth::rbac::{has_permission, Permission};
use crate::db::audit::log_action;
use crate::db::models::job_post::{
    days_until_expiry, expiry_from, CreateJobRequest, JobPost, JobPostListing, JobStatus,
    JobType, UpdateContactEmailRequest, JOB_COLUMNS,
};
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::metrics::AppMetrics;
use crate::services::email;

const LIST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListParams {
    pub category: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub status: Option<String>,
}

/// Public job page payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    #[serde(flatten)]
    pub listing: JobPostListing,
    pub days_left: i64,
    pub is_expired: bool,
}

/// Sponsor page payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupporterDetail {
    #[serde(flatten)]
    pub listing: JobPostListing,
    pub can_edit_contact_email: bool,
}

fn listing_sql(where_clause: &str) -> String {
    format!(
        "SELECT {}, u.name AS author_name, u.email AS author_email, \
         (SELECT COUNT(*) FROM applications a WHERE a.job_post_id = j.id) AS application_count \
         FROM job_posts j LEFT JOIN users u ON u.id = j.user_id \
         {} ORDER BY j.created_at DESC",
        JOB_COLUMNS, where_clause
    )
}

pub(crate) async fn fetch_job(pool: &DbPool, id: &str) -> AppResult<JobPost> {
    sqlx::query_as::<_, JobPost>(&format!("SELECT {} FROM job_posts j WHERE j.id = ?", JOB_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}

async fn fetch_listing(pool: &DbPool, id: &str) -> AppResult<Option<JobPostListing>> {
    let listing = sqlx::query_as::<_, JobPostListing>(&listing_sql("WHERE j.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(listing)
}

async fn set_status(pool: &DbPool, id: &str, status: JobStatus) -> AppResult<JobPost> {
    let result = sqlx::query("UPDATE job_posts SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(db::now_ts())
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Job not found".to_string()));
    }
    fetch_job(pool, id).await
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    viewer: MaybeAuthUser,
    Query(params): Query<JobListParams>,
) -> AppResult<Json<Value>> {
    let status = match params.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => JobStatus::Approved,
        Some(s) => JobStatus::parse(s)
            .ok_or_else(|| AppError::Validation(format!("Invalid status: {}", s)))?,
    };
    if status != JobStatus::Approved {
        match &viewer.0 {
            Some(claims) => require(claims, Permission::ViewUnpublishedJobs)?,
            None => {
                return Err(AppError::Unauthorized(
                    "Only admins can list unpublished jobs".to_string(),
                ))
            }
        }
    }

    let category = non_blank(params.category.as_deref());
    let location = non_blank(params.location.as_deref());
    let job_type = non_blank(params.job_type.as_deref());

    let mut conditions = vec!["j.status = ?", "j.expires_at >= ?"];
    if category.is_some() {
        conditions.push("j.category = ?");
    }
    if job_type.is_some() {
        conditions.push("j.job_type = ?");
    }
    if location.is_some() {
        conditions.push("instr(LOWER(j.location), LOWER(?)) > 0");
    }
    let sql = format!(
        "{} LIMIT ?",
        listing_sql(&format!("WHERE {}", conditions.join(" AND ")))
    );

    let mut query = sqlx::query_as::<_, JobPostListing>(&sql)
        .bind(status.as_str())
        .bind(db::now_ts());
    if let Some(ref v) = category { query = query.bind(v); }
    if let Some(ref v) = job_type { query = query.bind(v); }
    if let Some(ref v) = location { query = query.bind(v); }
    let jobs = query.bind(LIST_LIMIT).fetch_all(&state.db).await?;

    let total = jobs.len();
    Ok(Json(json!({ "jobs": jobs, "total": total })))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ApiJson(body): ApiJson<CreateJobRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    require(&claims, Permission::PostJobs)?;
    body.validate()?;
    let owner = session_user(&state.db, &claims).await?;

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let created_at = db::timestamp(now);
    let expires_at = db::timestamp(expiry_from(now, state.cfg.jobs.expiry_days));

    sqlx::query(
        "INSERT INTO job_posts (id, title, description, location, category, job_type, contact_email,
                                company_name, salary, requirements, image_url, status, user_id,
                                expires_at, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'PENDING', ?, ?, ?, ?)"
    )
    .bind(&id)
    .bind(body.title.trim())
    .bind(body.description.trim())
    .bind(body.location.trim())
    .bind(body.category.trim())
    .bind(body.job_type.trim())
    .bind(body.contact_email.trim())
    .bind(non_blank(body.company_name.as_deref()))
    .bind(non_blank(body.salary.as_deref()))
    .bind(non_blank(body.requirements.as_deref()))
    .bind(non_blank(body.image_url.as_deref()))
    .bind(&owner.id)
    .bind(&expires_at)
    .bind(&created_at)
    .bind(&created_at)
    .execute(&state.db)
    .await?;

    let job = fetch_job(&state.db, &id).await?;
    AppMetrics::inc(&state.metrics.jobs_posted);
    info!("Job '{}' ({}) posted by {}, pending approval", job.title, id, claims.email);

    let job_type = JobType::parse(&job.job_type)
        .map(|t| t.label())
        .unwrap_or_else(|| job.job_type.clone());
    state
        .mailer
        .notify(email::job_posted(
            state.mailer.admin_email(),
            &email::JobPostedEmail {
                title: &job.title,
                company_name: job.company_name.as_deref(),
                job_type: &job_type,
                location: &job.location,
                contact_email: &job.contact_email,
            },
        ))
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Job posted successfully and is pending approval",
            "job": job,
        })),
    ))
}

pub async fn get_public(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let listing = fetch_listing(&state.db, &id)
        .await?
        .filter(|l| l.job.status == JobStatus::Approved.as_str())
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let expires_at = db::parse_timestamp(&listing.job.expires_at)
        .ok_or_else(|| AppError::Internal(format!("Bad expires_at on job {}", id)))?;
    let days_left = days_until_expiry(expires_at, Utc::now());

    Ok(Json(json!({
        "job": JobDetail {
            listing,
            days_left,
            is_expired: days_left <= 0,
        }
    })))
}

pub async fn get_supporter(
    State(state): State<Arc<AppState>>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let is_admin = viewer.is_admin();
    let listing = fetch_listing(&state.db, &id)
        .await?
        .filter(|l| is_admin || l.job.status == JobStatus::Approved.as_str())
        .ok_or_else(|| AppError::NotFound("Sponsor not found".to_string()))?;

    let is_owner = match (&viewer.0, &listing.job.user_id) {
        (Some(claims), Some(owner)) => &claims.sub == owner,
        _ => false,
    };

    Ok(Json(json!({
        "job": SupporterDetail {
            listing,
            can_edit_contact_email: is_admin || is_owner,
        }
    })))
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ModerateJobs)?;
    let job = set_status(&state.db, &id, JobStatus::Approved).await?;
    info!("Job {} approved by {}", id, claims.email);
    log_action(state.db.clone(), claims.sub, claims.email, "approve", "job_post", Some(id.clone()), None);

    let job_url = format!("{}/jobs/{}", state.cfg.server.public_url.trim_end_matches('/'), id);
    state
        .mailer
        .notify(email::job_approved(&job.contact_email, &job.title, &job_url))
        .await;

    Ok(Json(json!({
        "success": true,
        "message": "Job approved successfully",
        "job": job,
    })))
}

pub async fn reject(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ModerateJobs)?;
    let job = set_status(&state.db, &id, JobStatus::Rejected).await?;
    info!("Job {} rejected by {}", id, claims.email);
    log_action(state.db.clone(), claims.sub, claims.email, "reject", "job_post", Some(id), None);

    Ok(Json(json!({
        "success": true,
        "message": "Job rejected successfully",
        "job": job,
    })))
}

pub async fn renew(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ModerateJobs)?;
    let days = state.cfg.jobs.expiry_days;
    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE job_posts SET expires_at = ?, status = 'APPROVED', updated_at = ? WHERE id = ?"
    )
    .bind(db::timestamp(expiry_from(now, days)))
    .bind(db::timestamp(now))
    .bind(&id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Job not found".to_string()));
    }

    let job = fetch_job(&state.db, &id).await?;
    info!("Job {} renewed for {} days by {}", id, days, claims.email);
    log_action(
        state.db.clone(),
        claims.sub,
        claims.email,
        "renew",
        "job_post",
        Some(id),
        Some(format!("expires_at={}", job.expires_at)),
    );

    Ok(Json(json!({
        "success": true,
        "message": format!("Job renewed successfully for {} more days", days),
        "job": job,
    })))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ModerateJobs)?;
    let result = sqlx::query("DELETE FROM job_posts WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Job not found".to_string()));
    }

    info!("Job {} deleted by {}", id, claims.email);
    log_action(state.db.clone(), claims.sub, claims.email, "delete", "job_post", Some(id), None);

    Ok(Json(json!({
        "success": true,
        "message": "Job deleted successfully",
    })))
}

pub async fn update_contact_email(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateContactEmailRequest>,
) -> AppResult<Json<Value>> {
    body.validate()?;

    let job = fetch_job(&state.db, &id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound("Sponsor not found".to_string()),
            other => other,
        })?;

    let is_owner = job.user_id.as_deref() == Some(claims.sub.as_str());
    let allowed = has_permission(&claims.role, &Permission::EditAnyContactEmail)
        || (is_owner && has_permission(&claims.role, &Permission::EditOwnContactEmail));
    if !allowed {
        return Err(AppError::Unauthorized("Forbidden".to_string()));
    }

    let contact_email = body.contact_email.trim().to_string();
    sqlx::query("UPDATE job_posts SET contact_email = ?, updated_at = ? WHERE id = ?")
        .bind(&contact_email)
        .bind(db::now_ts())
        .bind(&id)
        .execute(&state.db)
        .await?;

    log_action(
        state.db.clone(),
        claims.sub,
        claims.email,
        "update_contact_email",
        "job_post",
        Some(id),
        Some(contact_email.clone()),
    );

    Ok(Json(json!({ "success": true, "contactEmail": contact_email })))
}

/// Admin dashboard: every post regardless of status or expiry.
pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> AppResult<Json<Value>> {
    let jobs = sqlx::query_as::<_, JobPostListing>(&listing_sql(""))
        .fetch_all(&state.db)
        .await?;

    let total = jobs.len();
    Ok(Json(json!({ "data": jobs, "total": total })))
}
