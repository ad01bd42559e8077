use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::handlers::jobs::fetch_job;
use crate::api::handlers::upload::{bad_multipart, read_file};
use crate::api::middleware::rbac::{require, AdminUser};
use crate::api::validators::Validate;
use crate::api::AppState;
use crate::auth::rbac::Permission;
use crate::db::audit::log_action;
use crate::db::models::application::{
    resume_object_path, Application, ApplicationForm, ApplicationWithJob, ALLOWED_RESUME_TYPES,
    MAX_UPLOAD_BYTES,
};
use crate::db::models::job_post::{is_expired, JobStatus};
use crate::db;
use crate::error::{AppError, AppResult};
use crate::metrics::AppMetrics;
use crate::services::email;

const ADMIN_LIST_LIMIT: i64 = 200;

const APPLICATION_COLUMNS: &str = "a.id, a.job_post_id, a.applicant_name, a.applicant_email, \
     a.message, a.resume_url, a.is_reviewed, a.created_at";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListParams {
    pub job_post_id: Option<String>,
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Value>)> {
    let mut form = ApplicationForm::default();
    let mut resume = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => resume = read_file(field).await?,
            "applicantName" => form.applicant_name = field.text().await.map_err(bad_multipart)?,
            "applicantEmail" => form.applicant_email = field.text().await.map_err(bad_multipart)?,
            "message" => form.message = field.text().await.map_err(bad_multipart)?,
            "jobPostId" => form.job_post_id = field.text().await.map_err(bad_multipart)?,
            _ => {}
        }
    }

    form.validate()?;
    let applicant_name = form.applicant_name.trim();
    let applicant_email = form.applicant_email.trim();
    let message = form.message.trim();
    let job_post_id = form.job_post_id.trim();

    let resume = resume.ok_or_else(|| AppError::Validation("Resume file is required".to_string()))?;
    if resume.data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(
            "Resume file size must be less than 5MB. Please upload a smaller file.".to_string(),
        ));
    }
    if !ALLOWED_RESUME_TYPES.contains(&resume.content_type.as_str()) {
        return Err(AppError::Validation(
            "Invalid file type. Please upload a PDF, DOC, DOCX, or TXT file.".to_string(),
        ));
    }

    let job = fetch_job(&state.db, job_post_id).await?;
    if job.status != JobStatus::Approved.as_str() {
        return Err(AppError::Validation(
            "This job is not currently accepting applications. It may be pending approval or has been closed."
                .to_string(),
        ));
    }
    let now = Utc::now();
    let expired = db::parse_timestamp(&job.expires_at).map_or(true, |exp| is_expired(exp, now));
    if expired {
        return Err(AppError::Validation(
            "This job posting has expired and is no longer accepting applications.".to_string(),
        ));
    }

    let object = resume_object_path(&job.id, now.timestamp_millis(), applicant_name, &resume.file_name);
    let resume_url = state
        .storage
        .upload(&state.cfg.storage.resume_bucket, &object, resume.data.to_vec(), &resume.content_type)
        .await
        .map_err(|e| {
            error!("[Upload Resume] storage error: {:#}", e);
            AppError::Storage(format!("{:#}", e))
        })?;
    AppMetrics::inc(&state.metrics.files_stored);

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO applications (id, job_post_id, applicant_name, applicant_email, message,
                                   resume_url, is_reviewed, created_at)
         VALUES (?, ?, ?, ?, ?, ?, 0, ?)"
    )
    .bind(&id)
    .bind(&job.id)
    .bind(applicant_name)
    .bind(applicant_email)
    .bind(message)
    .bind(&resume_url)
    .bind(db::timestamp(now))
    .execute(&state.db)
    .await?;

    let application = sqlx::query_as::<_, Application>(&format!(
        "SELECT {} FROM applications a WHERE a.id = ?",
        APPLICATION_COLUMNS
    ))
    .bind(&id)
    .fetch_one(&state.db)
    .await?;

    AppMetrics::inc(&state.metrics.applications_submitted);
    info!("Application {} received for job {}", id, job.id);

    let details = email::ApplicationEmail {
        job_title: &job.title,
        applicant_name,
        applicant_email,
        message,
    };
    futures::join!(
        state.mailer.notify(email::application_received(&job.contact_email, &details)),
        state.mailer.notify(email::application_confirmation(&details)),
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Application submitted successfully",
            "application": application,
        })),
    ))
}

pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Query(params): Query<ApplicationListParams>,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ReviewApplications)?;
    let job_post_id = crate::api::validators::non_blank(params.job_post_id.as_deref());

    let where_clause = if job_post_id.is_some() { "WHERE a.job_post_id = ?" } else { "" };
    let sql = format!(
        "SELECT {}, j.title AS job_title, j.company_name \
         FROM applications a JOIN job_posts j ON j.id = a.job_post_id \
         {} ORDER BY a.created_at DESC LIMIT ?",
        APPLICATION_COLUMNS, where_clause
    );

    let mut query = sqlx::query_as::<_, ApplicationWithJob>(&sql);
    if let Some(ref v) = job_post_id { query = query.bind(v); }
    let applications = query.bind(ADMIN_LIST_LIMIT).fetch_all(&state.db).await?;

    let total = applications.len();
    Ok(Json(json!({ "data": applications, "total": total })))
}

pub async fn mark_reviewed(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ReviewApplications)?;
    let result = sqlx::query("UPDATE applications SET is_reviewed = 1 WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Application not found".to_string()));
    }

    log_action(state.db.clone(), claims.sub, claims.email, "review", "application", Some(id.clone()), None);

    let application = sqlx::query_as::<_, Application>(&format!(
        "SELECT {} FROM applications a WHERE a.id = ?",
        APPLICATION_COLUMNS
    ))
    .bind(&id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({ "success": true, "application": application })))
}
