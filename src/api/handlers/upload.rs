use axum::{
    body::Bytes,
    extract::{multipart::{Field, MultipartError}, Multipart, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::middleware::auth::AuthUser;
use crate::api::AppState;
use crate::db::models::application::MAX_UPLOAD_BYTES;
use crate::error::{AppError, AppResult};
use crate::metrics::AppMetrics;

/// image content type → stored extension
const IMAGE_TYPES: [(&str, &str); 4] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// A file part read from a multipart body.
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

pub fn bad_multipart(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid form data: {}", e.body_text()))
}

/// `None` for a file input left empty by the browser.
pub async fn read_file(field: Field<'_>) -> AppResult<Option<UploadedFile>> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();
    let data = field.bytes().await.map_err(bad_multipart)?;

    if data.is_empty() && file_name.is_empty() {
        return Ok(None);
    }
    Ok(Some(UploadedFile { file_name, content_type, data }))
}

/// `<unix-millis>-<uuid>.<ext>`
pub fn image_object_name(millis: i64, ext: &str) -> String {
    format!("{}-{}.{}", millis, Uuid::new_v4(), ext)
}

pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() == Some("file") {
            file = read_file(field).await?;
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;
    let ext = IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == file.content_type)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| {
            AppError::Validation(
                "Invalid file type. Please upload a JPEG, PNG, GIF, or WebP image.".to_string(),
            )
        })?;
    if file.data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(
            "File size must be less than 5MB".to_string(),
        ));
    }

    let object = image_object_name(Utc::now().timestamp_millis(), ext);
    let url = state
        .storage
        .upload(&state.cfg.storage.image_bucket, &object, file.data.to_vec(), &file.content_type)
        .await
        .map_err(|e| AppError::Storage(format!("{:#}", e)))?;

    AppMetrics::inc(&state.metrics.files_stored);
    info!("Image {} uploaded by {}", object, claims.email);
    Ok(Json(json!({ "url": url })))
}
