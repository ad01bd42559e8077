use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::api::middleware::json::ApiJson;
use crate::api::validators::{non_blank, Validate};
use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::services::email;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionContact {
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub selected_items: Option<Vec<String>>,
    pub other_text: Option<String>,
    pub contact: SolutionContact,
}

/// Contact form: forwarded to the admin inbox.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ContactRequest>,
) -> AppResult<Json<Value>> {
    body.validate()?;
    info!("Contact form submission from {} ({}): {}", body.name.trim(), body.email.trim(), body.subject.trim());

    state
        .mailer
        .notify(email::contact_form(
            state.mailer.admin_email(),
            &email::ContactEmail {
                name: body.name.trim(),
                email: body.email.trim(),
                subject: body.subject.trim(),
                message: body.message.trim(),
            },
        ))
        .await;

    Ok(Json(json!({ "message": "Message sent successfully" })))
}

/// Solution request: a plain-text summary sent to the requester's address.
pub async fn solutions(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SolutionRequest>,
) -> AppResult<Json<Value>> {
    body.validate()?;

    let selected_items = body.selected_items.unwrap_or_default();
    let other_text = non_blank(body.other_text.as_deref());
    let full_name = non_blank(body.contact.full_name.as_deref());
    let company_name = non_blank(body.contact.company_name.as_deref());
    let phone = non_blank(body.contact.phone.as_deref());
    let to = body.contact.email.trim();

    state
        .mailer
        .send(email::solution_request(&email::SolutionEmail {
            kind: body.kind.trim(),
            selected_items: &selected_items,
            other_text: other_text.as_deref(),
            full_name: full_name.as_deref(),
            company_name: company_name.as_deref(),
            email: to,
            phone: phone.as_deref(),
        }))
        .await
        .map_err(|e| AppError::Email(format!("{:#}", e)))?;

    info!("Solution request ({}) sent to {}", body.kind.trim(), to);
    Ok(Json(json!({ "message": "Email sent" })))
}
