use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use crate::api::AppState;
use crate::error::AppResult;

pub async fn latest(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let news = state.news.latest().await;
    Ok(Json(json!({
        "success": true,
        "news": news.as_slice(),
    })))
}
