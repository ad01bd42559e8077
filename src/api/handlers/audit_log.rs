use axum::{extract::{Query, State}, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::AppState;
use crate::api::middleware::rbac::{require, AdminUser};
use crate::api::validators::non_blank;
use crate::auth::rbac::Permission;
use crate::db::audit::AuditEntry;
use crate::error::{AppError, AppResult};

const DEFAULT_PER_PAGE: i64 = 50;
const MAX_PER_PAGE: i64 = 200;

#[derive(Deserialize)]
pub struct AuditLogParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub action: Option<String>,
    pub resource: Option<String>,
    #[serde(alias = "resourceId")]
    pub resource_id: Option<String>,
    #[serde(alias = "userId")]
    pub user_id: Option<String>,
    /// Only entries at or after this timestamp
    pub since: Option<String>,
}

/// Column filters, each an equality (or lower bound for `time`) with one bound value.
struct AuditFilter {
    conditions: Vec<&'static str>,
    bindings: Vec<String>,
}

impl AuditFilter {
    fn from_params(params: &AuditLogParams) -> AppResult<Self> {
        let mut filter = AuditFilter { conditions: Vec::new(), bindings: Vec::new() };
        filter.push("action = ?", params.action.as_deref());
        filter.push("resource = ?", params.resource.as_deref());
        filter.push("resource_id = ?", params.resource_id.as_deref());
        filter.push("user_id = ?", params.user_id.as_deref());

        if let Some(since) = non_blank(params.since.as_deref()) {
            let ts = crate::db::parse_timestamp(&since)
                .ok_or_else(|| AppError::Validation("Invalid 'since' timestamp".to_string()))?;
            filter.conditions.push("time >= ?");
            filter.bindings.push(crate::db::timestamp(ts));
        }
        Ok(filter)
    }

    fn push(&mut self, condition: &'static str, value: Option<&str>) {
        if let Some(v) = non_blank(value) {
            self.conditions.push(condition);
            self.bindings.push(v);
        }
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }
}

/// Admin actions, newest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Query(params): Query<AuditLogParams>,
) -> AppResult<Json<Value>> {
    require(&claims, Permission::ReadAuditLog)?;
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);

    let filter = AuditFilter::from_params(&params)?;
    let where_clause = filter.where_clause();

    let count_sql = format!("SELECT COUNT(*) FROM audit_log {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for v in &filter.bindings {
        count_query = count_query.bind(v);
    }
    let total = count_query.fetch_one(&state.db).await?;

    let data_sql = format!(
        "SELECT id, time, user_id, email, action, resource, resource_id, detail \
         FROM audit_log {} ORDER BY time DESC, id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let mut data_query = sqlx::query_as::<_, AuditEntry>(&data_sql);
    for v in &filter.bindings {
        data_query = data_query.bind(v);
    }
    let entries = data_query
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(json!({
        "data": entries,
        "total": total,
        "page": page,
        "per_page": per_page,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> AuditLogParams {
        AuditLogParams {
            page: None,
            per_page: None,
            action: None,
            resource: None,
            resource_id: None,
            user_id: None,
            since: None,
        }
    }

    #[test]
    fn test_filter_skips_blank_values() {
        let mut p = params();
        p.action = Some("approve".to_string());
        p.resource = Some("  ".to_string());
        p.resource_id = Some("job-1".to_string());

        let filter = AuditFilter::from_params(&p).unwrap();
        assert_eq!(filter.where_clause(), "WHERE action = ? AND resource_id = ?");
        assert_eq!(filter.bindings, vec!["approve", "job-1"]);
    }

    #[test]
    fn test_filter_rejects_bad_since() {
        let mut p = params();
        p.since = Some("yesterday".to_string());
        assert!(matches!(AuditFilter::from_params(&p), Err(AppError::Validation(_))));

        assert_eq!(AuditFilter::from_params(&params()).unwrap().where_clause(), "");
    }
}
