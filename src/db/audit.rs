use crate::db::DbPool;

/// Fire-and-forget: write an audit log entry to the database.
/// Spawns a background task so the caller is never blocked.
pub fn log_action(
    db: DbPool,
    user_id: String,
    email: String,
    action: impl Into<String> + Send + 'static,
    resource: impl Into<String> + Send + 'static,
    resource_id: Option<String>,
    detail: Option<String>,
) {
    let action = action.into();
    let resource = resource.into();
    let now = crate::db::now_ts();

    tokio::spawn(async move {
        let result = sqlx::query(
            "INSERT INTO audit_log (time, user_id, email, action, resource, resource_id, detail)
             VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&now)
        .bind(&user_id)
        .bind(&email)
        .bind(&action)
        .bind(&resource)
        .bind(resource_id.as_deref())
        .bind(detail.as_deref())
        .execute(&db)
        .await;

        if let Err(e) = result {
            tracing::warn!("Failed to write audit log entry ({} {}): {}", action, resource, e);
        }
    });
}

/// A row of `audit_log` as returned by the admin API.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    pub time: String,
    pub user_id: String,
    pub email: String,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    pub detail: Option<String>,
}
