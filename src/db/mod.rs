use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;
use crate::config::Config;
use std::str::FromStr;

pub mod models;
pub mod audit;

pub type DbPool = SqlitePool;

/// Password given to the admin account seeded into an empty database.
pub const SEED_ADMIN_PASSWORD: &str = "admin123";

/// Fixed-width RFC 3339 (millisecond precision, `Z` suffix) so that stored
/// timestamps compare chronologically as text.
pub fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_ts() -> String {
    timestamp(Utc::now())
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub async fn init(cfg: &Config) -> Result<DbPool> {
    let db_url = format!("sqlite://{}?mode=rwc", cfg.database.path);

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(20)
        .connect_with(
            sqlx::sqlite::SqliteConnectOptions::from_str(&db_url)?
                .create_if_missing(true)
                .foreign_keys(true)
        )
        .await?;

    sqlx::migrate!("./src/db/migrations").run(&pool).await?;

    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA synchronous=NORMAL")
        .execute(&pool)
        .await?;

    tracing::info!("Database connected: {}", cfg.database.path);
    Ok(pool)
}

/// Create the first ADMIN account if no users exist yet.
pub async fn seed_admin(pool: &DbPool, cfg: &Config) -> Result<()> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if count.0 == 0 {
        let id = Uuid::new_v4().to_string();
        let now = now_ts();
        let password = crate::auth::password::hash(SEED_ADMIN_PASSWORD)?;

        sqlx::query(
            "INSERT INTO users (id, email, name, password, role, created_at, updated_at)
             VALUES (?, ?, 'Admin User', ?, 'ADMIN', ?, ?)"
        )
        .bind(&id)
        .bind(&cfg.auth.admin_email)
        .bind(&password)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        tracing::warn!(
            "Created default admin user (email: {}, password: {}). \
             Change immediately in production!",
            cfg.auth.admin_email,
            SEED_ADMIN_PASSWORD
        );
    }

    Ok(())
}
