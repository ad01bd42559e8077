//! Shared setup for the integration tests.
//!
//! Two ways to drive the app:
//! 1. oneshot: call the router directly, no port bound (most endpoints)
//! 2. bound server: real TCP listener + reqwest (login needs ConnectInfo)

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use freightthis::api::{build_app, AppState};
use freightthis::config::{
    AuthConfig, Config, DatabaseConfig, EmailConfig, JobsConfig, NewsConfig, ServerConfig,
    StorageBackendKind, StorageConfig,
};
use freightthis::metrics::AppMetrics;

pub const ADMIN_EMAIL: &str = "admin@freightthis.test";
pub const USER_EMAIL: &str = "driver@freightthis.test";
pub const USER_PASSWORD: &str = "driverpass";
pub const PUBLIC_URL: &str = "https://freightthis.test";

pub struct TestApp {
    pub app: axum::Router,
    pub state: Arc<AppState>,
    pub admin_id: String,
    pub user_id: String,
    pub upload_dir: PathBuf,
}

impl TestApp {
    pub fn admin_token(&self) -> String {
        token_for(&self.state, &self.admin_id, ADMIN_EMAIL, "ADMIN")
    }

    pub fn user_token(&self) -> String {
        token_for(&self.state, &self.user_id, USER_EMAIL, "USER")
    }
}

/// Config with email disabled, local storage in a fresh temp dir and no news feeds.
pub fn test_config() -> Config {
    let upload_dir = std::env::temp_dir().join(format!("freightthis-test-{}", uuid::Uuid::new_v4()));

    Config {
        server: ServerConfig {
            bind: "127.0.0.1".to_string(),
            port: 0,
            public_url: PUBLIC_URL.to_string(),
            static_dir: "frontend/dist".to_string(),
            cors_allowed_origins: vec![],
        },
        database: DatabaseConfig {
            path: ":memory:".to_string(),
        },
        auth: AuthConfig {
            jwt_secret: "test-jwt-secret-for-integration-tests-only-32chars".to_string(),
            jwt_expiry_hours: 1,
            reset_token_expiry_minutes: 60,
            admin_email: ADMIN_EMAIL.to_string(),
        },
        jobs: JobsConfig { expiry_days: 30 },
        email: EmailConfig {
            sendgrid_api_key: None,
            from_email: "noreply@freightthis.test".to_string(),
            admin_email: ADMIN_EMAIL.to_string(),
            api_url: "http://127.0.0.1:9/v3/mail/send".to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackendKind::Local,
            local_dir: upload_dir.to_string_lossy().into_owned(),
            supabase_url: None,
            supabase_service_key: None,
            resume_bucket: "applications".to_string(),
            image_bucket: "job-images".to_string(),
        },
        news: NewsConfig {
            feeds: vec![],
            fetch_timeout_secs: 2,
            cache_ttl_secs: 300,
        },
    }
}

/// In-memory database with migrations applied, the seeded admin and one USER account.
async fn setup_db(cfg: &Config) -> (SqlitePool, String, String) {
    let pool = SqlitePool::connect(":memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    sqlx::migrate!("./src/db/migrations")
        .run(&pool)
        .await
        .expect("Migration failed");

    freightthis::db::seed_admin(&pool, cfg)
        .await
        .expect("Failed to seed admin user");
    let (admin_id,): (String,) = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(ADMIN_EMAIL)
        .fetch_one(&pool)
        .await
        .expect("Seeded admin missing");

    let user_id = uuid::Uuid::new_v4().to_string();
    let hash = freightthis::auth::password::hash(USER_PASSWORD).expect("Failed to hash password");
    let now = freightthis::db::now_ts();
    sqlx::query(
        "INSERT INTO users (id, email, name, password, role, created_at, updated_at)
         VALUES (?, ?, 'Dana Driver', ?, 'USER', ?, ?)"
    )
    .bind(&user_id)
    .bind(USER_EMAIL)
    .bind(&hash)
    .bind(&now)
    .bind(&now)
    .execute(&pool)
    .await
    .expect("Failed to seed user");

    (pool, admin_id, user_id)
}

pub async fn build_test_app_with(cfg: Config) -> TestApp {
    let (db, admin_id, user_id) = setup_db(&cfg).await;
    let upload_dir = PathBuf::from(&cfg.storage.local_dir);
    let metrics = Arc::new(AppMetrics::default());
    let state = Arc::new(AppState::new(cfg, db, metrics).expect("Failed to build AppState"));

    // CORS layer left empty in tests
    let app = build_app(state.clone(), tower_http::cors::CorsLayer::new());
    TestApp { app, state, admin_id, user_id, upload_dir }
}

pub async fn build_test_app() -> TestApp {
    build_test_app_with(test_config()).await
}

/// Serve the app on a random local port. Returns the base URL.
pub async fn start_test_server() -> (String, TestApp) {
    let test = build_test_app().await;
    let app = test.app.clone();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .ok();
    });

    (format!("http://127.0.0.1:{}", addr.port()), test)
}

/// Serve an arbitrary router (feed or mail stubs) on a random port.
pub async fn spawn_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("Failed to get local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://127.0.0.1:{}", addr.port())
}

pub fn token_for(state: &AppState, id: &str, email: &str, role: &str) -> String {
    freightthis::auth::jwt::generate(id, email, role, &state.jwt_secret, 1)
        .expect("Should generate token")
}

pub async fn body_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to collect body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Body is not valid JSON")
}

pub async fn body_text(body: Body) -> String {
    let bytes = body
        .collect()
        .await
        .expect("Failed to collect body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn send_json(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn send_empty(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    builder.body(Body::empty()).unwrap()
}

pub const BOUNDARY: &str = "freightthis-test-boundary";

/// A file part for `multipart_body`.
pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

pub fn multipart_body(fields: &[(&str, &str)], file: Option<FilePart<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(f) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, f.field, f.file_name, f.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(f.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn send_multipart(uri: &str, token: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn job_payload(title: &str) -> Value {
    serde_json::json!({
        "title": title,
        "description": "Regional carrier seeking sponsors for our driver safety program across the Midwest.",
        "location": "Chicago, IL",
        "category": "Transportation",
        "jobType": "FULL_TIME",
        "contactEmail": "hiring@carrier.test",
        "companyName": "Midwest Carriers",
    })
}
