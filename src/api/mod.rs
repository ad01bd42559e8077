use anyhow::Result;
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use std::sync::Arc;
use std::net::SocketAddr;
use std::time::Instant;
use dashmap::DashMap;
use crate::config::Config;
use crate::db::DbPool;
use crate::metrics::AppMetrics;
use crate::services::email::Mailer;
use crate::services::news::NewsAggregator;
use crate::services::storage::Storage;
use handlers::counts::AdminSection;

pub mod router;
pub mod middleware;
pub mod handlers;
pub mod validators;

pub struct AppState {
    pub db: DbPool,
    pub cfg: Config,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub mailer: Mailer,
    pub storage: Storage,
    pub news: NewsAggregator,
    pub metrics: Arc<AppMetrics>,
    /// Login failure tracking: ip → (failure_count, window_start)
    pub login_attempts: DashMap<String, (u32, Instant)>,
    /// Admin "last viewed" markers: (admin id, section) → timestamp
    pub admin_views: DashMap<(String, AdminSection), String>,
}

impl AppState {
    pub fn new(cfg: Config, db: DbPool, metrics: Arc<AppMetrics>) -> Result<Self> {
        let mailer = Mailer::new(&cfg.email, metrics.clone())?;
        let storage = Storage::from_config(&cfg)?;
        let news = NewsAggregator::new(&cfg.news)?;

        Ok(Self {
            db,
            jwt_secret: cfg.auth.jwt_secret.clone(),
            jwt_expiry_hours: cfg.auth.jwt_expiry_hours,
            mailer,
            storage,
            news,
            metrics,
            login_attempts: DashMap::new(),
            admin_views: DashMap::new(),
            cfg,
        })
    }
}

pub async fn serve(cfg: Config, db: DbPool, metrics: Arc<AppMetrics>) -> Result<()> {
    let bind_addr = format!("{}:{}", cfg.server.bind, cfg.server.port);
    let cors = build_cors_layer(&cfg.server.cors_allowed_origins);
    let state = Arc::new(AppState::new(cfg, db, metrics)?);
    if !state.mailer.is_enabled() {
        tracing::warn!("SendGrid API key not set: outgoing email will be skipped");
    }
    let app = build_app(state, cors);

    // ConnectInfo carries the peer IP used by the login rate limiter
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("FreightThis listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    ).await?;
    Ok(())
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("No valid CORS origins configured; CORS will block all cross-origin requests");
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn build_app(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .merge(router::routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
