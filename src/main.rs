use anyhow::Result;
use std::sync::Arc;
use tracing::info;

mod api;
mod auth;
mod config;
mod db;
mod error;
mod metrics;
mod services;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("freightthis=info".parse()?)
        )
        .init();

    info!("Starting FreightThis v{}", env!("CARGO_PKG_VERSION"));

    let cfg = config::load()?;
    info!("Configuration loaded");

    let db_pool = db::init(&cfg).await?;
    info!("Database initialized");

    // Seed initial admin user if none exist
    db::seed_admin(&db_pool, &cfg).await?;

    let metrics = Arc::new(metrics::AppMetrics::default());

    api::serve(cfg, db_pool, metrics).await
}
