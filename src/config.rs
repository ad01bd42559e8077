use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub jobs: JobsConfig,
    pub email: EmailConfig,
    pub storage: StorageConfig,
    pub news: NewsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Absolute base URL used in emails, the sitemap and local upload URLs.
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Built frontend bundle, served with SPA fallback.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Allowed CORS origins.
    /// Set FREIGHTTHIS__SERVER__CORS_ALLOWED_ORIGINS in production.
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_hours: u64,
    #[serde(default = "default_reset_expiry")]
    pub reset_token_expiry_minutes: u64,
    /// Email of the admin account seeded into an empty database.
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_job_expiry_days")]
    pub expiry_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Email delivery is disabled when unset; sends are skipped and logged.
    #[serde(default)]
    pub sendgrid_api_key: Option<String>,
    #[serde(default = "default_from_email")]
    pub from_email: String,
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    #[serde(default = "default_sendgrid_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    Local,
    Supabase,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackendKind,
    #[serde(default = "default_local_dir")]
    pub local_dir: String,
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_service_key: Option<String>,
    #[serde(default = "default_resume_bucket")]
    pub resume_bucket: String,
    #[serde(default = "default_image_bucket")]
    pub image_bucket: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    #[serde(default = "default_news_feeds")]
    pub feeds: Vec<String>,
    #[serde(default = "default_news_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_news_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_bind() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }
fn default_public_url() -> String { "http://localhost:3000".to_string() }
fn default_static_dir() -> String { "frontend/dist".to_string() }
fn default_cors_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}
fn default_db_path() -> String { "./freightthis.db".to_string() }
fn default_jwt_expiry() -> u64 { 24 }
fn default_reset_expiry() -> u64 { 60 }
fn default_admin_email() -> String { "admin@freightthis.com".to_string() }
fn default_job_expiry_days() -> i64 { 30 }
fn default_from_email() -> String { "noreply@freightthis.com".to_string() }
fn default_sendgrid_url() -> String { "https://api.sendgrid.com/v3/mail/send".to_string() }
fn default_storage_backend() -> StorageBackendKind { StorageBackendKind::Local }
fn default_local_dir() -> String { "./uploads".to_string() }
fn default_resume_bucket() -> String { "applications".to_string() }
fn default_image_bucket() -> String { "job-images".to_string() }
fn default_news_feeds() -> Vec<String> {
    vec!["https://www.freightwaves.com/feed".to_string()]
}
fn default_news_timeout() -> u64 { 5 }
fn default_news_ttl() -> u64 { 300 }

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

pub fn validate(cfg: &Config) -> Result<()> {
    if cfg.auth.jwt_secret == DEFAULT_JWT_SECRET {
        anyhow::bail!(
            "SECURITY ERROR: JWT secret must be changed from default value '{}'. \
            Set FREIGHTTHIS__AUTH__JWT_SECRET environment variable with a strong random value.",
            DEFAULT_JWT_SECRET
        );
    }

    if cfg.auth.jwt_secret.len() < 32 {
        anyhow::bail!(
            "CONFIG ERROR: JWT secret must be at least 32 characters (current: {})",
            cfg.auth.jwt_secret.len()
        );
    }

    if cfg.auth.jwt_expiry_hours == 0 || cfg.auth.reset_token_expiry_minutes == 0 {
        anyhow::bail!("CONFIG ERROR: token lifetimes must be greater than zero");
    }

    if cfg.jobs.expiry_days <= 0 {
        anyhow::bail!(
            "CONFIG ERROR: jobs.expiry_days must be positive (current: {})",
            cfg.jobs.expiry_days
        );
    }

    if cfg.storage.backend == StorageBackendKind::Supabase
        && (cfg.storage.supabase_url.is_none() || cfg.storage.supabase_service_key.is_none())
    {
        anyhow::bail!(
            "CONFIG ERROR: storage.backend = supabase requires storage.supabase_url \
             and storage.supabase_service_key"
        );
    }

    if let Some(parent) = std::path::Path::new(&cfg.database.path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            anyhow::bail!(
                "CONFIG ERROR: Database directory does not exist: {}",
                parent.display()
            );
        }
    }

    if cfg.email.sendgrid_api_key.is_none() {
        tracing::warn!("email.sendgrid_api_key not set; outgoing email is disabled");
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}

pub fn load() -> Result<Config> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(
            config::Environment::with_prefix("FREIGHTTHIS")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.cors_allowed_origins")
                .with_list_parse_key("news.feeds")
                .try_parsing(true),
        )
        .set_default("server.bind", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("database.path", "./freightthis.db")?
        .set_default("auth.jwt_secret", DEFAULT_JWT_SECRET)?
        .set_default("auth.jwt_expiry_hours", 24)?
        .set_default("jobs.expiry_days", 30)?
        .set_default("email.from_email", "noreply@freightthis.com")?
        .set_default("storage.backend", "local")?
        .set_default("news.fetch_timeout_secs", 5)?
        .build()?
        .try_deserialize()?;

    validate(&cfg)?;

    Ok(cfg)
}
