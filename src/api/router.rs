use axum::{extract::DefaultBodyLimit, routing::{get, post, patch, delete}, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use super::AppState;
use super::handlers;
use crate::db::models::application::MAX_UPLOAD_BYTES;

/// Multipart bodies carry a file of up to MAX_UPLOAD_BYTES plus form fields.
const UPLOAD_BODY_LIMIT: usize = 2 * MAX_UPLOAD_BYTES;

pub fn routes(state: Arc<AppState>) -> Router {
    let static_dir = Path::new(&state.cfg.server.static_dir);
    let spa = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));
    let uploads = state.storage.local_root().map(ServeDir::new);

    let router = Router::new()
        // Health & site (public)
        .route("/api/health", get(handlers::health::health_check))
        .route("/sitemap.xml", get(handlers::site::sitemap))
        .route("/robots.txt", get(handlers::site::robots))
        .route("/metrics", get(handlers::metrics::prometheus_metrics))
        // Accounts
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/session", get(handlers::auth::session))
        .route("/api/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/api/auth/reset-password", post(handlers::auth::reset_password))
        .route("/api/user/password", post(handlers::users::change_password))
        .route("/api/user/counts", get(handlers::counts::user_counts))
        // Jobs / sponsors
        .route("/api/jobs", get(handlers::jobs::list).post(handlers::jobs::create))
        .route("/api/jobs/{id}", get(handlers::jobs::get_public))
        .route("/api/supporters/{id}", get(handlers::jobs::get_supporter))
        .route("/api/jobs/{id}/approve", post(handlers::jobs::approve).delete(handlers::jobs::reject))
        .route("/api/jobs/{id}/manage", patch(handlers::jobs::renew).delete(handlers::jobs::delete))
        .route("/api/jobs/{id}/contact-email", patch(handlers::jobs::update_contact_email))
        // Applications & uploads (multipart)
        .route(
            "/api/applications",
            post(handlers::applications::submit).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/upload",
            post(handlers::upload::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        // Comments
        .route("/api/comments", get(handlers::comments::list).post(handlers::comments::create))
        .route("/api/comments/{id}/approve", post(handlers::comments::approve).delete(handlers::comments::reject))
        // News, contact, solutions (public)
        .route("/api/news", get(handlers::news::latest))
        .route("/api/contact", post(handlers::contact::contact))
        .route("/api/solutions", post(handlers::contact::solutions))
        // Admin
        .route("/api/admin/stats", get(handlers::dashboard::get_stats))
        .route("/api/admin/counts", get(handlers::counts::admin_counts).post(handlers::counts::mark_viewed))
        .route("/api/admin/jobs", get(handlers::jobs::admin_list))
        .route("/api/admin/applications", get(handlers::applications::admin_list))
        .route("/api/admin/applications/{id}/review", post(handlers::applications::mark_reviewed))
        .route("/api/admin/comments", get(handlers::comments::admin_list))
        .route("/api/admin/users", get(handlers::users::list))
        .route("/api/admin/user/{id}", delete(handlers::users::delete))
        .route("/api/admin/user/{id}/password", patch(handlers::users::set_user_password))
        .route("/api/admin/audit-log", get(handlers::audit_log::list));

    let router = match uploads {
        Some(dir) => router.nest_service("/uploads", dir),
        None => router,
    };

    router
        .with_state(state)
        // Frontend bundle + SPA fallback (after with_state)
        .fallback_service(spa)
}
