use axum::{extract::State, http::header, response::IntoResponse};
use std::sync::Arc;
use crate::api::AppState;
use crate::error::AppResult;

/// (path, changefreq, priority)
const STATIC_PAGES: [(&str, &str, &str); 7] = [
    ("", "daily", "1.0"),
    ("/about", "monthly", "0.8"),
    ("/contact", "monthly", "0.7"),
    ("/jobs", "daily", "0.9"),
    ("/jobs/post", "monthly", "0.6"),
    ("/supporters", "weekly", "0.8"),
    ("/supporters/submit", "monthly", "0.6"),
];

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn render_sitemap(base_url: &str, jobs: &[(String, String)], today: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    for (path, changefreq, priority) in STATIC_PAGES {
        xml.push_str(&format!(
            "  <url><loc>{}{}</loc><lastmod>{}</lastmod><changefreq>{}</changefreq><priority>{}</priority></url>\n",
            xml_escape(base), path, today, changefreq, priority
        ));
    }
    for (id, updated_at) in jobs {
        xml.push_str(&format!(
            "  <url><loc>{}/jobs/{}</loc><lastmod>{}</lastmod><changefreq>weekly</changefreq><priority>0.6</priority></url>\n",
            xml_escape(base), xml_escape(id), xml_escape(updated_at)
        ));
    }

    xml.push_str("</urlset>\n");
    xml
}

pub async fn sitemap(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let jobs: Vec<(String, String)> = sqlx::query_as(
        "SELECT id, updated_at FROM job_posts WHERE status = 'APPROVED' ORDER BY updated_at DESC"
    )
    .fetch_all(&state.db)
    .await?;

    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let body = render_sitemap(&state.cfg.server.public_url, &jobs, &today);
    Ok(([(header::CONTENT_TYPE, "application/xml")], body))
}

pub async fn robots(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let base = state.cfg.server.public_url.trim_end_matches('/');
    let body = format!(
        "User-agent: *\n\
         Allow: /\n\
         Disallow: /api/\n\
         Disallow: /admin/\n\
         Disallow: /profile/\n\
         Disallow: /reset-password/\n\
         \n\
         Sitemap: {}/sitemap.xml\n",
        base
    );
    ([(header::CONTENT_TYPE, "text/plain")], body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sitemap_lists_static_pages_and_jobs() {
        let jobs = vec![("job-1".to_string(), "2025-03-01T12:00:00.000Z".to_string())];
        let xml = render_sitemap("https://freightthis.com/", &jobs, "2025-03-02");

        assert!(xml.contains("<loc>https://freightthis.com</loc>"));
        assert!(xml.contains("<loc>https://freightthis.com/supporters/submit</loc>"));
        assert!(xml.contains("<loc>https://freightthis.com/jobs/job-1</loc><lastmod>2025-03-01T12:00:00.000Z</lastmod>"));
        assert_eq!(xml.matches("<url>").count(), STATIC_PAGES.len() + 1);
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn test_sitemap_priorities() {
        let xml = render_sitemap("https://freightthis.com", &[], "2025-03-02");

        assert!(xml.contains("<loc>https://freightthis.com/contact</loc><lastmod>2025-03-02</lastmod><changefreq>monthly</changefreq><priority>0.7</priority>"));
        assert!(xml.contains("<loc>https://freightthis.com/jobs/post</loc><lastmod>2025-03-02</lastmod><changefreq>monthly</changefreq><priority>0.6</priority>"));
        assert!(xml.contains("<loc>https://freightthis.com/jobs</loc><lastmod>2025-03-02</lastmod><changefreq>daily</changefreq><priority>0.9</priority>"));
    }
}
