use serde::Serialize;

/// Largest accepted upload (resumes and job images).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_RESUME_TYPES: [&str; 4] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub job_post_id: String,
    pub applicant_name: String,
    pub applicant_email: String,
    pub message: String,
    pub resume_url: String,
    pub is_reviewed: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationWithJob {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: Application,
    pub job_title: String,
    pub company_name: Option<String>,
}

/// Text fields of the multipart application form.
#[derive(Debug, Default)]
pub struct ApplicationForm {
    pub applicant_name: String,
    pub applicant_email: String,
    pub message: String,
    pub job_post_id: String,
}

/// `resumes/<job>/<millis>-<applicant name segment>.<ext>`
pub fn resume_object_path(job_post_id: &str, millis: i64, applicant_name: &str, file_name: &str) -> String {
    let name = object_name_segment(applicant_name);
    match file_extension(file_name) {
        Some(ext) => format!("resumes/{}/{}-{}.{}", job_post_id, millis, name, ext),
        None => format!("resumes/{}/{}-{}", job_post_id, millis, name),
    }
}

/// Applicant name as a single key segment: whitespace runs and anything
/// outside `[A-Za-z0-9._-]` become '-', dot runs collapse to one dot and
/// leading/trailing dots are dropped.
pub fn object_name_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for word in name.split_whitespace() {
        if !out.is_empty() {
            out.push('-');
        }
        for c in word.chars() {
            let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '-' };
            if c == '.' && out.ends_with('.') {
                continue;
            }
            out.push(c);
        }
    }

    match out.trim_matches('.') {
        "" => "applicant".to_string(),
        segment => segment.to_string(),
    }
}

pub fn file_extension(file_name: &str) -> Option<&str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}
