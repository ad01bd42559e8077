use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Moderation state of a job post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Approved,
    Rejected,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Approved => "APPROVED",
            JobStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<JobStatus> {
        match s {
            "PENDING" => Some(JobStatus::Pending),
            "APPROVED" => Some(JobStatus::Approved),
            "REJECTED" => Some(JobStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Freelance,
    Internship,
}

impl JobType {
    pub const ALL: [JobType; 5] = [
        JobType::FullTime,
        JobType::PartTime,
        JobType::Contract,
        JobType::Freelance,
        JobType::Internship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "FULL_TIME",
            JobType::PartTime => "PART_TIME",
            JobType::Contract => "CONTRACT",
            JobType::Freelance => "FREELANCE",
            JobType::Internship => "INTERNSHIP",
        }
    }

    pub fn parse(s: &str) -> Option<JobType> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// "FULL_TIME" -> "Full Time"
    pub fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => format!("{}{}", first, chars.as_str().to_lowercase()),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobPost {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub job_type: String,
    pub contact_email: String,
    pub company_name: Option<String>,
    pub salary: Option<String>,
    pub requirements: Option<String>,
    pub image_url: Option<String>,
    pub status: String,
    pub user_id: Option<String>,
    pub expires_at: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Job post joined with its poster and application count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobPostListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: JobPost,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub application_count: i64,
}

pub const JOB_COLUMNS: &str = "j.id, j.title, j.description, j.location, j.category, j.job_type, \
     j.contact_email, j.company_name, j.salary, j.requirements, j.image_url, j.status, \
     j.user_id, j.expires_at, j.created_at, j.updated_at";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub job_type: String,
    pub contact_email: String,
    pub company_name: Option<String>,
    pub salary: Option<String>,
    pub requirements: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactEmailRequest {
    pub contact_email: String,
}

pub fn expiry_from(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now + Duration::days(days)
}

pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at < now
}

/// Whole days left, rounded up; zero or negative once the post has lapsed.
pub fn days_until_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    let diff = (expires_at - now).num_milliseconds();
    // ceil for integer division, correct for negative values too
    diff.div_euclid(DAY_MS) + i64::from(diff.rem_euclid(DAY_MS) != 0)
}
