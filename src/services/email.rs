use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::config::EmailConfig;
use crate::metrics::AppMetrics;

const SEND_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    /// Plain-text only when `None`.
    pub html: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No API key configured.
    Skipped,
}

/// SendGrid v3 mail client.
pub struct Mailer {
    client: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    from: String,
    admin_email: String,
    metrics: Arc<AppMetrics>,
}

impl Mailer {
    pub fn new(cfg: &EmailConfig, metrics: Arc<AppMetrics>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: cfg.sendgrid_api_key.clone().filter(|k| !k.trim().is_empty()),
            api_url: cfg.api_url.clone(),
            from: cfg.from_email.clone(),
            admin_email: cfg.admin_email.clone(),
            metrics,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    pub async fn send(&self, msg: EmailMessage) -> Result<Delivery> {
        let Some(api_key) = &self.api_key else {
            info!("SendGrid not configured, skipping email \"{}\" to {}", msg.subject, msg.to);
            AppMetrics::inc(&self.metrics.emails_skipped);
            return Ok(Delivery::Skipped);
        };

        let mut content = vec![json!({ "type": "text/plain", "value": msg.text })];
        if let Some(html) = &msg.html {
            content.push(json!({ "type": "text/html", "value": html }));
        }
        let payload = json!({
            "personalizations": [{ "to": [{ "email": msg.to }] }],
            "from": { "email": self.from },
            "subject": msg.subject,
            "content": content,
        });

        let result = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                AppMetrics::inc(&self.metrics.emails_failed);
                return Err(anyhow::Error::new(e).context("SendGrid request failed"));
            }
        };

        if !response.status().is_success() {
            AppMetrics::inc(&self.metrics.emails_failed);
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("SendGrid returned {}: {}", status, body);
        }

        AppMetrics::inc(&self.metrics.emails_sent);
        info!("Email \"{}\" sent to {}", msg.subject, msg.to);
        Ok(Delivery::Sent)
    }

    /// Send and only log failures. For notifications that must not fail the request.
    pub async fn notify(&self, msg: EmailMessage) {
        let subject = msg.subject.clone();
        if let Err(e) = self.send(msg).await {
            error!("Error sending email \"{}\": {:#}", subject, e);
        }
    }
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "N/A",
    }
}

pub struct JobPostedEmail<'a> {
    pub title: &'a str,
    pub company_name: Option<&'a str>,
    pub job_type: &'a str,
    pub location: &'a str,
    pub contact_email: &'a str,
}

pub fn job_posted(admin_email: &str, job: &JobPostedEmail<'_>) -> EmailMessage {
    let company = or_na(job.company_name);
    EmailMessage {
        to: admin_email.to_string(),
        subject: format!("New Job Posted: {}", job.title),
        text: format!(
            "A new job has been posted and is awaiting approval.\n\nJob Title: {}\nCompany: {}\nType: {}\nLocation: {}\nContact: {}",
            job.title, company, job.job_type, job.location, job.contact_email
        ),
        html: Some(format!(
            "<h2>New Job Posted</h2>\
             <p>A new job has been posted and is awaiting approval.</p>\
             <ul>\
             <li><strong>Job Title:</strong> {}</li>\
             <li><strong>Company:</strong> {}</li>\
             <li><strong>Type:</strong> {}</li>\
             <li><strong>Location:</strong> {}</li>\
             <li><strong>Contact:</strong> {}</li>\
             </ul>\
             <p>Please review and approve in the admin dashboard.</p>",
            escape_html(job.title),
            escape_html(company),
            escape_html(job.job_type),
            escape_html(job.location),
            escape_html(job.contact_email),
        )),
    }
}

pub fn job_approved(contact_email: &str, title: &str, job_url: &str) -> EmailMessage {
    EmailMessage {
        to: contact_email.to_string(),
        subject: "Your Job Posting Has Been Approved".to_string(),
        text: format!(
            "Your job posting \"{}\" has been approved and is now live!\n\nView it here: {}",
            title, job_url
        ),
        html: Some(format!(
            "<h2>Job Approved!</h2>\
             <p>Your job posting <strong>\"{}\"</strong> has been approved and is now live!</p>\
             <p><a href=\"{}\">View your job posting</a></p>",
            escape_html(title),
            escape_html(job_url),
        )),
    }
}

pub struct ApplicationEmail<'a> {
    pub job_title: &'a str,
    pub applicant_name: &'a str,
    pub applicant_email: &'a str,
    pub message: &'a str,
}

pub fn application_received(job_contact_email: &str, app: &ApplicationEmail<'_>) -> EmailMessage {
    EmailMessage {
        to: job_contact_email.to_string(),
        subject: format!("New Application for {}", app.job_title),
        text: format!(
            "You have received a new application for your job posting \"{}\".\n\nApplicant: {}\nEmail: {}\nMessage: {}",
            app.job_title, app.applicant_name, app.applicant_email, app.message
        ),
        html: Some(format!(
            "<h2>New Application Received</h2>\
             <p>You have received a new application for your job posting <strong>\"{}\"</strong>.</p>\
             <ul>\
             <li><strong>Applicant:</strong> {}</li>\
             <li><strong>Email:</strong> {}</li>\
             <li><strong>Message:</strong> {}</li>\
             </ul>\
             <p>Please check your admin dashboard to review the full application and resume.</p>",
            escape_html(app.job_title),
            escape_html(app.applicant_name),
            escape_html(app.applicant_email),
            escape_html(app.message),
        )),
    }
}

pub fn application_confirmation(app: &ApplicationEmail<'_>) -> EmailMessage {
    EmailMessage {
        to: app.applicant_email.to_string(),
        subject: format!("Application Received for {}", app.job_title),
        text: format!(
            "Thank you for applying to {}. Your application has been received and will be reviewed shortly.",
            app.job_title
        ),
        html: Some(format!(
            "<h2>Application Received</h2>\
             <p>Thank you for applying to <strong>{}</strong>.</p>\
             <p>Your application has been received and will be reviewed shortly. \
             The hiring team will contact you if your profile matches their requirements.</p>\
             <p>Good luck!</p>",
            escape_html(app.job_title),
        )),
    }
}

pub fn password_reset(to: &str, reset_url: &str, expiry_minutes: u64) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Reset your FreightThis password".to_string(),
        text: format!(
            "We received a request to reset your password.\n\nReset it here: {}\n\nThis link expires in {} minutes. If you did not request a reset, you can ignore this email.",
            reset_url, expiry_minutes
        ),
        html: Some(format!(
            "<h2>Password Reset</h2>\
             <p>We received a request to reset your password.</p>\
             <p><a href=\"{}\">Reset your password</a></p>\
             <p>This link expires in {} minutes. If you did not request a reset, you can ignore this email.</p>",
            escape_html(reset_url),
            expiry_minutes,
        )),
    }
}

pub struct ContactEmail<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub subject: &'a str,
    pub message: &'a str,
}

pub fn contact_form(admin_email: &str, c: &ContactEmail<'_>) -> EmailMessage {
    EmailMessage {
        to: admin_email.to_string(),
        subject: format!("Contact Form: {}", c.subject),
        text: format!(
            "New contact form submission.\n\nName: {}\nEmail: {}\nSubject: {}\n\nMessage:\n{}",
            c.name, c.email, c.subject, c.message
        ),
        html: Some(format!(
            "<h2>New Contact Form Submission</h2>\
             <ul>\
             <li><strong>Name:</strong> {}</li>\
             <li><strong>Email:</strong> {}</li>\
             <li><strong>Subject:</strong> {}</li>\
             </ul>\
             <p style=\"white-space: pre-wrap;\">{}</p>",
            escape_html(c.name),
            escape_html(c.email),
            escape_html(c.subject),
            escape_html(c.message),
        )),
    }
}

pub struct SolutionEmail<'a> {
    pub kind: &'a str,
    pub selected_items: &'a [String],
    pub other_text: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub company_name: Option<&'a str>,
    pub email: &'a str,
    pub phone: Option<&'a str>,
}

pub fn solution_request(s: &SolutionEmail<'_>) -> EmailMessage {
    let items = if s.selected_items.is_empty() {
        "None".to_string()
    } else {
        s.selected_items.join("\n")
    };
    let parts = [
        format!("Type: {}", s.kind),
        format!("Selected Items:\n{}", items),
        format!("Other: {}", or_na(s.other_text)),
        "Contact Details:".to_string(),
        format!("Name: {}", or_na(s.full_name)),
        format!("Company: {}", or_na(s.company_name)),
        format!("Email: {}", s.email),
        format!("Phone: {}", or_na(s.phone)),
    ];
    EmailMessage {
        to: s.email.to_string(),
        subject: format!("Solution Request ({})", s.kind),
        text: parts.join("\n\n"),
        html: None,
    }
}
