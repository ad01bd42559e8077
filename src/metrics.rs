use std::sync::atomic::{AtomicU64, Ordering};

/// Marketplace activity counters exposed on `/metrics`.
#[derive(Default)]
pub struct AppMetrics {
    pub jobs_posted: AtomicU64,
    pub applications_submitted: AtomicU64,
    pub comments_submitted: AtomicU64,
    pub emails_sent: AtomicU64,
    pub emails_skipped: AtomicU64,
    pub emails_failed: AtomicU64,
    pub files_stored: AtomicU64,
}

impl AppMetrics {
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Serialize to Prometheus text exposition format.
    pub fn to_prometheus_text(&self) -> String {
        let jobs = self.jobs_posted.load(Ordering::Relaxed);
        let applications = self.applications_submitted.load(Ordering::Relaxed);
        let comments = self.comments_submitted.load(Ordering::Relaxed);
        let sent = self.emails_sent.load(Ordering::Relaxed);
        let skipped = self.emails_skipped.load(Ordering::Relaxed);
        let failed = self.emails_failed.load(Ordering::Relaxed);
        let files = self.files_stored.load(Ordering::Relaxed);

        format!(
            "# HELP freightthis_submissions_total Submissions accepted by the API\n\
             # TYPE freightthis_submissions_total counter\n\
             freightthis_submissions_total{{kind=\"job\"}} {jobs}\n\
             freightthis_submissions_total{{kind=\"application\"}} {applications}\n\
             freightthis_submissions_total{{kind=\"comment\"}} {comments}\n\
             # HELP freightthis_emails_total Outgoing email attempts\n\
             # TYPE freightthis_emails_total counter\n\
             freightthis_emails_total{{status=\"sent\"}} {sent}\n\
             freightthis_emails_total{{status=\"skipped\"}} {skipped}\n\
             freightthis_emails_total{{status=\"failed\"}} {failed}\n\
             # HELP freightthis_files_stored_total Files written to object storage\n\
             # TYPE freightthis_files_stored_total counter\n\
             freightthis_files_stored_total {files}\n"
        )
    }
}
