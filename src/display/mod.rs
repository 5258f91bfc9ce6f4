//! Display formatting for terminal output

pub mod records;

use chrono::{DateTime, Utc};

use crate::models::RetrievalJob;

pub use records::{
    format_record_details, format_record_list, format_rotation_plan, format_summary_list,
};

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format the time left until `until`, e.g. `3h 20m`
pub fn format_remaining(until: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (until - now).num_seconds();
    if secs <= 0 {
        return "now".to_string();
    }
    let (hours, minutes) = (secs / 3600, (secs % 3600) / 60);
    match (hours, minutes) {
        (0, 0) => format!("{}s", secs),
        (0, m) => format!("{}m", m),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// One-line status of a retrieval job
pub fn format_job(job: &RetrievalJob, now: DateTime<Utc>) -> String {
    if job.is_ready(now) {
        format!(
            "Job {} is ready (output kept until {})",
            job.job_id,
            job.expires_at().format("%Y-%m-%d %H:%M UTC")
        )
    } else {
        format!(
            "Job {} started {}, ready in {}",
            job.job_id,
            job.initiated_at.format("%Y-%m-%d %H:%M UTC"),
            format_remaining(job.ready_at, now)
        )
    }
}
