//! Cold-tier retrieval job model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::ids::JobId;
use crate::error::{StashError, StashResult};

/// How long a finished job's output stays readable
pub const JOB_OUTPUT_TTL_HOURS: i64 = 24;

/// Handle for an asynchronous cold-tier retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalJob {
    pub job_id: JobId,

    /// Vault archive id being retrieved
    pub archive_id: String,

    pub initiated_at: DateTime<Utc>,

    /// When the output becomes readable
    pub ready_at: DateTime<Utc>,
}

impl RetrievalJob {
    /// Start a job that becomes ready after `delay`
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the ready time is past the representable range.
    pub fn start(
        archive_id: impl Into<String>,
        now: DateTime<Utc>,
        delay: Duration,
    ) -> StashResult<Self> {
        let ready_at = now.checked_add_signed(delay).ok_or_else(|| {
            StashError::Validation(format!("retrieval delay {} is out of range", delay))
        })?;
        Ok(Self {
            job_id: JobId::new(),
            archive_id: archive_id.into(),
            initiated_at: now,
            ready_at,
        })
    }

    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        now >= self.ready_at
    }

    /// When the job's output stops being readable
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.ready_at
            .checked_add_signed(Duration::hours(JOB_OUTPUT_TTL_HOURS))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}
