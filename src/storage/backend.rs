//! Storage backend capabilities
//!
//! Both tiers implement [`StorageBackend`]. The cold tier additionally
//! implements [`ColdStorage`], reached through [`StorageBackend::as_cold`],
//! because its reads go through asynchronous retrieval jobs.

use chrono::{DateTime, Utc};

use crate::error::StashResult;
use crate::models::{RetrievalJob, Tier};

/// Upload, download and delete opaque byte blobs
pub trait StorageBackend: Send + Sync {
    /// Which tier this backend serves
    fn tier(&self) -> Tier;

    /// Identifies the bucket or vault; part of every record's backend hash
    fn container(&self) -> &str;

    /// Store `bytes` under the suggested `name`, returning the backend id
    fn put(&self, name: &str, bytes: &[u8]) -> StashResult<String>;

    /// Read back the bytes stored under `id`
    fn get(&self, id: &str) -> StashResult<Vec<u8>>;

    /// Delete `id`; `NotFound` when it does not exist
    fn delete(&self, id: &str) -> StashResult<()>;

    /// All ids currently stored, sorted
    fn list(&self) -> StashResult<Vec<String>>;

    /// Asynchronous retrieval, for tiers that need it
    fn as_cold(&self) -> Option<&dyn ColdStorage> {
        None
    }
}

/// Job-based retrieval for vaulted archives
pub trait ColdStorage: Send + Sync {
    /// Start a retrieval, or return the live job already running for `archive_id`
    fn initiate_retrieval(&self, archive_id: &str) -> StashResult<RetrievalJob>;

    /// Check a job; returns the archive bytes once it is ready
    fn poll_retrieval(&self, job: &RetrievalJob) -> StashResult<RetrievalStatus>;

    /// The live job for `archive_id`, if any, without starting one
    fn find_job(&self, archive_id: &str) -> StashResult<Option<RetrievalJob>>;
}

/// Result of polling a retrieval job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalStatus {
    Pending { ready_at: DateTime<Utc> },
    Ready(Vec<u8>),
}

impl RetrievalStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}
