//! Cold-tier vault
//!
//! Archives get opaque ids and can only be read back through retrieval
//! jobs. Layout under the vault root:
//!
//! ```text
//! archives/<archive-id>.bin
//! jobs/<job-id>.json
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::backend::{ColdStorage, RetrievalStatus, StorageBackend};
use super::credentials::{authorize, Credentials};
use super::file_io::{read_json_required, write_bytes_atomic, write_json_atomic};
use crate::error::{StashError, StashResult};
use crate::models::{ArchiveId, JobId, RetrievalJob, Tier};

const ARCHIVES_DIR: &str = "archives";
const JOBS_DIR: &str = "jobs";

/// Vaulted archival store rooted at a directory
#[derive(Debug)]
pub struct LocalVault {
    root: PathBuf,
    container: String,
    retrieval_delay: Duration,
    poll_interval: StdDuration,
}

impl LocalVault {
    /// Open the vault at `root`, checking `credentials` against it
    pub fn open(root: impl Into<PathBuf>, credentials: &Credentials) -> StashResult<Self> {
        let root = root.into();
        for dir in [ARCHIVES_DIR, JOBS_DIR] {
            fs::create_dir_all(root.join(dir)).map_err(|e| {
                StashError::Storage(format!("Failed to create vault {}: {}", root.display(), e))
            })?;
        }
        authorize(&root, credentials)?;

        Ok(Self {
            container: root.display().to_string(),
            root,
            retrieval_delay: Duration::zero(),
            poll_interval: StdDuration::from_secs(5),
        })
    }

    /// Time from initiating a job until its output is ready
    pub fn with_retrieval_delay(mut self, delay: Duration) -> Self {
        self.retrieval_delay = delay;
        self
    }

    /// Sleep between polls in the blocking `get`
    pub fn with_poll_interval(mut self, interval: StdDuration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn archive_path(&self, archive_id: &str) -> StashResult<PathBuf> {
        let id = ArchiveId::parse(archive_id)
            .map_err(|_| StashError::Validation(format!("invalid archive id '{}'", archive_id)))?;
        Ok(self
            .root
            .join(ARCHIVES_DIR)
            .join(format!("{}.bin", id.to_key())))
    }

    fn job_path(&self, job_id: &JobId) -> PathBuf {
        self.root
            .join(JOBS_DIR)
            .join(format!("{}.json", job_id.to_key()))
    }

    fn load_jobs(&self) -> StashResult<Vec<RetrievalJob>> {
        let mut jobs = Vec::new();
        for entry in fs::read_dir(self.root.join(JOBS_DIR))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_json_required::<RetrievalJob, _>(&path) {
                Ok(job) => jobs.push(job),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable job"),
            }
        }
        Ok(jobs)
    }

    /// Drop job files whose output window has passed
    fn prune_jobs(&self, now: DateTime<Utc>) -> StashResult<Vec<RetrievalJob>> {
        let mut live = Vec::new();
        for job in self.load_jobs()? {
            if job.is_expired(now) {
                debug!(job = %job.job_id, "Removing expired retrieval job");
                let _ = fs::remove_file(self.job_path(&job.job_id));
            } else {
                live.push(job);
            }
        }
        Ok(live)
    }

    /// [`ColdStorage::find_job`] at an explicit time
    pub fn find_job_at(
        &self,
        archive_id: &str,
        now: DateTime<Utc>,
    ) -> StashResult<Option<RetrievalJob>> {
        Ok(self
            .prune_jobs(now)?
            .into_iter()
            .filter(|job| job.archive_id == archive_id)
            .max_by_key(|job| job.initiated_at))
    }

    /// [`ColdStorage::initiate_retrieval`] at an explicit time
    pub fn initiate_retrieval_at(
        &self,
        archive_id: &str,
        now: DateTime<Utc>,
    ) -> StashResult<RetrievalJob> {
        if !self.archive_path(archive_id)?.exists() {
            return Err(StashError::object_not_found(archive_id));
        }

        if let Some(job) = self.find_job_at(archive_id, now)? {
            debug!(job = %job.job_id, archive = archive_id, "Reusing live retrieval job");
            return Ok(job);
        }

        let job = RetrievalJob::start(archive_id, now, self.retrieval_delay)?;
        write_json_atomic(self.job_path(&job.job_id), &job)?;
        info!(
            job = %job.job_id,
            archive = archive_id,
            ready_at = %job.ready_at,
            "Initiated retrieval job"
        );
        Ok(job)
    }

    /// [`ColdStorage::poll_retrieval`] at an explicit time
    pub fn poll_retrieval_at(
        &self,
        job: &RetrievalJob,
        now: DateTime<Utc>,
    ) -> StashResult<RetrievalStatus> {
        let path = self.job_path(&job.job_id);
        if !path.exists() {
            return Err(StashError::NotFound {
                entity_type: "Retrieval job",
                identifier: job.job_id.to_key(),
            });
        }

        let stored: RetrievalJob = read_json_required(&path)?;
        if stored.is_expired(now) {
            let _ = fs::remove_file(&path);
            return Err(StashError::NotFound {
                entity_type: "Retrieval job",
                identifier: format!("{} (output expired)", job.job_id.to_key()),
            });
        }

        if !stored.is_ready(now) {
            return Ok(RetrievalStatus::Pending {
                ready_at: stored.ready_at,
            });
        }

        let bytes = fs::read(self.archive_path(&stored.archive_id)?).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StashError::object_not_found(&stored.archive_id),
            _ => StashError::Storage(format!(
                "Failed to read archive {}: {}",
                stored.archive_id, e
            )),
        })?;
        Ok(RetrievalStatus::Ready(bytes))
    }
}

impl StorageBackend for LocalVault {
    fn tier(&self) -> Tier {
        Tier::Cold
    }

    fn container(&self) -> &str {
        &self.container
    }

    fn put(&self, name: &str, bytes: &[u8]) -> StashResult<String> {
        let id = ArchiveId::new().to_key();
        write_bytes_atomic(self.archive_path(&id)?, bytes)?;
        info!(archive = %id, description = name, size = bytes.len(), "Uploaded archive");
        Ok(id)
    }

    /// Blocks until a retrieval job for `id` is ready
    fn get(&self, id: &str) -> StashResult<Vec<u8>> {
        let job = self.initiate_retrieval(id)?;
        loop {
            match self.poll_retrieval(&job)? {
                RetrievalStatus::Ready(bytes) => return Ok(bytes),
                RetrievalStatus::Pending { ready_at } => {
                    let remaining = (ready_at - Utc::now()).to_std().unwrap_or_default();
                    let wait = remaining.min(self.poll_interval);
                    info!(job = %job.job_id, ready_at = %ready_at, "Waiting for retrieval job");
                    thread::sleep(wait);
                }
            }
        }
    }

    fn delete(&self, id: &str) -> StashResult<()> {
        let path = self.archive_path(id)?;
        fs::remove_file(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StashError::object_not_found(id),
            _ => StashError::Storage(format!("Failed to delete archive {}: {}", id, e)),
        })?;

        for job in self.load_jobs()? {
            if job.archive_id == id {
                let _ = fs::remove_file(self.job_path(&job.job_id));
            }
        }
        debug!(archive = id, "Deleted archive");
        Ok(())
    }

    fn list(&self) -> StashResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.root.join(ARCHIVES_DIR))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("bin") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn as_cold(&self) -> Option<&dyn ColdStorage> {
        Some(self)
    }
}

impl ColdStorage for LocalVault {
    fn initiate_retrieval(&self, archive_id: &str) -> StashResult<RetrievalJob> {
        self.initiate_retrieval_at(archive_id, Utc::now())
    }

    fn poll_retrieval(&self, job: &RetrievalJob) -> StashResult<RetrievalStatus> {
        self.poll_retrieval_at(job, Utc::now())
    }

    fn find_job(&self, archive_id: &str) -> StashResult<Option<RetrievalJob>> {
        self.find_job_at(archive_id, Utc::now())
    }
}
