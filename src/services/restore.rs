//! Restore service
//!
//! Resolve a name to a record, fetch the bytes (through a retrieval job on
//! the cold tier), verify the fingerprint and unpack.

use std::path::{Path, PathBuf};

use tracing::info;

use super::stash::Stash;
use crate::archive::{unpack, verify_fingerprint};
use crate::crypto::ArchiveKey;
use crate::error::{StashError, StashResult};
use crate::models::{BackupRecord, RetrievalJob, Tier};
use crate::storage::RetrievalStatus;

/// Result of a restore attempt
#[derive(Debug, Clone)]
pub enum RestoreOutcome {
    /// Files were written to the destination
    Restored {
        record: BackupRecord,
        paths: Vec<PathBuf>,
    },
    /// The cold-tier retrieval job is not ready yet
    Pending {
        record: BackupRecord,
        job: RetrievalJob,
    },
}

/// State of the retrieval job for a backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCheck {
    /// The backup is on the fast tier; no job is needed
    NotNeeded,
    /// No live job exists
    NoJob,
    Pending(RetrievalJob),
    Ready(RetrievalJob),
}

/// Service for restoring backups
pub struct RestoreService<'a> {
    stash: &'a Stash,
}

impl<'a> RestoreService<'a> {
    pub fn new(stash: &'a Stash) -> Self {
        Self { stash }
    }

    /// Find the record for an exact stored name, or the latest for a name
    pub fn resolve(&self, target: &str, tier: Option<Tier>) -> StashResult<BackupRecord> {
        if let Ok(record) = self.stash.inventory().get(target) {
            return Ok(record);
        }
        self.stash
            .inventory()
            .latest(target, tier)?
            .ok_or_else(|| StashError::backup_not_found(target))
    }

    /// Restore `target` into `destination`
    ///
    /// With `wait`, blocks on cold-tier jobs; otherwise returns `Pending`
    /// while the job is still running.
    pub fn restore(
        &self,
        target: &str,
        tier: Option<Tier>,
        destination: &Path,
        key: Option<&ArchiveKey>,
        wait: bool,
    ) -> StashResult<RestoreOutcome> {
        let record = self.resolve(target, tier)?;
        let backend = self.stash.backends().for_tier(record.tier);

        let bytes = match backend.as_cold() {
            Some(cold) if !wait => {
                let job = cold.initiate_retrieval(&record.backend_id)?;
                match cold.poll_retrieval(&job)? {
                    RetrievalStatus::Ready(bytes) => bytes,
                    RetrievalStatus::Pending { ready_at } => {
                        info!(
                            stored_name = %record.stored_name,
                            job = %job.job_id,
                            ready_at = %ready_at,
                            "Retrieval job pending"
                        );
                        return Ok(RestoreOutcome::Pending { record, job });
                    }
                }
            }
            _ => backend.get(&record.backend_id)?,
        };

        verify_fingerprint(&bytes, &record.fingerprint)?;
        let paths = unpack(&bytes, key, destination)?;

        info!(
            stored_name = %record.stored_name,
            destination = %destination.display(),
            "Restore complete"
        );
        Ok(RestoreOutcome::Restored { record, paths })
    }

    /// Report the retrieval job for `target` without starting one
    pub fn job_check(&self, target: &str, tier: Option<Tier>) -> StashResult<(BackupRecord, JobCheck)> {
        let record = self.resolve(target, tier)?;
        let backend = self.stash.backends().for_tier(record.tier);

        let check = match backend.as_cold() {
            None => JobCheck::NotNeeded,
            Some(cold) => match cold.find_job(&record.backend_id)? {
                None => JobCheck::NoJob,
                Some(job) if job.is_ready(chrono::Utc::now()) => JobCheck::Ready(job),
                Some(job) => JobCheck::Pending(job),
            },
        };
        Ok((record, check))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backup::{BackupRequest, BackupService};
    use crate::services::stash::fixtures::{stash_in, stash_with};
    use crate::storage::StorageBackend;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn source(dir: &TempDir) -> PathBuf {
        let src = dir.path().join("docs");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("a.txt"), b"alpha").unwrap();
        fs::write(src.join("sub/b.txt"), b"beta").unwrap();
        src
    }

    fn backup(stash: &Stash, dir: &TempDir, tier: Tier, key: Option<ArchiveKey>) -> BackupRecord {
        BackupService::new(stash)
            .backup(BackupRequest {
                tier: Some(tier),
                key,
                ..BackupRequest::new(source(dir))
            })
            .unwrap()
    }

    #[test]
    fn test_restore_latest_from_fast_tier() {
        let dir = TempDir::new().unwrap();
        let stash = stash_in(&dir);
        let service = BackupService::new(&stash);
        for day in [1, 2] {
            service
                .backup(BackupRequest {
                    created_at: Some(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()),
                    ..BackupRequest::new(source(&dir))
                })
                .unwrap();
        }

        let out = dir.path().join("out");
        let outcome = RestoreService::new(&stash)
            .restore("docs", None, &out, None, false)
            .unwrap();

        match outcome {
            RestoreOutcome::Restored { record, paths } => {
                assert_eq!(record.stored_name, "docs.20240102000000.tgz");
                assert_eq!(paths, vec![out.join("docs")]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(fs::read(out.join("docs/sub/b.txt")).unwrap(), b"beta");
    }

    #[test]
    fn test_restore_encrypted_from_cold_tier() {
        let dir = TempDir::new().unwrap();
        let stash = stash_in(&dir);
        let key = ArchiveKey::generate();
        let record = backup(&stash, &dir, Tier::Cold, Some(key.clone()));

        let out = dir.path().join("out");
        let outcome = RestoreService::new(&stash)
            .restore(&record.stored_name, None, &out, Some(&key), false)
            .unwrap();
        assert!(matches!(outcome, RestoreOutcome::Restored { .. }));
        assert_eq!(fs::read(out.join("docs/a.txt")).unwrap(), b"alpha");
    }

    #[test]
    fn test_slow_vault_reports_pending_and_reuses_job() {
        let dir = TempDir::new().unwrap();
        let stash = stash_with(&dir, |p| p.retrieval_delay_secs = 3_600);
        let record = backup(&stash, &dir, Tier::Cold, None);
        let service = RestoreService::new(&stash);
        let out = dir.path().join("out");

        let (_, check) = service.job_check("docs", None).unwrap();
        assert_eq!(check, JobCheck::NoJob);

        let first = match service.restore("docs", None, &out, None, false).unwrap() {
            RestoreOutcome::Pending { job, .. } => job,
            other => panic!("expected pending, got {:?}", other),
        };
        assert_eq!(first.archive_id, record.backend_id);

        let (_, check) = service.job_check("docs", None).unwrap();
        assert_eq!(check, JobCheck::Pending(first.clone()));

        match service.restore("docs", None, &out, None, false).unwrap() {
            RestoreOutcome::Pending { job, .. } => assert_eq!(job.job_id, first.job_id),
            other => panic!("expected pending, got {:?}", other),
        }
        assert!(!out.exists());
    }

    #[test]
    fn test_fast_tier_needs_no_job() {
        let dir = TempDir::new().unwrap();
        let stash = stash_in(&dir);
        backup(&stash, &dir, Tier::Fast, None);
        let (_, check) = RestoreService::new(&stash).job_check("docs", None).unwrap();
        assert_eq!(check, JobCheck::NotNeeded);
    }

    #[test]
    fn test_tampered_object_is_corrupted() {
        let dir = TempDir::new().unwrap();
        let stash = stash_in(&dir);
        let record = backup(&stash, &dir, Tier::Fast, None);
        stash
            .backends()
            .fast
            .put(&record.backend_id, b"tampered")
            .unwrap();

        let err = RestoreService::new(&stash)
            .restore("docs", None, &dir.path().join("out"), None, false)
            .unwrap_err();
        assert!(matches!(err, StashError::Corrupted(_)));
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let dir = TempDir::new().unwrap();
        let stash = stash_in(&dir);
        backup(&stash, &dir, Tier::Fast, Some(ArchiveKey::generate()));

        let err = RestoreService::new(&stash)
            .restore(
                "docs",
                None,
                &dir.path().join("out"),
                Some(&ArchiveKey::generate()),
                false,
            )
            .unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_unknown_name() {
        let dir = TempDir::new().unwrap();
        let stash = stash_in(&dir);
        let err = RestoreService::new(&stash)
            .restore("nothing", None, dir.path(), None, false)
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
