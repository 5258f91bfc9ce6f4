//! Backup service
//!
//! Build the archive, upload it to the chosen tier, then record it.

use std::path::PathBuf;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{info, warn};

use super::stash::Stash;
use crate::archive::ArchiveBuilder;
use crate::crypto::ArchiveKey;
use crate::error::{StashError, StashResult};
use crate::models::{BackupRecord, Tier};

/// What to back up and how
#[derive(Debug, Clone, Default)]
pub struct BackupRequest {
    pub source: PathBuf,
    /// Logical name; defaults to the source's last component
    pub name: Option<String>,
    /// Defaults to the profile's tier
    pub tier: Option<Tier>,
    pub key: Option<ArchiveKey>,
    pub tags: Vec<String>,
    /// Backup time; defaults to now
    pub created_at: Option<DateTime<Utc>>,
}

impl BackupRequest {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }
}

/// Service for creating backups
pub struct BackupService<'a> {
    stash: &'a Stash,
}

impl<'a> BackupService<'a> {
    pub fn new(stash: &'a Stash) -> Self {
        Self { stash }
    }

    /// Archive, upload and record `request.source`
    pub fn backup(&self, request: BackupRequest) -> StashResult<BackupRecord> {
        let profile = self.stash.profile();
        let tier = profile.tier_or_default(request.tier);
        let backend = self.stash.backend(Some(tier));
        // stored names carry whole seconds
        let created_at = request.created_at.unwrap_or_else(Utc::now).trunc_subsecs(0);

        let archive = ArchiveBuilder::new()
            .compression_level(profile.compression_level)?
            .key(request.key)
            .build(&request.source, request.name.as_deref(), created_at)?;

        if self.stash.inventory().get(&archive.stored_name).is_ok() {
            return Err(StashError::Duplicate {
                entity_type: "Backup",
                identifier: archive.stored_name,
            });
        }

        let backend_id = backend.put(&archive.stored_name, &archive.bytes)?;

        let record = BackupRecord {
            name: archive.name.clone(),
            stored_name: archive.stored_name.clone(),
            fingerprint: archive.fingerprint.clone(),
            tier,
            backend_id,
            backend_hash: profile.credentials().backend_hash(backend.container()),
            created_at,
            size: archive.size(),
            encrypted: archive.encrypted,
            tags: request.tags,
            profile: self.stash.profile_name().to_string(),
        };

        if let Err(e) = self.stash.inventory().record(record.clone()) {
            warn!(
                backend_id = %record.backend_id,
                error = %e,
                "Recording failed; removing uploaded archive"
            );
            if let Err(cleanup) = backend.delete(&record.backend_id) {
                warn!(error = %cleanup, "Failed to remove orphaned archive");
            }
            return Err(e);
        }

        info!(
            stored_name = %record.stored_name,
            tier = %record.tier,
            size = record.size,
            "Backup complete"
        );
        Ok(record)
    }
}
