//! Expiry service
//!
//! Explicit deletes, age-based expiry and GFS rotation all end the same
//! way: delete from the backend, then remove from the inventory.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::stash::Stash;
use crate::error::StashResult;
use crate::inventory::InventoryQuery;
use crate::models::BackupRecord;
use crate::rotation::{self, parse_interval, RotationPlan};

/// Service for deleting and rotating backups
pub struct ExpireService<'a> {
    stash: &'a Stash,
}

impl<'a> ExpireService<'a> {
    pub fn new(stash: &'a Stash) -> Self {
        Self { stash }
    }

    /// Delete one backup from its backend and the inventory
    ///
    /// A backend `NotFound` is tolerated so that records whose bytes are
    /// already gone can still be cleaned up.
    pub fn expire(&self, record: &BackupRecord, reason: &str) -> StashResult<BackupRecord> {
        let backend = self.stash.backends().for_tier(record.tier);
        match backend.delete(&record.backend_id) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => warn!(
                stored_name = %record.stored_name,
                backend_id = %record.backend_id,
                "Backend object already gone; removing record anyway"
            ),
            Err(e) => return Err(e),
        }
        self.stash.inventory().remove(&record.stored_name, reason)
    }

    /// Delete a backup by stored name
    pub fn delete(&self, stored_name: &str) -> StashResult<BackupRecord> {
        let record = self.stash.inventory().get(stored_name)?;
        self.expire(&record, "delete")
    }

    /// Delete every backup of `name` older than `interval` (e.g. `3M`)
    pub fn delete_older_than(
        &self,
        name: &str,
        interval: &str,
        now: DateTime<Utc>,
    ) -> StashResult<Vec<BackupRecord>> {
        let cutoff = now - parse_interval(interval)?;
        let query = InventoryQuery::new().name(name).older_than(cutoff);

        let mut deleted = Vec::new();
        for record in self.stash.inventory().search(&query)? {
            if record.name != name {
                continue;
            }
            deleted.push(self.expire(&record, "delete-older-than")?);
        }
        info!(name, interval, count = deleted.len(), "Deleted old backups");
        Ok(deleted)
    }

    /// Classify the backups of `name` with the profile's rotation policy
    pub fn plan_rotation(&self, name: &str, now: DateTime<Utc>) -> StashResult<RotationPlan> {
        let policy = self.stash.profile().rotation_policy()?;
        let records: Vec<BackupRecord> = self
            .stash
            .inventory()
            .search(&InventoryQuery::new().name(name))?
            .into_iter()
            .filter(|r| r.name == name)
            .collect();
        rotation::plan(policy, &records, now)
    }

    /// Apply the rotation policy to `name`; with `dry_run` nothing is deleted
    pub fn rotate(&self, name: &str, now: DateTime<Utc>, dry_run: bool) -> StashResult<RotationPlan> {
        let plan = self.plan_rotation(name, now)?;
        if dry_run {
            return Ok(plan);
        }

        for record in &plan.expire {
            self.expire(record, "rotation")?;
        }
        info!(
            name,
            kept = plan.keep.len(),
            expired = plan.expire.len(),
            "Rotation applied"
        );
        Ok(plan)
    }
}
