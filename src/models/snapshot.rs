//! Inventory snapshot model
//!
//! The full set of records for one profile. The same JSON object is written
//! locally and to the fast-tier mirror.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::BackupRecord;

/// Current snapshot schema version
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Ordered collection of backup records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Time of the last mutation
    pub updated_at: DateTime<Utc>,

    /// Records ordered by (created_at, stored_name)
    #[serde(default)]
    pub records: Vec<BackupRecord>,
}

fn default_schema_version() -> u32 {
    SNAPSHOT_SCHEMA_VERSION
}

impl Default for InventorySnapshot {
    fn default() -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            updated_at: Utc::now(),
            records: Vec::new(),
        }
    }
}

impl InventorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find a record by stored name
    pub fn get(&self, stored_name: &str) -> Option<&BackupRecord> {
        self.records.iter().find(|r| r.stored_name == stored_name)
    }

    pub fn contains(&self, stored_name: &str) -> bool {
        self.get(stored_name).is_some()
    }

    /// Insert keeping the (created_at, stored_name) order
    ///
    /// The caller is responsible for rejecting duplicates.
    pub fn insert(&mut self, record: BackupRecord) {
        let at = self
            .records
            .partition_point(|existing| existing.order(&record).is_lt());
        self.records.insert(at, record);
        self.updated_at = Utc::now();
    }

    /// Remove a record by stored name
    pub fn remove(&mut self, stored_name: &str) -> Option<BackupRecord> {
        let index = self
            .records
            .iter()
            .position(|r| r.stored_name == stored_name)?;
        self.updated_at = Utc::now();
        Some(self.records.remove(index))
    }

    /// Restore the ordering invariant after loading from an untrusted source
    pub fn normalize(&mut self) {
        self.records.sort_by(|a, b| a.order(b));
    }
}
