//! Inventory search filters

use chrono::{DateTime, Utc};

use crate::models::{BackupRecord, Tier};

/// Filter for inventory searches; empty fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryQuery {
    /// Matches the logical name exactly or a stored-name prefix
    pub name: Option<String>,
    pub tier: Option<Tier>,
    /// Every tag must be present
    pub tags: Vec<String>,
    /// Only records created strictly before this instant
    pub older_than: Option<DateTime<Utc>>,
    pub backend_hash: Option<String>,
}

impl InventoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn tier(mut self, tier: Option<Tier>) -> Self {
        self.tier = tier;
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn older_than(mut self, cutoff: DateTime<Utc>) -> Self {
        self.older_than = Some(cutoff);
        self
    }

    pub fn backend_hash(mut self, hash: impl Into<String>) -> Self {
        self.backend_hash = Some(hash.into());
        self
    }

    pub fn matches(&self, record: &BackupRecord) -> bool {
        if let Some(name) = &self.name {
            if record.name != *name && !record.stored_name.starts_with(name.as_str()) {
                return false;
            }
        }
        if let Some(tier) = self.tier {
            if record.tier != tier {
                return false;
            }
        }
        if !record.has_all_tags(&self.tags) {
            return false;
        }
        if let Some(cutoff) = self.older_than {
            if record.created_at >= cutoff {
                return false;
            }
        }
        if let Some(hash) = &self.backend_hash {
            if record.backend_hash != *hash {
                return false;
            }
        }
        true
    }
}
