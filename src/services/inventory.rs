//! Inventory queries for `info`, `show` and `ls`

use std::collections::BTreeMap;

use super::stash::Stash;
use crate::error::StashResult;
use crate::inventory::InventoryQuery;
use crate::models::{BackupRecord, Tier};

/// Latest version and version count of one logical backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSummary {
    pub name: String,
    pub latest: BackupRecord,
    pub versions: usize,
    /// Stored bytes across all versions
    pub total_size: u64,
}

/// Service for reading the inventory
pub struct InventoryService<'a> {
    stash: &'a Stash,
}

impl<'a> InventoryService<'a> {
    pub fn new(stash: &'a Stash) -> Self {
        Self { stash }
    }

    /// Summary of one logical backup
    pub fn info(&self, name: &str) -> StashResult<Option<BackupSummary>> {
        Ok(self
            .summaries()?
            .into_iter()
            .find(|summary| summary.name == name))
    }

    /// One summary per logical backup name, sorted by name
    pub fn summaries(&self) -> StashResult<Vec<BackupSummary>> {
        let mut by_name: BTreeMap<String, BackupSummary> = BTreeMap::new();
        // inventory order is oldest first, so the last one seen is the latest
        for record in self.stash.inventory().list()? {
            by_name
                .entry(record.name.clone())
                .and_modify(|summary| {
                    summary.versions += 1;
                    summary.total_size += record.size;
                    summary.latest = record.clone();
                })
                .or_insert_with(|| BackupSummary {
                    name: record.name.clone(),
                    total_size: record.size,
                    latest: record.clone(),
                    versions: 1,
                });
        }
        Ok(by_name.into_values().collect())
    }

    /// Records matching `query`
    pub fn show(&self, query: &InventoryQuery) -> StashResult<Vec<BackupRecord>> {
        self.stash.inventory().search(query)
    }

    /// Raw ids stored in a backend
    pub fn list_backend(&self, tier: Option<Tier>) -> StashResult<Vec<String>> {
        self.stash.backend(tier).list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::fixtures::record_at;
    use crate::services::stash::fixtures::stash_in;
    use tempfile::TempDir;

    #[test]
    fn test_summaries_group_by_name() {
        let dir = TempDir::new().unwrap();
        let stash = stash_in(&dir);
        let inventory = stash.inventory();
        inventory.record(record_at("photos", 2024, 1, 1, 0)).unwrap();
        inventory.record(record_at("docs", 2024, 1, 2, 0)).unwrap();
        inventory.record(record_at("photos", 2024, 1, 3, 0)).unwrap();

        let service = InventoryService::new(&stash);
        let summaries = service.summaries().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "docs");

        let photos = service.info("photos").unwrap().unwrap();
        assert_eq!(photos.versions, 2);
        assert_eq!(photos.total_size, 256);
        assert_eq!(photos.latest.stored_name, "photos.20240103000000.tgz");
        assert!(service.info("music").unwrap().is_none());
    }

    #[test]
    fn test_list_backend_includes_mirror() {
        let dir = TempDir::new().unwrap();
        let stash = stash_in(&dir);
        stash.inventory().sync_mirror().unwrap();

        let service = InventoryService::new(&stash);
        assert_eq!(
            service.list_backend(Some(Tier::Fast)).unwrap(),
            vec![stash.profile().mirror_key.clone()]
        );
        assert!(service.list_backend(Some(Tier::Cold)).unwrap().is_empty());
    }
}
