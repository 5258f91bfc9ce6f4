//! Local inventory with a fast-tier mirror
//!
//! The inventory file holds the snapshot plus a `mirror_pending` flag. After
//! every mutation the full snapshot is pushed to the fast tier under the
//! mirror key. A failed push leaves the local change in place and sets the
//! flag; the next mutation or an explicit sync pushes again.

use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::query::InventoryQuery;
use crate::audit::{AuditEntry, AuditLogger};
use crate::error::{StashError, StashResult};
use crate::models::{BackupRecord, InventorySnapshot, Tier};
use crate::storage::file_io::{read_json, write_json_atomic};
use crate::storage::StorageBackend;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    mirror_pending: bool,
    #[serde(default)]
    snapshot: InventorySnapshot,
}

/// Durable record of every stored backup for one profile
pub struct InventoryStore {
    path: PathBuf,
    profile: String,
    mirror: Arc<dyn StorageBackend>,
    mirror_key: String,
    audit: Option<AuditLogger>,
    state: RwLock<InventoryFile>,
}

impl InventoryStore {
    /// Load the inventory at `path`, mirroring to `mirror` under `mirror_key`
    pub fn open(
        path: impl Into<PathBuf>,
        profile: impl Into<String>,
        mirror: Arc<dyn StorageBackend>,
        mirror_key: impl Into<String>,
    ) -> StashResult<Self> {
        let path = path.into();
        let mut file: InventoryFile = read_json(&path)?;
        file.snapshot.normalize();

        debug!(
            path = %path.display(),
            records = file.snapshot.len(),
            mirror_pending = file.mirror_pending,
            "Loaded inventory"
        );

        Ok(Self {
            path,
            profile: profile.into(),
            mirror,
            mirror_key: mirror_key.into(),
            audit: None,
            state: RwLock::new(file),
        })
    }

    /// Append every mutation to `logger`
    pub fn with_audit(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(logger);
        self
    }

    pub fn mirror_key(&self) -> &str {
        &self.mirror_key
    }

    fn read_state(&self) -> StashResult<RwLockReadGuard<'_, InventoryFile>> {
        self.state
            .read()
            .map_err(|e| StashError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_state(&self) -> StashResult<RwLockWriteGuard<'_, InventoryFile>> {
        self.state
            .write()
            .map_err(|e| StashError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    fn persist(&self, file: &InventoryFile) -> StashResult<()> {
        write_json_atomic(&self.path, file)
    }

    fn audit(&self, entry: AuditEntry) {
        if let Some(logger) = &self.audit {
            if let Err(e) = logger.log(&entry) {
                warn!(error = %e, "Failed to write audit entry");
            }
        }
    }

    /// Add a record; `Duplicate` if its stored name is already present
    pub fn record(&self, record: BackupRecord) -> StashResult<()> {
        record
            .validate()
            .map_err(|e| StashError::Validation(e.to_string()))?;

        {
            let mut state = self.write_state()?;
            if state.snapshot.contains(&record.stored_name) {
                return Err(StashError::Duplicate {
                    entity_type: "Backup",
                    identifier: record.stored_name,
                });
            }
            let mut next = state.clone();
            next.snapshot.insert(record.clone());
            self.persist(&next)?;
            *state = next;
        }

        info!(stored_name = %record.stored_name, tier = %record.tier, "Recorded backup");
        self.audit(AuditEntry::record(&self.profile, &record));
        self.push_mirror_best_effort();
        Ok(())
    }

    /// Remove a record by stored name
    pub fn remove(&self, stored_name: &str, reason: &str) -> StashResult<BackupRecord> {
        let removed = {
            let mut state = self.write_state()?;
            let mut next = state.clone();
            let removed = next
                .snapshot
                .remove(stored_name)
                .ok_or_else(|| StashError::backup_not_found(stored_name))?;
            self.persist(&next)?;
            *state = next;
            removed
        };

        info!(stored_name, reason, "Removed backup from inventory");
        self.audit(AuditEntry::remove(&self.profile, &removed, reason));
        self.push_mirror_best_effort();
        Ok(removed)
    }

    /// All records in inventory order
    pub fn list(&self) -> StashResult<Vec<BackupRecord>> {
        Ok(self.read_state()?.snapshot.records.clone())
    }

    /// A copy of the current snapshot
    pub fn snapshot(&self) -> StashResult<InventorySnapshot> {
        Ok(self.read_state()?.snapshot.clone())
    }

    pub fn get(&self, stored_name: &str) -> StashResult<BackupRecord> {
        self.read_state()?
            .snapshot
            .get(stored_name)
            .cloned()
            .ok_or_else(|| StashError::backup_not_found(stored_name))
    }

    /// Records matching `query`, in inventory order
    pub fn search(&self, query: &InventoryQuery) -> StashResult<Vec<BackupRecord>> {
        Ok(self
            .read_state()?
            .snapshot
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect())
    }

    /// Most recent record whose name is `name` (or whose stored name starts with it)
    pub fn latest(&self, name: &str, tier: Option<Tier>) -> StashResult<Option<BackupRecord>> {
        let query = InventoryQuery::new().name(name).tier(tier);
        Ok(self.search(&query)?.into_iter().last())
    }

    /// Whether the last mirror push failed
    pub fn is_mirror_pending(&self) -> StashResult<bool> {
        Ok(self.read_state()?.mirror_pending)
    }

    fn push_mirror(&self) -> StashResult<()> {
        let bytes = {
            let state = self.read_state()?;
            serde_json::to_vec_pretty(&state.snapshot)?
        };
        self.mirror.put(&self.mirror_key, &bytes)?;
        debug!(key = %self.mirror_key, size = bytes.len(), "Pushed inventory mirror");
        Ok(())
    }

    fn set_mirror_pending(&self, pending: bool) -> StashResult<()> {
        let mut state = self.write_state()?;
        if state.mirror_pending != pending {
            let mut next = state.clone();
            next.mirror_pending = pending;
            self.persist(&next)?;
            *state = next;
        }
        Ok(())
    }

    /// Push after a local change that is already saved; failures only warn
    fn push_mirror_best_effort(&self) {
        let pending = match self.push_mirror() {
            Ok(()) => false,
            Err(e) => {
                warn!(
                    key = %self.mirror_key,
                    error = %e,
                    "Inventory mirror push failed; will retry on next change or sync"
                );
                true
            }
        };
        if let Err(e) = self.set_mirror_pending(pending) {
            warn!(error = %e, pending, "Failed to save mirror pending flag");
        }
    }

    /// Push the snapshot to the mirror, failing loudly
    pub fn sync_mirror(&self) -> StashResult<()> {
        if let Err(e) = self.push_mirror() {
            self.set_mirror_pending(true)?;
            return Err(e);
        }
        self.set_mirror_pending(false)?;
        info!(key = %self.mirror_key, "Inventory mirror synced");
        Ok(())
    }

    /// Read the mirrored snapshot
    pub fn fetch_mirror(&self) -> StashResult<InventorySnapshot> {
        let bytes = self.mirror.get(&self.mirror_key)?;
        let mut snapshot: InventorySnapshot = serde_json::from_slice(&bytes).map_err(|e| {
            StashError::Corrupted(format!("mirror {} is not an inventory: {}", self.mirror_key, e))
        })?;
        snapshot.normalize();
        Ok(snapshot)
    }

    /// Replace the local inventory with the mirrored copy
    pub fn restore_from_mirror(&self) -> StashResult<usize> {
        let snapshot = self.fetch_mirror()?;
        let count = snapshot.len();
        {
            let mut state = self.write_state()?;
            let next = InventoryFile {
                mirror_pending: false,
                snapshot,
            };
            self.persist(&next)?;
            *state = next;
        }

        info!(records = count, key = %self.mirror_key, "Restored inventory from mirror");
        self.audit(AuditEntry::replace(&self.profile, &self.mirror_key, count));
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::fixtures::record_at;
    use crate::storage::{Credentials, LocalObjectStore};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    const KEY: &str = "coldstash-inventory.json";

    fn bucket(dir: &TempDir) -> Arc<LocalObjectStore> {
        Arc::new(
            LocalObjectStore::open(dir.path().join("bucket"), &Credentials::new("AKIA", "s"))
                .unwrap(),
        )
    }

    fn open_store(dir: &TempDir, mirror: Arc<dyn StorageBackend>) -> InventoryStore {
        InventoryStore::open(dir.path().join("inventory.json"), "default", mirror, KEY).unwrap()
    }

    /// Fast-tier stand-in whose uploads can be switched off
    struct FlakyMirror {
        inner: Arc<LocalObjectStore>,
        down: AtomicBool,
    }

    impl StorageBackend for FlakyMirror {
        fn tier(&self) -> Tier {
            Tier::Fast
        }
        fn container(&self) -> &str {
            self.inner.container()
        }
        fn put(&self, name: &str, bytes: &[u8]) -> StashResult<String> {
            if self.down.load(Ordering::SeqCst) {
                return Err(StashError::Storage("connection refused".into()));
            }
            self.inner.put(name, bytes)
        }
        fn get(&self, id: &str) -> StashResult<Vec<u8>> {
            self.inner.get(id)
        }
        fn delete(&self, id: &str) -> StashResult<()> {
            self.inner.delete(id)
        }
        fn list(&self) -> StashResult<Vec<String>> {
            self.inner.list()
        }
    }

    #[test]
    fn test_record_list_and_mirror() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, bucket(&dir));

        store.record(record_at("b", 2024, 2, 1, 0)).unwrap();
        store.record(record_at("a", 2024, 1, 1, 0)).unwrap();

        let names: Vec<_> = store.list().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(store.fetch_mirror().unwrap(), store.snapshot().unwrap());
        assert!(!store.is_mirror_pending().unwrap());
    }

    #[test]
    fn test_duplicate_rejected() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, bucket(&dir));
        store.record(record_at("a", 2024, 1, 1, 0)).unwrap();

        let err = store.record(record_at("a", 2024, 1, 1, 0)).unwrap_err();
        assert!(matches!(err, StashError::Duplicate { .. }));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_and_not_found() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, bucket(&dir));
        let record = record_at("a", 2024, 1, 1, 0);
        store.record(record.clone()).unwrap();

        let removed = store.remove(&record.stored_name, "delete").unwrap();
        assert_eq!(removed, record);
        assert!(store.fetch_mirror().unwrap().is_empty());
        assert!(store
            .remove(&record.stored_name, "delete")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let mirror = bucket(&dir);
        {
            let store = open_store(&dir, mirror.clone());
            store.record(record_at("a", 2024, 1, 1, 0)).unwrap();
        }
        let store = open_store(&dir, mirror);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_mirror_failure_keeps_local_change_and_recovers() {
        let dir = TempDir::new().unwrap();
        let flaky = Arc::new(FlakyMirror {
            inner: bucket(&dir),
            down: AtomicBool::new(true),
        });
        let store = open_store(&dir, flaky.clone());

        store.record(record_at("a", 2024, 1, 1, 0)).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
        assert!(store.is_mirror_pending().unwrap());
        assert!(store.fetch_mirror().unwrap_err().is_not_found());
        assert!(store.sync_mirror().is_err());

        flaky.down.store(false, Ordering::SeqCst);
        store.record(record_at("b", 2024, 1, 2, 0)).unwrap();
        assert!(!store.is_mirror_pending().unwrap());
        assert_eq!(store.fetch_mirror().unwrap(), store.snapshot().unwrap());
    }

    #[test]
    fn test_pending_flag_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let flaky = Arc::new(FlakyMirror {
            inner: bucket(&dir),
            down: AtomicBool::new(true),
        });
        open_store(&dir, flaky.clone())
            .record(record_at("a", 2024, 1, 1, 0))
            .unwrap();

        flaky.down.store(false, Ordering::SeqCst);
        let store = open_store(&dir, flaky);
        assert!(store.is_mirror_pending().unwrap());
        store.sync_mirror().unwrap();
        assert!(!store.is_mirror_pending().unwrap());
    }

    #[test]
    fn test_restore_from_mirror_after_local_loss() {
        let dir = TempDir::new().unwrap();
        let mirror = bucket(&dir);
        {
            let store = open_store(&dir, mirror.clone());
            store.record(record_at("a", 2024, 1, 1, 0)).unwrap();
            store.record(record_at("b", 2024, 1, 2, 0)).unwrap();
        }
        std::fs::remove_file(dir.path().join("inventory.json")).unwrap();

        let store = open_store(&dir, mirror);
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.restore_from_mirror().unwrap(), 2);
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_latest_and_search() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, bucket(&dir));
        store.record(record_at("photos", 2024, 1, 1, 0)).unwrap();
        store.record(record_at("photos", 2024, 3, 1, 0)).unwrap();
        store.record(record_at("docs", 2024, 4, 1, 0)).unwrap();

        let latest = store.latest("photos", None).unwrap().unwrap();
        assert_eq!(latest.stored_name, "photos.20240301000000.tgz");
        assert!(store.latest("photos", Some(Tier::Cold)).unwrap().is_none());
        assert_eq!(
            store
                .search(&InventoryQuery::new().name("photos"))
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_mutations_are_audited() {
        let dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(dir.path().join("audit.log"));
        let store = open_store(&dir, bucket(&dir)).with_audit(logger.clone());
        let record = record_at("a", 2024, 1, 1, 0);

        store.record(record.clone()).unwrap();
        store.remove(&record.stored_name, "delete").unwrap();

        assert_eq!(logger.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_save_leaves_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, bucket(&dir));
        let kept = record_at("a", 2024, 1, 1, 0);
        store.record(kept.clone()).unwrap();

        // a directory where the temp file goes makes every save fail
        let blocker = dir.path().join("inventory.json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        assert!(store.record(record_at("b", 2024, 1, 2, 0)).is_err());
        assert!(store.remove(&kept.stored_name, "delete").is_err());
        assert_eq!(store.list().unwrap(), vec![kept.clone()]);

        std::fs::remove_dir(&blocker).unwrap();
        store.record(record_at("c", 2024, 1, 3, 0)).unwrap();
        let names: Vec<_> = store.list().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(store.fetch_mirror().unwrap(), store.snapshot().unwrap());
    }

    #[test]
    fn test_invalid_record_rejected() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, bucket(&dir));
        let mut record = record_at("a", 2024, 1, 1, 0);
        record.fingerprint = "nope".into();
        assert!(matches!(
            store.record(record),
            Err(StashError::Validation(_))
        ));
    }
}
