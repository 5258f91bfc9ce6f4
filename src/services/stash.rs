//! Per-profile coordinator
//!
//! Opens the profile's backends and inventory once and hands them to the
//! services.

use std::sync::Arc;

use tracing::debug;

use crate::audit::AuditLogger;
use crate::config::{Profile, Settings, StashPaths};
use crate::error::StashResult;
use crate::inventory::InventoryStore;
use crate::models::Tier;
use crate::storage::{Backends, StorageBackend};

/// Everything a command needs for one profile
pub struct Stash {
    paths: StashPaths,
    profile_name: String,
    profile: Profile,
    backends: Backends,
    inventory: InventoryStore,
}

impl Stash {
    /// Open a configured profile
    pub fn open(paths: StashPaths, profile_name: &str) -> StashResult<Self> {
        let settings = Settings::load_or_create(&paths)?;
        let profile = settings.profile(profile_name)?.clone();
        Self::with_profile(paths, profile_name, profile)
    }

    /// Open with an explicit profile, bypassing the settings file
    pub fn with_profile(paths: StashPaths, profile_name: &str, profile: Profile) -> StashResult<Self> {
        paths.ensure_directories()?;
        let backends = Backends::open(&profile)?;
        let inventory = InventoryStore::open(
            paths.inventory_file(profile_name),
            profile_name,
            backends.fast.clone(),
            profile.mirror_key.clone(),
        )?
        .with_audit(AuditLogger::new(paths.audit_log()));

        debug!(
            profile = profile_name,
            bucket = %profile.bucket.display(),
            vault = %profile.vault.display(),
            "Opened stash"
        );

        Ok(Self {
            paths,
            profile_name: profile_name.to_string(),
            profile,
            backends,
            inventory,
        })
    }

    pub fn paths(&self) -> &StashPaths {
        &self.paths
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    pub fn inventory(&self) -> &InventoryStore {
        &self.inventory
    }

    /// Backend for `tier`, or the profile's default tier
    pub fn backend(&self, tier: Option<Tier>) -> Arc<dyn StorageBackend> {
        self.backends.for_tier(self.profile.tier_or_default(tier))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::stash_in;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_unconfigured_profile_fails() {
        let dir = TempDir::new().unwrap();
        let paths = StashPaths::with_base_dir(dir.path().to_path_buf());
        assert!(Stash::open(paths, "default").is_err());
    }

    #[test]
    fn test_open_from_settings() {
        let dir = TempDir::new().unwrap();
        let paths = StashPaths::with_base_dir(dir.path().join("home"));
        let mut settings = Settings::default();
        settings.upsert_profile(
            "work",
            Profile::new("AKIA", "s", dir.path().join("b"), dir.path().join("v")),
        );
        settings.save(&paths).unwrap();

        let stash = Stash::open(paths, "work").unwrap();
        assert_eq!(stash.profile_name(), "work");
        assert_eq!(stash.backend(None).tier(), Tier::Fast);
        assert_eq!(stash.backend(Some(Tier::Cold)).tier(), Tier::Cold);
    }

    #[test]
    fn test_empty_inventory_syncs_to_bucket() {
        let dir = TempDir::new().unwrap();
        let stash = stash_in(&dir);
        stash.inventory().sync_mirror().unwrap();
        assert!(stash
            .backends()
            .fast
            .exists(&stash.profile().mirror_key)
            .unwrap());
    }
}
