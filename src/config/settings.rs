//! User settings for coldstash
//!
//! Settings hold one [`Profile`] per named set of credentials and store
//! roots, mirroring the `--profile` flag of every command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::paths::StashPaths;
use crate::error::{StashError, StashResult};
use crate::models::Tier;
use crate::rotation::RotationPolicy;
use crate::storage::credentials::Credentials;
use crate::storage::file_io::{read_json, write_json_atomic};

/// Name of the profile used when none is given
pub const DEFAULT_PROFILE: &str = "default";

/// Key the inventory mirror is written under in the fast tier
pub const DEFAULT_MIRROR_KEY: &str = "coldstash-inventory.json";

/// Region recorded when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Credentials, store roots and policies for one profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Access key identifying the user to both stores
    pub access_key: String,

    /// Secret key checked by both stores
    #[serde(default)]
    pub secret_key: String,

    /// Root of the fast-tier object store
    pub bucket: PathBuf,

    /// Root of the cold-tier vault
    pub vault: PathBuf,

    /// Tier used when a command does not name one
    #[serde(default)]
    pub default_tier: Tier,

    #[serde(default = "default_region")]
    pub region: String,

    /// Fast-tier key holding the inventory mirror
    #[serde(default = "default_mirror_key")]
    pub mirror_key: String,

    /// Seconds before a cold-tier retrieval job is ready
    #[serde(default)]
    pub retrieval_delay_secs: u64,

    /// Seconds between polls while waiting on a retrieval job
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// gzip level, 0-9
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,

    /// Grandfather-father-son rotation counts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<RotationPolicy>,
}

/// Longest cold-tier retrieval delay a profile may configure (30 days)
pub const MAX_RETRIEVAL_DELAY_SECS: u64 = 30 * 24 * 60 * 60;

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_mirror_key() -> String {
    DEFAULT_MIRROR_KEY.to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_compression_level() -> u32 {
    6
}

impl Profile {
    /// Create a profile with default policies
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        bucket: impl Into<PathBuf>,
        vault: impl Into<PathBuf>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            bucket: bucket.into(),
            vault: vault.into(),
            default_tier: Tier::default(),
            region: default_region(),
            mirror_key: default_mirror_key(),
            retrieval_delay_secs: 0,
            poll_interval_secs: default_poll_interval(),
            compression_level: default_compression_level(),
            rotation: None,
        }
    }

    /// Credentials presented to the stores
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.access_key.clone(), self.secret_key.as_str())
    }

    /// The configured rotation policy
    ///
    /// # Errors
    ///
    /// Returns `PolicyViolation` when no policy has been configured.
    pub fn rotation_policy(&self) -> StashResult<&RotationPolicy> {
        self.rotation.as_ref().ok_or_else(|| {
            StashError::PolicyViolation(
                "no rotation policy configured; run `coldstash configure-rotation`".into(),
            )
        })
    }

    /// Retrieval delay as a duration
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the delay exceeds [`MAX_RETRIEVAL_DELAY_SECS`].
    pub fn retrieval_delay(&self) -> StashResult<Duration> {
        let secs = self.retrieval_delay_secs;
        if secs > MAX_RETRIEVAL_DELAY_SECS {
            return Err(StashError::Validation(format!(
                "retrieval delay must be at most {}s, got {}s",
                MAX_RETRIEVAL_DELAY_SECS, secs
            )));
        }
        i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                StashError::Validation(format!("retrieval delay {}s is out of range", secs))
            })
    }

    /// Resolve the tier for a command, falling back to the profile default
    pub fn tier_or_default(&self, tier: Option<Tier>) -> Tier {
        tier.unwrap_or(self.default_tier)
    }
}

/// User settings for coldstash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Profiles keyed by name
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return empty settings if the file doesn't exist
    pub fn load_or_create(paths: &StashPaths) -> StashResult<Self> {
        read_json(paths.settings_file())
            .map_err(|e| StashError::Config(format!("Failed to load settings: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &StashPaths) -> StashResult<()> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> StashResult<&Profile> {
        self.profiles.get(name).ok_or_else(|| {
            StashError::Config(format!(
                "profile '{}' is not configured; run `coldstash configure --profile {}`",
                name, name
            ))
        })
    }

    /// Look up a profile by name for modification
    pub fn profile_mut(&mut self, name: &str) -> StashResult<&mut Profile> {
        self.profiles
            .get_mut(name)
            .ok_or_else(|| StashError::profile_not_found(name))
    }

    /// Insert or replace a profile
    pub fn upsert_profile(&mut self, name: impl Into<String>, profile: Profile) {
        self.profiles.insert(name.into(), profile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.schema_version, 1);
        assert!(settings.profiles.is_empty());
    }

    #[test]
    fn test_retrieval_delay_bounds() {
        let mut profile = Profile::new("AKIA1", "s3cret", "/srv/bucket", "/srv/vault");
        profile.retrieval_delay_secs = 3_600;
        assert_eq!(profile.retrieval_delay().unwrap(), Duration::hours(1));

        profile.retrieval_delay_secs = MAX_RETRIEVAL_DELAY_SECS;
        assert!(profile.retrieval_delay().is_ok());

        for secs in [MAX_RETRIEVAL_DELAY_SECS + 1, 10_000_000_000_000_000, u64::MAX] {
            profile.retrieval_delay_secs = secs;
            assert!(matches!(
                profile.retrieval_delay(),
                Err(StashError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_missing_profile_is_config_error() {
        let settings = Settings::default();
        let err = settings.profile("default").unwrap_err();
        assert!(matches!(err, StashError::Config(_)));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = StashPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        let mut profile = Profile::new("AKIA1", "s3cret", "/srv/bucket", "/srv/vault");
        profile.default_tier = Tier::Cold;
        profile.rotation = Some(RotationPolicy::new(7, 4, 12, 1));
        settings.upsert_profile("work", profile);
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        let profile = loaded.profile("work").unwrap();
        assert_eq!(profile.access_key, "AKIA1");
        assert_eq!(profile.default_tier, Tier::Cold);
        assert_eq!(profile.mirror_key, DEFAULT_MIRROR_KEY);
        assert_eq!(profile.rotation_policy().unwrap().days, 7);
    }

    #[test]
    fn test_profile_without_rotation_is_policy_violation() {
        let profile = Profile::new("a", "b", "/bucket", "/vault");
        assert!(profile.rotation_policy().unwrap_err().is_policy_violation());
    }

    #[test]
    fn test_partial_profile_uses_defaults() {
        let json = r#"{
            "profiles": {
                "default": { "access_key": "k", "bucket": "/b", "vault": "/v" }
            }
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        let profile = settings.profile("default").unwrap();
        assert_eq!(profile.default_tier, Tier::Fast);
        assert_eq!(profile.region, DEFAULT_REGION);
        assert_eq!(profile.compression_level, 6);
        assert!(profile.rotation.is_none());
    }
}
