//! Path management for coldstash
//!
//! ## Path Resolution Order
//!
//! 1. `COLDSTASH_HOME` environment variable (if set)
//! 2. The platform configuration directory joined with `coldstash`
//!    (`~/.config/coldstash` on Linux)

use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::StashError;

/// Environment variable that overrides the base directory
pub const HOME_ENV: &str = "COLDSTASH_HOME";

/// Manages all local paths used by coldstash
#[derive(Debug, Clone)]
pub struct StashPaths {
    base_dir: PathBuf,
}

impl StashPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, StashError> {
        let base_dir = match std::env::var_os(HOME_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create StashPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Path to the append-only audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Path to the local inventory of one profile
    pub fn inventory_file(&self, profile: &str) -> PathBuf {
        self.base_dir.join(format!("inventory-{}.json", profile))
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), StashError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| StashError::Io(format!("Failed to create base directory: {}", e)))
    }

    /// Check if coldstash has been configured (settings file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, StashError> {
    let dirs = BaseDirs::new()
        .ok_or_else(|| StashError::Config("Could not determine home directory".into()))?;
    Ok(dirs.config_dir().join("coldstash"))
}
