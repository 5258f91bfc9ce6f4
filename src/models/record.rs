//! Backup record model
//!
//! One record per stored backup. Records are immutable: the inventory only
//! ever adds or removes them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::tier::Tier;

/// A stored backup and where to find it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Logical backup name (usually the source's last path component)
    pub name: String,

    /// Name the archive was stored under, unique within an inventory
    pub stored_name: String,

    /// Hex SHA-256 of the exact bytes handed to the backend
    pub fingerprint: String,

    /// Backend kind
    pub tier: Tier,

    /// Identifier assigned by the backend (object key or vault archive id)
    pub backend_id: String,

    /// Scopes the record to the credentials and container it was written with
    pub backend_hash: String,

    pub created_at: DateTime<Utc>,

    /// Stored size in bytes
    pub size: u64,

    #[serde(default)]
    pub encrypted: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Profile the backup was made under
    #[serde(default)]
    pub profile: String,
}

impl BackupRecord {
    /// Check if the record carries a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Check if the record carries every one of `tags`
    pub fn has_all_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|t| self.has_tag(t))
    }

    /// How old the backup is relative to `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Inventory ordering: creation time, then stored name
    pub fn order(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.stored_name.cmp(&other.stored_name))
    }

    /// Validate the record before it enters an inventory
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.name.trim().is_empty() {
            return Err(RecordValidationError::EmptyName);
        }
        if self.stored_name.trim().is_empty() {
            return Err(RecordValidationError::EmptyStoredName);
        }
        if self.backend_id.trim().is_empty() {
            return Err(RecordValidationError::EmptyBackendId);
        }
        if self.fingerprint.len() != 64 || !self.fingerprint.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(RecordValidationError::BadFingerprint(self.fingerprint.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for BackupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {} bytes)", self.stored_name, self.tier, self.size)
    }
}

/// Validation errors for backup records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    EmptyName,
    EmptyStoredName,
    EmptyBackendId,
    BadFingerprint(String),
}

impl fmt::Display for RecordValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Backup name cannot be empty"),
            Self::EmptyStoredName => write!(f, "Stored name cannot be empty"),
            Self::EmptyBackendId => write!(f, "Backend id cannot be empty"),
            Self::BadFingerprint(fp) => {
                write!(f, "Fingerprint is not a hex SHA-256 digest: '{}'", fp)
            }
        }
    }
}

impl std::error::Error for RecordValidationError {}


#[cfg(test)]
mod tests {
    use super::fixtures::record_at;
    use super::*;

    #[test]
    fn test_validate_ok() {
        assert!(record_at("photos", 2024, 1, 1, 0).validate().is_ok());
    }

    #[test]
    fn test_validate_bad_fingerprint() {
        let mut record = record_at("photos", 2024, 1, 1, 0);
        record.fingerprint = "xyz".into();
        assert!(matches!(
            record.validate(),
            Err(RecordValidationError::BadFingerprint(_))
        ));
    }

    #[test]
    fn test_validate_empty_name() {
        let mut record = record_at("photos", 2024, 1, 1, 0);
        record.name = "  ".into();
        assert_eq!(record.validate(), Err(RecordValidationError::EmptyName));
    }

    #[test]
    fn test_ordering_by_time_then_name() {
        let a = record_at("a", 2024, 1, 1, 0);
        let b = record_at("b", 2024, 1, 1, 0);
        let older = record_at("z", 2023, 12, 31, 0);
        assert_eq!(a.order(&b), Ordering::Less);
        assert_eq!(older.order(&a), Ordering::Less);
    }

    #[test]
    fn test_tags() {
        let mut record = record_at("photos", 2024, 1, 1, 0);
        record.tags = vec!["home".into(), "weekly".into()];
        assert!(record.has_tag("home"));
        assert!(record.has_all_tags(&["home".into(), "weekly".into()]));
        assert!(!record.has_all_tags(&["home".into(), "work".into()]));
    }

    #[test]
    fn test_legacy_record_without_optional_fields() {
        let json = r#"{
            "name": "photos",
            "stored_name": "photos.20240101000000.tgz",
            "fingerprint": "00",
            "tier": "cold",
            "backend_id": "arc-1",
            "backend_hash": "ff",
            "created_at": "2024-01-01T00:00:00Z",
            "size": 10
        }"#;
        let record: BackupRecord = serde_json::from_str(json).unwrap();
        assert!(!record.encrypted);
        assert!(record.tags.is_empty());
        assert_eq!(record.tier, Tier::Cold);
    }
}
