//! Audit entry data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::BackupRecord;

/// Inventory mutations that get audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// A backup was added to the inventory
    Record,
    /// A backup was removed (explicit delete or rotation)
    Remove,
    /// The whole inventory was replaced from the mirror
    Replace,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Record => write!(f, "RECORD"),
            Operation::Remove => write!(f, "REMOVE"),
            Operation::Replace => write!(f, "REPLACE"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    /// Profile whose inventory changed
    pub profile: String,

    /// Stored name of the affected backup, or the mirror key for replacements
    pub target: String,

    /// Why the mutation happened (e.g. "rotation", "delete")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Record added or removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<serde_json::Value>,
}

impl AuditEntry {
    pub fn record(profile: impl Into<String>, record: &BackupRecord) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Record,
            profile: profile.into(),
            target: record.stored_name.clone(),
            reason: None,
            record: serde_json::to_value(record).ok(),
        }
    }

    pub fn remove(
        profile: impl Into<String>,
        record: &BackupRecord,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Remove,
            profile: profile.into(),
            target: record.stored_name.clone(),
            reason: Some(reason.into()),
            record: serde_json::to_value(record).ok(),
        }
    }

    /// The local inventory was overwritten with `record_count` records from `mirror_key`
    pub fn replace(profile: impl Into<String>, mirror_key: &str, record_count: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Replace,
            profile: profile.into(),
            target: mirror_key.to_string(),
            reason: Some(format!("restored {} records from mirror", record_count)),
            record: None,
        }
    }

    /// One-line summary for terminal output
    pub fn format_human_readable(&self) -> String {
        let mut line = format!(
            "[{}] {} {} ({})",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.target,
            self.profile
        );
        if let Some(reason) = &self.reason {
            line.push_str(&format!(": {}", reason));
        }
        line
    }
}
