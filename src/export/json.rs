//! JSON export of an inventory

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StashError, StashResult};
use crate::models::{BackupRecord, InventorySnapshot, Tier};

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full inventory export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryExport {
    pub schema_version: String,
    pub exported_at: DateTime<Utc>,
    /// Version of coldstash that wrote the export
    pub app_version: String,
    pub profile: String,
    pub records: Vec<BackupRecord>,
    pub metadata: ExportMetadata,
}

/// Totals for quick reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub record_count: usize,
    pub fast_count: usize,
    pub cold_count: usize,
    pub encrypted_count: usize,
    /// Stored bytes across all records
    pub total_size: u64,
}

impl InventoryExport {
    pub fn from_snapshot(profile: &str, snapshot: &InventorySnapshot) -> Self {
        let records = snapshot.records.clone();
        let metadata = ExportMetadata {
            record_count: records.len(),
            fast_count: records.iter().filter(|r| r.tier == Tier::Fast).count(),
            cold_count: records.iter().filter(|r| r.tier == Tier::Cold).count(),
            encrypted_count: records.iter().filter(|r| r.encrypted).count(),
            total_size: records.iter().map(|r| r.size).sum(),
        };

        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            profile: profile.to_string(),
            records,
            metadata,
        }
    }
}

/// Write the export as JSON
pub fn export_inventory_json<W: Write>(
    export: &InventoryExport,
    writer: &mut W,
    pretty: bool,
) -> StashResult<()> {
    let result = if pretty {
        serde_json::to_writer_pretty(&mut *writer, export)
    } else {
        serde_json::to_writer(&mut *writer, export)
    };
    result.map_err(|e| StashError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| StashError::Export(e.to_string()))
}
