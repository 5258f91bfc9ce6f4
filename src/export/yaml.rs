//! YAML export of an inventory

use std::io::Write;

use crate::error::{StashError, StashResult};
use crate::export::json::InventoryExport;

/// Write the export as YAML with a short comment header
pub fn export_inventory_yaml<W: Write>(export: &InventoryExport, writer: &mut W) -> StashResult<()> {
    let header = format!(
        "# coldstash inventory export\n# Profile: {}\n# Generated: {}\n# App Version: {}\n\n",
        export.profile, export.exported_at, export.app_version
    );
    writer
        .write_all(header.as_bytes())
        .map_err(|e| StashError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, export).map_err(|e| StashError::Export(e.to_string()))
}
