//! Inventory export
//!
//! - CSV: one row per backup (spreadsheet-compatible)
//! - JSON: full inventory with metadata, machine-readable
//! - YAML: the same document, human-readable

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::export_records_csv;
pub use json::{export_inventory_json, ExportMetadata, InventoryExport, EXPORT_SCHEMA_VERSION};
pub use yaml::export_inventory_yaml;
