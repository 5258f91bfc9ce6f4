//! Inventory export command

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::error::{StashError, StashResult};
use crate::export::{export_inventory_json, export_inventory_yaml, export_records_csv, InventoryExport};
use crate::services::Stash;

/// Export format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// One row per backup
    Csv,
    /// Full inventory with metadata
    Json,
    /// Full inventory, human-readable
    Yaml,
}

/// Arguments for `export`
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file path
    pub output: PathBuf,

    /// Export format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Handle `export`
pub fn handle_export(stash: &Stash, args: ExportArgs) -> StashResult<()> {
    let file = File::create(&args.output).map_err(|e| {
        StashError::Export(format!(
            "Failed to create {}: {}",
            args.output.display(),
            e
        ))
    })?;
    let mut writer = BufWriter::new(file);

    let snapshot = stash.inventory().snapshot()?;
    match args.format {
        ExportFormat::Csv => export_records_csv(&snapshot.records, &mut writer)?,
        ExportFormat::Json => {
            let export = InventoryExport::from_snapshot(stash.profile_name(), &snapshot);
            export_inventory_json(&export, &mut writer, args.pretty)?;
        }
        ExportFormat::Yaml => {
            let export = InventoryExport::from_snapshot(stash.profile_name(), &snapshot);
            export_inventory_yaml(&export, &mut writer)?;
        }
    }
    writer
        .flush()
        .map_err(|e| StashError::Export(e.to_string()))?;

    println!(
        "Exported {} backup record(s) to {}",
        snapshot.len(),
        args.output.display()
    );
    Ok(())
}
