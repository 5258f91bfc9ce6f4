//! CSV export of inventory records
//!
//! One row per backup, spreadsheet friendly. Tags are joined with `;`.

use std::io::Write;

use crate::error::{StashError, StashResult};
use crate::models::BackupRecord;

const HEADER: [&str; 10] = [
    "stored_name",
    "name",
    "tier",
    "created_at",
    "size",
    "encrypted",
    "fingerprint",
    "backend_id",
    "profile",
    "tags",
];

/// Write `records` as CSV
pub fn export_records_csv<W: Write>(records: &[BackupRecord], writer: W) -> StashResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER).map_err(export_err)?;

    for record in records {
        let tier = record.tier.to_string();
        let created_at = record.created_at.to_rfc3339();
        let size = record.size.to_string();
        let tags = record.tags.join(";");
        csv.write_record([
            record.stored_name.as_str(),
            record.name.as_str(),
            tier.as_str(),
            created_at.as_str(),
            size.as_str(),
            if record.encrypted { "true" } else { "false" },
            record.fingerprint.as_str(),
            record.backend_id.as_str(),
            record.profile.as_str(),
            tags.as_str(),
        ])
        .map_err(export_err)?;
    }

    csv.flush().map_err(|e| StashError::Export(e.to_string()))
}

fn export_err(e: csv::Error) -> StashError {
    StashError::Export(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::fixtures::record_at;

    #[test]
    fn test_csv_rows() {
        let mut tagged = record_at("my, photos", 2024, 3, 1, 12);
        tagged.tags = vec!["home".into(), "weekly".into()];
        let records = vec![record_at("docs", 2024, 1, 1, 0), tagged];

        let mut out = Vec::new();
        export_records_csv(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("stored_name,name,tier,created_at"));
        assert!(lines[1].starts_with("docs.20240101000000.tgz,docs,fast,2024-01-01T00:00:00+00:00,128,false"));
        // the comma in the name forces quoting
        assert!(lines[2].contains("\"my, photos\""));
        assert!(lines[2].ends_with("home;weekly"));
    }

    #[test]
    fn test_empty_export_has_header() {
        let mut out = Vec::new();
        export_records_csv(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
