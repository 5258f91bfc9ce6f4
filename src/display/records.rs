//! Inventory tables
//!
//! Formats records, per-name summaries and rotation plans for the terminal.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::format_size;
use crate::models::BackupRecord;
use crate::rotation::RotationPlan;
use crate::services::BackupSummary;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Stored Name")]
    stored_name: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Created (UTC)")]
    created: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Enc")]
    encrypted: &'static str,
    #[tabled(rename = "Tags")]
    tags: String,
}

impl From<&BackupRecord> for RecordRow {
    fn from(record: &BackupRecord) -> Self {
        Self {
            stored_name: record.stored_name.clone(),
            tier: record.tier.to_string(),
            created: record.created_at.format(TIME_FORMAT).to_string(),
            size: format_size(record.size),
            encrypted: if record.encrypted { "yes" } else { "" },
            tags: record.tags.join(", "),
        }
    }
}

/// Format inventory records as a table
pub fn format_record_list(records: &[BackupRecord]) -> String {
    if records.is_empty() {
        return "No backups found.".to_string();
    }

    let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
    let total: u64 = records.iter().map(|r| r.size).sum();

    format!(
        "{}\n{} backup(s), {}",
        Table::new(rows).with(Style::psql()),
        records.len(),
        format_size(total)
    )
}

/// Multi-line detail view of one record
pub fn format_record_details(record: &BackupRecord) -> String {
    let mut output = String::new();
    output.push_str(&format!("Stored name:  {}\n", record.stored_name));
    output.push_str(&format!("Name:         {}\n", record.name));
    output.push_str(&format!("Tier:         {}\n", record.tier));
    output.push_str(&format!("Backend id:   {}\n", record.backend_id));
    output.push_str(&format!(
        "Created:      {} UTC\n",
        record.created_at.format(TIME_FORMAT)
    ));
    output.push_str(&format!("Size:         {}\n", format_size(record.size)));
    output.push_str(&format!(
        "Encrypted:    {}\n",
        if record.encrypted { "yes" } else { "no" }
    ));
    output.push_str(&format!("Fingerprint:  {}\n", record.fingerprint));
    if !record.tags.is_empty() {
        output.push_str(&format!("Tags:         {}\n", record.tags.join(", ")));
    }
    output
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Latest (UTC)")]
    latest: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Versions")]
    versions: usize,
    #[tabled(rename = "Total Size")]
    total_size: String,
}

/// Format per-name summaries as a table
pub fn format_summary_list(summaries: &[BackupSummary]) -> String {
    if summaries.is_empty() {
        return "No backups found.".to_string();
    }

    let rows: Vec<SummaryRow> = summaries
        .iter()
        .map(|s| SummaryRow {
            name: s.name.clone(),
            latest: s.latest.created_at.format(TIME_FORMAT).to_string(),
            tier: s.latest.tier.to_string(),
            versions: s.versions,
            total_size: format_size(s.total_size),
        })
        .collect();

    Table::new(rows).with(Style::psql()).to_string()
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Action")]
    action: &'static str,
    #[tabled(rename = "Stored Name")]
    stored_name: String,
    #[tabled(rename = "Created (UTC)")]
    created: String,
    #[tabled(rename = "Kept By")]
    reasons: String,
}

/// Format a rotation plan, kept backups first
pub fn format_rotation_plan(plan: &RotationPlan) -> String {
    if plan.keep.is_empty() && plan.expire.is_empty() {
        return "No backups to rotate.".to_string();
    }

    let kept = plan.keep.iter().map(|kept| PlanRow {
        action: "keep",
        stored_name: kept.record.stored_name.clone(),
        created: kept.record.created_at.format(TIME_FORMAT).to_string(),
        reasons: kept
            .reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    });
    let expired = plan.expire.iter().map(|record| PlanRow {
        action: "expire",
        stored_name: record.stored_name.clone(),
        created: record.created_at.format(TIME_FORMAT).to_string(),
        reasons: String::new(),
    });

    format!(
        "{}\nKeep {}, expire {}",
        Table::new(kept.chain(expired)).with(Style::psql()),
        plan.keep.len(),
        plan.expire.len()
    )
}
