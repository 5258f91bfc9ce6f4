//! Stored-name formatting and parsing
//!
//! Stored names look like `photos.20240501120000.tgz`, with `.enc` appended
//! for encrypted archives. Older backups used `photos20240501120000.tgz`,
//! without the dot before the date; both forms parse.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::{StashError, StashResult};

/// Timestamp component of a stored name (UTC)
pub const DATE_FORMAT: &str = "%Y%m%d%H%M%S";

pub const TARBALL_EXT: &str = ".tgz";
pub const ENCRYPTED_EXT: &str = ".enc";

const DATE_LEN: usize = 14;

/// Components recovered from a stored name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub encrypted: bool,
}

/// Build the stored name for a backup
pub fn stored_name(name: &str, created_at: DateTime<Utc>, encrypted: bool) -> String {
    let mut stored = format!("{}.{}{}", name, created_at.format(DATE_FORMAT), TARBALL_EXT);
    if encrypted {
        stored.push_str(ENCRYPTED_EXT);
    }
    stored
}

/// Parse a stored name in either the current or the legacy form
pub fn parse_stored_name(stored: &str) -> Option<ParsedName> {
    let (rest, encrypted) = match stored.strip_suffix(ENCRYPTED_EXT) {
        Some(rest) => (rest, true),
        None => (stored, false),
    };
    let rest = rest.strip_suffix(TARBALL_EXT)?;
    if rest.len() < DATE_LEN || !rest.is_char_boundary(rest.len() - DATE_LEN) {
        return None;
    }

    let (head, date) = rest.split_at(rest.len() - DATE_LEN);
    if !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let name = head.strip_suffix('.').unwrap_or(head);
    if name.is_empty() {
        return None;
    }

    let naive = NaiveDateTime::parse_from_str(date, DATE_FORMAT).ok()?;
    Some(ParsedName {
        name: name.to_string(),
        created_at: Utc.from_utc_datetime(&naive),
        encrypted,
    })
}

/// Strip `.tgz` or `.tar.gz` from a file name
pub fn strip_tarball_ext(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(".tar.gz")
        .or_else(|| file_name.strip_suffix(TARBALL_EXT))
        .filter(|stem| !stem.is_empty())
}

/// Default backup name for a source path: its last component
pub fn backup_name(source: &Path) -> StashResult<String> {
    source
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            StashError::Validation(format!(
                "cannot derive a backup name from '{}'; pass --name",
                source.display()
            ))
        })
}

/// Backup names become part of object keys
pub fn validate_backup_name(name: &str) -> StashResult<()> {
    if name.trim().is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.starts_with('.')
    {
        return Err(StashError::Validation(format!(
            "invalid backup name '{}'",
            name
        )));
    }
    Ok(())
}
