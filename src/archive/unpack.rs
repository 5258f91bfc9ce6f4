//! Restore side of the archive pipeline

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, warn};

use super::builder::fingerprint;
use crate::crypto::{is_sealed, open, ArchiveKey};
use crate::error::{StashError, StashResult};

/// Fail with `Corrupted` unless `bytes` hash to `expected`
pub fn verify_fingerprint(bytes: &[u8], expected: &str) -> StashResult<()> {
    let actual = fingerprint(bytes);
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(StashError::Corrupted(format!(
            "fingerprint mismatch: expected {}, got {}",
            expected, actual
        )));
    }
    Ok(())
}

/// Decrypt if needed, then gunzip and untar into `destination`
///
/// Returns the top-level paths that were written. Entries that would land
/// outside `destination` are skipped.
pub fn unpack(
    bytes: &[u8],
    key: Option<&ArchiveKey>,
    destination: &Path,
) -> StashResult<Vec<PathBuf>> {
    let plain;
    let tarball: &[u8] = if is_sealed(bytes) {
        let key = key.ok_or_else(|| {
            StashError::Encryption("archive is encrypted; a password or key is required".into())
        })?;
        plain = open(bytes, key)?;
        &plain
    } else {
        if key.is_some() {
            debug!("Archive is not encrypted; ignoring the supplied key");
        }
        bytes
    };

    fs::create_dir_all(destination).map_err(|e| {
        StashError::Io(format!(
            "cannot create destination {}: {}",
            destination.display(),
            e
        ))
    })?;

    let mut archive = tar::Archive::new(GzDecoder::new(tarball));
    let mut top_level = BTreeSet::new();

    let entries = archive
        .entries()
        .map_err(|e| StashError::Archive(format!("unreadable tar stream: {}", e)))?;
    for entry in entries {
        let mut entry =
            entry.map_err(|e| StashError::Archive(format!("unreadable tar entry: {}", e)))?;
        let path = entry
            .path()
            .map_err(|e| StashError::Archive(format!("bad entry path: {}", e)))?
            .into_owned();

        let unpacked = entry.unpack_in(destination).map_err(|e| {
            StashError::Archive(format!("failed to extract {}: {}", path.display(), e))
        })?;
        if !unpacked {
            warn!(path = %path.display(), "Skipped entry outside the destination");
            continue;
        }

        if let Some(Component::Normal(first)) = path.components().next() {
            top_level.insert(destination.join(first));
        }
    }

    Ok(top_level.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::builder::ArchiveBuilder;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_tree(root: &Path) -> PathBuf {
        let src = root.join("docs");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.txt"), b"alpha").unwrap();
        fs::write(src.join("nested/b.txt"), b"beta").unwrap();
        src
    }

    #[test]
    fn test_unpack_plain() {
        let dir = TempDir::new().unwrap();
        let src = sample_tree(dir.path());
        let archive = ArchiveBuilder::new().build(&src, None, Utc::now()).unwrap();

        let out = dir.path().join("out");
        let written = unpack(&archive.bytes, None, &out).unwrap();

        assert_eq!(written, vec![out.join("docs")]);
        assert_eq!(fs::read(out.join("docs/a.txt")).unwrap(), b"alpha");
        assert_eq!(fs::read(out.join("docs/nested/b.txt")).unwrap(), b"beta");
    }

    #[test]
    fn test_unpack_encrypted_needs_key() {
        let dir = TempDir::new().unwrap();
        let src = sample_tree(dir.path());
        let key = ArchiveKey::generate();
        let archive = ArchiveBuilder::new()
            .key(Some(key.clone()))
            .build(&src, None, Utc::now())
            .unwrap();
        let out = dir.path().join("out");

        assert!(matches!(
            unpack(&archive.bytes, None, &out),
            Err(StashError::Encryption(_))
        ));
        assert!(unpack(&archive.bytes, Some(&ArchiveKey::generate()), &out)
            .unwrap_err()
            .is_authentication());

        unpack(&archive.bytes, Some(&key), &out).unwrap();
        assert_eq!(fs::read(out.join("docs/a.txt")).unwrap(), b"alpha");
    }

    #[test]
    fn test_verify_fingerprint() {
        let bytes = b"stored bytes";
        verify_fingerprint(bytes, &fingerprint(bytes)).unwrap();
        let err = verify_fingerprint(b"other", &fingerprint(bytes)).unwrap_err();
        assert!(matches!(err, StashError::Corrupted(_)));
    }

    #[test]
    fn test_garbage_is_archive_error() {
        let dir = TempDir::new().unwrap();
        let err = unpack(b"definitely not gzip", None, dir.path()).unwrap_err();
        assert!(matches!(err, StashError::Archive(_)));
    }
}
