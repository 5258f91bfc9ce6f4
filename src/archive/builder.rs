//! Packs a file or directory into a gzip tarball, optionally sealed

use std::fs;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::naming::{backup_name, stored_name, strip_tarball_ext, validate_backup_name};
use crate::crypto::{seal, ArchiveKey};
use crate::error::{StashError, StashResult};

/// Default gzip level
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A packed archive ready for upload
#[derive(Debug, Clone)]
pub struct BuiltArchive {
    /// Logical backup name
    pub name: String,
    pub stored_name: String,
    /// Bytes to hand to the backend
    pub bytes: Vec<u8>,
    /// Hex SHA-256 of `bytes`
    pub fingerprint: String,
    pub encrypted: bool,
    pub created_at: DateTime<Utc>,
}

impl BuiltArchive {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Hex SHA-256 of `bytes`
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Builds archives from filesystem paths
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    compression_level: u32,
    key: Option<ArchiveKey>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            key: None,
        }
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gzip level (0-9)
    pub fn compression_level(mut self, level: u32) -> StashResult<Self> {
        if level > 9 {
            return Err(StashError::Validation(format!(
                "compression level must be 0-9, got {}",
                level
            )));
        }
        self.compression_level = level;
        Ok(self)
    }

    /// Encrypt archives with `key`
    pub fn key(mut self, key: Option<ArchiveKey>) -> Self {
        self.key = key;
        self
    }

    /// Pack `source`, naming it `name` or the source's last component
    pub fn build(
        &self,
        source: &Path,
        name: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> StashResult<BuiltArchive> {
        let metadata = fs::metadata(source).map_err(|e| {
            StashError::Io(format!("cannot read source {}: {}", source.display(), e))
        })?;

        let (default_name, tarball) = if metadata.is_file() && is_gzip_tarball(source)? {
            let file_name = backup_name(source)?;
            let stem = strip_tarball_ext(&file_name).unwrap_or(&file_name).to_string();
            debug!(source = %source.display(), "Source is already a gzip tarball");
            (stem, fs::read(source)?)
        } else {
            let arcname = backup_name(source)?;
            let packed = self.pack(source, &arcname, metadata.is_dir())?;
            (arcname, packed)
        };

        let name = name.map(str::to_string).unwrap_or(default_name);
        validate_backup_name(&name)?;

        let (bytes, encrypted) = match &self.key {
            Some(key) => (seal(&tarball, key)?, true),
            None => (tarball, false),
        };

        let archive = BuiltArchive {
            stored_name: stored_name(&name, created_at, encrypted),
            fingerprint: fingerprint(&bytes),
            name,
            bytes,
            encrypted,
            created_at,
        };

        info!(
            stored_name = %archive.stored_name,
            size = archive.size(),
            encrypted,
            "Built archive"
        );
        Ok(archive)
    }

    fn pack(&self, source: &Path, arcname: &str, is_dir: bool) -> StashResult<Vec<u8>> {
        let encoder = GzEncoder::new(Vec::new(), Compression::new(self.compression_level));
        let mut tar = tar::Builder::new(encoder);

        let appended = if is_dir {
            tar.append_dir_all(arcname, source)
        } else {
            tar.append_path_with_name(source, arcname)
        };
        appended.map_err(|e| {
            StashError::Archive(format!("failed to pack {}: {}", source.display(), e))
        })?;

        let encoder = tar
            .into_inner()
            .map_err(|e| StashError::Archive(format!("failed to finish tar stream: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| StashError::Archive(format!("failed to finish gzip stream: {}", e)))
    }
}

/// A `.tgz`/`.tar.gz` file that really starts with the gzip magic
fn is_gzip_tarball(path: &Path) -> StashResult<bool> {
    let has_ext = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(strip_tarball_ext)
        .is_some();
    if !has_ext {
        return Ok(false);
    }

    let mut magic = [0u8; 2];
    let mut file = fs::File::open(path)?;
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == GZIP_MAGIC),
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::naming::parse_stored_name;
    use crate::crypto::is_sealed;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn when() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_build_directory() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("photos");
        fs::create_dir_all(src.join("2024")).unwrap();
        fs::write(src.join("2024/beach.jpg"), b"jpeg").unwrap();

        let archive = ArchiveBuilder::new().build(&src, None, when()).unwrap();

        assert_eq!(archive.name, "photos");
        assert_eq!(archive.stored_name, "photos.20240501120000.tgz");
        assert!(!archive.encrypted);
        assert_eq!(archive.bytes[..2], GZIP_MAGIC);
        assert_eq!(archive.fingerprint, fingerprint(&archive.bytes));
        assert_eq!(archive.fingerprint.len(), 64);
    }

    #[test]
    fn test_build_encrypted_with_custom_name() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("notes.txt");
        fs::write(&src, b"remember").unwrap();

        let archive = ArchiveBuilder::new()
            .key(Some(ArchiveKey::generate()))
            .build(&src, Some("notes"), when())
            .unwrap();

        assert!(archive.encrypted);
        assert!(is_sealed(&archive.bytes));
        let parsed = parse_stored_name(&archive.stored_name).unwrap();
        assert_eq!(parsed.name, "notes");
        assert!(parsed.encrypted);
    }

    #[test]
    fn test_existing_tarball_uploaded_as_is() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("site");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("index.html"), b"<html>").unwrap();
        let packed = ArchiveBuilder::new().build(&src, None, when()).unwrap();

        let tarball = dir.path().join("site.tar.gz");
        fs::write(&tarball, &packed.bytes).unwrap();

        let archive = ArchiveBuilder::new().build(&tarball, None, when()).unwrap();
        assert_eq!(archive.name, "site");
        assert_eq!(archive.bytes, packed.bytes);
    }

    #[test]
    fn test_fake_tarball_is_packed() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("fake.tgz");
        fs::write(&src, b"plain text").unwrap();

        let archive = ArchiveBuilder::new().build(&src, None, when()).unwrap();
        assert_eq!(archive.name, "fake.tgz");
        assert_ne!(archive.bytes, b"plain text");
    }

    #[test]
    fn test_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = ArchiveBuilder::new()
            .build(&dir.path().join("nope"), None, when())
            .unwrap_err();
        assert!(matches!(err, StashError::Io(_)));
    }

    #[test]
    fn test_bad_compression_level() {
        assert!(ArchiveBuilder::new().compression_level(10).is_err());
        assert!(ArchiveBuilder::new().compression_level(0).is_ok());
    }
}
