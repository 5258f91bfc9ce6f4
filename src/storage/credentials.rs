//! Store credentials and access checks
//!
//! Each store root keeps an access record naming the access key allowed to
//! use it and a SHA-512 digest of the matching secret. The first successful
//! open of an empty root writes the record.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tracing::{debug, info};

use super::file_io::{read_json_required, write_json_atomic};
use crate::crypto::SecureString;
use crate::error::{StashError, StashResult};

/// File name of the access record inside a store root
pub const ACCESS_FILE: &str = ".coldstash-access";

/// Access key plus secret presented to a store
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key: String,
    secret_key: SecureString,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: &str) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: SecureString::new(secret_key),
        }
    }

    /// Hex SHA-512 of the secret key
    pub fn secret_digest(&self) -> String {
        hex::encode(Sha512::digest(self.secret_key.as_bytes()))
    }

    /// Hex SHA-512 of `access_key + container`, recorded on every backup
    pub fn backend_hash(&self, container: &str) -> String {
        let mut hasher = Sha512::new();
        hasher.update(self.access_key.as_bytes());
        hasher.update(container.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessRecord {
    access_key: String,
    secret_digest: String,
}

/// Check `credentials` against the access record under `root`
///
/// Creates the root and its access record on first use.
pub fn authorize(root: &Path, credentials: &Credentials) -> StashResult<()> {
    if credentials.access_key.trim().is_empty() {
        return Err(StashError::Authentication("missing access key".into()));
    }

    let path = root.join(ACCESS_FILE);
    if !path.exists() {
        info!(root = %root.display(), "Initializing store access record");
        return write_json_atomic(
            &path,
            &AccessRecord {
                access_key: credentials.access_key.clone(),
                secret_digest: credentials.secret_digest(),
            },
        );
    }

    let record: AccessRecord = read_json_required(&path)?;
    if record.access_key != credentials.access_key
        || record.secret_digest != credentials.secret_digest()
    {
        return Err(StashError::Authentication(format!(
            "access key '{}' is not allowed on {}",
            credentials.access_key,
            root.display()
        )));
    }

    debug!(root = %root.display(), "Store credentials accepted");
    Ok(())
}
