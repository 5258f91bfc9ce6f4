//! Custom error types for coldstash
//!
//! One error hierarchy for the whole library, defined with thiserror. The
//! binary converts these into `anyhow` errors at the boundary.

use thiserror::Error;

/// The main error type for coldstash operations
#[derive(Error, Debug)]
pub enum StashError {
    /// Configuration-related errors (missing profile, unreadable settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid user input (bad interval, bad key name, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Store credentials rejected, or an archive failed its authentication tag
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rotation misconfiguration
    #[error("Rotation policy violation: {0}")]
    PolicyViolation(String),

    /// Encryption errors, including malformed keys
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Packing or unpacking a tarball failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// Downloaded bytes do not match the recorded fingerprint
    #[error("Integrity check failed: {0}")]
    Corrupted(String),

    /// Storage backend errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl StashError {
    /// Create a "not found" error for inventory records
    pub fn backup_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for backend objects
    pub fn object_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Object",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for profiles
    pub fn profile_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Profile",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an authentication error
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// Check if this is a rotation policy violation
    pub fn is_policy_violation(&self) -> bool {
        matches!(self, Self::PolicyViolation(_))
    }
}

impl From<std::io::Error> for StashError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StashError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for coldstash operations
pub type StashResult<T> = Result<T, StashError>;
