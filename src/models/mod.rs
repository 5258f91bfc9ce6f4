//! Core data models for coldstash
//!
//! Backup records, the inventory snapshot that orders them, storage tiers
//! and cold-tier retrieval jobs.

pub mod ids;
pub mod job;
pub mod record;
pub mod snapshot;
pub mod tier;

pub use ids::{ArchiveId, JobId};
pub use job::RetrievalJob;
pub use record::{BackupRecord, RecordValidationError};
pub use snapshot::{InventorySnapshot, SNAPSHOT_SCHEMA_VERSION};
pub use tier::Tier;
