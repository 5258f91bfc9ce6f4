//! Configuration module for coldstash
//!
//! - Base directory resolution (`paths`)
//! - Persisted profiles: credentials, store roots, rotation policy (`settings`)

pub mod paths;
pub mod settings;

pub use paths::StashPaths;
pub use settings::{Profile, Settings};
