//! Archive builder
//!
//! Turns a path into the bytes that get uploaded (tar, gzip, optional
//! AES-256-GCM envelope) and back again.

pub mod builder;
pub mod naming;
pub mod unpack;

pub use builder::{fingerprint, ArchiveBuilder, BuiltArchive, DEFAULT_COMPRESSION_LEVEL};
pub use naming::{parse_stored_name, stored_name, ParsedName};
pub use unpack::{unpack, verify_fingerprint};
