//! coldstash - compress, encrypt and upload backups to tiered storage
//!
//! A backup is a gzip tarball of a file or directory, optionally sealed with
//! AES-256-GCM, uploaded either to a fast object store or to a cold vault
//! whose reads go through retrieval jobs. Every upload is recorded in a
//! per-profile inventory that is mirrored into the fast tier, and old
//! backups are expired by age or by grandfather-father-son rotation.
//!
//! # Architecture
//!
//! - `archive`: tarball building, naming, fingerprints and unpacking
//! - `crypto`: the AES-GCM envelope and Argon2id key derivation
//! - `storage`: the `StorageBackend` trait and both tiers
//! - `inventory`: the local inventory and its mirror
//! - `rotation`: GFS planning and interval parsing
//! - `services`: backup, restore, expiry and inventory queries
//! - `config`, `audit`, `display`, `export`, `cli`: the ambient pieces
//!
//! # Example
//!
//! ```rust,ignore
//! use coldstash::config::StashPaths;
//! use coldstash::services::{BackupRequest, BackupService, Stash};
//!
//! let stash = Stash::open(StashPaths::new()?, "default")?;
//! let record = BackupService::new(&stash).backup(BackupRequest::new("/srv/photos"))?;
//! println!("{}", record.stored_name);
//! ```

pub mod archive;
pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod export;
pub mod inventory;
pub mod models;
pub mod rotation;
pub mod services;
pub mod storage;

pub use error::{StashError, StashResult};
