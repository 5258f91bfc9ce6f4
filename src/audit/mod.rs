//! Audit logging for inventory mutations
//!
//! Every record, remove and replace applied to an inventory is appended to
//! `audit.log` as one JSON line.

mod entry;
mod logger;

pub use entry::{AuditEntry, Operation};
pub use logger::AuditLogger;
