//! Service layer for coldstash
//!
//! Business logic on top of the archive builder, backends and inventory,
//! shared by the CLI and library users.

pub mod backup;
pub mod expire;
pub mod inventory;
pub mod restore;
pub mod stash;

pub use backup::{BackupRequest, BackupService};
pub use expire::ExpireService;
pub use inventory::{BackupSummary, InventoryService};
pub use restore::{JobCheck, RestoreOutcome, RestoreService};
pub use stash::Stash;
