//! Inventory store
//!
//! Maps backup names to where the bytes live, persisted locally and mirrored
//! to the fast tier.

pub mod query;
pub mod store;

pub use query::InventoryQuery;
pub use store::InventoryStore;
