//! Rotation engine
//!
//! Grandfather-father-son retention over the inventory, plus age-based
//! expiry with interval strings.

pub mod engine;
pub mod interval;
pub mod policy;

pub use engine::{plan, KeepReason, KeptRecord, RotationPlan};
pub use interval::parse_interval;
pub use policy::RotationPolicy;
