//! Storage layer for coldstash
//!
//! Atomic file helpers, store credentials and the two storage tiers.

pub mod backend;
pub mod credentials;
pub mod file_io;
pub mod object_store;
pub mod vault;

use std::sync::Arc;

pub use backend::{ColdStorage, RetrievalStatus, StorageBackend};
pub use credentials::Credentials;
pub use file_io::{read_json, write_json_atomic};
pub use object_store::LocalObjectStore;
pub use vault::LocalVault;

use crate::config::Profile;
use crate::error::StashResult;
use crate::models::Tier;

/// Both tiers for one profile
#[derive(Clone)]
pub struct Backends {
    pub fast: Arc<LocalObjectStore>,
    pub cold: Arc<LocalVault>,
}

impl Backends {
    /// Open the bucket and vault a profile points at
    pub fn open(profile: &Profile) -> StashResult<Self> {
        let credentials = profile.credentials();
        let fast = LocalObjectStore::open(&profile.bucket, &credentials)?;
        let cold = LocalVault::open(&profile.vault, &credentials)?
            .with_retrieval_delay(profile.retrieval_delay()?)
            .with_poll_interval(std::time::Duration::from_secs(
                profile.poll_interval_secs.max(1),
            ));

        Ok(Self {
            fast: Arc::new(fast),
            cold: Arc::new(cold),
        })
    }

    /// The backend serving `tier`
    pub fn for_tier(&self, tier: Tier) -> Arc<dyn StorageBackend> {
        match tier {
            Tier::Fast => self.fast.clone() as Arc<dyn StorageBackend>,
            Tier::Cold => self.cold.clone() as Arc<dyn StorageBackend>,
        }
    }
}
