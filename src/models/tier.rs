//! Storage tier model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which backend a backup lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Low-latency object store, addressed by key
    Fast,
    /// Vaulted archival store, read back through retrieval jobs
    Cold,
}

impl Tier {
    /// Parse a tier name, accepting the legacy `s3`/`glacier` spellings
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fast" | "s3" | "object" => Some(Self::Fast),
            "cold" | "glacier" | "vault" => Some(Self::Cold),
            _ => None,
        }
    }

    /// Whether reads from this tier go through retrieval jobs
    pub fn is_cold(&self) -> bool {
        matches!(self, Self::Cold)
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::Fast
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Cold => write!(f, "cold"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown tier '{}' (expected fast or cold)", s))
    }
}
