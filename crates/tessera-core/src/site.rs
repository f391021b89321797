//! Replica identity.
//!
//! A site id breaks ties between identifiers that share a position value.
//! Ids must be unique per session; assigning them is the host's job.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier of a replica (site).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub u64);

impl SiteId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Derive a fresh site id from the random bits of a ULID.
    pub fn generate() -> Self {
        Self(u128::from(Ulid::new()) as u64)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for SiteId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
