//! Identifier - one level of a character's position path.
//!
//! An identifier is an immutable `(value, site)` pair. Identifiers are
//! totally ordered by value first and by site second, so two replicas that
//! pick the same value at the same depth are still ordered deterministically.

use crate::site::SiteId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    value: u64,
    site_id: SiteId,
}

impl Identifier {
    pub fn new(value: u64, site_id: impl Into<SiteId>) -> Self {
        Self {
            value,
            site_id: site_id.into(),
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn site_id(&self) -> SiteId {
        self.site_id
    }

    /// Compare by value, then by site.
    pub fn compare_to(&self, other: &Identifier) -> Ordering {
        self.value
            .cmp(&other.value)
            .then_with(|| self.site_id.cmp(&other.site_id))
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_to(other)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.value, self.site_id)
    }
}
