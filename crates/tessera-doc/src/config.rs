//! Construction settings for a document store.

use serde::{Deserialize, Serialize};
use tessera_core::SiteId;

/// Branching exponent at depth 0 of the identifier tree.
pub const DEFAULT_ROOT_LOG2_BASE: u32 = 5;

/// Maximum width of a single random jump during allocation.
pub const DEFAULT_BOUNDARY: u64 = 10;

/// Configuration for a [`Crdt`](crate::Crdt).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrdtConfig {
    /// This replica's identity. Must be unique per session.
    pub site_id: SiteId,
    /// `2^root_log2_base` values are available at depth 0. Larger values suit
    /// edits clustered in a narrow range.
    pub root_log2_base: u32,
    /// Cap on the random jump when allocating a value. Larger values suit
    /// edits spread across the document.
    pub boundary: u64,
    /// Check site consistency of every incoming path. Walks the whole path.
    pub validate_site_ids: bool,
    /// Seed for the allocation RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl CrdtConfig {
    pub fn new(site_id: impl Into<SiteId>) -> Self {
        Self {
            site_id: site_id.into(),
            root_log2_base: DEFAULT_ROOT_LOG2_BASE,
            boundary: DEFAULT_BOUNDARY,
            validate_site_ids: false,
            seed: None,
        }
    }

    pub fn builder(site_id: impl Into<SiteId>) -> CrdtConfigBuilder {
        CrdtConfigBuilder::new(site_id)
    }
}

/// Builder for [`CrdtConfig`].
pub struct CrdtConfigBuilder {
    config: CrdtConfig,
}

impl CrdtConfigBuilder {
    pub fn new(site_id: impl Into<SiteId>) -> Self {
        Self {
            config: CrdtConfig::new(site_id),
        }
    }

    pub fn root_log2_base(mut self, log2_base: u32) -> Self {
        self.config.root_log2_base = log2_base;
        self
    }

    pub fn boundary(mut self, boundary: u64) -> Self {
        self.config.boundary = boundary.max(1);
        self
    }

    pub fn validate_site_ids(mut self, enabled: bool) -> Self {
        self.config.validate_site_ids = enabled;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn build(self) -> CrdtConfig {
        self.config
    }
}
