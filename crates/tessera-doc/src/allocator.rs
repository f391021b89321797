//! Identifier-path allocation.
//!
//! Paths are addresses in a virtual exponential tree: depth `d` offers
//! `2^(root_log2_base + d)` values. A new path between two bounds is built
//! depth by depth. As soon as a level has room strictly between the bounds'
//! heads, a random value is drawn there and the path ends. Otherwise the
//! lower head is kept and the path grows one level, so depth only increases
//! when the same narrow gap is subdivided again and again.

use crate::config::CrdtConfig;
use crate::error::{DocError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera_core::{Identifier, SiteId};

#[derive(Clone, Debug)]
pub struct Allocator {
    site_id: SiteId,
    root_log2_base: u32,
    boundary: u64,
    rng: StdRng,
}

impl Allocator {
    pub fn new(config: &CrdtConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            site_id: config.site_id,
            root_log2_base: config.root_log2_base,
            boundary: config.boundary.max(1),
            rng,
        }
    }

    pub fn site_id(&self) -> SiteId {
        self.site_id
    }

    /// Number of values available at `depth`. Saturates at `u64::MAX`.
    pub fn level_width(&self, depth: usize) -> u64 {
        let exponent = u32::try_from(depth)
            .map(|d| self.root_log2_base.saturating_add(d))
            .unwrap_or(u32::MAX);
        1u64.checked_shl(exponent).unwrap_or(u64::MAX)
    }

    /// Generate a path strictly between `lo` and `hi`.
    ///
    /// An empty bound is open: `lo = []` is the document start and `hi = []`
    /// the document end.
    pub fn generate_between(&mut self, lo: &[Identifier], hi: &[Identifier]) -> Result<Vec<Identifier>> {
        if !lo.is_empty() && !hi.is_empty() && lo >= hi {
            return Err(DocError::InvalidOrdering(format!(
                "lower bound {} does not precede upper bound {}",
                render(lo),
                render(hi)
            )));
        }

        let mut path = Vec::new();
        let mut lo = lo;
        let mut hi = hi;
        let mut depth = 0;

        loop {
            let (lower, upper) = self.heads(lo, hi, depth);
            if lower > upper {
                return Err(DocError::InvalidOrdering(format!(
                    "identifier {} must precede {} at depth {}",
                    lower, upper, depth
                )));
            }

            if upper.value() - lower.value() > 1 {
                let value = self.draw(lower.value(), upper.value());
                path.push(Identifier::new(value, self.site_id));
                return Ok(path);
            }

            path.push(lower);
            if lower == upper {
                // Shared prefix: keep descending both bounds.
                if hi.len() <= 1 {
                    return Err(DocError::InvalidOrdering(format!(
                        "no path fits between {} and {}",
                        render(&path),
                        render(hi)
                    )));
                }
                lo = tail(lo);
                hi = tail(hi);
            } else {
                // `lower` already sorts before `upper`, so the rest of the
                // path only has to beat the remainder of `lo`.
                lo = tail(lo);
                hi = &[];
            }
            depth += 1;
        }
    }

    /// Head identifiers of both bounds at `depth`, with open bounds defaulted
    /// to this site's identifiers at the edges of the level.
    fn heads(&self, lo: &[Identifier], hi: &[Identifier], depth: usize) -> (Identifier, Identifier) {
        let floor = Identifier::new(0, self.site_id);
        match (lo.first(), hi.first()) {
            (Some(&lower), Some(&upper)) => (lower, upper),
            (None, Some(&upper)) => (floor.min(upper), upper),
            (lower, None) => {
                let lower = lower.copied().unwrap_or(floor);
                let ceiling = self
                    .level_width(depth)
                    .max(lower.value().saturating_add(2));
                (lower, Identifier::new(ceiling, self.site_id))
            }
        }
    }

    /// Draw a value from `(lower, upper)`, jumping at most `boundary` past `lower`.
    fn draw(&mut self, lower: u64, upper: u64) -> u64 {
        let start = lower + 1;
        let interval = self.boundary.min(upper - start);
        self.rng.gen_range(start..start + interval)
    }
}

fn tail(path: &[Identifier]) -> &[Identifier] {
    path.get(1..).unwrap_or(&[])
}

fn render(path: &[Identifier]) -> String {
    let parts: Vec<String> = path.iter().map(|id| id.to_string()).collect();
    format!("[{}]", parts.join(", "))
}
