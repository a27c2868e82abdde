/// Recommendation drawing from the merged CPI of the nearest neighbors.
///
/// Seen items (merged CPI > 0) are weighted by their merged CPI. Unseen items
/// split a reserved share of the total weight evenly, so items nobody in the
/// neighborhood has picked yet still get drawn now and then.
use indexmap::IndexMap;
use rand::Rng;
use tracing::debug;

use crate::error::{PalateError, Result};
use crate::types::{Catalog, NeighborCandidate, Ratios, RecommendationPool};

pub struct RecommendationSelector {
    count: usize,
    pool_neighbors: usize,
    exploration_share: f64,
}

impl RecommendationSelector {
    pub fn new(count: usize, pool_neighbors: usize, exploration_share: f64) -> Self {
        assert!(pool_neighbors >= 1, "RecommendationSelector requires at least one pool neighbor.");
        assert!(
            (0.0..1.0).contains(&exploration_share),
            "Exploration share must be in [0, 1), got {}",
            exploration_share
        );
        RecommendationSelector { count, pool_neighbors, exploration_share }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Merge the CPI of the first `pool_neighbors` neighbors (and `own`, if given).
    pub fn pool(
        &self,
        neighbors: &[NeighborCandidate],
        own: Option<&Ratios>,
        catalog: Option<&Catalog>,
    ) -> RecommendationPool {
        let take = neighbors.len().min(self.pool_neighbors);
        let sources = neighbors[..take].iter().map(|n| &n.cpi).chain(own);
        merge_sources(sources, catalog)
    }

    /// Draw `count` distinct items from `pool`, ordered by descending merged CPI.
    /// Draw order only decides membership; ties keep draw order.
    pub fn select(&self, pool: &RecommendationPool, rng: &mut impl Rng) -> Result<Vec<String>> {
        let weighted = sampling_weights(pool, self.exploration_share);
        let available = weighted.iter().filter(|(_, w)| *w > 0.0).count();
        if available < self.count {
            return Err(PalateError::ExhaustedPool {
                requested: self.count,
                available,
            });
        }

        let mut remaining: Vec<f64> = weighted.iter().map(|(_, w)| *w).collect();
        let mut drawn: Vec<usize> = Vec::with_capacity(self.count);

        // no replacement: a drawn item drops to zero weight
        for _ in 0..self.count {
            let total: f64 = remaining.iter().sum();
            let idx = weighted_random_select(&remaining, total, rng);
            remaining[idx] = 0.0;
            drawn.push(idx);
        }

        let merged: Vec<f64> = pool.iter().map(|(_, v)| v).collect();
        drawn.sort_by(|&a, &b| merged[b].partial_cmp(&merged[a]).unwrap_or(std::cmp::Ordering::Equal));

        let items: Vec<String> = drawn.into_iter().map(|i| weighted[i].0.to_string()).collect();
        debug!(pool = pool.len(), drawn = ?items, "recommendations drawn");
        Ok(items)
    }
}

/// Average each item over the sources that mention it. A source that never
/// rated an item does not pull its average down.
///
/// With a catalog, the pool holds exactly the catalog: items outside it are
/// dropped and catalog items that no source mentions join at zero.
pub fn merge_sources<'a, I>(sources: I, catalog: Option<&Catalog>) -> RecommendationPool
where
    I: IntoIterator<Item = &'a Ratios>,
{
    let mut sums: IndexMap<&'a str, (f64, usize)> = IndexMap::new();
    for cpi in sources {
        for (item, value) in cpi.iter() {
            let entry = sums.entry(item).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    let mut pool: RecommendationPool = sums
        .into_iter()
        .filter(|(item, _)| catalog.map_or(true, |c| c.contains(item)))
        .map(|(item, (sum, n))| (item, sum / n as f64))
        .collect();

    if let Some(catalog) = catalog {
        for item in catalog.items() {
            pool.insert_if_absent(item, 0.0);
        }
    }
    pool
}

/// Sampling weight for every pool item, in pool order.
///
/// Unseen items share `exploration_share` of the total weight. If nothing has
/// been seen, every item weighs the same.
pub fn sampling_weights(pool: &RecommendationPool, exploration_share: f64) -> Vec<(&str, f64)> {
    let seen_total: f64 = pool.iter().map(|(_, v)| v).filter(|&v| v > 0.0).sum();
    let unseen = pool.iter().filter(|&(_, v)| v <= 0.0).count();

    if seen_total <= 0.0 {
        return pool.iter().map(|(item, _)| (item, 1.0)).collect();
    }

    let per_unseen = if unseen == 0 {
        0.0
    } else {
        seen_total * exploration_share / (1.0 - exploration_share) / unseen as f64
    };

    pool.iter()
        .map(|(item, v)| (item, if v > 0.0 { v } else { per_unseen }))
        .collect()
}

/// Pick an index with probability proportional to its weight. Zero weights are never picked.
fn weighted_random_select(weights: &[f64], total_weight: f64, rng: &mut impl Rng) -> usize {
    let mut r = rng.random::<f64>() * total_weight;
    let mut last_positive = 0;
    for (j, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        last_positive = j;
        r -= w;
        if r < 1e-10 {
            return j;
        }
    }
    last_positive
}
