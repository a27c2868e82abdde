/// Round orchestrator.
///
/// One round runs strictly in sequence:
///   session → aggregate → save → rank neighbors → draw recommendations.
/// The caller supplies the resolver, the store and the RNG; the recommender
/// holds no user state between rounds.
use rand::seq::index::sample;
use rand::Rng;
use tracing::{debug, warn};

use crate::aggregator::apply_round;
use crate::constants::{
    DEFAULT_COMPARISONS_PER_ROUND, DEFAULT_EXPLORATION_SHARE, DEFAULT_POOL_NEIGHBORS,
    DEFAULT_RECOMMENDATION_COUNT,
};
use crate::error::{PalateError, Result};
use crate::selector::RecommendationSelector;
use crate::session::{ComparisonResolver, PreferenceSession};
use crate::similarity::nearest_neighbors;
use crate::store::ProfileStore;
use crate::types::{Catalog, NeighborCandidate, Observation, Profile, RoundDelta};

/// Configuration for the recommender.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct EngineConfig {
    pub comparisons_per_round: usize,
    pub recommendation_count: usize,
    pub pool_neighbors: usize,
    pub exploration_share: f64,
    /// Average the active profile's own CPI into the recommendation pool.
    pub include_own_profile: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            comparisons_per_round: DEFAULT_COMPARISONS_PER_ROUND,
            recommendation_count: DEFAULT_RECOMMENDATION_COUNT,
            pool_neighbors: DEFAULT_POOL_NEIGHBORS,
            exploration_share: DEFAULT_EXPLORATION_SHARE,
            include_own_profile: false,
        }
    }
}

/// Where a recommendation list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationSource {
    Neighbors,
    /// Uniform catalog sample, used when no personalized list could be drawn.
    Catalog,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub items: Vec<String>,
    pub source: RecommendationSource,
    /// Neighbors consulted, best first. Empty for catalog fallbacks.
    pub neighbors: Vec<NeighborCandidate>,
}

/// A played round, before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub observations: Vec<Observation>,
    pub delta: RoundDelta,
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    pub outcome: RoundOutcome,
    pub recommendation: Recommendation,
}

pub struct Recommender {
    config: EngineConfig,
    session: PreferenceSession,
    selector: RecommendationSelector,
    catalog: Option<Catalog>,
}

impl Recommender {
    pub fn new(config: EngineConfig, catalog: Option<Catalog>) -> Self {
        let session = PreferenceSession::new(config.comparisons_per_round);
        assert!(
            config.recommendation_count >= session.required_candidates(),
            "Recommendation count {} cannot seed a round of {} comparisons.",
            config.recommendation_count,
            config.comparisons_per_round
        );
        if let Some(ref c) = catalog {
            assert!(
                c.len() >= config.recommendation_count,
                "Catalog of {} items is smaller than the recommendation count {}.",
                c.len(),
                config.recommendation_count
            );
        }

        let selector = RecommendationSelector::new(
            config.recommendation_count,
            config.pool_neighbors,
            config.exploration_share,
        );

        Recommender { config, session, selector, catalog }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    /// Candidates needed for one round.
    pub fn required_candidates(&self) -> usize {
        self.session.required_candidates()
    }

    /// Resolve one round over `candidates` and compute the updated profile in memory.
    pub fn play_round<R>(
        &self,
        profile: &Profile,
        candidates: &[String],
        resolver: &mut R,
    ) -> Result<RoundOutcome>
    where
        R: ComparisonResolver + ?Sized,
    {
        let result = self.session.run(candidates, resolver)?;

        let mut updated = profile.clone();
        updated.stats = apply_round(&profile.stats, &result.delta);

        debug!(
            identity = %profile.identity,
            comparisons = result.observations.len(),
            "round played"
        );

        Ok(RoundOutcome {
            observations: result.observations,
            delta: result.delta,
            profile: updated,
        })
    }

    /// Draw the next candidate list for `profile` from its nearest peers.
    ///
    /// Falls back to a catalog sample when no peer is eligible or the merged
    /// pool is too small, provided a catalog is configured.
    pub fn recommend(
        &self,
        profile: &Profile,
        peers: &[Profile],
        rng: &mut impl Rng,
    ) -> Result<Recommendation> {
        let catalog = self.catalog.as_ref();

        let personalized = nearest_neighbors(profile, peers, catalog).and_then(|neighbors| {
            let own = self.config.include_own_profile.then_some(&profile.stats.cpi);
            let pool = self.selector.pool(&neighbors, own, catalog);
            let items = self.selector.select(&pool, rng)?;
            Ok(Recommendation {
                items,
                source: RecommendationSource::Neighbors,
                neighbors,
            })
        });

        match personalized {
            Ok(recommendation) => Ok(recommendation),
            Err(err @ (PalateError::NoEligiblePeers { .. } | PalateError::ExhaustedPool { .. }))
                if catalog.is_some() =>
            {
                warn!(identity = %profile.identity, reason = %err, "falling back to catalog");
                Ok(Recommendation {
                    items: self.catalog_sample(rng)?,
                    source: RecommendationSource::Catalog,
                    neighbors: Vec::new(),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Candidates for a profile's first round, drawn uniformly from the catalog.
    pub fn starting_candidates(&self, rng: &mut impl Rng) -> Result<Vec<String>> {
        self.catalog_sample(rng)
    }

    fn catalog_sample(&self, rng: &mut impl Rng) -> Result<Vec<String>> {
        let count = self.config.recommendation_count;
        let items: Vec<&str> = self.catalog.as_ref().map(|c| c.items().collect()).unwrap_or_default();
        if items.len() < count {
            return Err(PalateError::ExhaustedPool {
                requested: count,
                available: items.len(),
            });
        }

        Ok(sample(rng, items.len(), count)
            .into_iter()
            .map(|i| items[i].to_string())
            .collect())
    }

    /// Run a full round for `identity` against `store`.
    ///
    /// The profile is saved once, after the round is fully computed. Peers are
    /// loaded after the save so they reflect the current store contents.
    pub fn run_round<S, R>(
        &self,
        store: &mut S,
        identity: &str,
        candidates: &[String],
        resolver: &mut R,
        rng: &mut impl Rng,
    ) -> Result<RoundReport>
    where
        S: ProfileStore + ?Sized,
        R: ComparisonResolver + ?Sized,
    {
        let profile = store.load(identity)?;
        let outcome = self.play_round(&profile, candidates, resolver)?;
        store.save(&outcome.profile)?;

        let peers = store.list_peers(identity)?;
        let recommendation = self.recommend(&outcome.profile, &peers, rng)?;

        Ok(RoundReport { outcome, recommendation })
    }
}
