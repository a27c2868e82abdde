/// palate-core: taste profiling from pairwise picks.
///
/// Pick-one-of-two answers → click/impression/CPI statistics → nearest peer
/// profiles → weighted recommendation draw. No filesystem, no console: storage,
/// the question prompt and randomness are all supplied by the caller.
///
/// Items are identified by caller-provided strings.
///
/// # Quick start
///
/// ```rust
/// use palate_core::{Catalog, Choice, EngineConfig, MemoryStore, Profile, Recommender};
/// use rand::{rngs::SmallRng, SeedableRng};
///
/// let mut store: MemoryStore = [Profile::new("me")].into_iter().collect();
/// let engine = Recommender::new(EngineConfig::default(), Some(Catalog::default()));
/// let mut rng = SmallRng::seed_from_u64(7);
///
/// // Always prefer the item already on the left.
/// let mut resolver = |_: &str, _: &str| -> palate_core::Result<Choice> { Ok(Choice::First) };
///
/// let candidates = engine.starting_candidates(&mut rng).unwrap();
/// let report = engine.run_round(&mut store, "me", &candidates, &mut resolver, &mut rng).unwrap();
///
/// for item in &report.recommendation.items {
///     println!("try next: {item}");
/// }
/// ```

pub mod aggregator;
pub mod constants;
pub mod engine;
pub mod error;
pub mod selector;
pub mod session;
pub mod similarity;
pub mod store;
pub mod types;

// Re-export primary public API at crate root.
pub use aggregator::{apply_round, compute_cpi, merge, tally_share};
pub use engine::{
    EngineConfig, Recommendation, RecommendationSource, Recommender, RoundOutcome, RoundReport,
};
pub use error::{PalateError, Result};
pub use selector::{merge_sources, sampling_weights, RecommendationSelector};
pub use session::{fold_observations, ComparisonResolver, PreferenceSession, SessionResult};
pub use similarity::{
    click_agreement, count_agreement, difference, nearest_neighbors, neighbor_count,
    rank_neighbors,
};
pub use store::{MemoryStore, ProfileStore};
pub use types::{
    Catalog, Choice, Counts, NeighborCandidate, Observation, Profile, ProfileStats, Ratios,
    RecommendationPool, RoundDelta,
};
