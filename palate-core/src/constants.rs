/// Number of binary comparisons resolved in one preference round.
/// A round therefore needs `DEFAULT_COMPARISONS_PER_ROUND + 1` distinct candidates.
pub const DEFAULT_COMPARISONS_PER_ROUND: usize = 4;

/// Size of the recommendation list drawn at the end of each round.
/// Must be at least `DEFAULT_COMPARISONS_PER_ROUND + 1` so the list can seed the next round.
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 6;

/// How many of the nearest neighbors contribute to the recommendation pool.
pub const DEFAULT_POOL_NEIGHBORS: usize = 3;

/// Fraction of the total sampling weight reserved for unseen items (merged CPI of zero).
///
/// Without this, an item nobody in the neighborhood has picked yet could never be drawn,
/// and the profile would never collect an impression for it.
pub const DEFAULT_EXPLORATION_SHARE: f64 = 0.10;

/// Upper bound of the CPI scale (clicks per impression, as a percentage).
pub const CPI_SCALE: f64 = 100.0;

/// Distance reported when two CPI mappings share no items.
///
/// A placeholder, not a measurement: it collides with a genuine zero distance,
/// so ranking uses `NO_OVERLAP_RANK` for such peers instead.
pub const NO_OVERLAP_DISTANCE: f64 = 0.0;

/// Sort key for a peer that shares no items with the active profile.
///
/// The midpoint of the distance range: neither best nor worst match. Such a
/// peer sorts ahead of overlapping peers further than this and behind closer
/// ones; at an exact tie the overlapping peer comes first.
pub const NO_OVERLAP_RANK: f64 = CPI_SCALE / 2.0;

/// Exponent for the neighbor count: K = round(N^NEIGHBOR_EXPONENT).
///
/// Sub-linear growth keeps the neighborhood small as the population grows:
///   N = 1 → 1, N = 8 → 4, N = 27 → 9, N = 1000 → 100.
pub const NEIGHBOR_EXPONENT: f64 = 2.0 / 3.0;

/// Items offered when no personalized list is available.
pub const DEFAULT_CATALOG: [&str; 17] = [
    "pizza",
    "chicken",
    "rice",
    "noodles",
    "tandoori chicken",
    "spaghetti",
    "sushi",
    "steak",
    "hamburger",
    "tacos",
    "barbecue ribs",
    "dumplings",
    "soup",
    "waffles",
    "pulled pork",
    "grilled salmon",
    "calamari",
];
