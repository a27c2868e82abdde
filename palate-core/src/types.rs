use indexmap::{IndexMap, IndexSet};

use crate::constants::DEFAULT_CATALOG;

/// Integer counts keyed by item (clicks, impressions, win tally).
///
/// Iteration order is significant: after every merge the map is sorted by
/// descending count, ties keeping their previous relative order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct Counts(IndexMap<String, u64>);

impl Counts {
    pub fn new() -> Self {
        Counts(IndexMap::new())
    }

    /// Count for `item`, zero if absent.
    pub fn get(&self, item: &str) -> u64 {
        self.0.get(item).copied().unwrap_or(0)
    }

    /// Add `amount` to `item`, inserting it at the end if absent.
    pub fn add(&mut self, item: &str, amount: u64) {
        match self.0.get_mut(item) {
            Some(count) => *count += amount,
            None => {
                self.0.insert(item.to_string(), amount);
            }
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.0.contains_key(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Stable sort by descending count.
    pub(crate) fn sort_descending(&mut self) {
        self.0.sort_by(|_, a, _, b| b.cmp(a));
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Counts(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Derived ratios keyed by item (CPI, tally share). Values are finite and non-negative.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct Ratios(IndexMap<String, f64>);

impl Ratios {
    pub fn new() -> Self {
        Ratios(IndexMap::new())
    }

    pub fn get(&self, item: &str) -> Option<f64> {
        self.0.get(item).copied()
    }

    pub fn insert(&mut self, item: &str, value: f64) {
        self.0.insert(item.to_string(), value);
    }

    pub fn contains(&self, item: &str) -> bool {
        self.0.contains_key(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if at least one item has a positive ratio. A mapping of only
    /// zeros carries no preference signal.
    pub fn has_signal(&self) -> bool {
        self.0.values().any(|&v| v > 0.0)
    }

    /// Stable sort by descending ratio.
    pub(crate) fn sort_descending(&mut self) {
        self.0.sort_by(|_, a, _, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Ratios {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Ratios(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Which of the two offered items the resolver preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    First,
    Second,
}

/// One resolved comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub winner: String,
    pub loser: String,
}

/// Counts collected during a single round, before merging into a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundDelta {
    pub clicks: Counts,
    pub impressions: Counts,
    /// Chained win tally (see `session::fold_observations`).
    pub tally: Counts,
}

impl RoundDelta {
    pub fn is_empty(&self) -> bool {
        self.clicks.is_empty() && self.impressions.is_empty() && self.tally.is_empty()
    }
}

/// Cumulative statistics of one profile.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProfileStats {
    #[cfg_attr(feature = "serde", serde(rename = "global", default))]
    pub tally: Counts,
    /// Each item's tally as a percentage of the tally total.
    #[cfg_attr(feature = "serde", serde(rename = "global_pct", default))]
    pub tally_share: Ratios,
    #[cfg_attr(feature = "serde", serde(default))]
    pub clicks: Counts,
    #[cfg_attr(feature = "serde", serde(default))]
    pub impressions: Counts,
    /// Clicks per impression, 0-100.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cpi: Ratios,
}

/// A stored user profile. The credential is carried through untouched.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Profile {
    pub identity: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub credential: Option<String>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub stats: ProfileStats,
}

impl Profile {
    /// Empty profile, as created at signup.
    pub fn new(identity: impl Into<String>) -> Self {
        Profile {
            identity: identity.into(),
            credential: None,
            stats: ProfileStats::default(),
        }
    }
}

/// A peer ranked by CPI distance to the active profile.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborCandidate {
    /// Mean absolute CPI difference over shared items; smaller is closer.
    pub distance: f64,
    pub identity: String,
    pub cpi: Ratios,
    /// Items rated by both profiles. Zero means `distance` is the no-overlap placeholder.
    pub shared_items: usize,
}

/// Merged neighbor CPI, item → mean value over the neighbors that mention it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationPool(IndexMap<String, f64>);

impl RecommendationPool {
    pub fn get(&self, item: &str) -> Option<f64> {
        self.0.get(item).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert_if_absent(&mut self, item: &str, value: f64) {
        if !self.0.contains_key(item) {
            self.0.insert(item.to_string(), value);
        }
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for RecommendationPool {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        RecommendationPool(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// The fixed set of valid item identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    items: IndexSet<String>,
}

impl Catalog {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = IndexSet::new();
        for item in items {
            let item = item.into();
            assert!(!set.contains(&item), "Duplicate catalog item: {}", item);
            set.insert(item);
        }
        Catalog { items: set }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Copy of `ratios` where items outside the catalog keep their key but read zero.
    pub fn zero_fill_outside(&self, ratios: &Ratios) -> Ratios {
        ratios
            .iter()
            .map(|(item, value)| (item, if self.contains(item) { value } else { 0.0 }))
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(DEFAULT_CATALOG)
    }
}
