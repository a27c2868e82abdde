/// Folding round deltas into cumulative profile statistics.
///
/// Pure functions: every operation returns new maps and leaves its inputs alone,
/// so a profile is only ever replaced by a fully computed successor.
use crate::constants::CPI_SCALE;
use crate::types::{Counts, ProfileStats, Ratios, RoundDelta};

/// Add every count in `delta` to `target`, inserting new items at the end,
/// then sort by descending count. Ties keep their previous relative order.
pub fn merge(mut target: Counts, delta: &Counts) -> Counts {
    for (item, amount) in delta.iter() {
        target.add(item, amount);
    }
    target.sort_descending();
    target
}

/// Clicks per impression on a 0-100 scale, for every item with a recorded impression count.
///
/// Zero impressions map to 0. A click count above the impression count would
/// break the 0-100 range, so the ratio is clamped.
pub fn compute_cpi(clicks: &Counts, impressions: &Counts) -> Ratios {
    let mut cpi: Ratios = impressions
        .iter()
        .map(|(item, shown)| {
            let ratio = if shown == 0 {
                0.0
            } else {
                (clicks.get(item) as f64 / shown as f64 * CPI_SCALE).clamp(0.0, CPI_SCALE)
            };
            (item, ratio)
        })
        .collect();
    cpi.sort_descending();
    cpi
}

/// Each item's tally as a percentage of the tally total. All zeros when the total is zero.
pub fn tally_share(tally: &Counts) -> Ratios {
    let total = tally.total();
    tally
        .iter()
        .map(|(item, count)| {
            let share = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            (item, share)
        })
        .collect()
}

/// Produce the statistics that follow `stats` after one round.
pub fn apply_round(stats: &ProfileStats, delta: &RoundDelta) -> ProfileStats {
    let tally = merge(stats.tally.clone(), &delta.tally);
    let clicks = merge(stats.clicks.clone(), &delta.clicks);
    let impressions = merge(stats.impressions.clone(), &delta.impressions);

    ProfileStats {
        tally_share: tally_share(&tally),
        cpi: compute_cpi(&clicks, &impressions),
        tally,
        clicks,
        impressions,
    }
}
