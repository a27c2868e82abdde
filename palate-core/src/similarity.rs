/// Peer ranking by CPI distance.
///
/// Distance is the mean absolute CPI difference over the items both profiles
/// have ratings for. Profiles with nothing in common get `NO_OVERLAP_DISTANCE`
/// and are ranked at `NO_OVERLAP_RANK`, the middle of the distance range.
use std::cmp::Ordering;

use tracing::debug;

use crate::constants::{NEIGHBOR_EXPONENT, NO_OVERLAP_DISTANCE, NO_OVERLAP_RANK};
use crate::error::{PalateError, Result};
use crate::types::{Catalog, Counts, NeighborCandidate, Profile, Ratios};

/// Mean absolute difference over shared keys, with the number of shared keys.
///
/// Shared keys are summed in sorted order so that swapping the arguments
/// yields a bit-identical result.
fn shared_distance(d1: &Ratios, d2: &Ratios) -> (f64, usize) {
    let mut shared: Vec<&str> = d1.keys().filter(|k| d2.contains(k)).collect();
    if shared.is_empty() {
        return (NO_OVERLAP_DISTANCE, 0);
    }
    shared.sort_unstable();

    let total: f64 = shared
        .iter()
        .map(|k| {
            let a = d1.get(k).unwrap_or(0.0);
            let b = d2.get(k).unwrap_or(0.0);
            (a - b).abs()
        })
        .sum();
    (total / shared.len() as f64, shared.len())
}

/// CPI distance between two mappings. Smaller is more similar.
///
/// Returns `NO_OVERLAP_DISTANCE` when the mappings share no items.
pub fn difference(d1: &Ratios, d2: &Ratios) -> f64 {
    shared_distance(d1, d2).0
}

fn rank_key(candidate: &NeighborCandidate) -> f64 {
    if candidate.shared_items == 0 {
        NO_OVERLAP_RANK
    } else {
        candidate.distance
    }
}

/// Neighbor count for a population of `eligible` peers: round(N^(2/3)), clamped to [1, N].
/// Zero peers means zero neighbors.
pub fn neighbor_count(eligible: usize) -> usize {
    if eligible == 0 {
        return 0;
    }
    let k = (eligible as f64).powf(NEIGHBOR_EXPONENT).round() as usize;
    k.clamp(1, eligible)
}

/// Rank every eligible peer by distance to `active`, best match first.
///
/// Skipped: the active profile itself, and peers whose CPI has no positive value.
/// With a catalog, CPI entries for unknown items read as zero on both sides.
pub fn rank_neighbors(
    active: &Profile,
    peers: &[Profile],
    catalog: Option<&Catalog>,
) -> Result<Vec<NeighborCandidate>> {
    let restrict = |cpi: &Ratios| match catalog {
        Some(c) => c.zero_fill_outside(cpi),
        None => cpi.clone(),
    };

    let active_cpi = restrict(&active.stats.cpi);
    let mut scanned = 0;
    let mut ranked = Vec::new();

    for peer in peers {
        if peer.identity == active.identity {
            continue;
        }
        scanned += 1;

        let peer_cpi = restrict(&peer.stats.cpi);
        if !peer_cpi.has_signal() {
            continue;
        }

        let (distance, shared_items) = shared_distance(&active_cpi, &peer_cpi);
        ranked.push(NeighborCandidate {
            distance,
            identity: peer.identity.clone(),
            cpi: peer_cpi,
            shared_items,
        });
    }

    if ranked.is_empty() {
        return Err(PalateError::NoEligiblePeers {
            identity: active.identity.clone(),
            scanned,
        });
    }

    ranked.sort_by(|a, b| {
        rank_key(a)
            .partial_cmp(&rank_key(b))
            .unwrap_or(Ordering::Equal)
            .then_with(|| (a.shared_items == 0).cmp(&(b.shared_items == 0)))
    });

    debug!(
        identity = %active.identity,
        scanned,
        eligible = ranked.len(),
        "ranked neighbors"
    );
    Ok(ranked)
}

/// The `neighbor_count(N)` closest eligible peers.
pub fn nearest_neighbors(
    active: &Profile,
    peers: &[Profile],
    catalog: Option<&Catalog>,
) -> Result<Vec<NeighborCandidate>> {
    let mut ranked = rank_neighbors(active, peers, catalog)?;
    let k = neighbor_count(ranked.len());
    ranked.truncate(k);
    Ok(ranked)
}

/// Agreement between two counts: 1 - |n1 - n2| / (n1 + n2). Two zeros agree fully.
pub fn count_agreement(n1: u64, n2: u64) -> f64 {
    let total = n1 + n2;
    if total == 0 {
        return 1.0;
    }
    1.0 - n1.abs_diff(n2) as f64 / total as f64
}

/// Per-item click agreement for the items both profiles have clicked, in `a`'s order.
pub fn click_agreement(a: &Counts, b: &Counts) -> Vec<(String, f64)> {
    a.iter()
        .filter(|(item, _)| b.contains(item))
        .map(|(item, n1)| (item.to_string(), count_agreement(n1, b.get(item))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratios(pairs: &[(&str, f64)]) -> Ratios {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    fn profile(identity: &str, cpi: &[(&str, f64)]) -> Profile {
        let mut p = Profile::new(identity);
        p.stats.cpi = ratios(cpi);
        p
    }

    #[test]
    fn test_difference_self_is_zero() {
        let d = ratios(&[("pizza", 80.0), ("sushi", 20.0), ("rice", 33.3)]);
        assert_eq!(difference(&d, &d), 0.0);
    }

    #[test]
    fn test_difference_symmetric() {
        let d1 = ratios(&[("pizza", 80.0), ("sushi", 20.0), ("rice", 33.3), ("soup", 1.0)]);
        let d2 = ratios(&[("rice", 66.6), ("sushi", 40.0), ("pizza", 10.1), ("tacos", 5.0)]);
        assert_eq!(difference(&d1, &d2), difference(&d2, &d1));
    }

    #[test]
    fn test_difference_only_counts_shared_keys() {
        let d1 = ratios(&[("pizza", 80.0), ("sushi", 20.0)]);
        let d2 = ratios(&[("pizza", 60.0), ("steak", 100.0)]);
        assert!((difference(&d1, &d2) - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_difference_no_overlap_is_neutral_constant() {
        let d1 = ratios(&[("pizza", 80.0)]);
        let d2 = ratios(&[("sushi", 20.0)]);
        assert_eq!(difference(&d1, &d2), NO_OVERLAP_DISTANCE);
        assert_eq!(difference(&d1, &Ratios::new()), NO_OVERLAP_DISTANCE);
    }

    #[test]
    fn test_neighbor_count_growth() {
        assert_eq!(neighbor_count(0), 0);
        assert_eq!(neighbor_count(1), 1);
        assert_eq!(neighbor_count(2), 2);
        assert_eq!(neighbor_count(3), 2);
        assert_eq!(neighbor_count(8), 4);
        assert_eq!(neighbor_count(27), 9);
        assert_eq!(neighbor_count(1000), 100);
    }

    #[test]
    fn test_rank_pizza_sushi_scenario() {
        let active = profile("me", &[("pizza", 80.0), ("sushi", 20.0)]);
        let peers = vec![
            profile("a", &[("pizza", 60.0), ("sushi", 40.0)]),
            profile("b", &[("sushi", 0.0)]),
        ];
        let ranked = rank_neighbors(&active, &peers, None).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].identity, "a");
        assert!((ranked[0].distance - 20.0).abs() < 1e-10);
        assert_eq!(ranked[0].shared_items, 2);
    }

    #[test]
    fn test_rank_orders_ascending_and_skips_self() {
        let active = profile("me", &[("pizza", 80.0), ("sushi", 20.0)]);
        let peers = vec![
            profile("far", &[("pizza", 0.0), ("sushi", 100.0)]),
            profile("me", &[("pizza", 80.0), ("sushi", 20.0)]),
            profile("near", &[("pizza", 75.0), ("sushi", 25.0)]),
            profile("mid", &[("pizza", 50.0)]),
        ];
        let ranked = rank_neighbors(&active, &peers, None).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|n| n.identity.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
    }

    #[test]
    fn test_no_overlap_peers_rank_in_the_middle() {
        let active = profile("me", &[("pizza", 80.0), ("sushi", 50.0)]);
        let peers = vec![
            profile("stranger", &[("steak", 90.0)]),
            profile("rival", &[("pizza", 0.0), ("soup", 50.0)]),
            profile("twin", &[("pizza", 75.0), ("sushi", 55.0)]),
            profile("even", &[("pizza", 30.0)]),
        ];
        let ranked = rank_neighbors(&active, &peers, None).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|n| n.identity.as_str()).collect();
        // twin 5, even 50 (ties the no-overlap rank), stranger, rival 80
        assert_eq!(ids, vec!["twin", "even", "stranger", "rival"]);

        let stranger = &ranked[2];
        assert_eq!(stranger.shared_items, 0);
        assert_eq!(stranger.distance, NO_OVERLAP_DISTANCE);
        assert!((ranked[3].distance - 80.0).abs() < 1e-10);
    }

    #[test]
    fn test_no_eligible_peers() {
        let active = profile("me", &[("pizza", 80.0)]);
        let peers = vec![
            profile("me", &[("pizza", 80.0)]),
            profile("new", &[]),
            profile("zeros", &[("sushi", 0.0)]),
        ];
        let err = rank_neighbors(&active, &peers, None).unwrap_err();
        match err {
            PalateError::NoEligiblePeers { identity, scanned } => {
                assert_eq!(identity, "me");
                assert_eq!(scanned, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_catalog_zero_fills_unknown_items() {
        let catalog = Catalog::new(["pizza", "sushi"]);
        let active = profile("me", &[("pizza", 80.0), ("kimchi", 90.0)]);
        let peers = vec![
            profile("a", &[("pizza", 70.0), ("kimchi", 10.0)]),
            profile("b", &[("kimchi", 100.0)]),
        ];
        let ranked = rank_neighbors(&active, &peers, Some(&catalog)).unwrap();
        // b only rated an unknown item, so it has no signal left
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].cpi.get("kimchi"), Some(0.0));
        // kimchi still counts as shared, at zero on both sides
        assert!((ranked[0].distance - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_nearest_truncates_to_k() {
        let active = profile("me", &[("pizza", 50.0)]);
        let peers: Vec<Profile> = (0..8)
            .map(|i| profile(&format!("p{i}"), &[("pizza", 10.0 * i as f64 + 1.0)]))
            .collect();
        let nearest = nearest_neighbors(&active, &peers, None).unwrap();
        assert_eq!(nearest.len(), 4);
        assert_eq!(nearest[0].identity, "p5"); // 51
        assert_eq!(nearest[1].identity, "p4"); // 41
    }

    #[test]
    fn test_count_agreement() {
        assert_eq!(count_agreement(0, 0), 1.0);
        assert_eq!(count_agreement(3, 3), 1.0);
        assert!((count_agreement(1, 3) - 0.5).abs() < 1e-10);
        assert_eq!(count_agreement(0, 4), 0.0);
    }

    #[test]
    fn test_click_agreement_shared_items_only() {
        let a: Counts = [("pizza", 2), ("rice", 1)].into_iter().collect();
        let b: Counts = [("pizza", 2), ("soup", 5)].into_iter().collect();
        assert_eq!(click_agreement(&a, &b), vec![("pizza".to_string(), 1.0)]);
    }
}
