/// Preference rounds: chained binary comparisons over a candidate list.
///
/// The session decides which two items meet and in what order results are folded.
/// Asking the question is delegated to a `ComparisonResolver`.
use std::collections::HashSet;

use tracing::debug;

use crate::error::{PalateError, Result};
use crate::types::{Choice, Counts, Observation, RoundDelta};

/// Answers "which of these two do you prefer?".
///
/// Implementations may block indefinitely. An `Err` aborts the round.
pub trait ComparisonResolver {
    fn resolve(&mut self, first: &str, second: &str) -> Result<Choice>;
}

impl<F> ComparisonResolver for F
where
    F: FnMut(&str, &str) -> Result<Choice>,
{
    fn resolve(&mut self, first: &str, second: &str) -> Result<Choice> {
        self(first, second)
    }
}

/// A resolved round: the chain of comparisons and the counts they produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    pub observations: Vec<Observation>,
    pub delta: RoundDelta,
}

pub struct PreferenceSession {
    comparisons: usize,
}

impl PreferenceSession {
    pub fn new(comparisons: usize) -> Self {
        assert!(comparisons >= 1, "PreferenceSession requires at least one comparison per round.");
        PreferenceSession { comparisons }
    }

    pub fn comparisons(&self) -> usize {
        self.comparisons
    }

    /// Candidates needed for one round.
    pub fn required_candidates(&self) -> usize {
        self.comparisons + 1
    }

    /// Check a candidate list without running it.
    pub fn validate(&self, candidates: &[String]) -> Result<()> {
        if candidates.len() < self.required_candidates() {
            return Err(PalateError::InsufficientCandidates {
                needed: self.required_candidates(),
                candidates: candidates.to_vec(),
            });
        }

        let mut seen = HashSet::with_capacity(candidates.len());
        for item in candidates {
            if !seen.insert(item.as_str()) {
                return Err(PalateError::DuplicateCandidate {
                    item: item.clone(),
                    candidates: candidates.to_vec(),
                });
            }
        }
        Ok(())
    }

    /// Run one round over `candidates`.
    ///
    /// Comparison i offers the current chain winner (initially `candidates[0]`)
    /// against `candidates[i + 1]`. Candidates beyond the first
    /// `comparisons + 1` are never offered.
    pub fn run<R>(&self, candidates: &[String], resolver: &mut R) -> Result<SessionResult>
    where
        R: ComparisonResolver + ?Sized,
    {
        self.validate(candidates)?;

        let mut observations = Vec::with_capacity(self.comparisons);
        let mut champion = candidates[0].as_str();

        for challenger in &candidates[1..=self.comparisons] {
            let (winner, loser) = match resolver.resolve(champion, challenger)? {
                Choice::First => (champion, challenger.as_str()),
                Choice::Second => (challenger.as_str(), champion),
            };
            debug!(winner, loser, "comparison resolved");

            observations.push(Observation {
                winner: winner.to_string(),
                loser: loser.to_string(),
            });
            champion = winner;
        }

        let delta = fold_observations(&observations);
        Ok(SessionResult { observations, delta })
    }
}

/// Fold a round's observations into click, impression and tally counts.
///
/// Tally: a winner seen for the first time this round enters with the loser's
/// tally plus one, inheriting the streak it broke; afterwards each win adds one.
pub fn fold_observations(observations: &[Observation]) -> RoundDelta {
    let mut clicks = Counts::new();
    let mut impressions = Counts::new();
    let mut tally = Counts::new();

    for Observation { winner, loser } in observations {
        if tally.contains(winner) {
            tally.add(winner, 1);
        } else {
            let inherited = tally.get(loser);
            tally.add(winner, inherited + 1);
        }

        clicks.add(winner, 1);
        impressions.add(winner, 1);
        impressions.add(loser, 1);
    }

    RoundDelta { clicks, impressions, tally }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn obs(winner: &str, loser: &str) -> Observation {
        Observation { winner: winner.to_string(), loser: loser.to_string() }
    }

    /// Resolver that prefers whichever item sits earlier in its list.
    struct Ranked(Vec<&'static str>);

    impl ComparisonResolver for Ranked {
        fn resolve(&mut self, first: &str, second: &str) -> Result<Choice> {
            let pos = |x: &str| self.0.iter().position(|&r| r == x).unwrap_or(usize::MAX);
            Ok(if pos(first) <= pos(second) { Choice::First } else { Choice::Second })
        }
    }

    #[test]
    fn test_rice_wins_twice_loses_once() {
        let observations = vec![
            obs("rice", "soup"),
            obs("rice", "tacos"),
            obs("pizza", "rice"),
        ];
        let delta = fold_observations(&observations);
        assert_eq!(delta.clicks.get("rice"), 2);
        assert_eq!(delta.impressions.get("rice"), 3);
        assert_eq!(delta.clicks.get("pizza"), 1);
        assert_eq!(delta.impressions.get("soup"), 1);
        assert!(!delta.clicks.contains("soup"));
    }

    #[test]
    fn test_tally_inherits_streak() {
        let observations = vec![
            obs("rice", "soup"),  // rice enters at 1
            obs("rice", "tacos"), // rice 2
            obs("pizza", "rice"), // pizza enters at rice + 1 = 3
            obs("pizza", "steak"), // pizza 4
        ];
        let delta = fold_observations(&observations);
        assert_eq!(delta.tally.get("rice"), 2);
        assert_eq!(delta.tally.get("pizza"), 4);
        assert!(!delta.tally.contains("soup"));
    }

    #[test]
    fn test_chain_carries_winner_forward() {
        let session = PreferenceSession::new(4);
        let candidates = items(&["a", "b", "c", "d", "e"]);
        let mut resolver = Ranked(vec!["c", "a", "e", "b", "d"]);

        let result = session.run(&candidates, &mut resolver).unwrap();
        assert_eq!(
            result.observations,
            vec![obs("a", "b"), obs("c", "a"), obs("c", "d"), obs("c", "e")]
        );
        assert_eq!(result.delta.clicks.get("c"), 3);
        assert_eq!(result.delta.impressions.get("c"), 3);
        assert_eq!(result.delta.impressions.get("a"), 2);
        // every comparison shows two items
        assert_eq!(result.delta.impressions.total(), 8);
        assert_eq!(result.delta.clicks.total(), 4);
    }

    #[test]
    fn test_offered_pairs_follow_chain() {
        let session = PreferenceSession::new(2);
        let candidates = items(&["x", "y", "z"]);
        let mut offered = Vec::new();
        let mut resolver = |first: &str, second: &str| -> Result<Choice> {
            offered.push((first.to_string(), second.to_string()));
            Ok(Choice::Second)
        };
        session.run(&candidates, &mut resolver).unwrap();
        assert_eq!(
            offered,
            vec![("x".to_string(), "y".to_string()), ("y".to_string(), "z".to_string())]
        );
    }

    #[test]
    fn test_extra_candidates_are_ignored() {
        let session = PreferenceSession::new(2);
        let candidates = items(&["x", "y", "z", "w"]);
        let mut resolver = |_: &str, _: &str| -> Result<Choice> { Ok(Choice::First) };
        let result = session.run(&candidates, &mut resolver).unwrap();
        assert_eq!(result.observations.len(), 2);
        assert!(!result.delta.impressions.contains("w"));
    }

    #[test]
    fn test_too_few_candidates_is_an_error() {
        let session = PreferenceSession::new(4);
        let mut resolver = |_: &str, _: &str| -> Result<Choice> { Ok(Choice::First) };

        let err = session.run(&items(&["a", "b", "c"]), &mut resolver).unwrap_err();
        match err {
            PalateError::InsufficientCandidates { needed, candidates } => {
                assert_eq!(needed, 5);
                assert_eq!(candidates.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = session.run(&items(&["a"]), &mut resolver).unwrap_err();
        assert!(matches!(err, PalateError::InsufficientCandidates { .. }));
    }

    #[test]
    fn test_duplicate_candidates_rejected() {
        let session = PreferenceSession::new(2);
        let mut resolver = |_: &str, _: &str| -> Result<Choice> { Ok(Choice::First) };
        let err = session.run(&items(&["a", "b", "a"]), &mut resolver).unwrap_err();
        assert!(matches!(err, PalateError::DuplicateCandidate { ref item, .. } if item == "a"));
    }

    #[test]
    fn test_resolver_failure_aborts_round() {
        let session = PreferenceSession::new(2);
        let mut calls = 0;
        let mut resolver = |first: &str, second: &str| -> Result<Choice> {
            calls += 1;
            Err(PalateError::Resolver {
                first: first.to_string(),
                second: second.to_string(),
                reason: "stdin closed".to_string(),
            })
        };
        let err = session.run(&items(&["a", "b", "c"]), &mut resolver).unwrap_err();
        assert!(matches!(err, PalateError::Resolver { .. }));
        assert_eq!(calls, 1);
    }

    #[test]
    #[should_panic(expected = "at least one comparison")]
    fn test_session_requires_a_comparison() {
        let _ = PreferenceSession::new(0);
    }
}
