use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PalateError>;

/// Failures surfaced by the preference / similarity / recommendation pipeline.
///
/// Every variant carries the inputs that caused it so callers can report them verbatim.
#[derive(Error, Debug)]
pub enum PalateError {
    /// Preference round given fewer candidates than it has comparisons + 1.
    #[error("Insufficient candidates: need {needed}, got {} ({candidates:?})", .candidates.len())]
    InsufficientCandidates {
        needed: usize,
        candidates: Vec<String>,
    },

    /// The same item appears twice in a preference round's candidates.
    #[error("Duplicate candidate \"{item}\" in {candidates:?}")]
    DuplicateCandidate {
        item: String,
        candidates: Vec<String>,
    },

    /// No peer profile has any non-zero CPI to compare against.
    #[error("No eligible peers for \"{identity}\" ({scanned} profiles scanned)")]
    NoEligiblePeers { identity: String, scanned: usize },

    /// The recommendation pool holds fewer distinct drawable items than requested.
    #[error("Exhausted pool: requested {requested} items, only {available} available")]
    ExhaustedPool { requested: usize, available: usize },

    #[error("Profile not found: \"{0}\"")]
    ProfileNotFound(String),

    /// Profile storage read/write failure, propagated from the store implementation.
    #[error("Profile store failure for \"{identity}\": {reason}")]
    Store { identity: String, reason: String },

    /// The comparison resolver could not produce an answer.
    #[error("Comparison \"{first}\" vs \"{second}\" failed: {reason}")]
    Resolver {
        first: String,
        second: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_offending_inputs() {
        let err = PalateError::InsufficientCandidates {
            needed: 5,
            candidates: vec!["pizza".into(), "sushi".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("need 5, got 2"), "{msg}");
        assert!(msg.contains("pizza") && msg.contains("sushi"), "{msg}");

        let err = PalateError::ExhaustedPool { requested: 6, available: 4 };
        assert_eq!(err.to_string(), "Exhausted pool: requested 6 items, only 4 available");
    }
}
