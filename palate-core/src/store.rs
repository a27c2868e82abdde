/// Profile persistence seam.
///
/// The core reads and writes profiles only through `ProfileStore`. `MemoryStore`
/// backs tests and embedders that keep profiles in process.
use indexmap::IndexMap;

use crate::error::{PalateError, Result};
use crate::types::Profile;

pub trait ProfileStore {
    /// Load one profile. Fails with `ProfileNotFound` if it does not exist.
    fn load(&self, identity: &str) -> Result<Profile>;

    /// Persist `profile` under its identity, replacing any previous version in one step.
    fn save(&mut self, profile: &Profile) -> Result<()>;

    /// Fresh snapshots of every stored profile except `excluding`.
    fn list_peers(&self, excluding: &str) -> Result<Vec<Profile>>;

    fn exists(&self, identity: &str) -> Result<bool> {
        match self.load(identity) {
            Ok(_) => Ok(true),
            Err(PalateError::ProfileNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: IndexMap<String, Profile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl FromIterator<Profile> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = Profile>>(iter: I) -> Self {
        MemoryStore {
            profiles: iter.into_iter().map(|p| (p.identity.clone(), p)).collect(),
        }
    }
}

impl ProfileStore for MemoryStore {
    fn load(&self, identity: &str) -> Result<Profile> {
        self.profiles
            .get(identity)
            .cloned()
            .ok_or_else(|| PalateError::ProfileNotFound(identity.to_string()))
    }

    fn save(&mut self, profile: &Profile) -> Result<()> {
        self.profiles.insert(profile.identity.clone(), profile.clone());
        Ok(())
    }

    fn list_peers(&self, excluding: &str) -> Result<Vec<Profile>> {
        Ok(self
            .profiles
            .values()
            .filter(|p| p.identity != excluding)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(!store.exists("ana").unwrap());

        let mut profile = Profile::new("ana");
        profile.stats.clicks.add("pizza", 2);
        store.save(&profile).unwrap();

        assert!(store.exists("ana").unwrap());
        assert_eq!(store.load("ana").unwrap(), profile);
    }

    #[test]
    fn test_missing_profile() {
        let store = MemoryStore::new();
        let err = store.load("ghost").unwrap_err();
        assert!(matches!(err, PalateError::ProfileNotFound(ref id) if id == "ghost"));
    }

    #[test]
    fn test_list_peers_excludes_active() {
        let store: MemoryStore = ["ana", "ben", "cy"].into_iter().map(Profile::new).collect();
        let peers = store.list_peers("ben").unwrap();
        let ids: Vec<&str> = peers.iter().map(|p| p.identity.as_str()).collect();
        assert_eq!(ids, vec!["ana", "cy"]);
        assert_eq!(store.len(), 3);
    }
}
