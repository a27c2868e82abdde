/// Profile store backed by a directory of JSON files, one per identity.
///
/// Saves go through a temp file in the same directory and a rename, so a
/// reader never sees a half-written profile.
use palate_core::{PalateError, Profile, ProfileStore, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const EXTENSION: &str = "json";

pub struct JsonDirStore {
    dir: PathBuf,
}

/// Identities become file names, so they must be a single plain path component.
pub fn validate_identity(identity: &str) -> std::result::Result<(), String> {
    if identity.trim().is_empty() {
        return Err("Username must not be empty".to_string());
    }
    if identity.starts_with('.') {
        return Err(format!("Username \"{identity}\" must not start with '.'"));
    }
    if identity.chars().any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control()) {
        return Err(format!("Username \"{identity}\" contains a path separator or control character"));
    }
    Ok(())
}

impl JsonDirStore {
    /// Open (and create if needed) a profile directory.
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(JsonDirStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, identity: &str) -> Result<PathBuf> {
        validate_identity(identity).map_err(|reason| store_error(identity, reason))?;
        Ok(self.dir.join(format!("{identity}.{EXTENSION}")))
    }
}

fn store_error(identity: &str, reason: impl std::fmt::Display) -> PalateError {
    PalateError::Store {
        identity: identity.to_string(),
        reason: reason.to_string(),
    }
}

impl ProfileStore for JsonDirStore {
    fn load(&self, identity: &str) -> Result<Profile> {
        let path = self.path_for(identity)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PalateError::ProfileNotFound(identity.to_string()));
            }
            Err(e) => return Err(store_error(identity, format!("read {}: {e}", path.display()))),
        };

        let profile: Profile = serde_json::from_str(&content)
            .map_err(|e| store_error(identity, format!("parse {}: {e}", path.display())))?;
        if profile.identity != identity {
            return Err(store_error(
                identity,
                format!("{} holds profile \"{}\"", path.display(), profile.identity),
            ));
        }
        Ok(profile)
    }

    fn save(&mut self, profile: &Profile) -> Result<()> {
        let identity = profile.identity.as_str();
        let path = self.path_for(identity)?;
        let json = serde_json::to_string_pretty(profile).map_err(|e| store_error(identity, e))?;

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| store_error(identity, e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.write_all(b"\n"))
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| store_error(identity, e))?;
        tmp.persist(&path)
            .map_err(|e| store_error(identity, format!("write {}: {}", path.display(), e.error)))?;
        Ok(())
    }

    fn list_peers(&self, excluding: &str) -> Result<Vec<Profile>> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| store_error(excluding, format!("list {}: {e}", self.dir.display())))?;

        let mut identities = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| store_error(excluding, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if stem != excluding && validate_identity(stem).is_ok() {
                    identities.push(stem.to_string());
                }
            }
        }
        identities.sort();

        identities.iter().map(|id| self.load(id)).collect()
    }
}
