/// Config file loading and creation for the palate CLI.
///
/// Config lives at ~/.config/palate/config.toml.
/// All fields are optional. CLI args override config values.
use palate_core::{Catalog, EngineConfig};
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Deserialize, Default, Debug, PartialEq)]
pub struct PalateConfig {
    pub profiles_dir: Option<String>,
    pub comparisons: Option<usize>,
    pub recommendations: Option<usize>,
    pub exploration_share: Option<f64>,
    pub include_own_profile: Option<bool>,
    pub catalog: Option<Vec<String>>,
}

/// Directory used when neither `--profiles-dir` nor the config sets one.
pub const DEFAULT_PROFILES_DIR: &str = "Profiles";

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# palate configuration
# All values here can be overridden by CLI flags.

# Directory holding one JSON file per profile
# profiles_dir = \"Profiles\"

# Comparisons per round (a round needs comparisons + 1 candidates)
# comparisons = 4

# Recommendations drawn after each round (must be at least comparisons + 1)
# recommendations = 6

# Share of sampling weight reserved for items nobody nearby has picked yet, in [0, 1)
# exploration_share = 0.1

# Average your own CPI into the recommendation pool
# include_own_profile = false

# Items to choose from. Defaults to the built-in list of seventeen dishes.
# catalog = [\"pizza\", \"sushi\", \"tacos\", \"soup\", \"steak\", \"waffles\"]
";

/// Returns the default config path: ~/.config/palate/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("palate").join("config.toml")
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> PalateConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => PalateConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

fn parse_config(content: &str) -> Result<PalateConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Write the commented template to `path`, creating parent directories.
/// Fails with `AlreadyExists` rather than overwrite an existing file.
pub fn write_default_config(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())
}

impl PalateConfig {
    /// Engine settings: config values over built-in defaults, validated before use.
    pub fn engine_config(&self) -> EngineConfig {
        let defaults = EngineConfig::default();
        let config = EngineConfig {
            comparisons_per_round: self.comparisons.unwrap_or(defaults.comparisons_per_round),
            recommendation_count: self.recommendations.unwrap_or(defaults.recommendation_count),
            pool_neighbors: defaults.pool_neighbors,
            exploration_share: self.exploration_share.unwrap_or(defaults.exploration_share),
            include_own_profile: self.include_own_profile.unwrap_or(defaults.include_own_profile),
        };

        if config.comparisons_per_round == 0 {
            bail("comparisons must be at least 1");
        }
        if config.recommendation_count < config.comparisons_per_round + 1 {
            bail(format!(
                "recommendations ({}) must be at least comparisons + 1 ({})",
                config.recommendation_count,
                config.comparisons_per_round + 1
            ));
        }
        if !(0.0..1.0).contains(&config.exploration_share) {
            bail(format!("exploration_share must be in [0, 1), got {}", config.exploration_share));
        }
        config
    }

    pub fn catalog(&self) -> Catalog {
        match &self.catalog {
            Some(items) => {
                let mut unique: Vec<&str> = Vec::with_capacity(items.len());
                for item in items.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
                    if unique.contains(&item) {
                        bail(format!("Duplicate catalog item \"{item}\" in config"));
                    }
                    unique.push(item);
                }
                Catalog::new(unique)
            }
            None => Catalog::default(),
        }
    }

    pub fn profiles_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.profiles_dir.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROFILES_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_parses_to_defaults() {
        let cfg = parse_config(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(cfg, PalateConfig::default());
        assert_eq!(cfg.engine_config(), EngineConfig::default());
        assert_eq!(cfg.catalog().len(), 17);
    }

    #[test]
    fn test_parse_overrides() {
        let cfg = parse_config(
            "comparisons = 2\nrecommendations = 4\nexploration_share = 0.25\ncatalog = [\"a\", \"b\", \"c\", \"d\"]\n",
        )
        .unwrap();
        let engine = cfg.engine_config();
        assert_eq!(engine.comparisons_per_round, 2);
        assert_eq!(engine.recommendation_count, 4);
        assert_eq!(engine.exploration_share, 0.25);
        let catalog = cfg.catalog();
        assert_eq!(catalog.items().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_profiles_dir_precedence() {
        let cfg = PalateConfig {
            profiles_dir: Some("/var/palate".to_string()),
            ..PalateConfig::default()
        };
        assert_eq!(cfg.profiles_dir(None), PathBuf::from("/var/palate"));
        assert_eq!(cfg.profiles_dir(Some(PathBuf::from("here"))), PathBuf::from("here"));
        assert_eq!(PalateConfig::default().profiles_dir(None), PathBuf::from(DEFAULT_PROFILES_DIR));
    }

    #[test]
    fn test_write_default_config_at_custom_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("palate.toml");

        write_default_config(&path).unwrap();
        assert_eq!(load_config(&path), PalateConfig::default());

        std::fs::write(&path, "comparisons = 2\n").unwrap();
        let err = write_default_config(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
        // the existing file is left alone
        assert_eq!(load_config(&path).comparisons, Some(2));
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        assert!(parse_config("comparisons = \"four\"").is_err());
    }
}
