//! Project configuration.
//!
//! Loaded from `.veneer.json` at the surface root. Everything has a default
//! so the tool also runs without a config file.

use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VeneerError};
use crate::track::ReleaseTrack;

/// Default config file name.
pub const CONFIG_FILE: &str = ".veneer.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Glob patterns for files to load, relative to the surface root
    pub include: Vec<String>,
    /// Glob patterns for files to skip
    pub exclude: Vec<String>,
    /// Root for `!REF` and collection lookups; the surface root when unset
    pub data_root: Option<PathBuf>,
    /// Track assumed when a command does not specify one
    pub default_track: ReleaseTrack,
    /// Rayon worker threads; number of CPUs when unset
    pub workers: Option<usize>,
    /// Where `veneer index` writes by default
    pub index_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include: vec!["**/*.yaml".to_string(), "**/*.yml".to_string()],
            exclude: Vec::new(),
            data_root: None,
            default_track: ReleaseTrack::Ga,
            workers: None,
            index_path: PathBuf::from(".veneer/surface.index.json"),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| VeneerError::io(path, e))?;
        serde_json::from_str(&raw)
            .map_err(|e| VeneerError::Config(format!("{}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json + "\n").map_err(|e| VeneerError::io(path, e))
    }

    /// Where refs and collections resolve, relative to the surface root.
    pub fn data_root(&self, surface_root: &Path) -> PathBuf {
        match &self.data_root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => surface_root.join(root),
            None => surface_root.to_path_buf(),
        }
    }

    /// Whether a file (relative to the surface root) should be loaded.
    pub fn matches(&self, relative: &Path) -> bool {
        let matches_any = |patterns: &[String]| {
            patterns
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .any(|p| p.matches_path(relative))
        };
        matches_any(&self.include) && !matches_any(&self.exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_track, ReleaseTrack::Ga);
        assert!(config.matches(Path::new("compute/instances/create.yaml")));
    }

    #[test]
    fn test_exclude_wins() {
        let config = Config {
            exclude: vec!["**/testdata/**".to_string()],
            ..Default::default()
        };
        assert!(!config.matches(Path::new("compute/testdata/bad.yaml")));
        assert!(config.matches(Path::new("compute/create.yaml")));
    }

    #[test]
    fn test_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = Config {
            default_track: ReleaseTrack::Beta,
            workers: Some(4),
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.default_track, ReleaseTrack::Beta);
        assert_eq!(loaded.workers, Some(4));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"default_track": "ALPHA"}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_track, ReleaseTrack::Alpha);
        assert!(!config.include.is_empty());
    }

    #[test]
    fn test_data_root_resolution() {
        let config = Config {
            data_root: Some(PathBuf::from("shared")),
            ..Default::default()
        };
        assert_eq!(
            config.data_root(Path::new("/surface")),
            PathBuf::from("/surface/shared")
        );
        let absolute = Config {
            data_root: Some(PathBuf::from("/data")),
            ..Default::default()
        };
        assert_eq!(
            absolute.data_root(Path::new("/surface")),
            PathBuf::from("/data")
        );
    }
}
