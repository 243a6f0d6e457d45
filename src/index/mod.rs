//! The surface index: a queryable JSON snapshot of a surface tree.

pub mod indexer;

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VeneerError};
use crate::schema::CommandType;
use crate::track::ReleaseTrack;
pub use indexer::Indexer;

/// Queryable snapshot of one surface tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceIndex {
    /// Tool version that wrote the index
    pub version: String,
    pub generated: DateTime<Utc>,
    pub root: String,
    pub stats: IndexStats,
    /// Command path -> entry, e.g. `compute instances create`
    pub commands: BTreeMap<String, CommandEntry>,
    /// Group path -> entry
    pub groups: BTreeMap<String, GroupEntry>,
    /// Relative file path -> fingerprint
    pub files: BTreeMap<String, FileEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub files: usize,
    pub commands: usize,
    pub groups: usize,
    pub resource_specs: usize,
    pub collections: usize,
    pub export_schemas: usize,
    pub load_errors: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEntry {
    pub file: String,
    pub kind: CommandType,
    pub variants: Vec<VariantEntry>,
}

impl CommandEntry {
    /// The variant visible on `track`, honoring unscoped single specs.
    pub fn variant_for(&self, track: ReleaseTrack) -> Option<&VariantEntry> {
        self.variants
            .iter()
            .find(|v| v.tracks.contains(&track))
            .or_else(|| match self.variants.as_slice() {
                [only] if only.tracks.is_empty() => Some(only),
                _ => None,
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantEntry {
    pub tracks: Vec<ReleaseTrack>,
    pub hidden: bool,
    pub brief: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub async_collection: Option<String>,
    #[serde(default)]
    pub argument_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEntry {
    pub brief: String,
    pub hidden: bool,
    #[serde(default)]
    pub tracks: Vec<ReleaseTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub kind: String,
    pub sha256: String,
}

impl SurfaceIndex {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| VeneerError::io(parent, e))?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json + "\n").map_err(|e| VeneerError::io(path, e))
    }

    pub fn from_json(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| VeneerError::io(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Commands visible on a track, hidden ones excluded unless requested.
    pub fn commands_for_track(
        &self,
        track: ReleaseTrack,
        include_hidden: bool,
    ) -> Vec<(&str, &VariantEntry)> {
        self.commands
            .iter()
            .filter_map(|(path, entry)| {
                entry
                    .variant_for(track)
                    .filter(|v| include_hidden || !v.hidden)
                    .map(|v| (path.as_str(), v))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(tracks: Vec<ReleaseTrack>, hidden: bool) -> CommandEntry {
        CommandEntry {
            file: "a/b.yaml".to_string(),
            kind: CommandType::Create,
            variants: vec![VariantEntry {
                tracks,
                hidden,
                brief: "Create.".to_string(),
                collection: Some("a.b".to_string()),
                method: Some("create".to_string()),
                async_collection: None,
                argument_names: vec![],
            }],
        }
    }

    fn index() -> SurfaceIndex {
        let mut commands = BTreeMap::new();
        commands.insert("a b create".to_string(), entry(vec![ReleaseTrack::Ga], false));
        commands.insert(
            "a b frob".to_string(),
            entry(vec![ReleaseTrack::Alpha], true),
        );
        SurfaceIndex {
            version: "0.3.0".to_string(),
            generated: Utc::now(),
            root: "surface".to_string(),
            stats: IndexStats::default(),
            commands,
            groups: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }

    #[test]
    fn test_track_filtering() {
        let index = index();
        let ga = index.commands_for_track(ReleaseTrack::Ga, false);
        assert_eq!(ga.len(), 1);
        assert_eq!(ga[0].0, "a b create");

        let alpha_visible = index.commands_for_track(ReleaseTrack::Alpha, false);
        assert!(alpha_visible.is_empty());
        let alpha_all = index.commands_for_track(ReleaseTrack::Alpha, true);
        assert_eq!(alpha_all.len(), 1);
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/surface.index.json");
        let index = index();
        index.write_json(&path).unwrap();
        let loaded = SurfaceIndex::from_json(&path).unwrap();
        assert_eq!(loaded.commands.len(), index.commands.len());
        assert_eq!(loaded.version, index.version);
    }

    #[test]
    fn test_unscoped_variant_visible_everywhere() {
        let entry = entry(vec![], false);
        assert!(entry.variant_for(ReleaseTrack::Alpha).is_some());
        assert!(entry.variant_for(ReleaseTrack::Ga).is_some());
    }
}
