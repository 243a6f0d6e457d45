//! Surface document loading.
//!
//! Walks a surface tree, classifies each YAML document, resolves `!REF`
//! includes, splits track-scoped variant files, and hands typed specs to the
//! linter and indexer.

pub mod refs;

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use walkdir::WalkDir;

use crate::error::{Result, VeneerError};
use crate::resource::ResourceSpec;
use crate::schema::{CommandSpec, CommandType, GroupSpec};
use crate::track::{self, ReleaseTrack};
pub use refs::{contains_ref, RefResolver, RefTarget};

/// What a YAML file in the surface tree is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// A command declaration (single spec or track variants)
    Command,
    /// A `group.yaml` command-group declaration
    Group,
    /// A `collections.yaml` API registry document
    Collections,
    /// A `resources.yaml` shared resource-spec data file
    Resources,
    /// A JSON-Schema-shaped export/import schema (`$schema` present)
    ExportSchema,
}

/// Classify a document by file name and, for schemas, its top-level keys.
pub fn classify(path: &Path, value: &Value) -> DocumentKind {
    match path.file_name().and_then(|n| n.to_str()) {
        Some("group.yaml") => return DocumentKind::Group,
        Some("collections.yaml") => return DocumentKind::Collections,
        Some("resources.yaml") => return DocumentKind::Resources,
        _ => {}
    }
    if value.get("$schema").is_some() {
        return DocumentKind::ExportSchema;
    }
    DocumentKind::Command
}

/// One release-track variant of a command file.
#[derive(Debug, Clone)]
pub struct CommandVariant {
    pub tracks: Vec<ReleaseTrack>,
    pub spec: CommandSpec,
}

/// A fully loaded command file.
#[derive(Debug, Clone)]
pub struct CommandFile {
    pub path: PathBuf,
    /// Space-separated command path relative to the surface root
    pub command_path: String,
    pub command_type: CommandType,
    pub variants: Vec<CommandVariant>,
}

impl CommandFile {
    /// The variant applicable to `track`, if any.
    pub fn for_track(&self, track: ReleaseTrack) -> Option<&CommandVariant> {
        let tracksets: Vec<Vec<ReleaseTrack>> =
            self.variants.iter().map(|v| v.tracks.clone()).collect();
        track::select_variant(&tracksets, track)
            .map(|i| &self.variants[i])
            .or_else(|| {
                // A single variant with no explicit tracks applies everywhere.
                match self.variants.as_slice() {
                    [only] if only.tracks.is_empty() => Some(only),
                    _ => None,
                }
            })
    }

    /// Union of tracks across variants; all tracks when unscoped.
    pub fn tracks(&self) -> Vec<ReleaseTrack> {
        let mut tracks: Vec<ReleaseTrack> = self
            .variants
            .iter()
            .flat_map(|v| v.tracks.iter().copied())
            .collect();
        if tracks.is_empty() {
            tracks = ReleaseTrack::ALL.to_vec();
        }
        tracks.sort();
        tracks.dedup();
        tracks
    }
}

/// Loads and resolves surface documents relative to a root.
pub struct SurfaceLoader {
    root: PathBuf,
    resolver: RefResolver,
}

impl SurfaceLoader {
    /// `data_root` is where `!REF` file paths resolve; usually the surface
    /// root itself or a shared data directory next to it.
    pub fn new(root: impl Into<PathBuf>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            resolver: RefResolver::new(data_root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All YAML files under the root, sorted for deterministic output.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                // The root itself is exempt; only entries below it are
                // subject to the dot-file filter.
                e.depth() == 0
                    || e.file_name()
                        .to_str()
                        .map(|name| !name.starts_with('.'))
                        .unwrap_or(true)
            })
        {
            let entry = entry.map_err(|e| {
                VeneerError::io(&self.root, std::io::Error::other(e.to_string()))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_yaml = entry
                .path()
                .extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);
            if is_yaml {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Read and ref-resolve a document without typing it.
    pub fn load_raw(&mut self, path: &Path) -> Result<Value> {
        let raw = std::fs::read_to_string(path).map_err(|e| VeneerError::io(path, e))?;
        let value: Value = serde_yaml::from_str(&raw).map_err(|e| VeneerError::yaml(path, e))?;
        self.resolver.resolve(value)
    }

    /// Load a command file: single spec or a sequence of track variants.
    pub fn load_command(&mut self, path: &Path) -> Result<CommandFile> {
        let value = self.load_raw(path)?;
        self.command_from_value(path, value)
    }

    /// Build a command file from an already loaded and ref-resolved value.
    pub fn command_from_value(&self, path: &Path, value: Value) -> Result<CommandFile> {
        let variant_values: Vec<Value> = match value {
            Value::Sequence(items) => items,
            other => vec![other],
        };
        if variant_values.is_empty() {
            return Err(VeneerError::invalid_spec(path, "file contains no specs"));
        }

        let mut variants = Vec::with_capacity(variant_values.len());
        for variant in variant_values {
            let spec: CommandSpec = serde_yaml::from_value(variant)
                .map_err(|e| VeneerError::invalid_spec(path, e.to_string()))?;
            variants.push(CommandVariant {
                tracks: spec.release_tracks.clone(),
                spec,
            });
        }

        if variants.len() > 1 {
            let tracksets: Vec<Vec<ReleaseTrack>> =
                variants.iter().map(|v| v.tracks.clone()).collect();
            track::check_disjoint(&tracksets)
                .map_err(|e| VeneerError::invalid_spec(path, e))?;
        }

        let command_type = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(CommandType::from_stem)
            .unwrap_or(CommandType::Generic);

        Ok(CommandFile {
            command_path: command_path(&self.root, path),
            path: path.to_path_buf(),
            command_type,
            variants,
        })
    }

    /// Load a `group.yaml` declaration.
    pub fn load_group(&mut self, path: &Path) -> Result<GroupSpec> {
        let value = self.load_raw(path)?;
        serde_yaml::from_value(value).map_err(|e| VeneerError::invalid_spec(path, e.to_string()))
    }

    /// Load a `resources.yaml` data file: a map of named resource specs.
    pub fn load_resources(&mut self, path: &Path) -> Result<Vec<(String, ResourceSpec)>> {
        let value = self.load_raw(path)?;
        let mapping = value.as_mapping().ok_or_else(|| {
            VeneerError::invalid_spec(path, "resources.yaml must be a mapping of specs")
        })?;
        let mut specs = Vec::with_capacity(mapping.len());
        for (key, spec_value) in mapping {
            let name = key
                .as_str()
                .ok_or_else(|| VeneerError::invalid_spec(path, "spec keys must be strings"))?
                .to_string();
            let spec: ResourceSpec = serde_yaml::from_value(spec_value.clone())
                .map_err(|e| VeneerError::invalid_spec(path, format!("spec [{name}]: {e}")))?;
            specs.push((name, spec));
        }
        Ok(specs)
    }
}

/// Derive the space-separated command path from the file location:
/// `compute/instances/create.yaml` -> `compute instances create`.
/// Underscores become dashes, matching surfaced command names.
pub fn command_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().replace('_', "-"))
        .collect();
    if let Some(last) = parts.last_mut() {
        let stem = last
            .strip_suffix(".yaml")
            .or_else(|| last.strip_suffix(".yml"))
            .map(str::to_string);
        if let Some(stem) = stem {
            *last = stem;
        }
    }
    // group.yaml names the group itself
    if parts.last().map(String::as_str) == Some("group") {
        parts.pop();
    }
    parts.join(" ")
}
