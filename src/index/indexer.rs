//! Builds the surface index.
//!
//! Walks the tree in parallel with one loader per worker, since ref
//! resolution keeps a per-loader file cache.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, VeneerError};
use crate::index::{CommandEntry, FileEntry, GroupEntry, IndexStats, SurfaceIndex, VariantEntry};
use crate::loader::{classify, command_path, CommandFile, DocumentKind, SurfaceLoader};
use crate::schema::{Argument, GroupSpec, Param};

/// Surface indexer with parallel file processing.
pub struct Indexer {
    config: Config,
}

/// What one worker extracted from one file.
struct FileRecord {
    relative: String,
    kind: DocumentKind,
    sha256: String,
    payload: Payload,
}

enum Payload {
    Command(CommandFile),
    Group { path: String, spec: GroupSpec },
    Resources { specs: usize },
    Collections { collections: usize },
    Schema,
    Failed(String),
}

impl Indexer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn index<P: AsRef<Path>>(&self, root: P) -> Result<SurfaceIndex> {
        let root = root.as_ref();
        match self.config.workers {
            Some(workers) => rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| VeneerError::Config(e.to_string()))?
                .install(|| self.scan(root)),
            None => self.scan(root),
        }
    }

    fn scan(&self, root: &Path) -> Result<SurfaceIndex> {
        let data_root = self.config.data_root(root);
        let loader = SurfaceLoader::new(root, &data_root);

        let files: Vec<PathBuf> = loader
            .discover()?
            .into_iter()
            .filter(|path| {
                let relative = path.strip_prefix(root).unwrap_or(path);
                self.config.matches(relative)
            })
            .collect();
        debug!(files = files.len(), root = %root.display(), "indexing surface");

        let progress = ProgressBar::new(files.len() as u64);
        progress.set_style(ProgressStyle::default_bar());

        let records: Vec<FileRecord> = files
            .par_iter()
            .map_init(
                || SurfaceLoader::new(root, &data_root),
                |loader, path| {
                    let record = index_file(loader, root, path);
                    progress.inc(1);
                    record
                },
            )
            .collect();
        progress.finish_and_clear();

        Ok(assemble(root, records))
    }
}

fn index_file(loader: &mut SurfaceLoader, root: &Path, path: &Path) -> FileRecord {
    let relative = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    let sha256 = match std::fs::read(path) {
        Ok(bytes) => fingerprint(&bytes),
        Err(e) => {
            return FileRecord {
                relative,
                kind: DocumentKind::Command,
                sha256: String::new(),
                payload: Payload::Failed(e.to_string()),
            }
        }
    };

    let value = match loader.load_raw(path) {
        Ok(value) => value,
        Err(e) => {
            return FileRecord {
                relative,
                kind: DocumentKind::Command,
                sha256,
                payload: Payload::Failed(e.to_string()),
            }
        }
    };

    let kind = classify(path, &value);
    let payload = match kind {
        DocumentKind::Command => match loader.command_from_value(path, value) {
            Ok(file) => Payload::Command(file),
            Err(e) => Payload::Failed(e.to_string()),
        },
        DocumentKind::Group => match serde_yaml::from_value::<GroupSpec>(value) {
            Ok(spec) => Payload::Group {
                path: command_path(root, path),
                spec,
            },
            Err(e) => Payload::Failed(e.to_string()),
        },
        DocumentKind::Resources => match value.as_mapping() {
            Some(mapping) => Payload::Resources {
                specs: mapping.len(),
            },
            None => Payload::Failed("resources.yaml must be a mapping of specs".to_string()),
        },
        DocumentKind::Collections => {
            match serde_yaml::from_value::<crate::resource::ApiDecl>(value) {
                Ok(api) => Payload::Collections {
                    collections: api.collections.len(),
                },
                Err(e) => Payload::Failed(e.to_string()),
            }
        }
        DocumentKind::ExportSchema => Payload::Schema,
    };

    FileRecord {
        relative,
        kind,
        sha256,
        payload,
    }
}

fn assemble(root: &Path, records: Vec<FileRecord>) -> SurfaceIndex {
    let mut stats = IndexStats::default();
    let mut commands = BTreeMap::new();
    let mut groups = BTreeMap::new();
    let mut files = BTreeMap::new();

    for record in records {
        stats.files += 1;
        files.insert(
            record.relative.clone(),
            FileEntry {
                kind: kind_name(record.kind).to_string(),
                sha256: record.sha256,
            },
        );

        match record.payload {
            Payload::Command(file) => {
                stats.commands += 1;
                let variants = file
                    .variants
                    .iter()
                    .map(|variant| VariantEntry {
                        tracks: variant.tracks.clone(),
                        hidden: variant.spec.hidden,
                        brief: variant.spec.help_text.brief.clone(),
                        collection: variant.spec.request.as_ref().map(|r| r.collection.clone()),
                        method: variant
                            .spec
                            .request
                            .as_ref()
                            .and_then(|r| {
                                r.effective_method(file.command_type.default_method())
                            })
                            .map(str::to_string),
                        async_collection: variant
                            .spec
                            .async_
                            .as_ref()
                            .map(|a| a.collection.clone()),
                        argument_names: argument_names(&variant.spec.arguments.params),
                    })
                    .collect();
                commands.insert(
                    file.command_path,
                    CommandEntry {
                        file: record.relative,
                        kind: file.command_type,
                        variants,
                    },
                );
            }
            Payload::Group { path, spec } => {
                stats.groups += 1;
                groups.insert(
                    path,
                    GroupEntry {
                        brief: spec.help_text.brief.clone(),
                        hidden: spec.hidden,
                        tracks: spec.release_tracks.clone(),
                    },
                );
            }
            Payload::Resources { specs } => stats.resource_specs += specs,
            Payload::Collections { collections } => stats.collections += collections,
            Payload::Schema => stats.export_schemas += 1,
            Payload::Failed(message) => {
                stats.load_errors += 1;
                debug!(file = %record.relative, %message, "skipped during indexing");
            }
        }
    }

    SurfaceIndex {
        version: crate::VERSION.to_string(),
        generated: Utc::now(),
        root: root.to_string_lossy().to_string(),
        stats,
        commands,
        groups,
        files,
    }
}

fn kind_name(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Command => "command",
        DocumentKind::Group => "group",
        DocumentKind::Collections => "collections",
        DocumentKind::Resources => "resources",
        DocumentKind::ExportSchema => "export-schema",
    }
}

fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Flag and positional names declared by a spec, nested groups included.
fn argument_names(params: &[Param]) -> Vec<String> {
    fn push_arg(arg: &Argument, out: &mut Vec<String>) {
        if let Some(name) = &arg.arg_name {
            out.push(name.clone());
        } else if let Some(field) = &arg.api_field {
            out.push(field.rsplit('.').next().unwrap_or(field).to_string());
        }
    }
    fn walk(params: &[Param], out: &mut Vec<String>) {
        for param in params {
            match param {
                Param::Arg(arg) => push_arg(arg, out),
                Param::Resource(resource) => {
                    if let Some(name) = &resource.arg_name {
                        out.push(name.clone());
                    }
                }
                Param::Group { group } => walk(&group.params, out),
            }
        }
    }
    let mut out = Vec::new();
    walk(params, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::ReleaseTrack;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn surface() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "pubsub/group.yaml",
            "help_text:\n  brief: Manage Pub/Sub resources.\n",
        );
        write(
            root,
            "pubsub/topics/create.yaml",
            r#"
release_tracks: [BETA, GA]
help_text:
  brief: Create a topic.
request:
  collection: pubsub.projects.topics
arguments:
  params:
  - arg_name: message-retention-duration
    api_field: topic.messageRetentionDuration
    help_text: How long to retain messages.
"#,
        );
        write(
            root,
            "pubsub/collections.yaml",
            r#"
api_name: pubsub
api_version: v1
base_url: https://pubsub.googleapis.com/v1/
collections:
- name: projects.topics
  path: projects/{project}/topics/{topic}
"#,
        );
        write(root, "pubsub/broken.yaml", "help_text: [unclosed");
        dir
    }

    #[tokio::test]
    async fn test_index_surface() {
        let dir = surface();
        let indexer = Indexer::new(Config::default());
        let index = indexer.index(dir.path()).await.unwrap();

        assert_eq!(index.stats.files, 4);
        assert_eq!(index.stats.commands, 1);
        assert_eq!(index.stats.groups, 1);
        assert_eq!(index.stats.collections, 1);
        assert_eq!(index.stats.load_errors, 1);

        let entry = &index.commands["pubsub topics create"];
        assert_eq!(entry.file, "pubsub/topics/create.yaml");
        let variant = entry.variant_for(ReleaseTrack::Ga).unwrap();
        assert_eq!(
            variant.collection.as_deref(),
            Some("pubsub.projects.topics")
        );
        assert_eq!(variant.method.as_deref(), Some("create"));
        assert_eq!(variant.argument_names, vec!["message-retention-duration"]);
        assert!(entry.variant_for(ReleaseTrack::Alpha).is_none());
    }

    #[tokio::test]
    async fn test_exclude_patterns_respected() {
        let dir = surface();
        let config = Config {
            exclude: vec!["**/broken.yaml".to_string()],
            ..Default::default()
        };
        let index = Indexer::new(config).index(dir.path()).await.unwrap();
        assert_eq!(index.stats.files, 3);
        assert_eq!(index.stats.load_errors, 0);
    }

    #[test]
    fn test_fingerprint_stable() {
        assert_eq!(fingerprint(b"abc").len(), 64);
        assert_eq!(fingerprint(b"abc"), fingerprint(b"abc"));
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
    }
}
