//! End-to-end tests over a small synthetic surface tree.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use veneer::lint::Severity;
use veneer::loader::SurfaceLoader;
use veneer::{CollectionRegistry, Config, Indexer, ReleaseTrack, SurfaceIndex, SurfaceLinter};

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A miniature surface: one API, one resource, three commands, a group and
/// an export schema.
fn surface() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

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
  enable_uri_parsing: true
- name: projects.subscriptions
  path: projects/{project}/subscriptions/{subscription}
"#,
    );
    write(
        root,
        "pubsub/resources.yaml",
        r#"
topic:
  name: topic
  collection: pubsub.projects.topics
  attributes:
  - parameter_name: project
    attribute_name: project
    help: Project of the topic.
  - parameter_name: topic
    attribute_name: topic
    help: Name of the topic.
"#,
    );
    write(
        root,
        "pubsub/group.yaml",
        "help_text:\n  brief: Manage Pub/Sub resources.\n",
    );
    write(
        root,
        "pubsub/topics/describe.yaml",
        r#"
release_tracks: [GA]
help_text:
  brief: Describe a topic.
request:
  collection: pubsub.projects.topics
arguments:
  resource:
    help_text: The topic to describe.
    spec: !REF pubsub.resources:topic
"#,
    );
    write(
        root,
        "pubsub/topics/create.yaml",
        r#"
- release_tracks: [ALPHA, BETA]
  help_text:
    brief: Create a topic (preview).
  request:
    collection: pubsub.projects.topics
  arguments:
    params:
    - arg_name: message-retention-duration
      api_field: topic.messageRetentionDuration
      help_text: How long to retain messages.
- release_tracks: [GA]
  help_text:
    brief: Create a topic.
  request:
    collection: pubsub.projects.topics
"#,
    );
    write(
        root,
        "pubsub/topics/update.yaml",
        r#"
release_tracks: [GA]
hidden: true
help_text:
  brief: Update a topic.
request:
  collection: pubsub.projects.topics
"#,
    );
    write(
        root,
        "pubsub/schemas/Topic.yaml",
        r#"
$schema: "http://json-schema.org/draft-06/schema#"
title: pubsub v1 Topic export schema
type: object
additionalProperties: false
properties:
  name:
    type: string
  labels:
    type: object
    additionalProperties:
      type: string
required:
- name
"#,
    );
    dir
}

#[test]
fn lint_clean_surface_has_no_errors() {
    let dir = surface();
    let registry = CollectionRegistry::load_dir(dir.path()).unwrap();
    assert_eq!(registry.len(), 2);

    let mut loader = SurfaceLoader::new(dir.path(), dir.path());
    let report = SurfaceLinter::new(registry).lint_surface(&mut loader);
    assert_eq!(report.files_checked, 7);
    assert!(!report.has_errors(), "{:#?}", report.findings);
}

#[test]
fn lint_catches_cross_file_breakage() {
    let dir = surface();
    // Unknown collection in a request.
    write(
        dir.path(),
        "pubsub/topics/delete.yaml",
        r#"
help_text:
  brief: Delete a topic.
request:
  collection: pubsub.projects.queues
"#,
    );
    // Argument with both default and fallback.
    write(
        dir.path(),
        "pubsub/topics/seek.yaml",
        r#"
help_text:
  brief: Seek a topic.
request:
  collection: pubsub.projects.topics
  method: seek
arguments:
  params:
  - arg_name: time
    api_field: seekRequest.time
    help_text: Seek target.
    default: now
    fallback: veneer.hooks:now
"#,
    );

    let registry = CollectionRegistry::load_dir(dir.path()).unwrap();
    let mut loader = SurfaceLoader::new(dir.path(), dir.path());
    let report = SurfaceLinter::new(registry).lint_surface(&mut loader);

    assert!(report.has_errors());
    let messages: Vec<&str> = report
        .findings
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .map(|f| f.message.as_str())
        .collect();
    assert!(
        messages.iter().any(|m| m.contains("pubsub.projects.queues")),
        "{messages:?}"
    );
    assert!(
        messages
            .iter()
            .any(|m| m.contains("default") && m.contains("fallback")),
        "{messages:?}"
    );
}

#[tokio::test]
async fn index_roundtrips_and_filters_tracks() {
    let dir = surface();
    let index = Indexer::new(Config::default()).index(dir.path()).await.unwrap();

    assert_eq!(index.stats.commands, 3);
    assert_eq!(index.stats.groups, 1);
    assert_eq!(index.stats.collections, 2);
    assert_eq!(index.stats.export_schemas, 1);
    assert_eq!(index.stats.load_errors, 0);

    // GA sees describe and create; update is hidden.
    let ga: Vec<&str> = index
        .commands_for_track(ReleaseTrack::Ga, false)
        .into_iter()
        .map(|(path, _)| path)
        .collect();
    assert_eq!(ga, vec!["pubsub topics create", "pubsub topics describe"]);

    let ga_all = index.commands_for_track(ReleaseTrack::Ga, true);
    assert_eq!(ga_all.len(), 3);

    // Alpha only sees the preview create variant.
    let alpha = index.commands_for_track(ReleaseTrack::Alpha, false);
    assert_eq!(alpha.len(), 1);
    assert_eq!(alpha[0].1.brief, "Create a topic (preview).");

    let out = dir.path().join(".veneer/surface.index.json");
    index.write_json(&out).unwrap();
    let loaded = SurfaceIndex::from_json(&out).unwrap();
    assert_eq!(loaded.commands.len(), index.commands.len());
    assert_eq!(
        loaded.files["pubsub/topics/create.yaml"].sha256,
        index.files["pubsub/topics/create.yaml"].sha256
    );
}

#[tokio::test]
async fn index_is_stable_across_runs() {
    let dir = surface();
    let first = Indexer::new(Config::default()).index(dir.path()).await.unwrap();
    let second = Indexer::new(Config::default()).index(dir.path()).await.unwrap();
    assert_eq!(
        serde_json::to_value(&first.files).unwrap(),
        serde_json::to_value(&second.files).unwrap()
    );
    assert_eq!(
        serde_json::to_value(&first.commands).unwrap(),
        serde_json::to_value(&second.commands).unwrap()
    );
}

#[test]
fn resource_names_resolve_both_directions() {
    let dir = surface();
    let registry = CollectionRegistry::load_dir(dir.path()).unwrap();
    let topics = registry.require("pubsub.projects.topics").unwrap();

    let mut values = HashMap::new();
    values.insert("project".to_string(), "p1".to_string());
    values.insert("topic".to_string(), "t1".to_string());
    let name = topics.relative_name(&values).unwrap();
    assert_eq!(name, "projects/p1/topics/t1");

    let parsed = topics.parse(&name).unwrap();
    assert_eq!(parsed, values);

    let parsed_uri = topics
        .parse("https://pubsub.googleapis.com/v1/projects/p1/topics/t1")
        .unwrap();
    assert_eq!(parsed_uri, values);
}

#[test]
fn loaded_commands_carry_resolved_refs() {
    let dir = surface();
    let mut loader = SurfaceLoader::new(dir.path(), dir.path());
    let file = loader
        .load_command(&dir.path().join("pubsub/topics/describe.yaml"))
        .unwrap();
    assert_eq!(file.command_path, "pubsub topics describe");

    let variant = file.for_track(ReleaseTrack::Ga).unwrap();
    let resource = variant.spec.arguments.resource.as_ref().unwrap();
    assert_eq!(resource.resource_spec.name, "topic");
    assert_eq!(
        resource.resource_spec.attribute_names(),
        vec!["project", "topic"]
    );
}
