//! Resource specs and the collection registry.
//!
//! A *collection* names an API resource family (`compute.instances`) and
//! carries the path template for its fully-qualified names. A *resource spec*
//! is the argument-side description: named attributes, one per template
//! parameter, ending with the anchor attribute that identifies the resource.

pub mod name;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{Result, VeneerError};
use crate::schema::HookPath;
pub use name::PathTemplate;

/// A named hierarchy of parameterized path attributes, as referenced from
/// command declarations (usually through `!REF`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: String,
    #[serde(default)]
    pub plural_name: Option<String>,
    pub collection: String,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub attributes: Vec<ResourceAttribute>,
    #[serde(default = "default_true")]
    pub disable_auto_completers: bool,
}

/// One level of a resource spec: a path parameter and the flag that fills it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceAttribute {
    pub parameter_name: String,
    pub attribute_name: String,
    #[serde(default)]
    pub help: Option<String>,
    /// Property consulted when the flag is unset, e.g. `core/project`
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub fallthroughs: Vec<Fallthrough>,
}

/// Hook-based value fallthrough for an attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fallthrough {
    pub hook: HookPath,
    pub hint: String,
}

fn default_true() -> bool {
    true
}

impl ResourceSpec {
    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes
            .iter()
            .map(|a| a.attribute_name.clone())
            .collect()
    }

    /// The anchor attribute: the last one, naming the resource itself.
    pub fn anchor(&self) -> Option<&ResourceAttribute> {
        self.attributes.last()
    }

    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.name.is_empty() {
            problems.push("resource spec must have a name".to_string());
        }
        if self.collection.is_empty() {
            problems.push("resource spec must name a collection".to_string());
        }
        if self.attributes.is_empty() {
            problems.push("resource spec must declare at least one attribute".to_string());
        }
        let mut seen = Vec::new();
        for attribute in &self.attributes {
            if seen.contains(&&attribute.attribute_name) {
                problems.push(format!(
                    "duplicate attribute [{}]",
                    attribute.attribute_name
                ));
            }
            seen.push(&attribute.attribute_name);
        }
        problems
    }
}

/// A `collections.yaml` document: one API's collection declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiDecl {
    pub api_name: String,
    pub api_version: String,
    pub base_url: String,
    #[serde(default)]
    pub docs_url: Option<String>,
    #[serde(default)]
    pub collections: Vec<CollectionDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionDecl {
    pub name: String,
    pub path: String,
    /// Alternate path shapes keyed by name, matched during parsing
    #[serde(default)]
    pub flat_paths: HashMap<String, String>,
    #[serde(default = "default_true")]
    pub enable_uri_parsing: bool,
}

/// A registered collection with its parsed templates.
#[derive(Debug, Clone)]
pub struct Collection {
    pub full_name: String,
    pub api_name: String,
    pub api_version: String,
    pub base_url: String,
    pub template: PathTemplate,
    pub flat_templates: Vec<PathTemplate>,
    pub enable_uri_parsing: bool,
}

impl Collection {
    /// Parameters of the primary path template, in order.
    pub fn params(&self) -> Vec<&str> {
        self.template.params()
    }

    /// Format attribute values into a relative resource name.
    pub fn relative_name(&self, values: &HashMap<String, String>) -> Result<String> {
        self.template
            .format(values)
            .map_err(VeneerError::ResourceName)
    }

    /// Parse a relative name or a full resource URI into parameter values.
    pub fn parse(&self, identifier: &str) -> Result<HashMap<String, String>> {
        let relative = self.strip_uri_prefix(identifier)?;
        for template in std::iter::once(&self.template).chain(self.flat_templates.iter()) {
            if let Some(values) = template.match_name(relative) {
                return Ok(values);
            }
        }
        Err(VeneerError::ResourceName(format!(
            "[{relative}] does not match collection [{}] with template [{}]",
            self.full_name, self.template
        )))
    }

    fn strip_uri_prefix<'a>(&self, identifier: &'a str) -> Result<&'a str> {
        if !identifier.starts_with("http://") && !identifier.starts_with("https://") {
            return Ok(identifier);
        }
        if !self.enable_uri_parsing {
            return Err(VeneerError::ResourceName(format!(
                "URI parsing is disabled for collection [{}]",
                self.full_name
            )));
        }
        let mut rest = identifier
            .strip_prefix(self.base_url.as_str())
            .ok_or_else(|| {
                VeneerError::ResourceName(format!(
                    "[{identifier}] is not under the API base URL [{}]",
                    self.base_url
                ))
            })?;
        rest = rest.trim_start_matches('/');
        // Some APIs keep the version out of the base URL.
        if let Some(stripped) = rest.strip_prefix(&format!("{}/", self.api_version)) {
            rest = stripped;
        }
        Ok(rest)
    }
}

/// All collections known to a surface, keyed by full name.
#[derive(Debug, Clone, Default)]
pub struct CollectionRegistry {
    collections: HashMap<String, Collection>,
}

impl CollectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn get(&self, full_name: &str) -> Option<&Collection> {
        self.collections.get(full_name)
    }

    pub fn require(&self, full_name: &str) -> Result<&Collection> {
        self.get(full_name)
            .ok_or_else(|| VeneerError::UnknownCollection(full_name.to_string()))
    }

    pub fn full_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.collections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Register every collection an API document declares.
    pub fn insert_api(&mut self, api: ApiDecl) -> Result<()> {
        for decl in &api.collections {
            let full_name = format!("{}.{}", api.api_name, decl.name);
            let template = PathTemplate::parse(&decl.path).map_err(|e| {
                VeneerError::ResourceName(format!("collection [{full_name}]: {e}"))
            })?;
            let mut flat_templates = Vec::new();
            for flat in decl.flat_paths.values() {
                flat_templates.push(PathTemplate::parse(flat).map_err(|e| {
                    VeneerError::ResourceName(format!("collection [{full_name}]: {e}"))
                })?);
            }
            self.collections.insert(
                full_name.clone(),
                Collection {
                    full_name,
                    api_name: api.api_name.clone(),
                    api_version: api.api_version.clone(),
                    base_url: api.base_url.clone(),
                    template,
                    flat_templates,
                    enable_uri_parsing: decl.enable_uri_parsing,
                },
            );
        }
        Ok(())
    }

    /// Load every `collections.yaml` under `root`.
    pub fn load_dir(root: &Path) -> Result<Self> {
        let mut registry = Self::new();
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name() != "collections.yaml" {
                continue;
            }
            let raw = std::fs::read_to_string(entry.path())
                .map_err(|e| VeneerError::io(entry.path(), e))?;
            let api: ApiDecl = serde_yaml::from_str(&raw)
                .map_err(|e| VeneerError::yaml(entry.path(), e))?;
            tracing::debug!(
                api = %api.api_name,
                version = %api.api_version,
                collections = api.collections.len(),
                "registered API"
            );
            registry.insert_api(api)?;
        }
        Ok(registry)
    }

    /// Cross-check a resource spec against its collection's path template:
    /// every template parameter needs exactly one attribute, in order.
    pub fn check_resource_spec(&self, spec: &ResourceSpec) -> Vec<String> {
        let mut problems = Vec::new();
        let collection = match self.get(&spec.collection) {
            Some(collection) => collection,
            None => {
                problems.push(format!(
                    "resource spec [{}] references unknown collection [{}]",
                    spec.name, spec.collection
                ));
                return problems;
            }
        };
        let params = collection.params();
        let attribute_params: Vec<&str> = spec
            .attributes
            .iter()
            .map(|a| a.parameter_name.as_str())
            .collect();
        if params != attribute_params {
            problems.push(format!(
                "resource spec [{}] attributes [{}] do not match collection [{}] \
                 parameters [{}]",
                spec.name,
                attribute_params.join(", "),
                spec.collection,
                params.join(", ")
            ));
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compute_api() -> ApiDecl {
        serde_yaml::from_str(
            r#"
api_name: compute
api_version: v1
base_url: https://compute.googleapis.com/compute/v1/
collections:
- name: instances
  path: projects/{project}/zones/{zone}/instances/{instance}
- name: zoneOperations
  path: projects/{project}/zones/{zone}/operations/{operation}
"#,
        )
        .unwrap()
    }

    fn registry() -> CollectionRegistry {
        let mut registry = CollectionRegistry::new();
        registry.insert_api(compute_api()).unwrap();
        registry
    }

    fn instance_values() -> HashMap<String, String> {
        [("project", "p1"), ("zone", "z1"), ("instance", "vm")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_registry_lookup() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert!(registry.get("compute.instances").is_some());
        assert!(registry.require("compute.disks").is_err());
    }

    #[test]
    fn test_relative_name() {
        let registry = registry();
        let collection = registry.require("compute.instances").unwrap();
        assert_eq!(
            collection.relative_name(&instance_values()).unwrap(),
            "projects/p1/zones/z1/instances/vm"
        );
    }

    #[test]
    fn test_parse_relative_name() {
        let registry = registry();
        let collection = registry.require("compute.instances").unwrap();
        let values = collection.parse("projects/p1/zones/z1/instances/vm").unwrap();
        assert_eq!(values, instance_values());
    }

    #[test]
    fn test_parse_full_uri() {
        let registry = registry();
        let collection = registry.require("compute.instances").unwrap();
        let values = collection
            .parse("https://compute.googleapis.com/compute/v1/projects/p1/zones/z1/instances/vm")
            .unwrap();
        assert_eq!(values, instance_values());
    }

    #[test]
    fn test_parse_foreign_uri_rejected() {
        let registry = registry();
        let collection = registry.require("compute.instances").unwrap();
        assert!(collection
            .parse("https://example.com/projects/p/zones/z/instances/i")
            .is_err());
    }

    #[test]
    fn test_resource_spec_cross_check() {
        let registry = registry();
        let spec: ResourceSpec = serde_yaml::from_str(
            r#"
name: instance
collection: compute.instances
attributes:
- parameter_name: project
  attribute_name: project
- parameter_name: zone
  attribute_name: zone
- parameter_name: instance
  attribute_name: instance
"#,
        )
        .unwrap();
        assert!(registry.check_resource_spec(&spec).is_empty());
    }

    #[test]
    fn test_resource_spec_attribute_mismatch() {
        let registry = registry();
        let spec: ResourceSpec = serde_yaml::from_str(
            r#"
name: instance
collection: compute.instances
attributes:
- parameter_name: project
  attribute_name: project
- parameter_name: instance
  attribute_name: instance
"#,
        )
        .unwrap();
        let problems = registry.check_resource_spec(&spec);
        assert!(problems[0].contains("do not match"));
    }

    #[test]
    fn test_unknown_collection_reported() {
        let registry = registry();
        let spec: ResourceSpec = serde_yaml::from_str(
            r#"
name: topic
collection: pubsub.projects.topics
attributes:
- parameter_name: project
  attribute_name: project
"#,
        )
        .unwrap();
        assert!(registry.check_resource_spec(&spec)[0].contains("unknown collection"));
    }
}
