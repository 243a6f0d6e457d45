//! `!REF` include resolution.
//!
//! Shared YAML data is referenced from surface documents as
//! `!REF dotted.path.to.file:key(.key)*`. The dotted file path is resolved
//! against a data root (`dotted/path/to/file.yaml`), the key path indexes
//! into that document, and the referenced value replaces the tag node.
//! Referenced values may themselves contain `!REF`s; resolution recurses
//! with cycle detection and a depth bound.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_yaml::value::TaggedValue;
use serde_yaml::Value;

use crate::error::{Result, VeneerError};

/// Maximum depth of nested references before resolution gives up.
const MAX_DEPTH: usize = 16;

/// A parsed `file.path:key.path` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefTarget {
    pub file_path: String,
    pub key_path: Vec<String>,
}

impl RefTarget {
    pub fn parse(reference: &str) -> Result<Self> {
        let mut parts = reference.splitn(2, ':');
        let file_part = parts.next().unwrap_or_default().trim();
        let key_part = parts.next().unwrap_or_default().trim();
        if file_part.is_empty() || key_part.is_empty() {
            return Err(VeneerError::InvalidRef {
                reference: reference.to_string(),
                message: "references must be in the format file.path:key(.key)*".to_string(),
            });
        }
        Ok(Self {
            file_path: file_part.to_string(),
            key_path: key_part.split('.').map(str::to_string).collect(),
        })
    }

    /// The YAML file the reference points at, under `data_root`.
    pub fn resolve_path(&self, data_root: &Path) -> PathBuf {
        let mut path = data_root.to_path_buf();
        for part in self.file_path.split('.') {
            path.push(part);
        }
        path.set_extension("yaml");
        path
    }
}

/// Resolves `!REF` tags against a shared data root, caching loaded files.
pub struct RefResolver {
    data_root: PathBuf,
    loaded: HashMap<PathBuf, Value>,
}

impl RefResolver {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            loaded: HashMap::new(),
        }
    }

    /// Replace every `!REF` in `value` with its resolved target.
    pub fn resolve(&mut self, value: Value) -> Result<Value> {
        let mut stack = Vec::new();
        self.resolve_value(value, &mut stack)
    }

    fn resolve_value(&mut self, value: Value, stack: &mut Vec<String>) -> Result<Value> {
        if stack.len() > MAX_DEPTH {
            return Err(VeneerError::RefCycle {
                chain: stack.join(" -> "),
            });
        }
        match value {
            Value::Tagged(tagged) => self.resolve_tagged(*tagged, stack),
            Value::Mapping(mapping) => {
                let mut resolved = serde_yaml::Mapping::with_capacity(mapping.len());
                for (key, val) in mapping {
                    resolved.insert(key, self.resolve_value(val, stack)?);
                }
                Ok(Value::Mapping(resolved))
            }
            Value::Sequence(sequence) => {
                let resolved: Result<Vec<Value>> = sequence
                    .into_iter()
                    .map(|v| self.resolve_value(v, stack))
                    .collect();
                Ok(Value::Sequence(resolved?))
            }
            other => Ok(other),
        }
    }

    fn resolve_tagged(&mut self, tagged: TaggedValue, stack: &mut Vec<String>) -> Result<Value> {
        if tagged.tag != "REF" {
            return Err(VeneerError::InvalidRef {
                reference: format!("{}", tagged.tag),
                message: "unknown tag, only !REF is supported".to_string(),
            });
        }
        let reference = match &tagged.value {
            Value::String(s) => s.clone(),
            other => {
                return Err(VeneerError::InvalidRef {
                    reference: format!("{other:?}"),
                    message: "!REF must tag a string".to_string(),
                })
            }
        };

        let target = RefTarget::parse(&reference)?;
        let marker = format!("{}:{}", target.file_path, target.key_path.join("."));
        if stack.contains(&marker) {
            stack.push(marker);
            return Err(VeneerError::RefCycle {
                chain: stack.join(" -> "),
            });
        }
        stack.push(marker);

        let document = self.load_file(&target, &reference)?;
        let mut current = &document;
        for key in &target.key_path {
            current = current.get(key.as_str()).ok_or_else(|| VeneerError::InvalidRef {
                reference: reference.clone(),
                message: format!("key [{key}] not found"),
            })?;
        }

        let resolved = self.resolve_value(current.clone(), stack)?;
        stack.pop();
        Ok(resolved)
    }

    fn load_file(&mut self, target: &RefTarget, reference: &str) -> Result<Value> {
        let path = target.resolve_path(&self.data_root);
        if let Some(value) = self.loaded.get(&path) {
            return Ok(value.clone());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| VeneerError::InvalidRef {
            reference: reference.to_string(),
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let value: Value =
            serde_yaml::from_str(&raw).map_err(|e| VeneerError::yaml(&path, e))?;
        self.loaded.insert(path, value.clone());
        Ok(value)
    }
}

/// True when any `!REF` tag remains in the value tree.
pub fn contains_ref(value: &Value) -> bool {
    match value {
        Value::Tagged(tagged) => tagged.tag == "REF" || contains_ref(&tagged.value),
        Value::Mapping(mapping) => mapping.values().any(contains_ref),
        Value::Sequence(sequence) => sequence.iter().any(contains_ref),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn data_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("compute")).unwrap();
        fs::write(
            dir.path().join("compute/resources.yaml"),
            r#"
instance:
  name: instance
  collection: compute.instances
  attributes:
  - parameter_name: project
    attribute_name: project
  - parameter_name: zone
    attribute_name: zone
  - parameter_name: instance
    attribute_name: instance
zone:
  name: zone
  collection: compute.zones
"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_target_parse() {
        let target = RefTarget::parse("compute.resources:instance.attributes").unwrap();
        assert_eq!(target.file_path, "compute.resources");
        assert_eq!(target.key_path, vec!["instance", "attributes"]);
        assert!(RefTarget::parse("no-colon").is_err());
    }

    #[test]
    fn test_resolve_path() {
        let target = RefTarget::parse("compute.resources:instance").unwrap();
        assert_eq!(
            target.resolve_path(Path::new("/data")),
            PathBuf::from("/data/compute/resources.yaml")
        );
    }

    #[test]
    fn test_resolve_ref() {
        let root = data_root();
        let mut resolver = RefResolver::new(root.path());
        let value: Value =
            serde_yaml::from_str("spec: !REF compute.resources:instance").unwrap();
        let resolved = resolver.resolve(value).unwrap();
        assert!(!contains_ref(&resolved));
        assert_eq!(
            resolved["spec"]["collection"],
            Value::String("compute.instances".to_string())
        );
    }

    #[test]
    fn test_resolve_nested_key() {
        let root = data_root();
        let mut resolver = RefResolver::new(root.path());
        let value: Value =
            serde_yaml::from_str("attrs: !REF compute.resources:instance.attributes").unwrap();
        let resolved = resolver.resolve(value).unwrap();
        assert_eq!(resolved["attrs"].as_sequence().unwrap().len(), 3);
    }

    #[test]
    fn test_missing_key_reported() {
        let root = data_root();
        let mut resolver = RefResolver::new(root.path());
        let value: Value = serde_yaml::from_str("spec: !REF compute.resources:disk").unwrap();
        let err = resolver.resolve(value).unwrap_err();
        assert!(err.to_string().contains("disk"));
    }

    #[test]
    fn test_missing_file_reported() {
        let root = data_root();
        let mut resolver = RefResolver::new(root.path());
        let value: Value = serde_yaml::from_str("spec: !REF storage.resources:bucket").unwrap();
        assert!(resolver.resolve(value).is_err());
    }

    #[test]
    fn test_cycle_detected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.yaml"),
            "first: !REF b:second\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("b.yaml"),
            "second: !REF a:first\n",
        )
        .unwrap();
        let mut resolver = RefResolver::new(dir.path());
        let value: Value = serde_yaml::from_str("x: !REF a:first").unwrap();
        let err = resolver.resolve(value).unwrap_err();
        assert!(matches!(err, VeneerError::RefCycle { .. }));
    }

    #[test]
    fn test_transitive_refs_resolve() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("base.yaml"), "leaf: 42\n").unwrap();
        fs::write(
            dir.path().join("mid.yaml"),
            "wrapped: !REF base:leaf\n",
        )
        .unwrap();
        let mut resolver = RefResolver::new(dir.path());
        let value: Value = serde_yaml::from_str("x: !REF mid:wrapped").unwrap();
        let resolved = resolver.resolve(value).unwrap();
        assert_eq!(resolved["x"], Value::Number(42.into()));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let root = data_root();
        let mut resolver = RefResolver::new(root.path());
        let value: Value = serde_yaml::from_str("spec: !COMMON compute.resources:x").unwrap();
        assert!(resolver.resolve(value).is_err());
    }
}
