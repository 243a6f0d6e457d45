//! Export/import schemas.
//!
//! Each exportable resource carries a JSON-Schema-shaped YAML document
//! describing its importable and exportable fields. This module types the
//! subset the surface uses, lints it structurally, and compiles it with a
//! real JSON Schema validator to check instance documents.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::Value as Yaml;

use crate::error::{Result, VeneerError};

const VALID_TYPES: [&str; 7] = [
    "object", "array", "string", "integer", "number", "boolean", "null",
];

// Keywords the surface schemas are allowed to use beyond the typed fields.
const KNOWN_KEYWORDS: [&str; 14] = [
    "title",
    "example",
    "default",
    "format",
    "pattern",
    "minimum",
    "maximum",
    "minItems",
    "maxItems",
    "uniqueItems",
    "$ref",
    "definitions",
    "oneOf",
    "anyOf",
];

/// `type:` value: a single type name or a list of alternatives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    One(String),
    Many(Vec<String>),
}

impl TypeSpec {
    fn names(&self) -> Vec<&str> {
        match self {
            TypeSpec::One(name) => vec![name.as_str()],
            TypeSpec::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// One node of the schema tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(default, rename = "type")]
    pub type_spec: Option<TypeSpec>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "enum")]
    pub enum_values: Option<Vec<Yaml>>,
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaNode>,
    #[serde(default)]
    pub items: Option<Box<SchemaNode>>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default, rename = "additionalProperties")]
    pub additional_properties: Option<Yaml>,
    /// Everything else, kept for keyword linting
    #[serde(flatten)]
    pub extra: BTreeMap<String, Yaml>,
}

impl SchemaNode {
    fn lint_into(&self, location: &str, problems: &mut Vec<String>) {
        if let Some(type_spec) = &self.type_spec {
            for name in type_spec.names() {
                if !VALID_TYPES.contains(&name) {
                    problems.push(format!("{location}: unknown type [{name}]"));
                }
            }
        }
        if let Some(enum_values) = &self.enum_values {
            if enum_values.is_empty() {
                problems.push(format!("{location}: enum must not be empty"));
            }
        }
        for name in &self.required {
            let additional_allowed = !matches!(
                self.additional_properties,
                Some(Yaml::Bool(false))
            );
            if !self.properties.contains_key(name) && !additional_allowed {
                problems.push(format!(
                    "{location}: required property [{name}] is not declared and \
                     additionalProperties is false"
                ));
            }
        }
        for keyword in self.extra.keys() {
            if !KNOWN_KEYWORDS.contains(&keyword.as_str()) && !keyword.starts_with('$') {
                problems.push(format!("{location}: unknown keyword [{keyword}]"));
            }
        }
        for (name, child) in &self.properties {
            child.lint_into(&format!("{location}.{name}"), problems);
        }
        if let Some(items) = &self.items {
            items.lint_into(&format!("{location}[]"), problems);
        }
    }
}

/// A loaded export/import schema document.
#[derive(Debug, Clone)]
pub struct ExportSchema {
    pub schema_uri: String,
    pub title: Option<String>,
    pub root: SchemaNode,
    /// Original document, kept for validator compilation
    raw: Yaml,
}

impl ExportSchema {
    pub fn from_value(path: &Path, value: Yaml) -> Result<Self> {
        let schema_uri = value
            .get("$schema")
            .and_then(Yaml::as_str)
            .ok_or_else(|| VeneerError::invalid_schema(path, "missing $schema"))?
            .to_string();
        let title = value
            .get("title")
            .and_then(Yaml::as_str)
            .map(str::to_string);
        let root: SchemaNode = serde_yaml::from_value(value.clone())
            .map_err(|e| VeneerError::invalid_schema(path, e.to_string()))?;
        Ok(Self {
            schema_uri,
            title,
            root,
            raw: value,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| VeneerError::io(path, e))?;
        let value: Yaml = serde_yaml::from_str(&raw).map_err(|e| VeneerError::yaml(path, e))?;
        Self::from_value(path, value)
    }

    /// Structural lint of the schema document itself.
    pub fn lint(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.title.is_none() {
            problems.push("schema should carry a title".to_string());
        }
        self.root.lint_into("$", &mut problems);
        problems
    }

    /// Validate an instance document, returning one message per violation.
    pub fn validate_instance(
        &self,
        path: &Path,
        instance: &serde_json::Value,
    ) -> Result<Vec<String>> {
        let schema_json = yaml_to_json(path, &self.raw)?;
        let validator = jsonschema::validator_for(&schema_json)
            .map_err(|e| VeneerError::invalid_schema(path, e.to_string()))?;
        Ok(validator
            .iter_errors(instance)
            .map(|err| {
                let location = err.instance_path.to_string();
                if location.is_empty() {
                    err.to_string()
                } else {
                    format!("at {location}: {err}")
                }
            })
            .collect())
    }
}

/// Convert a YAML value to JSON. Tags are unwrapped; non-string mapping keys
/// are rejected since JSON cannot represent them.
pub fn yaml_to_json(path: &Path, value: &Yaml) -> Result<serde_json::Value> {
    use serde_json::Value as Json;
    Ok(match value {
        Yaml::Null => Json::Null,
        Yaml::Bool(b) => Json::Bool(*b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Json::from(i)
            } else if let Some(u) = n.as_u64() {
                Json::from(u)
            } else {
                serde_json::Number::from_f64(n.as_f64().unwrap_or(0.0))
                    .map(Json::Number)
                    .unwrap_or(Json::Null)
            }
        }
        Yaml::String(s) => Json::String(s.clone()),
        Yaml::Sequence(items) => Json::Array(
            items
                .iter()
                .map(|v| yaml_to_json(path, v))
                .collect::<Result<_>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut object = serde_json::Map::with_capacity(mapping.len());
            for (key, val) in mapping {
                let key = key.as_str().ok_or_else(|| {
                    VeneerError::invalid_schema(path, "mapping keys must be strings")
                })?;
                object.insert(key.to_string(), yaml_to_json(path, val)?);
            }
            Json::Object(object)
        }
        Yaml::Tagged(tagged) => yaml_to_json(path, &tagged.value)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    const TOPIC_SCHEMA: &str = r#"
$schema: "http://json-schema.org/draft-06/schema#"
title: pubsub v1 Topic export schema
description: A topic export/import template.
type: object
additionalProperties: false
properties:
  name:
    description: Relative resource name of the topic.
    type: string
  labels:
    type: object
    additionalProperties:
      type: string
  messageRetentionDuration:
    type: string
required:
- name
"#;

    fn schema() -> ExportSchema {
        let value: Yaml = serde_yaml::from_str(TOPIC_SCHEMA).unwrap();
        ExportSchema::from_value(&PathBuf::from("Topic.yaml"), value).unwrap()
    }

    #[test]
    fn test_parse_and_lint_clean() {
        let schema = schema();
        assert_eq!(schema.title.as_deref(), Some("pubsub v1 Topic export schema"));
        assert!(schema.lint().is_empty());
    }

    #[test]
    fn test_annotation_keywords_accepted() {
        let value: Yaml = serde_yaml::from_str(
            r#"
$schema: "http://json-schema.org/draft-06/schema#"
title: t
type: object
properties:
  name:
    title: Topic name
    type: string
    example: projects/p/topics/t
"#,
        )
        .unwrap();
        let schema = ExportSchema::from_value(&PathBuf::from("x.yaml"), value).unwrap();
        assert_eq!(schema.lint(), Vec::<String>::new());
    }

    #[test]
    fn test_missing_dollar_schema_rejected() {
        let value: Yaml = serde_yaml::from_str("type: object").unwrap();
        assert!(ExportSchema::from_value(&PathBuf::from("x.yaml"), value).is_err());
    }

    #[test]
    fn test_bad_type_flagged() {
        let value: Yaml = serde_yaml::from_str(
            r#"
$schema: "http://json-schema.org/draft-06/schema#"
title: t
type: object
properties:
  count:
    type: int
"#,
        )
        .unwrap();
        let schema = ExportSchema::from_value(&PathBuf::from("x.yaml"), value).unwrap();
        assert!(schema.lint().iter().any(|p| p.contains("unknown type [int]")));
    }

    #[test]
    fn test_undeclared_required_flagged() {
        let value: Yaml = serde_yaml::from_str(
            r#"
$schema: "http://json-schema.org/draft-06/schema#"
title: t
type: object
additionalProperties: false
properties:
  name:
    type: string
required: [name, missing]
"#,
        )
        .unwrap();
        let schema = ExportSchema::from_value(&PathBuf::from("x.yaml"), value).unwrap();
        assert!(schema.lint().iter().any(|p| p.contains("missing")));
    }

    #[test]
    fn test_undeclared_required_allowed_for_open_schemas() {
        let value: Yaml = serde_yaml::from_str(
            r#"
$schema: "http://json-schema.org/draft-06/schema#"
title: t
type: object
properties:
  name:
    type: string
required: [name, dynamic]
"#,
        )
        .unwrap();
        let schema = ExportSchema::from_value(&PathBuf::from("x.yaml"), value).unwrap();
        // Additional properties are allowed, so [dynamic] may be undeclared.
        assert!(schema.lint().is_empty());
    }

    #[test]
    fn test_valid_instance() {
        let schema = schema();
        let instance = serde_json::json!({
            "name": "projects/p/topics/t",
            "labels": {"env": "prod"}
        });
        let violations = schema
            .validate_instance(&PathBuf::from("Topic.yaml"), &instance)
            .unwrap();
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_invalid_instance_reported() {
        let schema = schema();
        let instance = serde_json::json!({
            "labels": {"env": 3},
            "unexpected": true
        });
        let violations = schema
            .validate_instance(&PathBuf::from("Topic.yaml"), &instance)
            .unwrap();
        assert!(!violations.is_empty());
    }

    #[test]
    fn test_yaml_to_json_roundtrip() {
        let yaml: Yaml = serde_yaml::from_str("a: [1, two, true]\nb: 1.5\n").unwrap();
        let json = yaml_to_json(&PathBuf::from("x.yaml"), &yaml).unwrap();
        assert_eq!(json, serde_json::json!({"a": [1, "two", true], "b": 1.5}));
    }
}
