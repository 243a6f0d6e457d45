//! Request mapping and operation-polling sections of a command declaration.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashMap;

use super::hook::HookPath;

/// The `request` section: which API collection and method the command calls
/// and how static or hook-computed fields are bound into the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// API collection the request targets, e.g. `compute.instances`
    pub collection: String,
    #[serde(default)]
    pub api_version: Option<String>,
    /// Method on the collection; defaults from the command type
    #[serde(default)]
    pub method: Option<String>,
    /// Skip resource-spec/collection cross validation
    #[serde(default)]
    pub disable_resource_check: bool,
    /// Constant request fields set on every invocation
    #[serde(default)]
    pub static_fields: HashMap<String, Value>,
    #[serde(default)]
    pub modify_request_hooks: Vec<HookPath>,
    #[serde(default)]
    pub create_request_hook: Option<HookPath>,
    #[serde(default)]
    pub issue_request_hook: Option<HookPath>,
}

impl Request {
    /// The method actually invoked, falling back to the command-type default.
    pub fn effective_method<'a>(&'a self, default: Option<&'a str>) -> Option<&'a str> {
        self.method.as_deref().or(default)
    }
}

/// The `async` section: how to poll the long-running operation a mutating
/// method returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncSpec {
    /// Operations collection polled for completion
    pub collection: String,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default = "default_get")]
    pub method: String,
    /// Response field holding the operation name
    #[serde(default = "default_name")]
    pub response_name_field: String,
    #[serde(default)]
    pub state: Option<AsyncState>,
    /// Fetch the mutated resource once the operation completes
    #[serde(default = "default_true")]
    pub extract_resource_result: bool,
    #[serde(default)]
    pub operation_get_method_params: HashMap<String, String>,
    #[serde(default)]
    pub modify_request_hooks: Vec<HookPath>,
}

/// Terminal-state detection for operation polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncState {
    pub field: String,
    #[serde(default)]
    pub success_values: Vec<Value>,
    #[serde(default)]
    pub error_values: Vec<Value>,
}

fn default_get() -> String {
    "get".to_string()
}

fn default_name() -> String {
    "name".to_string()
}

fn default_true() -> bool {
    true
}

impl AsyncSpec {
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.collection.is_empty() {
            problems.push("async.collection must not be empty".to_string());
        }
        if let Some(state) = &self.state {
            if state.field.is_empty() {
                problems.push("async.state.field must not be empty".to_string());
            }
            if state.success_values.is_empty() && state.error_values.is_empty() {
                problems.push(
                    "async.state must declare at least one of success_values or error_values"
                        .to_string(),
                );
            }
        }
        problems
    }
}

/// Output formatting directives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub flatten: Option<Vec<String>>,
}

impl Output {
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if let Some(format) = &self.format {
            if format.trim().is_empty() {
                problems.push("output.format must not be empty when present".to_string());
            }
        }
        if let Some(flatten) = &self.flatten {
            if flatten.is_empty() {
                problems.push("output.flatten must not be an empty list".to_string());
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_minimal() {
        let request: Request = serde_yaml::from_str(
            r#"
collection: compute.instances
api_version: v1
"#,
        )
        .unwrap();
        assert_eq!(request.collection, "compute.instances");
        assert_eq!(request.effective_method(Some("get")), Some("get"));
    }

    #[test]
    fn test_request_explicit_method_wins() {
        let request: Request = serde_yaml::from_str(
            r#"
collection: compute.instances
method: insert
"#,
        )
        .unwrap();
        assert_eq!(request.effective_method(Some("create")), Some("insert"));
    }

    #[test]
    fn test_async_defaults() {
        let spec: AsyncSpec = serde_yaml::from_str(
            r#"
collection: compute.zoneOperations
"#,
        )
        .unwrap();
        assert_eq!(spec.method, "get");
        assert_eq!(spec.response_name_field, "name");
        assert!(spec.extract_resource_result);
        assert!(spec.validate().is_empty());
    }

    #[test]
    fn test_async_state_needs_terminal_values() {
        let spec: AsyncSpec = serde_yaml::from_str(
            r#"
collection: compute.zoneOperations
state:
  field: status
"#,
        )
        .unwrap();
        assert!(spec
            .validate()
            .iter()
            .any(|p| p.contains("success_values")));
    }

    #[test]
    fn test_output_empty_format_flagged() {
        let output: Output = serde_yaml::from_str("format: \"  \"").unwrap();
        assert!(!output.validate().is_empty());
    }

    #[test]
    fn test_request_hooks_parse() {
        let request: Request = serde_yaml::from_str(
            r#"
collection: pubsub.projects.topics
method: create
modify_request_hooks:
- command_lib.pubsub.topics:AddDefaultLabels
"#,
        )
        .unwrap();
        assert_eq!(request.modify_request_hooks.len(), 1);
    }
}
