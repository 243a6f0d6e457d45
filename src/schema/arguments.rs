//! Argument section of a command declaration.
//!
//! Mirrors the declarative schema: a flat `params` list whose entries are
//! plain arguments, nested argument groups (optionally mutex), or resource
//! arguments carrying an inline (usually `!REF`-included) resource spec.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashMap;

use super::hook::HookPath;
use crate::resource::ResourceSpec;

/// Everything under the `arguments` key of a command spec.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Arguments {
    /// Primary resource argument (anchor plus parent attributes)
    #[serde(default)]
    pub resource: Option<ResourceParam>,

    /// Flags, positionals and groups
    #[serde(default)]
    pub params: Vec<Param>,

    /// Labels flag bound to an API field
    #[serde(default)]
    pub labels: Option<Labels>,

    /// Base-level args to suppress
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Hook returning extra arguments the schema cannot express
    #[serde(default)]
    pub additional_arguments_hook: Option<HookPath>,
}

/// Labels section: only the API field the labels map binds to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Labels {
    pub api_field: String,
}

/// One entry of the `params` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    /// `group:` wrapper around nested params
    Group { group: ArgumentGroup },
    /// Entry with a `resource_spec`, generated as a resource argument
    Resource(ResourceParam),
    /// Plain flag or positional
    Arg(Argument),
}

/// An argument group, possibly mutually exclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArgumentGroup {
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub mutex: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub params: Vec<Param>,
}

/// A plain argument bound to a request field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Argument {
    /// Request field this argument's value is written into
    #[serde(default)]
    pub api_field: Option<String>,
    /// Flag name; defaults to api_field when unset
    #[serde(default)]
    pub arg_name: Option<String>,
    /// Required by the schema, checked during validation so a missing value
    /// surfaces as a lint finding instead of a parse failure
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub metavar: Option<String>,
    #[serde(default)]
    pub is_positional: Option<bool>,
    #[serde(default, rename = "type")]
    pub arg_type: Option<ArgTypeSpec>,
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub fallback: Option<HookPath>,
    #[serde(default)]
    pub processor: Option<HookPath>,
    #[serde(default)]
    pub completer: Option<HookPath>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub action: Option<ActionSpec>,
    #[serde(default)]
    pub repeated: Option<bool>,
    #[serde(default)]
    pub clearable: bool,
}

/// A single enum choice value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub arg_value: Value,
    #[serde(default)]
    pub enum_value: Option<Value>,
    #[serde(default)]
    pub help_text: Option<String>,
}

/// Argument action: a builtin argparse-style action, a hook path, or a
/// deprecation block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionSpec {
    Deprecation { deprecated: HashMap<String, Value> },
    Name(String),
}

const STATIC_ACTIONS: [&str; 3] = ["store", "store_true", "append"];

impl ActionSpec {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ActionSpec::Name(name) => {
                if STATIC_ACTIONS.contains(&name.as_str()) {
                    Ok(())
                } else {
                    HookPath::parse(name).map(|_| ()).map_err(|e| {
                        format!("action must be one of {STATIC_ACTIONS:?} or a hook path: {e}")
                    })
                }
            }
            ActionSpec::Deprecation { deprecated } => {
                if deprecated.is_empty() {
                    Err("deprecated action block must not be empty".to_string())
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// The `type` of an argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgTypeSpec {
    /// `arg_dict:` wrapper binding a dict flag to a repeated message field
    ArgDict { arg_dict: ArgDictSpec },
    /// `arg_object:` free-form object parsing
    ArgObject { arg_object: Option<Value> },
    /// A builtin scalar type or a hook path
    Name(String),
}

const BUILTIN_TYPES: [&str; 5] = ["str", "int", "long", "float", "bool"];

impl ArgTypeSpec {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ArgTypeSpec::Name(name) => {
                if BUILTIN_TYPES.contains(&name.as_str()) || name.contains("arg_list") {
                    return Ok(());
                }
                HookPath::parse(name).map(|_| ()).map_err(|e| {
                    format!("type must be one of {BUILTIN_TYPES:?}, arg_list or a hook path: {e}")
                })
            }
            ArgTypeSpec::ArgDict { arg_dict } => arg_dict.validate(),
            ArgTypeSpec::ArgObject { .. } => Ok(()),
        }
    }
}

/// Spec for an `arg_dict` type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgDictSpec {
    pub spec: Vec<SpecField>,
    #[serde(default)]
    pub flatten: bool,
}

impl ArgDictSpec {
    pub fn validate(&self) -> Result<(), String> {
        if self.spec.is_empty() {
            return Err("arg_dict spec must not be empty".to_string());
        }
        // Flattened dicts map one key=value entry per message, so the spec is
        // exactly a key field and a value field.
        if self.flatten && self.spec.len() != 2 {
            return Err("flattened arg_dicts must have exactly two items in the spec".to_string());
        }
        Ok(())
    }
}

/// One field of an `arg_dict` spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecField {
    pub api_field: String,
    #[serde(default)]
    pub arg_name: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub repeated: bool,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
}

fn default_true() -> bool {
    true
}

/// A resource argument: anchor value plus parent attributes resolved through
/// a resource spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceParam {
    /// Inline or `!REF`-included resource spec
    #[serde(alias = "spec")]
    pub resource_spec: ResourceSpec,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub arg_name: Option<String>,
    #[serde(default)]
    pub is_positional: Option<bool>,
    #[serde(default)]
    pub is_parent_resource: bool,
    #[serde(default)]
    pub is_primary_resource: Option<bool>,
    #[serde(default)]
    pub removed_flags: Vec<String>,
    #[serde(default)]
    pub request_id_field: Option<String>,
    #[serde(default)]
    pub resource_method_params: HashMap<String, String>,
    #[serde(default = "default_true")]
    pub parse_resource_into_request: bool,
    #[serde(default = "default_true")]
    pub use_relative_name: bool,
    #[serde(default)]
    pub override_resource_collection: bool,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub repeated: bool,
    #[serde(default)]
    pub clearable: bool,
}

impl Argument {
    /// Effective flag name: arg_name, falling back to the api_field.
    pub fn effective_name(&self) -> Option<&str> {
        self.arg_name.as_deref().or(self.api_field.as_deref())
    }

    /// Structural checks on a single argument. Returns one message per
    /// violation; an empty vec means the argument is well formed.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let name = match self.effective_name() {
            Some(name) => name.to_string(),
            None => {
                problems
                    .push("an argument must have at least one of [api_field, arg_name]".to_string());
                "<unnamed>".to_string()
            }
        };

        if self.help_text.as_deref().map_or(true, str::is_empty) {
            problems.push(format!("argument [{name}] must have help_text"));
        }
        if self.default.is_some() && self.fallback.is_some() {
            problems.push(format!(
                "argument [{name}] may have at most one of [default, fallback]"
            ));
        }
        if let Some(arg_type) = &self.arg_type {
            if let Err(e) = arg_type.validate() {
                problems.push(format!("argument [{name}]: {e}"));
            }
        }
        if let Some(action) = &self.action {
            if let Err(e) = action.validate() {
                problems.push(format!("argument [{name}]: {e}"));
            }
        }
        if let Some(choices) = &self.choices {
            if choices.is_empty() {
                problems.push(format!("argument [{name}] declares an empty choices list"));
            }
        }

        problems
    }
}

impl ArgumentGroup {
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.params.is_empty() {
            problems.push("argument group must contain at least one param".to_string());
        }
        for param in &self.params {
            problems.extend(param.validate());
        }
        problems
    }
}

impl ResourceParam {
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.help_text.as_deref().map_or(true, str::is_empty) {
            problems.push(format!(
                "resource argument [{}] must have help_text",
                self.resource_spec.name
            ));
        }
        let attribute_names = self.resource_spec.attribute_names();
        for removed in &self.removed_flags {
            if !attribute_names.iter().any(|a| a == removed) {
                problems.push(format!(
                    "removed flag [{removed}] for resource arg [{}] references an attribute \
                     that does not exist; valid attributes are [{}]",
                    self.resource_spec.name,
                    attribute_names.join(", ")
                ));
            }
        }
        problems.extend(
            self.resource_spec
                .validate()
                .into_iter()
                .map(|e| format!("resource arg [{}]: {e}", self.resource_spec.name)),
        );
        problems
    }
}

impl Param {
    pub fn validate(&self) -> Vec<String> {
        match self {
            Param::Group { group } => group.validate(),
            Param::Resource(resource) => resource.validate(),
            Param::Arg(arg) => arg.validate(),
        }
    }

    /// Flag/positional names contributed by this param, for duplicate checks.
    pub fn collect_names(&self, out: &mut Vec<String>) {
        match self {
            Param::Group { group } => {
                for param in &group.params {
                    param.collect_names(out);
                }
            }
            Param::Resource(resource) => {
                if let Some(name) = resource
                    .arg_name
                    .as_deref()
                    .or(Some(resource.resource_spec.name.as_str()))
                {
                    out.push(name.to_string());
                }
            }
            Param::Arg(arg) => {
                if let Some(name) = arg.effective_name() {
                    out.push(name.to_string());
                }
            }
        }
    }
}

impl Arguments {
    /// Validate the whole section, including duplicate argument names.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if let Some(resource) = &self.resource {
            problems.extend(resource.validate());
        }
        for param in &self.params {
            problems.extend(param.validate());
        }

        let mut names = Vec::new();
        for param in &self.params {
            param.collect_names(&mut names);
        }
        names.sort();
        for pair in names.windows(2) {
            if pair[0] == pair[1] {
                problems.push(format!("duplicate argument name [{}]", pair[0]));
            }
        }
        problems
    }
}
