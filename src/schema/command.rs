//! Top-level command declaration.

use serde::{Deserialize, Serialize};

use super::arguments::Arguments;
use super::request::{AsyncSpec, Output, Request};
use crate::track::ReleaseTrack;

/// A single declarative command: one YAML mapping after reference resolution
/// and track selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    #[serde(default)]
    pub release_tracks: Vec<ReleaseTrack>,

    pub help_text: HelpText,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default)]
    pub universe_compatible: Option<bool>,

    #[serde(default)]
    pub deprecate: Option<Deprecate>,

    #[serde(default)]
    pub request: Option<Request>,

    #[serde(default, rename = "async")]
    pub async_: Option<AsyncSpec>,

    #[serde(default)]
    pub arguments: Arguments,

    #[serde(default)]
    pub output: Option<Output>,
}

/// Help text block. `brief` is mandatory for every command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpText {
    pub brief: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub examples: Option<String>,
}

/// Deprecation notice attached to a whole command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deprecate {
    #[serde(default)]
    pub is_removed: bool,
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Verb family of a command, inferred from the file stem. Determines the
/// default API method when `request.method` is omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Describe,
    List,
    Create,
    Delete,
    Update,
    Import,
    Export,
    GetIamPolicy,
    SetIamPolicy,
    Generic,
}

impl CommandType {
    pub fn from_stem(stem: &str) -> Self {
        match stem {
            "describe" => CommandType::Describe,
            "list" => CommandType::List,
            "create" => CommandType::Create,
            "delete" => CommandType::Delete,
            "update" => CommandType::Update,
            "import" => CommandType::Import,
            "export" => CommandType::Export,
            "get_iam_policy" | "get-iam-policy" => CommandType::GetIamPolicy,
            "set_iam_policy" | "set-iam-policy" => CommandType::SetIamPolicy,
            _ => CommandType::Generic,
        }
    }

    /// Default API method for the verb, None when the spec must name one.
    pub fn default_method(&self) -> Option<&'static str> {
        match self {
            CommandType::Describe => Some("get"),
            CommandType::List => Some("list"),
            CommandType::Create => Some("create"),
            CommandType::Delete => Some("delete"),
            CommandType::Update => Some("patch"),
            // Import/export run through get and patch on the same resource.
            CommandType::Import => Some("patch"),
            CommandType::Export => Some("get"),
            CommandType::GetIamPolicy => Some("getIamPolicy"),
            CommandType::SetIamPolicy => Some("setIamPolicy"),
            CommandType::Generic => None,
        }
    }
}

impl CommandSpec {
    /// Structural validation of a resolved spec. Cross-file checks (collection
    /// existence, resource/template agreement) live in the linter.
    pub fn validate(&self, command_type: CommandType) -> Vec<String> {
        let mut problems = Vec::new();

        if self.help_text.brief.trim().is_empty() {
            problems.push("help_text.brief must not be empty".to_string());
        }

        match &self.request {
            Some(request) => {
                if request.collection.is_empty() {
                    problems.push("request.collection must not be empty".to_string());
                }
                if request
                    .effective_method(command_type.default_method())
                    .is_none()
                {
                    problems.push(
                        "request.method is required for commands with no default method"
                            .to_string(),
                    );
                }
            }
            None => {
                // Commands without a request section can still exist (pure
                // group help files are handled separately), but async makes
                // no sense without one.
                if self.async_.is_some() {
                    problems.push("async declared without a request section".to_string());
                }
            }
        }

        if let Some(async_) = &self.async_ {
            problems.extend(async_.validate());
        }
        if let Some(output) = &self.output {
            problems.extend(output.validate());
        }
        if let Some(deprecate) = &self.deprecate {
            if deprecate.is_removed && deprecate.error.is_none() {
                problems
                    .push("deprecate.is_removed requires an error message".to_string());
            }
        }
        problems.extend(self.arguments.validate());

        problems
    }
}

/// A command group declaration (`group.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    #[serde(default)]
    pub release_tracks: Vec<ReleaseTrack>,
    pub help_text: HelpText,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub category: Option<String>,
}
