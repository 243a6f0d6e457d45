//! Code-hook path parsing.
//!
//! Command declarations attach behavior through hook paths of the form
//! `package.module:attribute.attribute(:arg=value,...)`. The dispatcher that
//! imports and calls them is external; here the paths are only parsed and
//! checked structurally so a lint run can reject malformed ones.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A parsed hook path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HookPath {
    /// Dotted module path, e.g. `command_lib.compute.instances`
    pub module: String,
    /// Dotted attribute path within the module, e.g. `MakeRequestHook`
    pub attribute: String,
    /// Optional call arguments appended as `:arg=value,arg=value`
    pub kwargs: BTreeMap<String, String>,
}

impl HookPath {
    /// Parse a hook path, validating each of the two or three `:` parts.
    pub fn parse(path: &str) -> Result<Self, String> {
        let parts: Vec<&str> = path.split(':').collect();
        if parts.len() != 2 && parts.len() != 3 {
            return Err(format!(
                "invalid hook [{path}]: hooks must be in the format \
                 package(.module)+:attribute(.attribute)*(:arg=value(,arg=value)*)?"
            ));
        }

        let module = parts[0].trim();
        let attribute = parts[1].trim();
        if module.is_empty() || !module.split('.').all(is_identifier) {
            return Err(format!("invalid hook [{path}]: bad module path [{module}]"));
        }
        if attribute.is_empty() || !attribute.split('.').all(is_identifier) {
            return Err(format!(
                "invalid hook [{path}]: bad attribute path [{attribute}]"
            ));
        }

        let mut kwargs = BTreeMap::new();
        if parts.len() == 3 {
            for arg in parts[2].split(',') {
                if arg.is_empty() {
                    continue;
                }
                let mut kv = arg.splitn(2, '=');
                match (kv.next(), kv.next()) {
                    (Some(k), Some(v)) if !k.trim().is_empty() => {
                        kwargs.insert(k.trim().to_string(), v.trim().to_string());
                    }
                    _ => {
                        return Err(format!(
                            "invalid hook [{path}]: args must be in the form arg=value,arg=value,..."
                        ));
                    }
                }
            }
        }

        Ok(Self {
            module: module.to_string(),
            attribute: attribute.to_string(),
            kwargs,
        })
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for HookPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.attribute)?;
        if !self.kwargs.is_empty() {
            let args: Vec<String> = self
                .kwargs
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, ":{}", args.join(","))?;
        }
        Ok(())
    }
}

impl FromStr for HookPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HookPath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HookPath> for String {
    fn from(hook: HookPath) -> Self {
        hook.to_string()
    }
}
