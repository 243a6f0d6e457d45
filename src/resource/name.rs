//! Parameterized path templates for fully-qualified resource names.
//!
//! A template like `projects/{project}/zones/{zone}/instances/{instance}`
//! formats a parameter map into a relative resource name and matches a
//! relative name back into its parameters.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

fn param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\{\+?([A-Za-z_][A-Za-z0-9_]*)\}$").expect("static regex"))
}

/// One `/`-separated segment of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template string. Parameters are `{name}` segments; `{+name}`
    /// wildcard segments are accepted and treated as plain parameters.
    pub fn parse(template: &str) -> Result<Self, String> {
        let trimmed = template.trim_matches('/');
        if trimmed.is_empty() {
            return Err("path template must not be empty".to_string());
        }

        let mut segments = Vec::new();
        let mut seen: Vec<&str> = Vec::new();
        for raw in trimmed.split('/') {
            if raw.is_empty() {
                return Err(format!("empty segment in path template [{template}]"));
            }
            if raw.starts_with('{') || raw.ends_with('}') {
                let caps = param_regex()
                    .captures(raw)
                    .ok_or_else(|| format!("malformed parameter [{raw}] in template [{template}]"))?;
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                if seen.contains(&name) {
                    return Err(format!(
                        "duplicate parameter [{name}] in template [{template}]"
                    ));
                }
                seen.push(name);
                segments.push(Segment::Param(name.to_string()));
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }
        Ok(Self { segments })
    }

    /// Parameter names in template order.
    pub fn params(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// The final parameter, which anchors the resource identity.
    pub fn anchor_param(&self) -> Option<&str> {
        self.params().last().copied()
    }

    /// Substitute parameter values to produce a relative resource name.
    pub fn format(&self, values: &HashMap<String, String>) -> Result<String, String> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => parts.push(lit.clone()),
                Segment::Param(name) => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| format!("missing value for parameter [{name}]"))?;
                    if value.is_empty() || value.contains('/') {
                        return Err(format!(
                            "invalid value [{value}] for parameter [{name}]"
                        ));
                    }
                    parts.push(value.clone());
                }
            }
        }
        Ok(parts.join("/"))
    }

    /// Match a relative resource name against the template, extracting
    /// parameter values. Returns None when the shape does not match.
    pub fn match_name(&self, name: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = name.trim_matches('/').split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut values = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Param(param) => {
                    if part.is_empty() {
                        return None;
                    }
                    values.insert(param.clone(), part.to_string());
                }
            }
        }
        Some(values)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .segments
            .iter()
            .map(|s| match s {
                Segment::Literal(lit) => lit.clone(),
                Segment::Param(name) => format!("{{{name}}}"),
            })
            .collect();
        write!(f, "{}", parts.join("/"))
    }
}
