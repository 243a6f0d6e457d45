//! Implements `veneer check`: validate an instance document against an
//! export/import schema.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;

use crate::export::{yaml_to_json, ExportSchema};

/// Options for the check command
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Schema file (JSON-Schema-shaped YAML)
    pub schema: PathBuf,
    /// Instance document to validate, YAML or JSON by extension
    pub instance: PathBuf,
}

/// Execute the check command
pub fn execute_check(options: CheckOptions) -> Result<()> {
    let schema = ExportSchema::load(&options.schema)?;
    let instance = read_instance(&options.instance)?;

    let violations = schema.validate_instance(&options.schema, &instance)?;
    if violations.is_empty() {
        let schema_name = options.schema.display().to_string();
        println!(
            "{} {} matches {}",
            style("✓").green(),
            options.instance.display(),
            schema.title.as_deref().unwrap_or(&schema_name)
        );
        return Ok(());
    }

    for violation in &violations {
        println!("{} {}", style("✗").red(), violation);
    }
    println!(
        "{} {} violations in {}",
        style("✗").red(),
        violations.len(),
        options.instance.display()
    );
    std::process::exit(1);
}

fn read_instance(path: &Path) -> Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let is_json = path
        .extension()
        .map(|ext| ext == "json")
        .unwrap_or(false);
    if is_json {
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    } else {
        let value: serde_yaml::Value =
            serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        Ok(yaml_to_json(path, &value)?)
    }
}
