//! Implements `veneer resolve`: resource-name resolution through the
//! collection registry, in both directions.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use console::style;

use crate::config::Config;
use crate::resource::CollectionRegistry;

/// Options for the resolve command
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Full collection name, e.g. `pubsub.projects.topics`
    pub collection: String,
    /// Surface root whose collections.yaml files feed the registry
    pub root: PathBuf,
    /// `key=value` parameter assignments for formatting
    pub params: Vec<String>,
    /// Relative name or URI to parse instead of formatting
    pub identifier: Option<String>,
    /// Emit JSON instead of styled text
    pub json: bool,
}

/// Execute the resolve command
pub fn execute_resolve(options: ResolveOptions, config: Config) -> Result<()> {
    let data_root = config.data_root(&options.root);
    let registry = CollectionRegistry::load_dir(&data_root)
        .with_context(|| format!("loading collections under {}", data_root.display()))?;
    if registry.is_empty() {
        anyhow::bail!(
            "no collections.yaml files found under {}",
            data_root.display()
        );
    }
    let collection = registry.require(&options.collection)?;

    if let Some(identifier) = &options.identifier {
        let values = collection.parse(identifier)?;
        if options.json {
            let ordered: serde_json::Map<String, serde_json::Value> = collection
                .params()
                .iter()
                .filter_map(|p| {
                    values
                        .get(*p)
                        .map(|v| (p.to_string(), serde_json::Value::String(v.clone())))
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&ordered)?);
        } else {
            println!("{} {}", style("✓").green(), identifier);
            for param in collection.params() {
                if let Some(value) = values.get(param) {
                    println!("  {param}: {value}");
                }
            }
        }
        return Ok(());
    }

    let values: HashMap<String, String> = options
        .params
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| anyhow!("expected key=value, got [{pair}]"))
        })
        .collect::<Result<_>>()?;
    let name = collection.relative_name(&values)?;
    if options.json {
        println!("{}", serde_json::json!({ "name": name }));
    } else {
        println!("{} {}", style("✓").green(), name);
    }
    Ok(())
}
