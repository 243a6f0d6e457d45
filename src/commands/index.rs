//! Implements `veneer index`: build and write the surface index.

use std::path::PathBuf;

use anyhow::Result;
use console::style;

use crate::config::Config;
use crate::index::Indexer;

/// Options for the index command
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Surface root to index
    pub root: PathBuf,
    /// Output index file path; config's index_path when unset
    pub output: Option<PathBuf>,
}

/// Execute the index command
pub async fn execute_index(options: IndexOptions, config: Config) -> Result<()> {
    println!("{} Indexing surface...", style("→").cyan());

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| config.index_path.clone());

    let indexer = Indexer::new(config);
    let index = indexer.index(&options.root).await?;

    if index.stats.files == 0 {
        eprintln!(
            "{} No YAML files found under {}",
            style("✗").red(),
            options.root.display()
        );
        eprintln!("  Check the include/exclude patterns in .veneer.json");
        std::process::exit(1);
    }

    index.write_json(&output)?;
    println!(
        "{} Index written to {}",
        style("✓").green(),
        output.display()
    );
    println!("  Files: {}", index.stats.files);
    println!("  Commands: {}", index.stats.commands);
    println!("  Groups: {}", index.stats.groups);
    println!("  Collections: {}", index.stats.collections);
    println!("  Resource specs: {}", index.stats.resource_specs);
    println!("  Export schemas: {}", index.stats.export_schemas);
    if index.stats.load_errors > 0 {
        println!(
            "{} {} files failed to load; run `veneer lint` for details",
            style("!").yellow(),
            index.stats.load_errors
        );
    }

    Ok(())
}
