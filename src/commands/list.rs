//! Implements `veneer list`: enumerate commands visible on a track.

use std::path::PathBuf;

use anyhow::Result;
use console::style;

use crate::config::Config;
use crate::index::Indexer;
use crate::track::ReleaseTrack;

/// Options for the list command
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Surface root to enumerate
    pub root: PathBuf,
    /// Track to list; config's default track when unset
    pub track: Option<ReleaseTrack>,
    /// List every track instead of one
    pub all_tracks: bool,
    /// Include hidden commands
    pub hidden: bool,
    /// Emit JSON instead of styled text
    pub json: bool,
}

/// Execute the list command
pub async fn execute_list(options: ListOptions, config: Config) -> Result<()> {
    let default_track = options.track.unwrap_or(config.default_track);
    let index = Indexer::new(config).index(&options.root).await?;

    let tracks: Vec<ReleaseTrack> = if options.all_tracks {
        ReleaseTrack::ALL.to_vec()
    } else {
        vec![default_track]
    };

    if options.json {
        let mut out = serde_json::Map::new();
        for track in &tracks {
            let commands: Vec<serde_json::Value> = index
                .commands_for_track(*track, options.hidden)
                .into_iter()
                .map(|(path, variant)| {
                    serde_json::json!({
                        "command": path,
                        "brief": variant.brief,
                        "hidden": variant.hidden,
                        "collection": variant.collection,
                    })
                })
                .collect();
            out.insert(track.to_string(), serde_json::Value::Array(commands));
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for track in &tracks {
        let commands = index.commands_for_track(*track, options.hidden);
        println!(
            "{} {} ({} commands)",
            style("→").cyan(),
            style(track).bold(),
            commands.len()
        );
        for (path, variant) in commands {
            let marker = if variant.hidden {
                style("[hidden] ").dim().to_string()
            } else {
                String::new()
            };
            println!("  {}{}  {}", marker, style(path).bold(), variant.brief);
        }
    }

    Ok(())
}
