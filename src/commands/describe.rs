//! Implements `veneer describe`: print one command's resolved declaration.

use std::path::PathBuf;

use anyhow::{bail, Result};
use console::style;

use crate::config::Config;
use crate::loader::{command_path, SurfaceLoader};
use crate::track::ReleaseTrack;

/// Options for the describe command
#[derive(Debug, Clone)]
pub struct DescribeOptions {
    /// Space-separated command path, e.g. `compute instances create`
    pub command: String,
    /// Surface root to search
    pub root: PathBuf,
    /// Track whose variant to print; config's default track when unset
    pub track: Option<ReleaseTrack>,
    /// Emit JSON instead of YAML
    pub json: bool,
}

/// Execute the describe command
pub fn execute_describe(options: DescribeOptions, config: Config) -> Result<()> {
    let track = options.track.unwrap_or(config.default_track);
    let data_root = config.data_root(&options.root);
    let mut loader = SurfaceLoader::new(&options.root, &data_root);

    let target = options.command.trim();
    let path = loader
        .discover()?
        .into_iter()
        .find(|path| command_path(&options.root, path) == target);
    let path = match path {
        Some(path) => path,
        None => {
            bail!("no command file for [{target}] under {}", options.root.display());
        }
    };
    // A group's command path is its directory, so a bare prefix like
    // `compute instances` lands on group.yaml rather than a command.
    if path.file_name().and_then(|n| n.to_str()) == Some("group.yaml") {
        bail!("[{target}] is a command group, not a command; list it with `veneer list`");
    }

    let file = loader.load_command(&path)?;
    let variant = match file.for_track(track) {
        Some(variant) => variant,
        None => {
            bail!(
                "[{target}] has no {track} variant; declared tracks: {}",
                file.tracks()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&variant.spec)?);
    } else {
        println!(
            "{} {} ({}, from {})",
            style("→").cyan(),
            style(target).bold(),
            track,
            file.path.display()
        );
        print!("{}", serde_yaml::to_string(&variant.spec)?);
    }
    Ok(())
}
