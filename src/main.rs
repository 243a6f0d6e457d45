#![forbid(unsafe_code)]
//! veneer command line interface

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use veneer::commands::{
    execute_check, execute_describe, execute_index, execute_lint, execute_list, execute_resolve,
    CheckOptions, DescribeOptions, IndexOptions, LintOptions, ListOptions, ResolveOptions,
};
use veneer::config::CONFIG_FILE;
use veneer::{Config, ReleaseTrack};

#[derive(Parser)]
#[command(name = "veneer")]
#[command(about = "Loader, linter and indexer for declarative CLI surfaces")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint every surface document under a root
    Lint {
        /// Surface root directory
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Build the surface index
    Index {
        /// Surface root directory
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Output index file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List commands visible on a release track
    List {
        /// Surface root directory
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Release track (ALPHA, BETA, GA)
        #[arg(short, long)]
        track: Option<String>,

        /// List every track
        #[arg(long)]
        all_tracks: bool,

        /// Include hidden commands
        #[arg(long)]
        hidden: bool,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one command's resolved declaration
    Describe {
        /// Space-separated command path, e.g. "compute instances create"
        command: String,

        /// Surface root directory
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Release track (ALPHA, BETA, GA)
        #[arg(short, long)]
        track: Option<String>,

        /// Emit JSON instead of YAML
        #[arg(long)]
        json: bool,
    },

    /// Resolve resource names through the collection registry
    Resolve {
        /// Full collection name, e.g. pubsub.projects.topics
        collection: String,

        /// Surface root directory
        #[arg(default_value = ".")]
        root: PathBuf,

        /// key=value parameter assignments (can specify multiple)
        #[arg(short, long)]
        param: Vec<String>,

        /// Relative name or URI to parse instead of formatting
        #[arg(short, long)]
        uri: Option<String>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate an instance document against an export schema
    Check {
        /// Schema file
        schema: PathBuf,

        /// Instance document (YAML or JSON)
        #[arg(short, long)]
        instance: PathBuf,
    },
}

fn parse_track(track: Option<String>) -> anyhow::Result<Option<ReleaseTrack>> {
    track
        .map(|t| t.parse::<ReleaseTrack>().map_err(|e| anyhow!(e)))
        .transpose()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Lint { root, json, strict } => {
            let options = LintOptions { root, json, strict };
            execute_lint(options, config)?;
        }

        Commands::Index { root, output } => {
            let options = IndexOptions { root, output };
            execute_index(options, config).await?;
        }

        Commands::List {
            root,
            track,
            all_tracks,
            hidden,
            json,
        } => {
            let options = ListOptions {
                root,
                track: parse_track(track)?,
                all_tracks,
                hidden,
                json,
            };
            execute_list(options, config).await?;
        }

        Commands::Describe {
            command,
            root,
            track,
            json,
        } => {
            let options = DescribeOptions {
                command,
                root,
                track: parse_track(track)?,
                json,
            };
            execute_describe(options, config)?;
        }

        Commands::Resolve {
            collection,
            root,
            param,
            uri,
            json,
        } => {
            let options = ResolveOptions {
                collection,
                root,
                params: param,
                identifier: uri,
                json,
            };
            execute_resolve(options, config)?;
        }

        Commands::Check { schema, instance } => {
            let options = CheckOptions { schema, instance };
            execute_check(options)?;
        }
    }

    Ok(())
}
