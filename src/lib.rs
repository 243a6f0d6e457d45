#![forbid(unsafe_code)]

//! # veneer
//!
//! Loader, linter and indexer for declarative cloud CLI surfaces: trees of
//! YAML command declarations, shared resource specs, collection registries
//! and export/import schemas.
//!
//! A surface tree contains five document kinds:
//!
//! - command declarations (one spec, or a sequence of release-track variants)
//! - `group.yaml` command-group declarations
//! - `collections.yaml` API registries with resource path templates
//! - `resources.yaml` shared resource specs, pulled in with `!REF`
//! - JSON-Schema-shaped export/import schemas (`$schema` present)
//!
//! The library loads and type-checks all of them, resolves `!REF` includes,
//! cross-checks collections against resource specs, and builds a queryable
//! JSON index of the whole surface. The `veneer` binary wraps this in
//! `lint`, `index`, `list`, `describe`, `resolve` and `check` subcommands.

pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod index;
pub mod lint;
pub mod loader;
pub mod resource;
pub mod schema;
pub mod track;

pub use config::Config;
pub use error::{Result, VeneerError};
pub use index::{Indexer, SurfaceIndex};
pub use lint::{LintReport, SurfaceLinter};
pub use loader::SurfaceLoader;
pub use resource::CollectionRegistry;
pub use track::ReleaseTrack;

/// Crate version, stamped into the index.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
