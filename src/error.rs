//! Error types shared across the library.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the library
pub type Result<T> = std::result::Result<T, VeneerError>;

/// Errors produced while loading or validating surface documents
#[derive(Debug, Error)]
pub enum VeneerError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid command spec in {path}: {message}")]
    InvalidSpec { path: PathBuf, message: String },

    #[error("invalid reference [{reference}]: {message}")]
    InvalidRef { reference: String, message: String },

    #[error("reference cycle detected: {chain}")]
    RefCycle { chain: String },

    #[error("unknown collection [{0}]")]
    UnknownCollection(String),

    #[error("resource name error: {0}")]
    ResourceName(String),

    #[error("invalid export schema in {path}: {message}")]
    InvalidSchema { path: PathBuf, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl VeneerError {
    /// Wrap an io::Error with the path that produced it
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a serde_yaml::Error with the path that produced it
    pub fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_spec(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidSpec {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            path: path.into(),
            message: message.into(),
        }
    }
}
