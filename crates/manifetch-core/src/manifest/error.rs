//! Errors raised while loading a manifest.

use std::path::PathBuf;
use thiserror::Error;

/// First required-field rule a manifest violates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("version is required")]
    MissingVersion,
    #[error("name is required")]
    MissingName,
    #[error("at least one source is required")]
    NoSources,
    #[error("source {index}: url is required")]
    MissingUrl { index: usize },
    #[error("source {index}: dest is required")]
    MissingDest { index: usize },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read manifest {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid manifest {}", .path.display())]
    Validation {
        path: PathBuf,
        #[source]
        rule: ValidationError,
    },
}

impl LoadError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            LoadError::Read { path, .. }
            | LoadError::Parse { path, .. }
            | LoadError::Validation { path, .. } => path,
        }
    }
}
