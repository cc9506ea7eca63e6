//! Aggregate errors for a manifest and for a whole run.
//!
//! Failures are listed in declaration order (sources) and argument order
//! (manifests), each rendered with its full `source()` chain.

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::manifest::LoadError;
use crate::retry::SourceError;

/// `err: cause: root cause`.
pub fn render_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut next = err.source();
    while let Some(cause) = next {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        next = cause.source();
    }
    out
}

fn join_failures<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// One failed source of a manifest.
#[derive(Debug)]
pub struct SourceFailure {
    /// Position in the manifest's `sources` list (0-based).
    pub index: usize,
    pub url: String,
    pub error: SourceError,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.url, render_chain(&self.error))
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("some sources failed to download: {}", join_failures(.failures))]
    Sources { failures: Vec<SourceFailure> },

    /// The task processing the manifest panicked or was aborted.
    #[error("manifest task failed: {0}")]
    Aborted(String),
}

/// One manifest that failed to load or had failed sources.
#[derive(Debug)]
pub struct ManifestFailure {
    /// Position among the discovered manifests (0-based).
    pub index: usize,
    pub path: PathBuf,
    pub error: ManifestError,
}

impl fmt::Display for ManifestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), render_chain(&self.error))
    }
}

/// At least one manifest failed.
#[derive(Debug, Error)]
#[error("some manifests failed to process: {}", join_failures(.failures))]
pub struct RunError {
    pub failures: Vec<ManifestFailure>,
}
