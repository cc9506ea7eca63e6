//! Manifest discovery: turn CLI path arguments into manifest files.
//!
//! Files pass through untouched. Directories are scanned one level deep for
//! entries ending in [`MANIFEST_SUFFIX`]. Results keep argument order and are
//! not deduplicated, so a file named directly and via its directory is
//! processed twice.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name suffix that marks a manifest inside a scanned directory.
pub const MANIFEST_SUFFIX: &str = ".manifest.yaml";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to expand path {}", .path.display())]
    Expand {
        path: PathBuf,
        #[source]
        reason: ExpandError,
    },
    #[error("no manifest files found")]
    NoManifests,
}

#[derive(Debug, Error)]
pub enum ExpandError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("no *{} files found in directory {}", MANIFEST_SUFFIX, .0.display())]
    NoMatches(PathBuf),
}

/// Expand a single path argument.
pub fn expand_path(path: &Path) -> Result<Vec<PathBuf>, ExpandError> {
    let meta = fs::metadata(path)?;
    if !meta.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut matches = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name();
        let is_manifest = name
            .to_str()
            .map(|n| n.ends_with(MANIFEST_SUFFIX))
            .unwrap_or(false);
        if is_manifest && !entry.file_type()?.is_dir() {
            matches.push(path.join(name));
        }
    }

    if matches.is_empty() {
        return Err(ExpandError::NoMatches(path.to_path_buf()));
    }
    matches.sort();
    Ok(matches)
}

/// Expand every argument in order and concatenate the results.
pub fn expand_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut manifests = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let found = expand_path(path).map_err(|reason| DiscoveryError::Expand {
            path: path.to_path_buf(),
            reason,
        })?;
        tracing::debug!(path = %path.display(), found = found.len(), "expanded path argument");
        manifests.extend(found);
    }

    if manifests.is_empty() {
        return Err(DiscoveryError::NoManifests);
    }
    Ok(manifests)
}
