//! Manifest model and loader.
//!
//! A manifest is one YAML file naming a set of sources to fetch plus the
//! settings (parallelism, retries, timeout, retrieval executable) that apply
//! to all of them. Loading reads, parses, applies defaults once and then
//! validates; any violation rejects the whole file.

mod duration;
mod error;

pub use error::{LoadError, ValidationError};

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of sources fetched at once within one manifest.
pub const DEFAULT_PARALLELISM: usize = 4;
/// Default number of retries after the first failed attempt.
pub const DEFAULT_RETRIES: u32 = 3;
/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every source of a manifest (the `config:` block).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of in-flight fetches.
    pub parallelism: usize,
    /// Retries after the first attempt (total attempts = retries + 1).
    pub retries: u32,
    /// Timeout for one attempt unless the source overrides it.
    #[serde(with = "duration")]
    pub timeout: Duration,
    /// External program invoked as `<program> <url> <dest>`. When absent,
    /// retrieval happens in-process.
    #[serde(rename = "retrieval-executable")]
    pub retrieval_executable: Option<PathBuf>,
}

impl Settings {
    /// Replace zero values with the built-in defaults. Explicit values stay.
    pub fn apply_defaults(&mut self) {
        if self.parallelism == 0 {
            self.parallelism = DEFAULT_PARALLELISM;
        }
        if self.retries == 0 {
            self.retries = DEFAULT_RETRIES;
        }
        if self.timeout.is_zero() {
            self.timeout = DEFAULT_TIMEOUT;
        }
    }
}

/// One fetch unit: `url` is retrieved into `dest`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Source {
    pub url: String,
    pub dest: String,
    #[serde(with = "duration::option")]
    pub timeout: Option<Duration>,
    pub recursive: bool,
}

impl Source {
    /// Timeout for one attempt: the source's own when set and nonzero,
    /// otherwise the manifest-wide one.
    pub fn effective_timeout(&self, settings: &Settings) -> Duration {
        match self.timeout {
            Some(t) if !t.is_zero() => t,
            _ => settings.timeout,
        }
    }
}

/// A parsed manifest file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub version: u32,
    pub name: String,
    pub config: Settings,
    pub sources: Vec<Source>,
}

impl Manifest {
    /// Parse a manifest from YAML text without defaults or validation.
    /// A blank document yields an empty manifest.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn apply_defaults(&mut self) {
        self.config.apply_defaults();
    }

    /// Check required fields in a fixed order and report the first violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version == 0 {
            return Err(ValidationError::MissingVersion);
        }
        if self.name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.sources.is_empty() {
            return Err(ValidationError::NoSources);
        }
        for (index, source) in self.sources.iter().enumerate() {
            if source.url.is_empty() {
                return Err(ValidationError::MissingUrl { index });
            }
            if source.dest.is_empty() {
                return Err(ValidationError::MissingDest { index });
            }
        }
        Ok(())
    }
}

/// Read, parse, default and validate the manifest at `path`.
pub fn load(path: &Path) -> Result<Manifest, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut manifest = Manifest::from_yaml(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    manifest.apply_defaults();

    manifest.validate().map_err(|rule| LoadError::Validation {
        path: path.to_path_buf(),
        rule,
    })?;

    tracing::debug!(
        path = %path.display(),
        name = %manifest.name,
        sources = manifest.sources.len(),
        "manifest loaded"
    );
    Ok(manifest)
}
