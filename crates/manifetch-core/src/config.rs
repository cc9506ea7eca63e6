//! Tool-wide settings from `~/.config/manifetch/config.toml`.
//!
//! Per-run knobs (parallelism, retries, timeouts) live in the manifests; this
//! file only holds what applies to every run. A missing file means defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::DEFAULT_BACKOFF_UNIT;

/// `[retry]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Seconds per backoff unit; the wait after attempt `n` is `n` units.
    pub backoff_unit_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_unit_secs: DEFAULT_BACKOFF_UNIT.as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub retry: RetryConfig,
}

impl ToolConfig {
    /// Backoff unit as a duration; non-finite or negative values fall back
    /// to the default unit.
    pub fn backoff_unit(&self) -> Duration {
        let secs = self.retry.backoff_unit_secs;
        if !secs.is_finite() || secs < 0.0 {
            return DEFAULT_BACKOFF_UNIT;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(DEFAULT_BACKOFF_UNIT)
    }
}

/// Existing config file, if any.
pub fn config_path() -> Result<Option<PathBuf>> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("manifetch")?;
    Ok(xdg_dirs.find_config_file("config.toml"))
}

/// Load the tool config, or defaults when no file exists.
pub fn load() -> Result<ToolConfig> {
    match config_path()? {
        Some(path) => load_from(&path),
        None => Ok(ToolConfig::default()),
    }
}

pub fn load_from(path: &Path) -> Result<ToolConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: ToolConfig = toml::from_str(&data)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded tool config");
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backoff_is_one_second() {
        let cfg = ToolConfig::default();
        assert_eq!(cfg.backoff_unit(), Duration::from_secs(1));
    }

    #[test]
    fn custom_backoff_unit() {
        let cfg: ToolConfig = toml::from_str("[retry]\nbackoff_unit_secs = 0.25\n").unwrap();
        assert_eq!(cfg.backoff_unit(), Duration::from_millis(250));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: ToolConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, ToolConfig::default());
    }

    #[test]
    fn bad_values_fall_back() {
        let mut cfg = ToolConfig::default();
        cfg.retry.backoff_unit_secs = -2.0;
        assert_eq!(cfg.backoff_unit(), DEFAULT_BACKOFF_UNIT);
        cfg.retry.backoff_unit_secs = f64::NAN;
        assert_eq!(cfg.backoff_unit(), DEFAULT_BACKOFF_UNIT);
        cfg.retry.backoff_unit_secs = f64::INFINITY;
        assert_eq!(cfg.backoff_unit(), DEFAULT_BACKOFF_UNIT);
    }

    #[test]
    fn load_from_reads_file_and_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("config.toml");
        fs::write(&good, "[retry]\nbackoff_unit_secs = 2\n").unwrap();
        assert_eq!(load_from(&good).unwrap().backoff_unit(), Duration::from_secs(2));

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "[retry\n").unwrap();
        let err = load_from(&bad).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to parse config"));
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = ToolConfig {
            retry: RetryConfig {
                backoff_unit_secs: 0.5,
            },
        };
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ToolConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, cfg);
    }
}
