//! Tracing setup for the CLI.
//!
//! Events go to `manifetch.log` in the XDG state directory. If that file
//! cannot be opened the subscriber writes to stderr at `warn` instead, so a
//! read-only home never stops a run.

use anyhow::{anyhow, Context, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "manifetch.log";
const FILE_FILTER: &str = "info,manifetch=debug,manifetch_core=debug";
const STDERR_FILTER: &str = "warn";

/// Where the global subscriber sends events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    File(PathBuf),
    Stderr,
}

/// `RUST_LOG` when set and parseable, else `fallback`.
fn filter_or(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// `$XDG_STATE_HOME/manifetch/manifetch.log`, creating the directory.
pub fn log_file_path() -> Result<PathBuf> {
    xdg::BaseDirectories::with_prefix("manifetch")
        .context("failed to resolve XDG directories")?
        .place_state_file(LOG_FILE_NAME)
        .context("failed to create log directory")
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber. Errors only when one is already set.
pub fn init() -> Result<LogSink> {
    let opened = log_file_path().and_then(|path| {
        let file = open_append(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok((path, file))
    });

    let builder = tracing_subscriber::fmt().with_ansi(false);
    match opened {
        Ok((path, file)) => {
            builder
                .with_env_filter(filter_or(FILE_FILTER))
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow!("{}", e))?;
            tracing::info!(path = %path.display(), "logging to file");
            Ok(LogSink::File(path))
        }
        Err(reason) => {
            builder
                .with_env_filter(filter_or(STDERR_FILTER))
                .with_writer(io::stderr)
                .try_init()
                .map_err(|e| anyhow!("{}", e))?;
            tracing::warn!("log file unavailable, using stderr: {:#}", reason);
            Ok(LogSink::Stderr)
        }
    }
}
