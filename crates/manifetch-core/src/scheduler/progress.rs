//! Progress events emitted while a run is processed.
//!
//! The CLI drains these from an unbounded channel and prints one line per
//! event; the core never writes to stdout itself.

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    RunStarted {
        manifests: usize,
    },
    ManifestStarted {
        path: PathBuf,
    },
    ManifestLoaded {
        path: PathBuf,
        name: String,
        version: u32,
        sources: usize,
        parallelism: usize,
        retries: u32,
    },
    ManifestFailed {
        path: PathBuf,
        error: String,
    },
    ManifestCompleted {
        path: PathBuf,
    },
    /// `position` is 1-based within the manifest's `total` sources.
    SourceStarted {
        position: usize,
        total: usize,
        url: String,
        dest: String,
    },
    SourceRetrying {
        url: String,
        attempt: u32,
        retries: u32,
        delay: Duration,
        error: String,
    },
    SourceSucceeded {
        position: usize,
        total: usize,
        dest: String,
    },
    SourceFailed {
        position: usize,
        total: usize,
        error: String,
    },
}

/// Optional sender of [`ProgressEvent`]s. Sends after the receiver is gone
/// are ignored.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    tx: Option<UnboundedSender<ProgressEvent>>,
}

impl Progress {
    pub fn new(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
