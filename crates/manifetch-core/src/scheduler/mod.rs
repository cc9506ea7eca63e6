//! Manifest processor: the two-level fan-out.
//!
//! Level 1 runs every discovered manifest on its own task. Level 2 runs every
//! source of a manifest on its own task, admitted through a gate sized to the
//! manifest's `parallelism`. Outcomes land in index-addressed slots and are
//! aggregated in declaration order once everything has joined, so a failure
//! in one unit never disturbs its siblings.

mod gate;
mod progress;
mod report;

pub use gate::{Admission, AdmissionGate};
pub use progress::{Progress, ProgressEvent};
pub use report::{render_chain, ManifestError, ManifestFailure, RunError, SourceFailure};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::discovery::{expand_paths, DiscoveryError};
use crate::fetcher::SourceFetcher;
use crate::manifest::{self, Settings};
use crate::retrieval::{self, Retriever};
use crate::retry::{SourceError, DEFAULT_BACKOFF_UNIT};

/// Builds the retrieval client for a manifest's settings.
pub type RetrieverFactory = Arc<dyn Fn(&Settings) -> Arc<dyn Retriever> + Send + Sync>;

/// Processes a fixed list of manifest files.
pub struct ManifestProcessor {
    manifests: Vec<PathBuf>,
    backoff_unit: Duration,
    client_factory: RetrieverFactory,
    progress: Progress,
}

impl ManifestProcessor {
    /// Expand `paths` (files pass through, directories are scanned one level
    /// deep for manifests). Fails if any path fails or nothing is found.
    pub fn new<P: AsRef<Path>>(paths: &[P]) -> Result<Self, DiscoveryError> {
        let manifests = expand_paths(paths)?;
        tracing::debug!(count = manifests.len(), "discovered manifests");
        Ok(Self {
            manifests,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            client_factory: Arc::new(retrieval::client_for),
            progress: Progress::disabled(),
        })
    }

    /// Discovered manifest paths, in processing order.
    pub fn manifests(&self) -> &[PathBuf] {
        &self.manifests
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_client_factory(mut self, factory: RetrieverFactory) -> Self {
        self.client_factory = factory;
        self
    }

    pub fn with_progress(mut self, tx: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Progress::new(tx);
        self
    }

    /// Process every manifest. Succeeds only if every source of every
    /// manifest was fetched.
    pub async fn process(&self, cancel: &CancellationToken) -> Result<(), RunError> {
        let total = self.manifests.len();
        tracing::info!(manifests = total, "run started");
        self.progress.emit(ProgressEvent::RunStarted { manifests: total });

        let handles: Vec<_> = self
            .manifests
            .iter()
            .map(|path| {
                let job = ManifestJob {
                    path: path.clone(),
                    backoff_unit: self.backoff_unit,
                    client_factory: Arc::clone(&self.client_factory),
                    progress: self.progress.clone(),
                    cancel: cancel.clone(),
                };
                tokio::spawn(job.run())
            })
            .collect();

        let mut failures = Vec::new();
        for (index, (path, handle)) in self.manifests.iter().zip(handles).enumerate() {
            let outcome = handle
                .await
                .unwrap_or_else(|e| Err(ManifestError::Aborted(e.to_string())));
            if let Err(error) = outcome {
                tracing::warn!(path = %path.display(), error = %render_chain(&error), "manifest failed");
                self.progress.emit(ProgressEvent::ManifestFailed {
                    path: path.clone(),
                    error: render_chain(&error),
                });
                failures.push(ManifestFailure {
                    index,
                    path: path.clone(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            tracing::info!(manifests = total, "run complete");
            Ok(())
        } else {
            tracing::warn!(failed = failures.len(), manifests = total, "run finished with failures");
            Err(RunError { failures })
        }
    }
}

/// Everything one manifest task owns.
struct ManifestJob {
    path: PathBuf,
    backoff_unit: Duration,
    client_factory: RetrieverFactory,
    progress: Progress,
    cancel: CancellationToken,
}

impl ManifestJob {
    async fn run(self) -> Result<(), ManifestError> {
        self.progress.emit(ProgressEvent::ManifestStarted {
            path: self.path.clone(),
        });
        let manifest = manifest::load(&self.path)?;
        let settings = &manifest.config;
        tracing::info!(
            path = %self.path.display(),
            name = %manifest.name,
            sources = manifest.sources.len(),
            parallelism = settings.parallelism,
            retries = settings.retries,
            "processing manifest"
        );
        self.progress.emit(ProgressEvent::ManifestLoaded {
            path: self.path.clone(),
            name: manifest.name.clone(),
            version: manifest.version,
            sources: manifest.sources.len(),
            parallelism: settings.parallelism,
            retries: settings.retries,
        });

        let client = (self.client_factory)(settings);
        let fetcher = Arc::new(
            SourceFetcher::new(client, settings)
                .with_backoff_unit(self.backoff_unit)
                .with_progress(self.progress.clone()),
        );
        let gate = Arc::new(AdmissionGate::new(settings.parallelism));
        let total = manifest.sources.len();

        let handles: Vec<_> = manifest
            .sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let source = source.clone();
                let fetcher = Arc::clone(&fetcher);
                let gate = Arc::clone(&gate);
                let progress = self.progress.clone();
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    let Some(_admission) = gate.admit(&cancel).await else {
                        return Err(SourceError::Cancelled);
                    };
                    let position = index + 1;
                    progress.emit(ProgressEvent::SourceStarted {
                        position,
                        total,
                        url: source.url.clone(),
                        dest: source.dest.clone(),
                    });
                    let outcome = fetcher.fetch_source(&source, &cancel).await;
                    match &outcome {
                        Ok(()) => progress.emit(ProgressEvent::SourceSucceeded {
                            position,
                            total,
                            dest: source.dest.clone(),
                        }),
                        Err(e) => progress.emit(ProgressEvent::SourceFailed {
                            position,
                            total,
                            error: render_chain(e),
                        }),
                    }
                    outcome
                })
            })
            .collect();

        let mut failures = Vec::new();
        for (index, (source, handle)) in manifest.sources.iter().zip(handles).enumerate() {
            let outcome = handle
                .await
                .unwrap_or_else(|e| Err(SourceError::Aborted(e.to_string())));
            if let Err(error) = outcome {
                if error.is_cancelled() {
                    tracing::debug!(url = %source.url, "source cancelled");
                } else {
                    tracing::warn!(url = %source.url, error = %render_chain(&error), "source failed");
                }
                failures.push(SourceFailure {
                    index,
                    url: source.url.clone(),
                    error,
                });
            }
        }
        tracing::debug!(
            path = %self.path.display(),
            peak_in_flight = gate.peak(),
            capacity = gate.capacity(),
            "manifest sources joined"
        );

        if !failures.is_empty() {
            return Err(ManifestError::Sources { failures });
        }
        self.progress.emit(ProgressEvent::ManifestCompleted {
            path: self.path.clone(),
        });
        Ok(())
    }
}
