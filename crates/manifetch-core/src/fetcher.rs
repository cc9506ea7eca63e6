//! Source fetcher: one source, several attempts.
//!
//! Wraps a [`Retriever`] with the manifest's retry policy. Every attempt
//! gets its own deadline (the source's effective timeout) and a child of the
//! run's cancellation token.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::manifest::{Settings, Source};
use crate::retrieval::{AttemptContext, FetchRequest, RetrievalError, Retriever};
use crate::retry::{run_with_retry, RetryPolicy, SourceError};
use crate::scheduler::{Progress, ProgressEvent};

pub struct SourceFetcher {
    client: Arc<dyn Retriever>,
    settings: Settings,
    policy: RetryPolicy,
    progress: Progress,
}

impl SourceFetcher {
    pub fn new(client: Arc<dyn Retriever>, settings: &Settings) -> Self {
        Self {
            client,
            policy: RetryPolicy::new(settings.retries),
            settings: settings.clone(),
            progress: Progress::disabled(),
        }
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.policy = self.policy.with_backoff_unit(unit);
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Fetch `source`, retrying failed attempts with linear backoff.
    pub async fn fetch_source(
        &self,
        source: &Source,
        cancel: &CancellationToken,
    ) -> Result<(), SourceError> {
        let request = FetchRequest::from(source);
        let timeout = source.effective_timeout(&self.settings);
        let request = &request;
        let retries = self.policy.retries;

        run_with_retry(
            &self.policy,
            cancel,
            move |n| self.attempt(request, timeout, cancel, n),
            |n, delay, err| {
                tracing::warn!(
                    url = %source.url,
                    attempt = n,
                    retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, retrying"
                );
                self.progress.emit(ProgressEvent::SourceRetrying {
                    url: source.url.clone(),
                    attempt: n,
                    retries,
                    delay,
                    error: err.to_string(),
                });
            },
        )
        .await
    }

    /// One bounded attempt. The attempt context is cancelled on the way out
    /// so nothing keeps running on its behalf.
    async fn attempt(
        &self,
        request: &FetchRequest,
        timeout: Duration,
        cancel: &CancellationToken,
        n: u32,
    ) -> Result<(), RetrievalError> {
        let ctx = AttemptContext::new(cancel, timeout);
        tracing::debug!(
            url = %request.url,
            dest = %request.dest.display(),
            attempt = n,
            max_attempts = self.policy.max_attempts(),
            timeout_ms = timeout.as_millis() as u64,
            "starting attempt"
        );

        let outcome = tokio::select! {
            res = self.client.fetch(request, &ctx) => res,
            _ = tokio::time::sleep_until(ctx.deadline()) => Err(RetrievalError::DeadlineExceeded {
                url: request.url.clone(),
                timeout,
            }),
            _ = cancel.cancelled() => Err(RetrievalError::Cancelled),
        };
        ctx.cancel();
        outcome
    }
}
