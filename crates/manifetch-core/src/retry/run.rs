//! Retry loop: run an attempt until success or the policy says stop.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::error::SourceError;
use super::policy::{RetryDecision, RetryPolicy};
use crate::retrieval::RetrievalError;

/// Runs `attempt(n)` (n is 1-based) until it succeeds or the policy gives
/// up. `on_retry(n, delay, &err)` is called before each backoff wait.
///
/// Cancellation is checked before every attempt and interrupts the backoff
/// wait. An attempt that itself reports [`RetrievalError::Cancelled`] ends
/// the loop without further attempts.
pub async fn run_with_retry<F, Fut, R>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut attempt: F,
    mut on_retry: R,
) -> Result<(), SourceError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(), RetrievalError>>,
    R: FnMut(u32, Duration, &RetrievalError),
{
    let mut n = 1u32;
    loop {
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled);
        }
        let err = match attempt(n).await {
            Ok(()) => return Ok(()),
            Err(e) if !e.is_retryable() => return Err(SourceError::Cancelled),
            Err(e) => e,
        };
        match policy.decide(n) {
            RetryDecision::NoRetry => {
                return Err(SourceError::Exhausted {
                    retries: policy.retries,
                    last: err,
                })
            }
            RetryDecision::RetryAfter(delay) => {
                on_retry(n, delay, &err);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(SourceError::Cancelled),
                }
                n += 1;
            }
        }
    }
}
