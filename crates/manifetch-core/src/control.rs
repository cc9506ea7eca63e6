//! Run control: the shared cancellation token plus a one-shot interrupt latch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Cloned into the signal listener and handed (as a token) to the processor.
/// Cancellation is all-or-nothing for the whole run.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    token: CancellationToken,
    interrupted: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel the run. Returns true only for the first call, so the caller
    /// can announce the interrupt exactly once.
    pub fn interrupt(&self) -> bool {
        let first = !self.interrupted.swap(true, Ordering::AcqRel);
        self.token.cancel();
        if first {
            tracing::warn!("interrupt received, cancelling run");
        }
        first
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }
}
