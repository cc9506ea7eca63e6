//! Per-source failure after the retry loop settles.

use thiserror::Error;

use crate::retrieval::RetrievalError;

#[derive(Debug, Error)]
pub enum SourceError {
    /// Every attempt failed; only the last failure is kept.
    #[error("failed after {retries} retries")]
    Exhausted {
        retries: u32,
        #[source]
        last: RetrievalError,
    },

    /// The run was cancelled before the source settled.
    #[error("cancelled")]
    Cancelled,

    /// The task fetching the source panicked or was aborted.
    #[error("fetch task failed: {0}")]
    Aborted(String),
}

impl SourceError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SourceError::Cancelled)
    }
}
