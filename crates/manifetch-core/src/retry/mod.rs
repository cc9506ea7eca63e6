//! Retry and backoff for source fetches.
//!
//! A source gets `retries` extra attempts after the first. Between failed
//! attempts the loop waits `attempt * backoff_unit` (linear backoff), and
//! that wait observes run cancellation like everything else.

mod error;
mod policy;
mod run;

pub use error::SourceError;
pub use policy::{RetryDecision, RetryPolicy, DEFAULT_BACKOFF_UNIT};
pub use run::run_with_retry;
