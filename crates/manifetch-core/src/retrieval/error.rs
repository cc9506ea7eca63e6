//! Single-attempt retrieval failure.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

fn human(d: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*d)
}

/// Why one fetch attempt failed. Retried by the source fetcher unless it is
/// [`RetrievalError::Cancelled`].
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("transfer failed for {url}")]
    Transfer {
        url: String,
        #[source]
        source: curl::Error,
    },

    #[error("GET {url} returned HTTP {code}")]
    Http { url: String, code: u32 },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is a directory; set `recursive: true` to copy it", .path.display())]
    NotRecursive { path: PathBuf },

    #[error("failed to launch retrieval executable {}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("retrieval executable failed for {url}: {status}\nOutput: {output}")]
    ExternalExit {
        url: String,
        status: ExitStatus,
        output: String,
    },

    #[error("fetching {url} exceeded the {} deadline", human(.timeout))]
    DeadlineExceeded { url: String, timeout: Duration },

    #[error("cancelled")]
    Cancelled,

    #[error("retrieval worker failed: {0}")]
    Worker(String),
}

impl RetrievalError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        RetrievalError::Io {
            context: context.into(),
            source,
        }
    }

    /// Cancellation ends the retry loop; every other failure is retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RetrievalError::Cancelled)
    }
}
