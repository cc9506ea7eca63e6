//! Retrieval clients: perform one fetch attempt of one source.
//!
//! The orchestrator only sees the [`Retriever`] trait. Two implementations
//! ship: [`InProcessRetriever`] (libcurl for network URLs, the filesystem for
//! `file://` and bare paths) and [`ExternalRetriever`], which shells out to a
//! configured executable. Neither retries; that is the source fetcher's job.

mod error;
mod external;
mod local;
mod naming;
mod transfer;

pub use error::RetrievalError;
pub use external::ExternalRetriever;
pub use naming::target_file_name;

use async_trait::async_trait;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::manifest::{Settings, Source};

/// Stand-in deadline for timeouts too large to add to `Instant::now()`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// What to fetch and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub dest: PathBuf,
    pub recursive: bool,
}

impl From<&Source> for FetchRequest {
    fn from(source: &Source) -> Self {
        Self {
            url: source.url.clone(),
            dest: PathBuf::from(&source.dest),
            recursive: source.recursive,
        }
    }
}

impl FetchRequest {
    /// True when `dest` names a directory the fetched file should go into:
    /// it already exists as one, or it ends with a path separator.
    pub fn dest_is_dir(&self) -> bool {
        if self.dest.is_dir() {
            return true;
        }
        let raw = self.dest.as_os_str().to_string_lossy();
        raw.ends_with('/') || raw.ends_with(MAIN_SEPARATOR)
    }
}

/// Cancellation and deadline bound to one attempt.
///
/// The token is a child of the run's token, so cancelling the run cancels
/// every attempt, while cancelling an attempt leaves the run alone.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    token: CancellationToken,
    deadline: Instant,
    timeout: Duration,
}

impl AttemptContext {
    pub fn new(parent: &CancellationToken, timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            token: parent.child_token(),
            deadline: now.checked_add(timeout).unwrap_or(now + FAR_FUTURE),
            timeout,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline (zero once it has passed).
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Abort whatever is still running on behalf of this attempt.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// One fetch attempt of one source.
///
/// Implementations must return promptly once `ctx` is cancelled and must
/// not retry internally.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn fetch(&self, request: &FetchRequest, ctx: &AttemptContext)
        -> Result<(), RetrievalError>;
}

/// Fetches with libcurl, or with the local filesystem for `file://` URLs and
/// plain paths.
#[derive(Debug, Clone, Default)]
pub struct InProcessRetriever {
    _priv: (),
}

impl InProcessRetriever {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Where a source URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Local(PathBuf),
    Remote(url::Url),
}

fn locate(raw: &str) -> Result<Location, RetrievalError> {
    match url::Url::parse(raw) {
        Ok(parsed) if parsed.scheme() == "file" => parsed
            .to_file_path()
            .map(Location::Local)
            .map_err(|()| RetrievalError::InvalidUrl {
                url: raw.to_string(),
                reason: "file URL does not name a local path".to_string(),
            }),
        // Single-letter "schemes" are Windows drive letters.
        Ok(parsed) if parsed.scheme().len() == 1 => Ok(Location::Local(PathBuf::from(raw))),
        Ok(parsed) => Ok(Location::Remote(parsed)),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Location::Local(PathBuf::from(raw))),
        Err(e) => Err(RetrievalError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[async_trait]
impl Retriever for InProcessRetriever {
    async fn fetch(
        &self,
        request: &FetchRequest,
        ctx: &AttemptContext,
    ) -> Result<(), RetrievalError> {
        match locate(&request.url)? {
            Location::Local(path) => local::copy(&path, request, ctx).await,
            Location::Remote(url) => transfer::download(url, request, ctx).await,
        }
    }
}

/// Pick the retrieval client a manifest asks for.
pub fn client_for(settings: &Settings) -> Arc<dyn Retriever> {
    match &settings.retrieval_executable {
        Some(program) => Arc::new(ExternalRetriever::new(program.clone())),
        None => Arc::new(InProcessRetriever::new()),
    }
}

/// Create the parent directory of `path` if it has one.
pub(crate) async fn ensure_parent(path: &Path) -> Result<(), RetrievalError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RetrievalError::io(format!("create {}", parent.display()), e)),
        _ => Ok(()),
    }
}
