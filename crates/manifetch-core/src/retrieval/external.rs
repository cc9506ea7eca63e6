//! Subprocess retrieval: `<program> <url> <dest>`.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use super::{AttemptContext, FetchRequest, RetrievalError, Retriever};

/// Delegates each attempt to an external executable. The child is killed
/// when the attempt is cancelled or its deadline passes.
#[derive(Debug, Clone)]
pub struct ExternalRetriever {
    program: PathBuf,
}

impl ExternalRetriever {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut out = String::from_utf8_lossy(stdout).into_owned();
    out.push_str(&String::from_utf8_lossy(stderr));
    out.trim_end().to_string()
}

#[async_trait]
impl Retriever for ExternalRetriever {
    async fn fetch(
        &self,
        request: &FetchRequest,
        ctx: &AttemptContext,
    ) -> Result<(), RetrievalError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&request.url)
            .arg(&request.dest)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::debug!(
            program = %self.program.display(),
            url = %request.url,
            dest = %request.dest.display(),
            "running retrieval executable"
        );

        let output = tokio::select! {
            res = cmd.output() => res.map_err(|source| RetrievalError::Spawn {
                program: self.program.clone(),
                source,
            })?,
            _ = ctx.cancelled() => return Err(RetrievalError::Cancelled),
        };

        if output.status.success() {
            return Ok(());
        }
        Err(RetrievalError::ExternalExit {
            url: request.url.clone(),
            status: output.status,
            output: combined_output(&output.stdout, &output.stderr),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tokio_util::sync::CancellationToken;

    fn ctx(parent: &CancellationToken) -> AttemptContext {
        AttemptContext::new(parent, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn passes_url_and_dest_positionally() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.txt");
        std::fs::write(&src, b"external").unwrap();
        let dest = dir.path().join("out.txt");

        let client = ExternalRetriever::new("cp");
        let request = FetchRequest {
            url: src.display().to_string(),
            dest: dest.clone(),
            recursive: false,
        };
        client
            .fetch(&request, &ctx(&CancellationToken::new()))
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"external");
    }

    #[tokio::test]
    async fn nonzero_exit_carries_output() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let client = ExternalRetriever::new("ls");
        let request = FetchRequest {
            url: missing.display().to_string(),
            dest: dir.path().join("also-missing"),
            recursive: false,
        };
        let err = client
            .fetch(&request, &ctx(&CancellationToken::new()))
            .await
            .unwrap_err();
        match &err {
            RetrievalError::ExternalExit { status, output, .. } => {
                assert!(!status.success());
                assert!(output.contains("does-not-exist"), "output: {}", output);
            }
            other => panic!("expected ExternalExit, got {:?}", other),
        }
        assert!(err.to_string().contains("Output:"));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let client = ExternalRetriever::new("/nonexistent/manifetch-retriever");
        let request = FetchRequest {
            url: "https://example.com/a".to_string(),
            dest: PathBuf::from("a"),
            recursive: false,
        };
        let err = client
            .fetch(&request, &ctx(&CancellationToken::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Spawn { .. }));
    }

    #[tokio::test]
    async fn cancellation_kills_child_promptly() {
        let parent = CancellationToken::new();
        let attempt = ctx(&parent);
        // GNU sleep sums its operands: "5" + "0".
        let client = ExternalRetriever::new("sleep");
        let request = FetchRequest {
            url: "5".to_string(),
            dest: PathBuf::from("0"),
            recursive: false,
        };

        let canceller = parent.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let err = client.fetch(&request, &attempt).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
