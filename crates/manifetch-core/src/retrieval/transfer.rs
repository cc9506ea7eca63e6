//! libcurl transfer of one network URL.
//!
//! The blocking transfer runs on tokio's blocking pool. The attempt token is
//! polled from curl's progress callback, so cancelling the attempt (deadline
//! or run cancellation) aborts the transfer and drops the staging file.

use std::path::PathBuf;
use std::str;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::naming::target_file_name;
use super::{AttemptContext, FetchRequest, RetrievalError};
use crate::storage::PartFile;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: u32 = 10;
/// Largest timeout libcurl takes in milliseconds where `long` is 32 bits.
const MAX_CURL_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);
const USER_AGENT: &str = concat!("manifetch/", env!("CARGO_PKG_VERSION"));

/// Timeout to hand libcurl. `None` leaves curl unbounded; the attempt
/// deadline still cancels it through the progress callback.
fn curl_timeout(remaining: Duration) -> Option<Duration> {
    (remaining <= MAX_CURL_TIMEOUT).then_some(remaining)
}

pub(super) async fn download(
    url: url::Url,
    request: &FetchRequest,
    ctx: &AttemptContext,
) -> Result<(), RetrievalError> {
    let job = CurlJob {
        check_status: matches!(url.scheme(), "http" | "https"),
        url: url.to_string(),
        dest: request.dest.clone(),
        into_dir: request.dest_is_dir(),
        timeout: ctx.remaining(),
        budget: ctx.timeout(),
        token: ctx.token().clone(),
    };

    let handle = tokio::task::spawn_blocking(move || job.run());
    tokio::select! {
        res = handle => res.map_err(|e| RetrievalError::Worker(e.to_string()))?,
        _ = ctx.cancelled() => Err(RetrievalError::Cancelled),
    }
}

struct CurlJob {
    url: String,
    dest: PathBuf,
    into_dir: bool,
    check_status: bool,
    /// Time left for this attempt.
    timeout: Duration,
    /// The attempt's full timeout, for error messages.
    budget: Duration,
    token: CancellationToken,
}

impl CurlJob {
    fn transfer_error(&self, source: curl::Error) -> RetrievalError {
        RetrievalError::Transfer {
            url: self.url.clone(),
            source,
        }
    }

    fn run(self) -> Result<(), RetrievalError> {
        if self.timeout.is_zero() {
            return Err(RetrievalError::DeadlineExceeded {
                url: self.url.clone(),
                timeout: self.budget,
            });
        }

        // Until headers arrive the name inside a directory dest is a guess.
        let staged_target = if self.into_dir {
            self.dest.join(target_file_name(&self.url, None))
        } else {
            self.dest.clone()
        };
        let mut part = PartFile::create(&staged_target).map_err(|e| {
            RetrievalError::io(format!("create {}", staged_target.display()), e)
        })?;

        let mut easy = curl::easy::Easy::new();
        easy.url(&self.url).map_err(|e| self.transfer_error(e))?;
        easy.follow_location(true).map_err(|e| self.transfer_error(e))?;
        easy.max_redirections(MAX_REDIRECTS)
            .map_err(|e| self.transfer_error(e))?;
        easy.useragent(USER_AGENT).map_err(|e| self.transfer_error(e))?;
        easy.connect_timeout(CONNECT_TIMEOUT.min(self.timeout))
            .map_err(|e| self.transfer_error(e))?;
        if let Some(limit) = curl_timeout(self.timeout) {
            easy.timeout(limit).map_err(|e| self.transfer_error(e))?;
        }
        easy.progress(true).map_err(|e| self.transfer_error(e))?;

        let mut disposition: Option<String> = None;
        let mut write_error: Option<std::io::Error> = None;
        let token = self.token.clone();

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|line| {
                    if let Ok(line) = str::from_utf8(line) {
                        if let Some((name, value)) = line.split_once(':') {
                            if name.trim().eq_ignore_ascii_case("content-disposition") {
                                disposition = Some(value.trim().to_string());
                            }
                        }
                    }
                    true
                })
                .map_err(|e| self.transfer_error(e))?;
            transfer
                .write_function(|data| match part.write_all(data) {
                    Ok(()) => Ok(data.len()),
                    Err(e) => {
                        write_error = Some(e);
                        // Short count makes curl abort with a write error.
                        Ok(0)
                    }
                })
                .map_err(|e| self.transfer_error(e))?;
            transfer
                .progress_function(move |_, _, _, _| !token.is_cancelled())
                .map_err(|e| self.transfer_error(e))?;
            transfer.perform()
        };

        if let Err(e) = performed {
            if self.token.is_cancelled() {
                return Err(RetrievalError::Cancelled);
            }
            if let Some(io) = write_error {
                return Err(RetrievalError::io(
                    format!("write {}", part.path().display()),
                    io,
                ));
            }
            if e.is_operation_timedout() {
                return Err(RetrievalError::DeadlineExceeded {
                    url: self.url.clone(),
                    timeout: self.budget,
                });
            }
            return Err(self.transfer_error(e));
        }

        if self.check_status {
            let code = easy.response_code().map_err(|e| self.transfer_error(e))?;
            if !(200..300).contains(&code) {
                return Err(RetrievalError::Http {
                    url: self.url.clone(),
                    code,
                });
            }
        }

        let final_path = if self.into_dir {
            self.dest
                .join(target_file_name(&self.url, disposition.as_deref()))
        } else {
            self.dest.clone()
        };
        let written = part
            .commit(&final_path)
            .map_err(|e| RetrievalError::io(format!("finalize {}", final_path.display()), e))?;

        tracing::debug!(
            url = %self.url,
            path = %final_path.display(),
            bytes = written,
            "transfer complete"
        );
        Ok(())
    }
}
