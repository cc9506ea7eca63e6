//! Local filesystem sources (`file://` URLs and plain paths).

use std::path::{Path, PathBuf};

use super::naming::FALLBACK_FILE_NAME;
use super::{ensure_parent, AttemptContext, FetchRequest, RetrievalError};
use crate::storage::staging_path;

pub(super) async fn copy(
    src: &Path,
    request: &FetchRequest,
    ctx: &AttemptContext,
) -> Result<(), RetrievalError> {
    let meta = tokio::fs::metadata(src)
        .await
        .map_err(|e| RetrievalError::io(format!("stat {}", src.display()), e))?;

    if meta.is_dir() {
        if !request.recursive {
            return Err(RetrievalError::NotRecursive {
                path: src.to_path_buf(),
            });
        }
        return copy_tree(src, &request.dest, ctx).await;
    }

    let target = if request.dest_is_dir() {
        let name = src
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| FALLBACK_FILE_NAME.into());
        request.dest.join(name)
    } else {
        request.dest.clone()
    };
    let bytes = copy_file(src, &target, ctx).await?;
    tracing::debug!(src = %src.display(), dest = %target.display(), bytes, "local copy complete");
    Ok(())
}

/// Copy via a private staging file, renaming once the copy finished.
async fn copy_file(src: &Path, target: &Path, ctx: &AttemptContext) -> Result<u64, RetrievalError> {
    ensure_parent(target).await?;
    let staging = staging_path(target);

    let copied = tokio::select! {
        res = tokio::fs::copy(src, &staging) => res,
        _ = ctx.cancelled() => {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(RetrievalError::Cancelled);
        }
    };
    let bytes = match copied {
        Ok(n) => n,
        Err(e) => {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(RetrievalError::io(
                format!("copy {} to {}", src.display(), staging.display()),
                e,
            ));
        }
    };

    tokio::fs::rename(&staging, target)
        .await
        .map_err(|e| RetrievalError::io(format!("finalize {}", target.display()), e))?;
    Ok(bytes)
}

/// Mirror the tree under `src` into `dest`, creating `dest` if needed.
async fn copy_tree(src: &Path, dest: &Path, ctx: &AttemptContext) -> Result<(), RetrievalError> {
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(src.to_path_buf(), dest.to_path_buf())];
    let mut files = 0u64;

    while let Some((from, to)) = pending.pop() {
        if ctx.is_cancelled() {
            return Err(RetrievalError::Cancelled);
        }
        tokio::fs::create_dir_all(&to)
            .await
            .map_err(|e| RetrievalError::io(format!("create {}", to.display()), e))?;

        let mut entries = tokio::fs::read_dir(&from)
            .await
            .map_err(|e| RetrievalError::io(format!("read {}", from.display()), e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RetrievalError::io(format!("read {}", from.display()), e))?
        {
            let child = entry.path();
            let target = to.join(entry.file_name());
            let meta = tokio::fs::metadata(&child)
                .await
                .map_err(|e| RetrievalError::io(format!("stat {}", child.display()), e))?;
            if meta.is_dir() {
                pending.push((child, target));
            } else {
                copy_file(&child, &target, ctx).await?;
                files += 1;
            }
        }
    }

    tracing::debug!(src = %src.display(), dest = %dest.display(), files, "local tree copy complete");
    Ok(())
}
