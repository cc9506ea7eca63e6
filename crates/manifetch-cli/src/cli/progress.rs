//! Prints progress events as the run produces them.

use manifetch_core::scheduler::ProgressEvent;
use std::io::{self, Write};
use tokio::sync::mpsc::UnboundedReceiver;

/// One human-readable line (or two) per event.
pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::RunStarted { manifests } => format!("Processing {} manifest(s)", manifests),
        ProgressEvent::ManifestStarted { path } => {
            format!("\n==> Processing manifest: {}", path.display())
        }
        ProgressEvent::ManifestLoaded {
            name,
            version,
            sources,
            parallelism,
            retries,
            ..
        } => format!(
            "Manifest: {} (version: {})\nSources: {}, Parallelism: {}, Retries: {}",
            name, version, sources, parallelism, retries
        ),
        ProgressEvent::ManifestFailed { path, error } => {
            format!("Error processing {}: {}", path.display(), error)
        }
        ProgressEvent::ManifestCompleted { path } => format!("Completed {}", path.display()),
        ProgressEvent::SourceStarted {
            position,
            total,
            url,
            dest,
        } => format!("  [{}/{}] Fetching {} -> {}", position, total, url, dest),
        ProgressEvent::SourceRetrying {
            url,
            attempt,
            retries,
            delay,
            error,
        } => format!(
            "  Retry {}/{} for {} in {}: {}",
            attempt,
            retries,
            url,
            delay_label(*delay),
            error
        ),
        ProgressEvent::SourceSucceeded {
            position,
            total,
            dest,
        } => format!("  [{}/{}] Success: {}", position, total, dest),
        ProgressEvent::SourceFailed {
            position,
            total,
            error,
        } => format!("  [{}/{}] Failed: {}", position, total, error),
    }
}

fn delay_label(d: std::time::Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

/// Print events until every sender is gone.
pub async fn drain<W: Write>(mut rx: UnboundedReceiver<ProgressEvent>, out: &mut W) -> io::Result<()> {
    while let Some(event) = rx.recv().await {
        writeln!(out, "{}", format_event(&event))?;
        out.flush()?;
    }
    Ok(())
}
