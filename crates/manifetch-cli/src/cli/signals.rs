//! SIGINT/SIGTERM handling: cancel the run, announce it once.

use manifetch_core::control::RunControl;
use std::io;

const INTERRUPT_NOTICE: &str = "\nReceived interrupt signal, cancelling...";

/// Listen for interrupts for the rest of the process. Further signals after
/// the first are absorbed silently.
pub fn spawn_listener(control: RunControl) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = listen(&control).await {
            tracing::warn!("signal listener stopped: {}", e);
        }
    })
}

fn announce(control: &RunControl) {
    if control.interrupt() {
        println!("{}", INTERRUPT_NOTICE);
    }
}

#[cfg(unix)]
async fn listen(control: &RunControl) -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => res?,
            _ = term.recv() => {}
        }
        announce(control);
    }
}

#[cfg(not(unix))]
async fn listen(control: &RunControl) -> io::Result<()> {
    loop {
        tokio::signal::ctrl_c().await?;
        announce(control);
    }
}
