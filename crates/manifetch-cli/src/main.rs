use manifetch_core::config::{self, ToolConfig};
use manifetch_core::control::RunControl;
use manifetch_core::logging;

mod cli;

use crate::cli::{signals, App, RunConfig};

#[tokio::main]
async fn main() {
    if let Err(err) = logging::init() {
        eprintln!("manifetch: logging disabled: {:#}", err);
    }

    let tool_cfg = config::load().unwrap_or_else(|err| {
        tracing::warn!("ignoring tool config: {:#}", err);
        eprintln!("manifetch: ignoring tool config: {:#}", err);
        ToolConfig::default()
    });

    let app = App::new(
        RunConfig {
            version: env!("CARGO_PKG_VERSION"),
        },
        tool_cfg,
    );
    let control = RunControl::new();
    signals::spawn_listener(control.clone());

    let mut stdout = std::io::stdout();
    if let Err(err) = app.run(std::env::args_os(), &control, &mut stdout).await {
        eprintln!("manifetch error: {:#}", err);
        std::process::exit(1);
    }
}
