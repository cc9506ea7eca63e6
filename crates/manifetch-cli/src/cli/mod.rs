//! CLI for manifetch: parse arguments, run the processor, narrate progress.

pub mod progress;
pub mod signals;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use manifetch_core::config::ToolConfig;
use manifetch_core::control::RunControl;
use manifetch_core::scheduler::ManifestProcessor;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

/// Values fixed at build time and handed to the app explicitly.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    pub version: &'static str,
}

/// Help and version are plain flags so their output goes to the app's
/// writer instead of clap's stdout.
#[derive(Debug, Parser)]
#[command(name = "manifetch", disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Show this help message.
    #[arg(short = 'h', long = "help", action = ArgAction::SetTrue)]
    pub help: bool,

    /// Show version information.
    #[arg(short = 'v', long = "version", action = ArgAction::SetTrue)]
    pub version: bool,

    /// Manifest files (*.manifest.yaml) or directories containing them.
    #[arg(value_name = "MANIFEST_OR_DIR")]
    pub paths: Vec<PathBuf>,
}

pub struct App {
    run_cfg: RunConfig,
    tool_cfg: ToolConfig,
}

impl App {
    pub fn new(run_cfg: RunConfig, tool_cfg: ToolConfig) -> Self {
        Self { run_cfg, tool_cfg }
    }

    /// Run with `args` (program name first). Everything user-facing goes to
    /// `out`; the returned error is what `main` prints.
    pub async fn run<I, T, W>(&self, args: I, control: &RunControl, out: &mut W) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
        W: Write,
    {
        let cli = Cli::try_parse_from(args)?;

        if cli.help {
            write!(out, "{}", self.usage())?;
            return Ok(());
        }
        if cli.version {
            writeln!(out, "manifetch version {}", self.run_cfg.version)?;
            return Ok(());
        }
        if cli.paths.is_empty() {
            write!(out, "{}", self.usage())?;
            bail!("no configuration files or directories specified");
        }

        writeln!(out, "manifetch version {}", self.run_cfg.version)?;
        tracing::info!(version = self.run_cfg.version, paths = cli.paths.len(), "starting run");

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let processor = ManifestProcessor::new(&cli.paths)?
            .with_backoff_unit(self.tool_cfg.backoff_unit())
            .with_progress(tx);

        let run = async move {
            let outcome = processor.process(control.token()).await;
            // Closes the progress channel so the printer below finishes.
            drop(processor);
            outcome
        };
        let (outcome, printed) = tokio::join!(run, progress::drain(rx, &mut *out));
        printed.context("failed to write progress")?;
        if let Err(e) = outcome {
            if control.is_interrupted() {
                tracing::warn!("run cancelled by interrupt");
            }
            return Err(e.into());
        }

        writeln!(out, "\nAll manifests processed successfully!")?;
        Ok(())
    }

    fn usage(&self) -> String {
        format!(
            "manifetch version {version}

Fetch remote and local files declared in YAML manifests.

Usage:
  manifetch [options] <manifest-file-or-directory>...

Options:
  -h, --help     Show this help message
  -v, --version  Show version information

Arguments:
  One or more manifest files (*.manifest.yaml) or directories.
  Directories are scanned (not recursively) for *.manifest.yaml files.

Examples:
  # Process a single manifest
  manifetch project1.manifest.yaml

  # Process several manifests
  manifetch project1.manifest.yaml project2.manifest.yaml

  # Process every manifest in some directories
  manifetch manifests-v1/ manifests-v2/

  # Mix files and directories
  manifetch project1.manifest.yaml manifests/

",
            version = self.run_cfg.version
        )
    }
}

#[cfg(test)]
mod tests;
