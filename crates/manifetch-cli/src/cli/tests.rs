use super::*;
use std::path::Path;

const VERSION: &str = "1.2.3-test";

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

fn app() -> App {
    App::new(RunConfig { version: VERSION }, ToolConfig::default())
}

async fn run(args: &[&str], control: &RunControl) -> (Result<()>, String) {
    let mut out = Vec::new();
    let res = app().run(args.iter().copied(), control, &mut out).await;
    (res, String::from_utf8(out).unwrap())
}

fn write_manifest(dir: &Path, src: &Path, dest: &Path) -> PathBuf {
    let path = dir.join("copy.manifest.yaml");
    std::fs::write(
        &path,
        format!(
            "version: 1\nname: copy\nsources:\n  - url: {}\n    dest: {}\n",
            src.display(),
            dest.display()
        ),
    )
    .unwrap();
    path
}

#[test]
fn cli_parse_paths() {
    let cli = parse(&["manifetch", "a.manifest.yaml", "dir/"]);
    assert!(!cli.help && !cli.version);
    assert_eq!(cli.paths, vec![PathBuf::from("a.manifest.yaml"), PathBuf::from("dir/")]);
}

#[test]
fn cli_parse_help_and_version_flags() {
    assert!(parse(&["manifetch", "-h"]).help);
    assert!(parse(&["manifetch", "--help"]).help);
    assert!(parse(&["manifetch", "-v"]).version);
    assert!(parse(&["manifetch", "--version"]).version);
}

#[test]
fn cli_parse_rejects_unknown_flag() {
    assert!(Cli::try_parse_from(["manifetch", "--bogus"]).is_err());
}

#[tokio::test]
async fn no_arguments_prints_usage_and_fails() {
    let (res, out) = run(&["manifetch"], &RunControl::new()).await;
    let err = res.unwrap_err();
    assert_eq!(err.to_string(), "no configuration files or directories specified");
    assert!(out.starts_with(&format!("manifetch version {}", VERSION)));
    assert!(out.contains("Usage:"));
}

#[tokio::test]
async fn version_flag_prints_version() {
    let (res, out) = run(&["manifetch", "-v"], &RunControl::new()).await;
    res.unwrap();
    assert_eq!(out, format!("manifetch version {}\n", VERSION));
}

#[tokio::test]
async fn help_flag_prints_usage() {
    let (res, out) = run(&["manifetch", "--help"], &RunControl::new()).await;
    res.unwrap();
    assert!(out.contains("manifetch [options] <manifest-file-or-directory>..."));
}

#[tokio::test]
async fn run_copies_local_source_and_reports_success() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("input.txt");
    std::fs::write(&src, "hello").unwrap();
    let dest = dir.path().join("out/input.txt");
    let manifest = write_manifest(dir.path(), &src, &dest);
    let manifest = manifest.to_str().unwrap();

    let (res, out) = run(&["manifetch", manifest], &RunControl::new()).await;
    res.unwrap();
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "hello");
    assert!(out.starts_with(&format!("manifetch version {}\n", VERSION)), "{}", out);
    assert!(out.contains("Processing 1 manifest(s)"), "{}", out);
    assert!(out.contains("[1/1] Success:"), "{}", out);
    assert!(out.ends_with("\nAll manifests processed successfully!\n"), "{}", out);
}

#[tokio::test]
async fn missing_path_fails_before_processing() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.manifest.yaml");
    let (res, out) = run(&["manifetch", missing.to_str().unwrap()], &RunControl::new()).await;
    let err = res.unwrap_err();
    assert!(format!("{:#}", err).contains("failed to expand path"), "{:#}", err);
    assert!(!out.contains("Processing"));
}

#[tokio::test]
async fn interrupted_run_reports_cancelled_sources() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("input.txt");
    std::fs::write(&src, "hello").unwrap();
    let manifest = write_manifest(dir.path(), &src, &dir.path().join("out.txt"));

    let control = RunControl::new();
    assert!(control.interrupt());
    let (res, out) = run(&["manifetch", manifest.to_str().unwrap()], &control).await;
    let err = res.unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("some manifests failed to process: "), "{}", msg);
    assert!(msg.ends_with(": cancelled"), "{}", msg);
    assert!(!out.contains("All manifests processed successfully!"));
}
