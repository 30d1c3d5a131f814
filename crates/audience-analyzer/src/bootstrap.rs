use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Per-user state directory, relative to the home directory.
const STATE_DIR: &str = ".audience-analyzer";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure the output directory exists.
pub fn ensure_directories(output_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name to a `tracing` filter directive.
///
/// Unrecognised names pass through unchanged so that full `EnvFilter`
/// directives (`audience_data=debug`) also work.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// With `log_file` set, output is appended to that file without ANSI
/// colours; otherwise it goes to stderr so it never mixes with the explorer
/// screen on stdout.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Places searched for input data when `--input` is not given, in order.
pub fn candidate_data_paths(cwd: &Path, home: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = vec![cwd.join("data")];
    if let Some(home) = home {
        candidates.push(home.join(STATE_DIR).join("data"));
    }
    candidates
}

/// First existing candidate data path:
/// 1. `./data/`
/// 2. `~/.audience-analyzer/data/`
pub fn discover_data_path() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let home = dirs::home_dir();
    candidate_data_paths(&cwd, home.as_deref())
        .into_iter()
        .find(|p| p.exists())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("warning"), "warn");
        assert_eq!(level_directive("CRITICAL"), "error");
        assert_eq!(level_directive("audience_data=trace"), "audience_data=trace");
    }

    #[test]
    fn test_ensure_directories_creates_output_dir() {
        let tmp = TempDir::new().expect("tempdir");
        let output = tmp.path().join("nested").join("outputs");

        ensure_directories(&output).expect("ensure_directories should succeed");

        assert!(output.is_dir(), "output dir must exist");
    }

    #[test]
    fn test_candidate_order() {
        let cwd = Path::new("/work");
        let home = Path::new("/home/analyst");
        assert_eq!(
            candidate_data_paths(cwd, Some(home)),
            vec![
                PathBuf::from("/work/data"),
                PathBuf::from("/home/analyst/.audience-analyzer/data"),
            ]
        );
        assert_eq!(candidate_data_paths(cwd, None), vec![PathBuf::from("/work/data")]);
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let tmp = TempDir::new().expect("tempdir");
        let cwd = tmp.path().join("project");
        let home = tmp.path().join("home");
        let home_data = home.join(STATE_DIR).join("data");
        std::fs::create_dir_all(&home_data).expect("create home data dir");
        std::fs::create_dir_all(&cwd).expect("create cwd");

        let found = candidate_data_paths(&cwd, Some(&home))
            .into_iter()
            .find(|p| p.exists());
        assert_eq!(found, Some(home_data));

        std::fs::create_dir_all(cwd.join("data")).expect("create local data dir");
        let found = candidate_data_paths(&cwd, Some(&home))
            .into_iter()
            .find(|p| p.exists());
        assert_eq!(found, Some(cwd.join("data")));
    }
}
