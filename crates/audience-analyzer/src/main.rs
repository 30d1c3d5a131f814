mod bootstrap;

use std::path::PathBuf;

use anyhow::{Context, Result};
use audience_core::config::EngineConfig;
use audience_core::settings::{RunMode, Settings};
use audience_runtime::batch::BatchPipeline;
use audience_runtime::explorer::ExplorationSession;
use audience_runtime::scheduler::{BatchOutcome, BatchScheduler};
use audience_viz::app::ExplorerApp;
use audience_viz::themes::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::ensure_directories(&settings.output_dir)?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Audience Analyzer v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Mode: {:?}, min_observations: {}, top_n: {}",
        settings.mode,
        settings.min_observations,
        settings.top_n
    );

    let config = settings.engine_config()?;
    let input = resolve_input(&settings)?;

    match settings.mode {
        RunMode::Explore => run_explorer(input, config, &settings.theme).await?,

        RunMode::Batch => {
            let pipeline = BatchPipeline::new(input, settings.output_dir.clone(), config);
            let report = tokio::task::spawn_blocking(move || pipeline.run()).await??;
            tracing::info!(
                "Wrote {} files to {} in {:.2?} ({} rows loaded, {} rejected)",
                report.files.len(),
                report.output_dir.display(),
                report.elapsed,
                report.load.rows_loaded,
                report.load.rows_rejected
            );
        }

        RunMode::Schedule => {
            let pipeline = BatchPipeline::new(input, settings.output_dir.clone(), config);
            run_schedule(pipeline, settings.interval_secs).await;
        }
    }

    Ok(())
}

/// `--input` when given, otherwise the first discovered data directory.
fn resolve_input(settings: &Settings) -> Result<PathBuf> {
    match &settings.input {
        Some(path) => Ok(path.clone()),
        None => bootstrap::discover_data_path()
            .context("no --input given and no data directory found in ./data or ~/.audience-analyzer/data"),
    }
}

async fn run_explorer(input: PathBuf, config: EngineConfig, theme: &str) -> Result<()> {
    tracing::info!("Loading {} for exploration...", input.display());
    let theme = Theme::from_name(theme);

    tokio::task::spawn_blocking(move || -> Result<()> {
        let (mut session, load) = ExplorationSession::open(&input)?;
        tracing::info!(
            "Loaded {} rows from {} files ({} rejected)",
            load.rows_loaded,
            load.files.len(),
            load.rows_rejected
        );

        // Thresholds that leave nothing to rank are not fatal here; the user
        // can relax them from inside the explorer.
        let mut app = ExplorerApp::new(theme, Vec::new(), config);
        match session.dashboard(&config) {
            Ok(charts) => app.apply(config, charts),
            Err(e) if e.is_recoverable() => app.status = e.to_string(),
            Err(e) => return Err(e.into()),
        }

        app.run(|next| session.dashboard(&next))?;
        Ok(())
    })
    .await?
}

async fn run_schedule(pipeline: BatchPipeline, interval_secs: u64) {
    tracing::info!("Starting scheduled batch runs every {}s...", interval_secs);
    let (mut rx, handle) = BatchScheduler::new(interval_secs, pipeline).start();

    loop {
        tokio::select! {
            outcome = rx.recv() => match outcome {
                Some(BatchOutcome::Completed { run, report }) => {
                    tracing::info!("Run {} wrote {} files", run, report.files.len());
                }
                Some(BatchOutcome::Failed { run, error }) => {
                    tracing::error!("Run {} failed: {}", run, error);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; stopping scheduled runs");
                break;
            }
        }
    }

    handle.abort();
}
