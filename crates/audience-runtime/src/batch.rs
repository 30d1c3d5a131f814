//! One-shot batch pipeline: load, analyse, export.
//!
//! Everything that can fail for data reasons (loading, thresholds, the
//! engine, chart building) runs before the first file is written, so a
//! failed run leaves the output directory untouched.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::info;

use audience_core::config::EngineConfig;
use audience_core::error::Result;
use audience_data::engine::run_complete_analysis;
use audience_data::export::{export_result, write_json};
use audience_data::reader::{load_table, LoadReport};
use audience_data::result::AnalysisResult;
use audience_viz::adapter::{build_dashboard_charts, build_static_report_figure};

pub const DASHBOARD_FILE: &str = "dashboard_charts.json";
pub const REPORT_FIGURE_FILE: &str = "report_figure.json";

/// What a successful batch run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub config: EngineConfig,
    pub load: LoadReport,
    pub result: AnalysisResult,
    /// Every file written, in write order.
    pub files: Vec<PathBuf>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct BatchPipeline {
    input: PathBuf,
    output_dir: PathBuf,
    config: EngineConfig,
}

impl BatchPipeline {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, config: EngineConfig) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            config,
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the whole pipeline once.
    pub fn run(&self) -> Result<BatchReport> {
        let started = Instant::now();
        info!(
            input = %self.input.display(),
            output_dir = %self.output_dir.display(),
            "starting batch analysis"
        );

        let (table, load) = load_table(&self.input)?;
        let result = run_complete_analysis(&table, &self.config)?;
        let dashboard = build_dashboard_charts(&result);
        let figure = build_static_report_figure(&result);

        let mut files = export_result(&result, &self.output_dir)?.files;
        files.push(write_json(&self.output_dir.join(DASHBOARD_FILE), &dashboard)?);
        files.push(write_json(&self.output_dir.join(REPORT_FIGURE_FILE), &figure)?);

        let elapsed = started.elapsed();
        info!(
            files = files.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            dominant_age_band = %result.summary.dominant_age_band,
            "batch analysis complete"
        );

        Ok(BatchReport {
            input: self.input.clone(),
            output_dir: self.output_dir.clone(),
            config: self.config,
            load,
            result,
            files,
            elapsed,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
