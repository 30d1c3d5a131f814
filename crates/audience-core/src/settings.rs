use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::EngineConfig;
use crate::error::Result;

// ── Run mode ───────────────────────────────────────────────────────────────────

/// What the binary does after loading its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Interactive terminal explorer.
    Explore,
    /// One analysis run, exported to the output directory.
    Batch,
    /// Batch runs repeated every `--interval-secs`.
    Schedule,
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Demographic and time-slot analysis of broadcast viewership ratings
#[derive(Parser, Debug, Clone)]
#[command(
    name = "audience-analyzer",
    about = "Demographic and time-slot analysis of broadcast viewership ratings",
    version
)]
pub struct Settings {
    /// Run mode
    #[arg(long, value_enum, default_value_t = RunMode::Batch)]
    pub mode: RunMode,

    /// Ratings CSV file, or a directory searched recursively for *.csv
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Directory receiving exported tables and chart specs
    #[arg(long, default_value = "outputs")]
    pub output_dir: PathBuf,

    /// Minimum observations a program needs to be ranked
    #[arg(long, default_value = "50", env = "AUDIENCE_MIN_OBSERVATIONS")]
    pub min_observations: usize,

    /// Number of programs reported in the age-preference ranking
    #[arg(long, default_value = "10", env = "AUDIENCE_TOP_N")]
    pub top_n: usize,

    /// Seconds between scheduled batch runs (60-86400)
    #[arg(long, default_value = "86400", value_parser = clap::value_parser!(u64).range(60..=86400))]
    pub interval_secs: u64,

    /// Explorer colour theme
    #[arg(long, default_value = "auto", value_parser = ["auto", "dark", "light"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] but with an explicit argument list.
    pub fn load_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::resolve(Settings::parse_from(args))
    }

    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Engine thresholds carried by these settings, validated.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        EngineConfig::new(self.min_observations, self.top_n)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
