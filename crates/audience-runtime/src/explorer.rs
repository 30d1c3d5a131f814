//! Interactive exploration session.
//!
//! Owns a loaded [`RatingTable`] and caches the last [`AnalysisResult`]
//! keyed by the [`EngineConfig`] that produced it. Changing the thresholds
//! re-runs the engine; asking again with the same thresholds is free.

use std::path::Path;
use std::time::{Duration, Instant};

use audience_core::config::EngineConfig;
use audience_core::error::Result;
use audience_data::engine::run_complete_analysis;
use audience_data::reader::{load_table, LoadReport};
use audience_data::result::AnalysisResult;
use audience_data::table::RatingTable;
use audience_viz::adapter::{build_dashboard_charts, build_static_report_figure};
use audience_viz::chart::ChartSpec;

pub struct ExplorationSession {
    table: RatingTable,
    /// Last successful result and the configuration it was computed with.
    cache: Option<(EngineConfig, AnalysisResult)>,
    cache_timestamp: Option<Instant>,
    last_error: Option<String>,
}

impl ExplorationSession {
    pub fn new(table: RatingTable) -> Self {
        Self {
            table,
            cache: None,
            cache_timestamp: None,
            last_error: None,
        }
    }

    /// Load `path` (file or directory) and open a session over it.
    pub fn open(path: &Path) -> Result<(Self, LoadReport)> {
        let (table, report) = load_table(path)?;
        Ok((Self::new(table), report))
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Analysis result for `config`, computed at most once per configuration
    /// change.
    ///
    /// On failure the previous cache is kept and the error is returned; the
    /// session stays usable with other thresholds.
    pub fn analyze(&mut self, config: &EngineConfig) -> Result<&AnalysisResult> {
        let cached = match self.cache.take() {
            Some((cached_config, result)) if cached_config == *config => {
                tracing::debug!("returning cached analysis result");
                Some((cached_config, result))
            }
            other => {
                self.cache = other;
                None
            }
        };

        let entry = match cached {
            Some(entry) => entry,
            None => match run_complete_analysis(&self.table, config) {
                Ok(result) => {
                    tracing::debug!(
                        min_observations = config.min_observations(),
                        top_n = config.top_n(),
                        "analysis cache updated"
                    );
                    self.cache_timestamp = Some(Instant::now());
                    self.last_error = None;
                    (*config, result)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "analysis failed; keeping previous result");
                    self.last_error = Some(e.to_string());
                    return Err(e);
                }
            },
        };

        let (_, result) = self.cache.insert(entry);
        Ok(result)
    }

    /// Dashboard charts for `config`.
    pub fn dashboard(&mut self, config: &EngineConfig) -> Result<Vec<ChartSpec>> {
        self.analyze(config).map(build_dashboard_charts)
    }

    /// Composite report figure for `config`.
    pub fn report_figure(&mut self, config: &EngineConfig) -> Result<ChartSpec> {
        self.analyze(config).map(build_static_report_figure)
    }

    /// Configuration of the cached result, if any.
    pub fn cached_config(&self) -> Option<EngineConfig> {
        self.cache.as_ref().map(|(config, _)| *config)
    }

    /// Discard the cached result, forcing the next call to recompute.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.cache_timestamp = None;
        tracing::debug!("cache invalidated");
    }

    /// Age of the cached result, or `None` if nothing has been computed.
    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    /// Human-readable description of the last analysis error, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn table(&self) -> &RatingTable {
        &self.table
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use audience_core::error::AnalysisError;
    use audience_core::models::{AgeBand, Gender, ViewershipRecord};

    fn records() -> Vec<ViewershipRecord> {
        (1..=9)
            .map(|day| {
                ViewershipRecord::new(
                    format!("2024-01-0{}T20:00:00", day).parse().unwrap(),
                    if day % 2 == 0 { "Even Show" } else { "Odd Show" },
                    0.1 * day as f64,
                    AgeBand::Age35To44,
                    Some(if day % 3 == 0 { Gender::Male } else { Gender::Female }),
                )
            })
            .collect()
    }

    fn session() -> ExplorationSession {
        ExplorationSession::new(RatingTable::from_records(records()).unwrap())
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = session();
        assert!(session.cached_config().is_none());
        assert!(session.cache_age().is_none());
        assert!(session.last_error().is_none());
        assert_eq!(session.table().len(), 9);
    }

    #[test]
    fn test_analyze_matches_engine() {
        let mut session = session();
        let config = EngineConfig::new(1, 5).unwrap();
        let direct = run_complete_analysis(session.table(), &config).unwrap();

        assert_eq!(session.analyze(&config).unwrap(), &direct);
        assert_eq!(session.cached_config(), Some(config));
        assert!(session.cache_age().is_some());
    }

    #[test]
    fn test_config_change_recomputes() {
        let mut session = session();
        let wide = EngineConfig::new(1, 5).unwrap();
        let narrow = EngineConfig::new(1, 1).unwrap();

        let first = session.analyze(&wide).unwrap().age_preferences.programs.len();
        let second = session.analyze(&narrow).unwrap().age_preferences.programs.len();
        assert_eq!(first, 2);
        assert_eq!(second, 1);
        assert_eq!(session.cached_config(), Some(narrow));
    }

    #[test]
    fn test_failure_keeps_previous_cache() {
        let mut session = session();
        let good = EngineConfig::new(1, 5).unwrap();
        let too_strict = EngineConfig::new(100, 5).unwrap();

        session.analyze(&good).unwrap();
        let err = session.analyze(&too_strict).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
        assert!(session.last_error().is_some());
        assert_eq!(session.cached_config(), Some(good));
    }

    #[test]
    fn test_invalidate_cache() {
        let mut session = session();
        session.analyze(&EngineConfig::new(1, 5).unwrap()).unwrap();
        session.invalidate_cache();
        assert!(session.cached_config().is_none());
    }

    #[test]
    fn test_dashboard_and_figure() {
        let mut session = session();
        let config = EngineConfig::new(1, 5).unwrap();
        assert_eq!(session.dashboard(&config).unwrap().len(), 8);
        assert_eq!(session.report_figure(&config).unwrap().panels.len(), 9);
    }
}
