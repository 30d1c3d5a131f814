//! Interactive chart explorer and its terminal event loop.
//!
//! [`ExplorerApp`] pages through dashboard charts and lets the user adjust
//! the engine thresholds. It never computes anything itself: every
//! adjustment goes through a refresh callback that returns new charts.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tracing::debug;

use audience_core::config::EngineConfig;
use audience_core::error::{AnalysisError, Result};

use crate::chart::ChartSpec;
use crate::table_view;
use crate::themes::Theme;

/// Step applied to `min_observations` by `[` and `]`.
const MIN_OBSERVATIONS_STEP: usize = 10;

/// What a key press asks the event loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    /// Re-run the analysis with these thresholds.
    Reconfigure(EngineConfig),
}

/// Charts plus the paging and threshold state of the explorer.
pub struct ExplorerApp {
    pub theme: Theme,
    pub charts: Vec<ChartSpec>,
    pub page: usize,
    pub config: EngineConfig,
    /// One-line status, e.g. the last recoverable error.
    pub status: String,
}

impl ExplorerApp {
    pub fn new(theme: Theme, charts: Vec<ChartSpec>, config: EngineConfig) -> Self {
        Self {
            theme,
            charts,
            page: 0,
            config,
            status: String::new(),
        }
    }

    pub fn current(&self) -> Option<&ChartSpec> {
        self.charts.get(self.page)
    }

    pub fn next_page(&mut self) {
        if !self.charts.is_empty() {
            self.page = (self.page + 1) % self.charts.len();
        }
    }

    pub fn previous_page(&mut self) {
        if !self.charts.is_empty() {
            self.page = (self.page + self.charts.len() - 1) % self.charts.len();
        }
    }

    /// Translate a key press into an [`Action`], updating paging in place.
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        let (min_observations, top_n) = (self.config.min_observations(), self.config.top_n());
        let proposed = match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Action::Quit
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Right | KeyCode::Char('l') => {
                self.next_page();
                return Action::None;
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.previous_page();
                return Action::None;
            }
            KeyCode::Char('+') | KeyCode::Char('=') => (min_observations, top_n + 1),
            KeyCode::Char('-') => (min_observations, top_n.saturating_sub(1)),
            KeyCode::Char(']') => (min_observations + MIN_OBSERVATIONS_STEP, top_n),
            KeyCode::Char('[') => (
                min_observations.saturating_sub(MIN_OBSERVATIONS_STEP).max(1),
                top_n,
            ),
            _ => return Action::None,
        };

        match EngineConfig::new(proposed.0, proposed.1) {
            Ok(config) if config != self.config => Action::Reconfigure(config),
            Ok(_) => Action::None,
            Err(e) => {
                self.status = e.to_string();
                Action::None
            }
        }
    }

    /// Install freshly computed charts for `config`, keeping the page when
    /// it still exists.
    pub fn apply(&mut self, config: EngineConfig, charts: Vec<ChartSpec>) {
        self.config = config;
        self.charts = charts;
        if self.page >= self.charts.len() {
            self.page = 0;
        }
        self.status = format!(
            "min_observations={} top_n={}",
            config.min_observations(),
            config.top_n()
        );
    }

    /// Run the explorer until the user quits.
    ///
    /// `refresh` recomputes the dashboard for a new configuration.
    /// Recoverable errors (too few observations, bad thresholds) are shown in
    /// the status line and the previous charts stay on screen; any other
    /// error ends the loop.
    pub fn run<F>(mut self, mut refresh: F) -> Result<()>
    where
        F: FnMut(EngineConfig) -> Result<Vec<ChartSpec>>,
    {
        enable_raw_mode().map_err(terminal_error)?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(terminal_error)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(terminal_error)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(terminal_error(e));
            }

            let polled = event::poll(tick_rate).map_err(terminal_error);
            let key = match polled {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
                    Ok(_) => continue,
                    Err(e) => break Err(terminal_error(e)),
                },
                Ok(false) => continue,
                Err(e) => break Err(e),
            };

            match self.handle_key(key) {
                Action::Quit => break Ok(()),
                Action::None => {}
                Action::Reconfigure(config) => {
                    debug!(
                        min_observations = config.min_observations(),
                        top_n = config.top_n(),
                        "explorer reconfigured"
                    );
                    match refresh(config) {
                        Ok(charts) => self.apply(config, charts),
                        Err(e) if e.is_recoverable() => self.status = e.to_string(),
                        Err(e) => break Err(e),
                    }
                }
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode().map_err(terminal_error)?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(terminal_error)?;
        terminal.show_cursor().map_err(terminal_error)?;

        result
    }

    /// Render the current page, a page indicator and the key help.
    pub fn render(&self, frame: &mut Frame) {
        let [body, footer] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(2)]).areas(frame.area());

        match self.current() {
            Some(chart) => table_view::render_chart(frame, body, chart, &self.theme),
            None => table_view::render_no_data(frame, body, &self.status, &self.theme),
        }

        let indicator = if self.charts.is_empty() {
            "0/0".to_string()
        } else {
            format!("{}/{}", self.page + 1, self.charts.len())
        };
        let lines = vec![
            Line::from(vec![
                Span::styled(format!(" {} ", indicator), self.theme.value),
                Span::styled(self.status.clone(), self.theme.status),
            ]),
            Line::from(Span::styled(
                " ←/→ page  +/- top_n  [/] min_observations  q quit",
                self.theme.dim,
            )),
        ];
        frame.render_widget(Paragraph::new(lines), footer);
    }
}

fn terminal_error(e: io::Error) -> AnalysisError {
    AnalysisError::Terminal(e.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(pages: usize) -> ExplorerApp {
        let charts = (0..pages)
            .map(|i| ChartSpec::new(&format!("c{}", i), &format!("Chart {}", i), ChartKind::Line))
            .collect();
        ExplorerApp::new(Theme::dark(), charts, EngineConfig::new(50, 10).unwrap())
    }

    #[test]
    fn test_paging_wraps() {
        let mut app = app(3);
        assert_eq!(app.handle_key(key(KeyCode::Left)), Action::None);
        assert_eq!(app.page, 2);
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.page, 0);
    }

    #[test]
    fn test_paging_without_charts() {
        let mut app = app(0);
        app.next_page();
        app.previous_page();
        assert_eq!(app.page, 0);
        assert!(app.current().is_none());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app(1);
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
    }

    #[test]
    fn test_threshold_keys_propose_new_config() {
        let mut app = app(1);
        assert_eq!(
            app.handle_key(key(KeyCode::Char('+'))),
            Action::Reconfigure(EngineConfig::new(50, 11).unwrap())
        );
        assert_eq!(
            app.handle_key(key(KeyCode::Char('['))),
            Action::Reconfigure(EngineConfig::new(40, 10).unwrap())
        );
    }

    #[test]
    fn test_top_n_cannot_reach_zero() {
        let mut app = app(1);
        app.config = EngineConfig::new(1, 1).unwrap();
        assert_eq!(app.handle_key(key(KeyCode::Char('-'))), Action::None);
        assert!(app.status.contains("top_n"));
        // min_observations is clamped at one.
        assert_eq!(app.handle_key(key(KeyCode::Char('['))), Action::None);
    }

    #[test]
    fn test_apply_resets_out_of_range_page() {
        let mut app = app(3);
        app.page = 2;
        let config = EngineConfig::new(20, 5).unwrap();
        app.apply(config, vec![ChartSpec::new("only", "Only", ChartKind::Pie)]);
        assert_eq!(app.page, 0);
        assert_eq!(app.config, config);
        assert!(app.status.contains("min_observations=20"));
    }

    #[test]
    fn test_render_does_not_panic() {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let app = app(2);
        terminal.draw(|frame| app.render(frame)).unwrap();

        let empty = ExplorerApp::new(Theme::light(), Vec::new(), EngineConfig::new(1, 1).unwrap());
        terminal.draw(|frame| empty.render(frame)).unwrap();
    }
}
