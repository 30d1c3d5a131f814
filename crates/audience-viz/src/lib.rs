//! Visualization layer of the audience analyzer.
//!
//! Turns an analysis result into renderer-neutral chart specifications,
//! renders them as terminal tables with [`ratatui`], and drives the
//! interactive explorer.

pub mod adapter;
pub mod app;
pub mod chart;
pub mod table_view;
pub mod themes;

pub use adapter::{build_dashboard_charts, build_static_report_figure};
pub use audience_core as core;
pub use chart::{ChartKind, ChartSpec};
