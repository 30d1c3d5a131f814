//! Data layer of the audience analyzer.
//!
//! Loads ratings exports into a validated [`table::RatingTable`], runs the
//! unified analysis [`engine`] over it, and exports the resulting
//! [`result::AnalysisResult`] as flat files.

pub mod aggregator;
pub mod engine;
pub mod export;
pub mod reader;
pub mod result;
pub mod table;

pub use audience_core as core;
pub use engine::run_complete_analysis;
pub use result::AnalysisResult;
pub use table::RatingTable;
