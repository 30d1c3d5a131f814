//! Shared vocabulary for the audience analyzer.
//!
//! Holds the record model and grouping taxonomies, the engine configuration
//! value, the error taxonomy, presentation formatting and the CLI settings.

pub mod config;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use config::EngineConfig;
pub use error::{AnalysisError, Result};
