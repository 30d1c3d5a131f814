//! Runtime layer of the audience analyzer.
//!
//! Hosts the two consumers of the analysis engine: the interactive
//! [`explorer::ExplorationSession`] and the [`batch::BatchPipeline`], plus a
//! tokio-driven [`scheduler::BatchScheduler`] for periodic batch runs.

pub mod batch;
pub mod explorer;
pub mod scheduler;

pub use audience_core as core;
pub use audience_data as data;
pub use audience_viz as viz;
