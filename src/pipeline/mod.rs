//! Orchestration of a filing analysis run.

pub mod orchestrator;
pub mod result;
pub mod state;

pub use orchestrator::{PipelineOptions, PipelineOrchestrator};
pub use result::{PipelineFailure, PipelineResult};
pub use state::{PipelineState, Stage};
