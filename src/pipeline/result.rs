//! Outcome types of a pipeline run.

use crate::pipeline::state::Stage;
use crate::types::{FilingReference, StageError, StructuredExtraction, Summary};
use serde::Serialize;
use thiserror::Error;

/// Completed run. At least one of `summary` and `extraction` is `Ok`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    /// Filing the analysis was run on.
    pub reference: FilingReference,
    /// Characters in the parsed document text.
    pub text_chars: usize,
    /// Characters sent to the summarizer.
    pub excerpt_chars: usize,
    /// Summary outcome.
    pub summary: Result<Summary, StageError>,
    /// Extraction outcome.
    pub extraction: Result<StructuredExtraction, StageError>,
}

impl PipelineResult {
    /// Whether both analysis stages succeeded.
    pub fn is_complete(&self) -> bool {
        self.summary.is_ok() && self.extraction.is_ok()
    }
}

/// Terminal failure of a run.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PipelineFailure {
    /// The filing could not be located.
    #[error("Locating failed: {0}")]
    Locating(StageError),
    /// The filing could not be downloaded or parsed.
    #[error("Fetching failed: {0}")]
    Fetching(StageError),
    /// Both analysis stages failed.
    #[error("Analyzing failed: summary: {summary}; extraction: {extraction}")]
    Analyzing {
        /// Filing the analysis was attempted on.
        reference: FilingReference,
        /// Summary failure.
        summary: StageError,
        /// Extraction failure.
        extraction: StageError,
    },
}

impl PipelineFailure {
    /// Stage in which the run terminated.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Locating(_) => Stage::Locating,
            Self::Fetching(_) => Stage::Fetching,
            Self::Analyzing { .. } => Stage::Analyzing,
        }
    }
}
