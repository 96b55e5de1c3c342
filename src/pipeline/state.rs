//! Run lifecycle: `Idle → Locating → Fetching → Analyzing → Done`, or `Failed(stage)`.

use serde::Serialize;
use std::fmt;

/// Pipeline stage that can fail a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Searching for the filing.
    Locating,
    /// Downloading and parsing the filing.
    Fetching,
    /// Summarizing and extracting in parallel.
    Analyzing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Locating => "locating",
            Self::Fetching => "fetching",
            Self::Analyzing => "analyzing",
        })
    }
}

/// Position of a run in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Not started.
    Idle,
    /// Searching for the filing.
    Locating,
    /// Downloading and parsing.
    Fetching,
    /// Summary and extraction in flight.
    Analyzing,
    /// Finished with at least one analysis result.
    Done,
    /// Terminated by a failure in the given stage.
    Failed(Stage),
}

impl PipelineState {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Idle, Self::Locating)
            | (Self::Locating, Self::Fetching)
            | (Self::Fetching, Self::Analyzing)
            | (Self::Analyzing, Self::Done) => true,
            (Self::Idle | Self::Locating, Self::Failed(Stage::Locating))
            | (Self::Fetching, Self::Failed(Stage::Fetching))
            | (Self::Analyzing, Self::Failed(Stage::Analyzing)) => true,
            _ => false,
        }
    }

    /// Stage the run is executing, if any.
    pub fn active_stage(self) -> Option<Stage> {
        match self {
            Self::Locating => Some(Stage::Locating),
            Self::Fetching => Some(Stage::Fetching),
            Self::Analyzing => Some(Stage::Analyzing),
            _ => None,
        }
    }
}

/// Tracks one run's state and logs every transition with the run's identity.
#[derive(Debug)]
pub(crate) struct RunTracker<'a> {
    organization: &'a str,
    fiscal_year: i32,
    state: PipelineState,
}

impl<'a> RunTracker<'a> {
    pub(crate) fn new(organization: &'a str, fiscal_year: i32) -> Self {
        Self {
            organization,
            fiscal_year,
            state: PipelineState::Idle,
        }
    }

    pub(crate) fn state(&self) -> PipelineState {
        self.state
    }

    /// Move to `next`. Illegal transitions are bugs in the orchestrator.
    pub(crate) fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal pipeline transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(
            organization = self.organization,
            fiscal_year = self.fiscal_year,
            from = ?self.state,
            to = ?next,
            "Pipeline transition"
        );
        self.state = next;
    }

    /// Move to `Failed` for the stage currently executing; a run that never started fails in
    /// `Locating`.
    pub(crate) fn fail(&mut self) -> Stage {
        let stage = self.state.active_stage().unwrap_or(Stage::Locating);
        self.advance(PipelineState::Failed(stage));
        stage
    }
}
