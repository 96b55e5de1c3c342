#![deny(missing_docs)]

//! Locates a company's regulatory filing, extracts its text, and analyzes it through a remote
//! text-intelligence service.

/// Environment-driven configuration.
pub mod config;
/// Schema-constrained structured extraction.
pub mod extraction;
/// Document download and text extraction.
pub mod fetcher;
/// Filing search.
pub mod locator;
/// Structured logging and tracing setup.
pub mod logging;
/// Stage sequencing, run state, and results.
pub mod pipeline;
/// Timeout and retry policy for remote calls.
pub mod retry;
/// Client for the text-intelligence service.
pub mod service;
/// Markdown summary generation.
pub mod summary;
/// Shared data types and the stage error taxonomy.
pub mod types;

pub use config::{Config, ConfigError};
pub use pipeline::{PipelineFailure, PipelineOrchestrator, PipelineResult};
pub use types::{DocumentType, FilingQuery, StageError};
