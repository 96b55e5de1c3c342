//! Sequencing of the four pipeline stages for a single filing query.

use crate::config::{Config, ConfigError};
use crate::extraction::{ExtractionSchema, ServiceExtractor, StructuredExtractor};
use crate::fetcher::{DocumentFetcher, HttpFetcher, PdfToTextParser};
use crate::locator::{DocumentLocator, ServiceLocator};
use crate::pipeline::result::{PipelineFailure, PipelineResult};
use crate::pipeline::state::{PipelineState, RunTracker};
use crate::retry::RetryPolicy;
use crate::service::ServiceClient;
use crate::summary::{ServiceSummaryGenerator, SummaryGenerator, SummaryInstructions};
use crate::types::{FilingQuery, TextExcerpt};
use reqwest::Client;

/// Per-run inputs that do not come from the query.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Upper bound on the characters sent to the summarizer.
    pub max_excerpt_chars: usize,
    /// Summary content and language.
    pub instructions: SummaryInstructions,
    /// Shape of the structured extraction.
    pub schema: ExtractionSchema,
}

impl PipelineOptions {
    /// Options derived from the loaded configuration, using the annual report schema.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_excerpt_chars: config.max_excerpt_chars,
            instructions: SummaryInstructions::from_config(config),
            schema: ExtractionSchema::annual_report(),
        }
    }
}

/// Runs locate, fetch, and the parallel summarize/extract stages for one query.
///
/// Only locate and fetch failures abort a run. Summary and extraction are isolated from each
/// other: the run completes if either succeeds, with the other's error kept in the result.
pub struct PipelineOrchestrator {
    locator: Box<dyn DocumentLocator>,
    fetcher: Box<dyn DocumentFetcher>,
    summarizer: Box<dyn SummaryGenerator>,
    extractor: Box<dyn StructuredExtractor>,
    options: PipelineOptions,
}

impl PipelineOrchestrator {
    /// Assemble an orchestrator from explicit stage implementations.
    pub fn new(
        locator: Box<dyn DocumentLocator>,
        fetcher: Box<dyn DocumentFetcher>,
        summarizer: Box<dyn SummaryGenerator>,
        extractor: Box<dyn StructuredExtractor>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            locator,
            fetcher,
            summarizer,
            extractor,
            options,
        }
    }

    /// Wire the service-backed stages onto one shared HTTP pool.
    pub fn from_config(config: &Config, http: Client) -> Result<Self, ConfigError> {
        let service = ServiceClient::new(http.clone(), config)?;
        let parser = PdfToTextParser::new(config.pdftotext_path.clone(), config.download_timeout);

        Ok(Self::new(
            Box::new(ServiceLocator::new(service.clone(), config.search_domain.clone())),
            Box::new(HttpFetcher::new(
                http,
                RetryPolicy::for_download(config),
                Box::new(parser),
            )),
            Box::new(ServiceSummaryGenerator::new(service.clone())),
            Box::new(ServiceExtractor::new(service)),
            PipelineOptions::from_config(config),
        ))
    }

    /// Run the whole pipeline for `query`.
    pub async fn run(&self, query: &FilingQuery) -> Result<PipelineResult, PipelineFailure> {
        let mut tracker = RunTracker::new(&query.organization_name, query.fiscal_year);
        tracing::info!(
            organization = %query.organization_name,
            fiscal_year = query.fiscal_year,
            document_type = %query.document_type,
            "Starting filing analysis"
        );

        tracker.advance(PipelineState::Locating);
        let reference = match self.locator.locate(query).await {
            Ok(reference) => reference,
            Err(error) => {
                tracker.fail();
                tracing::error!(error = %error, "Filing could not be located");
                return Err(PipelineFailure::Locating(error));
            }
        };

        tracker.advance(PipelineState::Fetching);
        let document = match self.fetcher.fetch(&reference).await {
            Ok(document) => document,
            Err(error) => {
                tracker.fail();
                tracing::error!(
                    url = %reference.url,
                    error = %error,
                    "Filing could not be fetched"
                );
                return Err(PipelineFailure::Fetching(error));
            }
        };

        tracker.advance(PipelineState::Analyzing);
        let excerpt = TextExcerpt::new(&document.full_text, self.options.max_excerpt_chars);
        let text_chars = document.full_text.chars().count();
        tracing::debug!(
            text_chars,
            excerpt_chars = excerpt.char_len(),
            "Dispatching summary and extraction"
        );

        let (summary, extraction) = tokio::join!(
            self.summarizer.summarize(&excerpt, &self.options.instructions),
            self.extractor.extract(&document.full_text, &self.options.schema),
        );

        match (summary, extraction) {
            (Err(summary), Err(extraction)) => {
                tracker.fail();
                tracing::error!(
                    summary_error = %summary,
                    extraction_error = %extraction,
                    "Both analysis stages failed"
                );
                Err(PipelineFailure::Analyzing {
                    reference,
                    summary,
                    extraction,
                })
            }
            (summary, extraction) => {
                if let Err(error) = &summary {
                    tracing::warn!(error = %error, "Summary failed; returning partial result");
                }
                if let Err(error) = &extraction {
                    tracing::warn!(error = %error, "Extraction failed; returning partial result");
                }
                tracker.advance(PipelineState::Done);
                tracing::info!(
                    state = ?tracker.state(),
                    url = %reference.url,
                    "Filing analysis finished"
                );

                Ok(PipelineResult {
                    reference,
                    text_chars,
                    excerpt_chars: excerpt.char_len(),
                    summary,
                    extraction,
                })
            }
        }
    }
}
