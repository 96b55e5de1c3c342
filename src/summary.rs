//! Markdown summaries of a bounded excerpt of the filing.
//!
//! The generator sends the excerpt as-is; bounding its length is the orchestrator's job.

use crate::config::Config;
use crate::service::ServiceClient;
use crate::service::types::{SummarizeRequest, SummarizeResponse};
use crate::types::{StageError, Summary, TextExcerpt};
use async_trait::async_trait;
use serde::Serialize;

const SUMMARIZE_PATH: &str = "summarize";

/// Topics the summary must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageCategory {
    /// Revenue, profitability, and cash flow.
    FinancialPerformance,
    /// Expansion plans and strategic direction.
    GrowthStrategy,
    /// Material risks disclosed by the filer.
    RiskFactors,
    /// Technology investments and innovation.
    Technology,
    /// Litigation and regulatory proceedings.
    LegalChallenges,
}

impl CoverageCategory {
    /// Every category, in the order they are listed in the instructions.
    pub const ALL: [Self; 5] = [
        Self::FinancialPerformance,
        Self::GrowthStrategy,
        Self::RiskFactors,
        Self::Technology,
        Self::LegalChallenges,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::FinancialPerformance => "financial performance",
            Self::GrowthStrategy => "growth strategies",
            Self::RiskFactors => "risk factors",
            Self::Technology => "technological innovations",
            Self::LegalChallenges => "legal challenges",
        }
    }
}

/// Output format requested from the summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    /// Markdown text.
    Markdown,
}

impl SummaryFormat {
    /// Wire value of the `format` request field.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
        }
    }
}

/// What the summary has to contain and how it should be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryInstructions {
    /// Topics to cover.
    pub categories: Vec<CoverageCategory>,
    /// Number of key points to produce.
    pub key_points: usize,
    /// Output language.
    pub language: String,
    /// Output format.
    pub format: SummaryFormat,
}

impl SummaryInstructions {
    /// Instructions covering every category, sized and localized per configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            categories: CoverageCategory::ALL.to_vec(),
            key_points: config.summary_points,
            language: config.summary_language.clone(),
            format: SummaryFormat::Markdown,
        }
    }

    /// Instruction text sent in the request's `instructions` field.
    pub fn render(&self) -> String {
        let topics = self
            .categories
            .iter()
            .map(|category| category.label())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Summarize in {} key points in {}, including: {}",
            self.key_points, self.language, topics
        )
    }
}

/// Interface implemented by summarization backends.
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    /// Summarize `excerpt` following `instructions`.
    async fn summarize(
        &self,
        excerpt: &TextExcerpt,
        instructions: &SummaryInstructions,
    ) -> Result<Summary, StageError>;
}

/// Summary generator backed by the service's summarize endpoint.
#[derive(Debug, Clone)]
pub struct ServiceSummaryGenerator {
    service: ServiceClient,
}

impl ServiceSummaryGenerator {
    /// Wrap a service client.
    pub fn new(service: ServiceClient) -> Self {
        Self { service }
    }
}

#[async_trait]
impl SummaryGenerator for ServiceSummaryGenerator {
    async fn summarize(
        &self,
        excerpt: &TextExcerpt,
        instructions: &SummaryInstructions,
    ) -> Result<Summary, StageError> {
        let rendered = instructions.render();
        let request = SummarizeRequest {
            text: excerpt.as_str(),
            instructions: &rendered,
            format: instructions.format.as_str(),
        };
        tracing::debug!(chars = excerpt.char_len(), "Requesting summary");

        let response: SummarizeResponse = self.service.post_json(SUMMARIZE_PATH, &request).await?;
        let markdown = response.summary.trim().to_string();
        if markdown.is_empty() {
            return Err(StageError::service("summary field is empty"));
        }

        tracing::info!(chars = markdown.chars().count(), "Summary generated");
        Ok(Summary { markdown })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;
    use std::time::Duration;

    fn instructions() -> SummaryInstructions {
        SummaryInstructions {
            categories: CoverageCategory::ALL.to_vec(),
            key_points: 10,
            language: "Spanish".into(),
            format: SummaryFormat::Markdown,
        }
    }

    fn generator(base_url: String, timeout: Duration) -> ServiceSummaryGenerator {
        ServiceSummaryGenerator::new(ServiceClient::for_tests(base_url, 1, timeout))
    }

    #[test]
    fn renders_all_categories_in_order() {
        assert_eq!(
            instructions().render(),
            "Summarize in 10 key points in Spanish, including: financial performance, \
             growth strategies, risk factors, technological innovations, legal challenges"
        );
    }

    #[tokio::test]
    async fn posts_excerpt_with_markdown_format() {
        let server = MockServer::start_async().await;
        let expected_instructions = instructions().render();
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/summarize").json_body(json!({
                    "text": "Revenue grew.",
                    "instructions": expected_instructions,
                    "format": "markdown"
                }));
                then.status(200)
                    .json_body(json!({ "summary": "  - Revenue grew 14%\n" }));
            })
            .await;

        let summary = generator(server.base_url(), Duration::from_secs(5))
            .summarize(&TextExcerpt::new("Revenue grew.", 100), &instructions())
            .await
            .expect("summary");

        mock.assert();
        assert_eq!(summary.markdown, "- Revenue grew 14%");
    }

    #[tokio::test]
    async fn missing_summary_field_is_a_service_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/summarize");
                then.status(200).json_body(json!({ "result": "ok" }));
            })
            .await;

        let error = generator(server.base_url(), Duration::from_secs(5))
            .summarize(&TextExcerpt::new("text", 100), &instructions())
            .await
            .expect_err("missing summary");

        assert!(matches!(error, StageError::Service { .. }));
    }

    #[tokio::test]
    async fn blank_summary_is_a_service_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/summarize");
                then.status(200).json_body(json!({ "summary": "   " }));
            })
            .await;

        let error = generator(server.base_url(), Duration::from_secs(5))
            .summarize(&TextExcerpt::new("text", 100), &instructions())
            .await
            .expect_err("blank summary");

        assert_eq!(error, StageError::service("summary field is empty"));
    }

    #[tokio::test]
    async fn timeout_is_a_transport_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/summarize");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!({ "summary": "late" }));
            })
            .await;

        let error = generator(server.base_url(), Duration::from_millis(50))
            .summarize(&TextExcerpt::new("text", 100), &instructions())
            .await
            .expect_err("timeout");

        assert!(matches!(error, StageError::Transport { .. }));
    }
}
