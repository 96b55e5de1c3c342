use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use filing_analyst::PipelineFailure;
use filing_analyst::config::Config;
use filing_analyst::extraction::{ExtractionSchema, ServiceExtractor};
use filing_analyst::fetcher::{DocumentParser, HttpFetcher};
use filing_analyst::locator::ServiceLocator;
use filing_analyst::pipeline::{PipelineOptions, PipelineOrchestrator, Stage};
use filing_analyst::retry::RetryPolicy;
use filing_analyst::service::ServiceClient;
use filing_analyst::summary::{ServiceSummaryGenerator, SummaryInstructions};
use filing_analyst::types::{DocumentType, FilingQuery, StageError};
use httpmock::{
    Method::{GET, POST},
    MockServer,
};
use serde_json::{Value, json};

const FILING_TEXT: &str = "Alphabet annual report. Revenues increased 14% to $350 billion.";

/// Treats the downloaded body as UTF-8 text so no PDF tooling is needed.
struct PlainTextParser;

#[async_trait]
impl DocumentParser for PlainTextParser {
    async fn parse(&self, bytes: &[u8]) -> Result<String, StageError> {
        String::from_utf8(bytes.to_vec()).map_err(|error| StageError::parse(error.to_string()))
    }
}

fn config(server: &MockServer, max_excerpt_chars: usize) -> Config {
    Config {
        service_url: server.url("/v1"),
        service_api_key: "test-key".into(),
        search_domain: "sec.gov".into(),
        max_excerpt_chars,
        request_timeout: Duration::from_millis(300),
        download_timeout: Duration::from_secs(5),
        max_attempts: 2,
        retry_backoff: Duration::from_millis(1),
        summary_language: "Spanish".into(),
        summary_points: 10,
        pdftotext_path: PathBuf::from("pdftotext"),
    }
}

fn orchestrator(config: &Config) -> PipelineOrchestrator {
    let http = reqwest::Client::builder()
        .user_agent("filing-analyst-test")
        .build()
        .expect("client");
    let service = ServiceClient::new(http.clone(), config).expect("service client");

    PipelineOrchestrator::new(
        Box::new(ServiceLocator::new(service.clone(), config.search_domain.clone())),
        Box::new(HttpFetcher::new(
            http,
            RetryPolicy::for_download(config),
            Box::new(PlainTextParser),
        )),
        Box::new(ServiceSummaryGenerator::new(service.clone())),
        Box::new(ServiceExtractor::new(service)),
        PipelineOptions::from_config(config),
    )
}

fn query() -> FilingQuery {
    FilingQuery::new("Alphabet Inc.", 2024, DocumentType::TenK)
}

fn extraction_body() -> Value {
    json!({
        "financial_performance": {
            "total_revenue": 350018,
            "revenue_growth": "14%",
            "net_income": 100118
        },
        "risk_factors": ["Antitrust proceedings"],
        "key_projects": [
            { "name": "Technical infrastructure", "capex": 52535, "description": "Servers and data centers" }
        ]
    })
}

#[tokio::test]
async fn analyzes_filing_end_to_end() {
    let server = MockServer::start_async().await;
    let document_url = server.url("/Archives/goog-10k-2024.pdf");
    let config = config(&server, 20);
    let excerpt: String = FILING_TEXT.chars().take(20).collect();

    let search = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/search")
                .header("authorization", "Bearer test-key")
                .json_body(json!({
                    "query": "Alphabet Inc. 10-K 2024 filetype:pdf",
                    "domain": "sec.gov",
                    "limit": 1
                }));
            then.status(200)
                .json_body(json!({ "results": [{ "url": document_url }] }));
        })
        .await;
    let download = server
        .mock_async(|when, then| {
            when.method(GET).path("/Archives/goog-10k-2024.pdf");
            then.status(200).body(FILING_TEXT);
        })
        .await;
    let summarize = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/summarize")
                .json_body(json!({
                    "text": excerpt,
                    "instructions": SummaryInstructions::from_config(&config).render(),
                    "format": "markdown"
                }));
            then.status(200)
                .json_body(json!({ "summary": "1. Los ingresos crecieron un 14%." }));
        })
        .await;
    let extract = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/extract").json_body(json!({
                "text": FILING_TEXT,
                "schema": ExtractionSchema::annual_report().to_wire()
            }));
            then.status(200).json_body(extraction_body());
        })
        .await;

    let result = orchestrator(&config)
        .run(&query())
        .await
        .expect("pipeline result");

    search.assert();
    download.assert();
    summarize.assert();
    extract.assert();

    assert_eq!(result.reference.url, server.url("/Archives/goog-10k-2024.pdf"));
    assert_eq!(result.text_chars, FILING_TEXT.chars().count());
    assert_eq!(result.excerpt_chars, 20);
    assert_eq!(
        result.summary.as_ref().map(|summary| summary.markdown.as_str()),
        Ok("1. Los ingresos crecieron un 14%.")
    );
    let extraction = result.extraction.as_ref().expect("extraction");
    assert_eq!(extraction.financial_performance.revenue_growth, 14.0);
    assert_eq!(extraction.key_projects[0].capex, 52535.0);
}

#[tokio::test]
async fn empty_search_fails_before_download() {
    let server = MockServer::start_async().await;
    let config = config(&server, 100);

    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/search");
            then.status(200).json_body(json!({ "results": [] }));
        })
        .await;
    let download = server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).body(FILING_TEXT);
        })
        .await;
    let summarize = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/summarize");
            then.status(200).json_body(json!({ "summary": "unused" }));
        })
        .await;
    let extract = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/extract");
            then.status(200).json_body(extraction_body());
        })
        .await;

    let failure = orchestrator(&config)
        .run(&query())
        .await
        .expect_err("not found");

    download.assert_hits(0);
    summarize.assert_hits(0);
    extract.assert_hits(0);
    assert_eq!(failure.stage(), Stage::Locating);
    assert_eq!(
        failure,
        PipelineFailure::Locating(StageError::NotFound {
            query: "Alphabet Inc. 10-K 2024 filetype:pdf".into()
        })
    );
}

#[tokio::test]
async fn summary_timeout_keeps_extraction() {
    let server = MockServer::start_async().await;
    let document_url = server.url("/filing.pdf");
    let config = config(&server, 100_000);

    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/search");
            then.status(200)
                .json_body(json!({ "results": [{ "url": document_url }] }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/filing.pdf");
            then.status(200).body(FILING_TEXT);
        })
        .await;
    let summarize = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/summarize");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(json!({ "summary": "too late" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/extract");
            then.status(200).json_body(extraction_body());
        })
        .await;

    let result = orchestrator(&config)
        .run(&query())
        .await
        .expect("partial result");

    summarize.assert_hits(2);
    assert!(matches!(result.summary, Err(StageError::Transport { .. })));
    assert!(result.extraction.is_ok());
}

#[tokio::test]
async fn both_analysis_failures_fail_the_run() {
    let server = MockServer::start_async().await;
    let document_url = server.url("/filing.pdf");
    let config = config(&server, 100_000);

    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/search");
            then.status(200)
                .json_body(json!({ "results": [{ "url": document_url }] }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/filing.pdf");
            then.status(200).body(FILING_TEXT);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/summarize");
            then.status(200).json_body(json!({ "error": "quota exceeded" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/extract");
            then.status(200).json_body(json!({ "risk_factors": [] }));
        })
        .await;

    let failure = orchestrator(&config)
        .run(&query())
        .await
        .expect_err("both failed");

    match failure {
        PipelineFailure::Analyzing {
            reference,
            summary,
            extraction,
        } => {
            assert_eq!(reference.url, server.url("/filing.pdf"));
            assert!(matches!(summary, StageError::Service { .. }));
            assert!(matches!(
                extraction,
                StageError::SchemaMismatch { ref path, .. } if path == "$.financial_performance"
            ));
        }
        other => panic!("expected analyzing failure, got {other:?}"),
    }
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let server = MockServer::start_async().await;
    let document_url = server.url("/filing.pdf");
    let config = config(&server, 100_000);

    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/search");
            then.status(200)
                .json_body(json!({ "results": [{ "url": document_url }] }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/filing.pdf");
            then.status(200).body(FILING_TEXT);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/summarize");
            then.status(200)
                .json_body(json!({ "summary": "- Crecimiento sostenido" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/extract");
            then.status(200).json_body(extraction_body());
        })
        .await;

    let orchestrator = orchestrator(&config);
    let first = orchestrator.run(&query()).await.expect("first run");
    let second = orchestrator.run(&query()).await.expect("second run");

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_value(&first).expect("json"),
        serde_json::to_value(&second).expect("json")
    );
}
