//! Retrieval of filing documents and their conversion to text.

pub mod parser;

pub use parser::{DocumentParser, PdfToTextParser};

use crate::retry::{AttemptFailure, RetryPolicy};
use crate::types::{FilingDocument, FilingReference, StageError};
use async_trait::async_trait;
use reqwest::Client;

/// Interface implemented by document fetchers.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Download the document at `reference` and extract its text.
    async fn fetch(&self, reference: &FilingReference) -> Result<FilingDocument, StageError>;
}

/// Fetcher issuing a plain GET (no service credentials) on the shared HTTP pool.
pub struct HttpFetcher {
    http: Client,
    policy: RetryPolicy,
    parser: Box<dyn DocumentParser>,
}

impl HttpFetcher {
    /// Build a fetcher that hands downloaded bytes to `parser`.
    pub fn new(http: Client, policy: RetryPolicy, parser: Box<dyn DocumentParser>) -> Self {
        Self {
            http,
            policy,
            parser,
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AttemptFailure> {
        let response = self
            .http
            .get(url)
            .timeout(self.policy.timeout)
            .send()
            .await
            .map_err(|error| AttemptFailure::from_error(error.into()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptFailure::from_status(
                status,
                StageError::transport(format!("GET {url} returned {status}")),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| AttemptFailure::from_error(error.into()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, reference: &FilingReference) -> Result<FilingDocument, StageError> {
        tracing::debug!(url = %reference.url, "Downloading filing");
        let raw_bytes = self
            .policy
            .run(&reference.url, || self.download(&reference.url))
            .await?;

        let full_text = self.parser.parse(&raw_bytes).await?;
        if full_text.trim().is_empty() {
            tracing::warn!(url = %reference.url, bytes = raw_bytes.len(), "Parser produced no text");
        }

        tracing::info!(
            url = %reference.url,
            bytes = raw_bytes.len(),
            chars = full_text.chars().count(),
            "Filing downloaded and parsed"
        );
        Ok(FilingDocument {
            raw_bytes,
            full_text,
        })
    }
}
