//! Schema-constrained extraction of financial data from the full filing text.

pub mod schema;

pub use schema::{ExtractionSchema, FieldKind, FieldSpec};

use crate::service::ServiceClient;
use crate::service::types::ExtractRequest;
use crate::types::{StageError, StructuredExtraction};
use async_trait::async_trait;
use serde_json::Value;

const EXTRACT_PATH: &str = "extract";

/// Interface implemented by structured extraction backends.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    /// Extract values conforming to `schema` from `text`.
    async fn extract(
        &self,
        text: &str,
        schema: &ExtractionSchema,
    ) -> Result<StructuredExtraction, StageError>;
}

/// Extractor backed by the service's extract endpoint.
#[derive(Debug, Clone)]
pub struct ServiceExtractor {
    service: ServiceClient,
}

impl ServiceExtractor {
    /// Wrap a service client.
    pub fn new(service: ServiceClient) -> Self {
        Self { service }
    }
}

#[async_trait]
impl StructuredExtractor for ServiceExtractor {
    async fn extract(
        &self,
        text: &str,
        schema: &ExtractionSchema,
    ) -> Result<StructuredExtraction, StageError> {
        let wire = schema.to_wire();
        let request = ExtractRequest {
            text,
            schema: &wire,
        };
        tracing::debug!(chars = text.chars().count(), "Requesting structured extraction");

        let response: Value = self.service.post_json(EXTRACT_PATH, &request).await?;
        let extraction = decode_extraction(schema, &response)?;

        tracing::info!(
            risk_factors = extraction.risk_factors.len(),
            key_projects = extraction.key_projects.len(),
            "Structured data extracted"
        );
        Ok(extraction)
    }
}

/// Validate a raw response against `schema` and build the typed extraction from it.
pub fn decode_extraction(
    schema: &ExtractionSchema,
    response: &Value,
) -> Result<StructuredExtraction, StageError> {
    let normalized = schema.conform(response)?;
    serde_json::from_value(normalized)
        .map_err(|error| StageError::schema_mismatch("$", error.to_string()))
}
