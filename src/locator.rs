//! Resolves a filing query to the URL of a single best-match document.

use crate::service::ServiceClient;
use crate::service::types::{SearchRequest, SearchResponse};
use crate::types::{FilingQuery, FilingReference, StageError};
use async_trait::async_trait;

const SEARCH_PATH: &str = "search";

/// Interface implemented by filing locators.
#[async_trait]
pub trait DocumentLocator: Send + Sync {
    /// Find the document matching `query`.
    async fn locate(&self, query: &FilingQuery) -> Result<FilingReference, StageError>;
}

/// Locator backed by the service's search endpoint.
///
/// Relies on the service's relevance ranking: only the first of at most one result is used.
#[derive(Debug, Clone)]
pub struct ServiceLocator {
    service: ServiceClient,
    domain: String,
}

impl ServiceLocator {
    /// Build a locator restricted to `domain`.
    pub fn new(service: ServiceClient, domain: impl Into<String>) -> Self {
        Self {
            service,
            domain: domain.into(),
        }
    }
}

#[async_trait]
impl DocumentLocator for ServiceLocator {
    async fn locate(&self, query: &FilingQuery) -> Result<FilingReference, StageError> {
        query.validate()?;

        let phrase = query.search_phrase();
        tracing::debug!(query = %phrase, domain = %self.domain, "Searching for filing");
        let request = SearchRequest {
            query: phrase.clone(),
            domain: &self.domain,
            limit: 1,
        };

        let response: SearchResponse = self.service.post_json(SEARCH_PATH, &request).await?;
        let first = response
            .results
            .into_iter()
            .next()
            .ok_or(StageError::NotFound { query: phrase })?;

        let url = first
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| StageError::service("first search result has no `url`"))?;
        reqwest::Url::parse(&url).map_err(|error| {
            StageError::service(format!("search returned invalid url {url}: {error}"))
        })?;

        tracing::info!(url = %url, "Filing located");
        Ok(FilingReference { url })
    }
}
