//! HTTP client wrapper for the text-intelligence service.

use crate::config::{Config, ConfigError};
use crate::retry::{AttemptFailure, RetryPolicy};
use crate::types::StageError;
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// Lightweight JSON client for the text-intelligence service.
///
/// Cloning is cheap: the underlying connection pool is shared and never reconfigured.
#[derive(Clone)]
pub struct ServiceClient {
    http: Client,
    base_url: String,
    api_key: String,
    policy: RetryPolicy,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("base_url", &self.base_url)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    /// Construct a client on top of the shared HTTP pool.
    pub fn new(http: Client, config: &Config) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(&config.service_url)
            .map_err(|_| ConfigError::InvalidValue("FILING_SERVICE_URL".into()))?;
        tracing::debug!(
            url = %base_url,
            has_api_key = !config.service_api_key.is_empty(),
            "Initialized service client"
        );

        Ok(Self {
            http,
            base_url,
            api_key: config.service_api_key.clone(),
            policy: RetryPolicy::for_service(config),
        })
    }

    /// POST `body` to `path` and decode the JSON response, retrying retryable failures.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, StageError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = format_endpoint(&self.base_url, path);
        self.policy.run(&url, || self.attempt(&url, body)).await
    }

    async fn attempt<B, R>(&self, url: &str, body: &B) -> Result<R, AttemptFailure>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .timeout(self.policy.timeout)
            .json(body)
            .send()
            .await
            .map_err(|error| AttemptFailure::from_error(error.into()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptFailure::from_status(
                status,
                StageError::transport(format!("{url} returned {status}: {}", preview(&body))),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| AttemptFailure::from_error(error.into()))?;

        decode_body(&bytes).map_err(AttemptFailure::from_error)
    }
}

/// Decode a 2xx body, treating an `error` payload or an unexpected shape as a service failure.
fn decode_body<R: DeserializeOwned>(bytes: &[u8]) -> Result<R, StageError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|error| {
        StageError::service(format!("response is not valid JSON: {error}"))
    })?;

    if let Some(reported) = value.get("error").filter(|error| !error.is_null()) {
        let message = match reported {
            Value::String(text) => text.clone(),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| reported.to_string()),
            other => other.to_string(),
        };
        return Err(StageError::service(format!("service reported: {message}")));
    }

    serde_json::from_value(value)
        .map_err(|error| StageError::service(format!("unexpected response shape: {error}")))
}

fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let mut preview: String = trimmed.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
    preview.push('…');
    preview
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
impl ServiceClient {
    /// Client pointed at a mock server with a 1ms backoff.
    pub(crate) fn for_tests(
        base_url: String,
        max_attempts: u32,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            http: Client::builder()
                .user_agent("filing-analyst-test")
                .build()
                .expect("client"),
            base_url,
            api_key: "secret".into(),
            policy: RetryPolicy {
                max_attempts,
                backoff: std::time::Duration::from_millis(1),
                timeout,
            },
        }
    }
}
