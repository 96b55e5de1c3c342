use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default text-intelligence service endpoint.
pub const DEFAULT_SERVICE_URL: &str = "https://api.deepseek.com/v1";
/// Default domain the filing search is restricted to.
pub const DEFAULT_SEARCH_DOMAIN: &str = "sec.gov";
/// Default excerpt limit applied before summarization.
pub const DEFAULT_MAX_EXCERPT_CHARS: usize = 100_000;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Immutable runtime configuration, built once at process start and passed to every component.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the text-intelligence service (search, summarize, extract).
    pub service_url: String,
    /// Bearer token sent with every service request.
    pub service_api_key: String,
    /// Domain the filing search is restricted to.
    pub search_domain: String,
    /// Maximum number of characters handed to the summarization stage.
    pub max_excerpt_chars: usize,
    /// Upper bound on a single service request attempt.
    pub request_timeout: Duration,
    /// Upper bound on the document download.
    pub download_timeout: Duration,
    /// Total attempts per service call, including the first.
    pub max_attempts: u32,
    /// Base delay between service call attempts; doubles after each failure.
    pub retry_backoff: Duration,
    /// Language the summary should be written in.
    pub summary_language: String,
    /// Number of key points requested from the summarizer.
    pub summary_points: usize,
    /// Path or name of the `pdftotext` executable.
    pub pdftotext_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source(lookup);

        let config = Self {
            service_url: source
                .optional("FILING_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string()),
            service_api_key: source.required("FILING_SERVICE_API_KEY")?,
            search_domain: source
                .optional("FILING_SEARCH_DOMAIN")
                .unwrap_or_else(|| DEFAULT_SEARCH_DOMAIN.to_string()),
            max_excerpt_chars: source
                .parse_or("FILING_MAX_EXCERPT_CHARS", DEFAULT_MAX_EXCERPT_CHARS)?,
            request_timeout: Duration::from_secs(
                source.parse_or("FILING_REQUEST_TIMEOUT_SECS", 60)?,
            ),
            download_timeout: Duration::from_secs(
                source.parse_or("FILING_DOWNLOAD_TIMEOUT_SECS", 120)?,
            ),
            max_attempts: source.parse_or("FILING_MAX_ATTEMPTS", 3)?,
            retry_backoff: Duration::from_millis(source.parse_or("FILING_RETRY_BACKOFF_MS", 500)?),
            summary_language: source
                .optional("FILING_SUMMARY_LANGUAGE")
                .unwrap_or_else(|| "Spanish".to_string()),
            summary_points: source.parse_or("FILING_SUMMARY_POINTS", 10)?,
            pdftotext_path: source
                .optional("FILING_PDFTOTEXT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("pdftotext")),
        };

        config.validate()?;
        tracing::debug!(
            service_url = %config.service_url,
            search_domain = %config.search_domain,
            max_excerpt_chars = config.max_excerpt_chars,
            max_attempts = config.max_attempts,
            "Loaded configuration"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        reqwest::Url::parse(&self.service_url)
            .map_err(|_| ConfigError::InvalidValue("FILING_SERVICE_URL".into()))?;
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue("FILING_MAX_ATTEMPTS".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "FILING_REQUEST_TIMEOUT_SECS".into(),
            ));
        }
        if self.download_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "FILING_DOWNLOAD_TIMEOUT_SECS".into(),
            ));
        }
        if self.summary_points == 0 {
            return Err(ConfigError::InvalidValue("FILING_SUMMARY_POINTS".into()));
        }
        Ok(())
    }
}

struct Source<F>(F);

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
    }

    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.optional(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string())),
            None => Ok(default),
        }
    }
}
