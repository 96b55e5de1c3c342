//! Core data types and error definitions shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Earliest fiscal year accepted by [`FilingQuery::validate`].
pub const MIN_FISCAL_YEAR: i32 = 1900;
/// Latest fiscal year accepted by [`FilingQuery::validate`].
pub const MAX_FISCAL_YEAR: i32 = 2100;

/// Typed failure produced by a single pipeline stage.
///
/// Values are cloneable and comparable so that a [`crate::pipeline::PipelineResult`] carrying a
/// failed sibling stage can be compared across runs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageError {
    /// Query violated the locator's input constraints.
    #[error("Invalid filing query: {message}")]
    InvalidQuery {
        /// Human readable description of the violated constraint.
        message: String,
    },
    /// Search completed but returned no candidate document.
    #[error("No filing found for {query}")]
    NotFound {
        /// Search phrase that produced an empty result set.
        query: String,
    },
    /// Network or HTTP level failure (connect, timeout, non-2xx status).
    #[error("Transport failure: {message}")]
    Transport {
        /// Description of the failed exchange.
        message: String,
    },
    /// Document bytes could not be converted into text.
    #[error("Document parse failure: {message}")]
    Parse {
        /// Description reported by the parser.
        message: String,
    },
    /// Remote service answered but with an error payload or malformed body.
    #[error("Service error: {message}")]
    Service {
        /// Description of the malformed or rejected response.
        message: String,
    },
    /// Extraction response did not conform to the declared schema.
    #[error("Schema mismatch at `{path}`: {message}")]
    SchemaMismatch {
        /// Dotted path of the offending field.
        path: String,
        /// What was expected at that path.
        message: String,
    },
}

impl StageError {
    /// Build a [`StageError::Transport`] from any displayable message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Build a [`StageError::Service`] from any displayable message.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Build a [`StageError::Parse`] from any displayable message.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Build a [`StageError::SchemaMismatch`] for the given field path.
    pub fn schema_mismatch(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether a retry of the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Service { .. })
    }
}

impl From<reqwest::Error> for StageError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("request timed out: {error}")
        } else if error.is_connect() {
            format!("connection failed: {error}")
        } else {
            error.to_string()
        };
        Self::Transport { message }
    }
}

/// Known regulatory filing categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DocumentType {
    /// Annual report.
    #[serde(rename = "10-K")]
    TenK,
    /// Quarterly report.
    #[serde(rename = "10-Q")]
    TenQ,
    /// Current report.
    #[serde(rename = "8-K")]
    EightK,
    /// Annual report of a foreign private issuer.
    #[serde(rename = "20-F")]
    TwentyF,
    /// Annual report of a Canadian issuer under MJDS.
    #[serde(rename = "40-F")]
    FortyF,
}

impl DocumentType {
    /// Canonical form used in search queries.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TenK => "10-K",
            Self::TenQ => "10-Q",
            Self::EightK => "8-K",
            Self::TwentyF => "20-F",
            Self::FortyF => "40-F",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known [`DocumentType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown document type: {0}")]
pub struct UnknownDocumentType(pub String);

impl FromStr for DocumentType {
    type Err = UnknownDocumentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "10-K" | "10K" => Ok(Self::TenK),
            "10-Q" | "10Q" => Ok(Self::TenQ),
            "8-K" | "8K" => Ok(Self::EightK),
            "20-F" | "20F" => Ok(Self::TwentyF),
            "40-F" | "40F" => Ok(Self::FortyF),
            _ => Err(UnknownDocumentType(s.to_string())),
        }
    }
}

/// What to look for: one organization, one fiscal year, one filing category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilingQuery {
    /// Registered name of the filing organization.
    pub organization_name: String,
    /// Fiscal year covered by the filing.
    pub fiscal_year: i32,
    /// Filing category.
    pub document_type: DocumentType,
}

impl FilingQuery {
    /// Construct a query; call [`FilingQuery::validate`] before use.
    pub fn new(
        organization_name: impl Into<String>,
        fiscal_year: i32,
        document_type: DocumentType,
    ) -> Self {
        Self {
            organization_name: organization_name.into(),
            fiscal_year,
            document_type,
        }
    }

    /// Check the input constraints the locator relies on.
    pub fn validate(&self) -> Result<(), StageError> {
        if self.organization_name.trim().is_empty() {
            return Err(StageError::InvalidQuery {
                message: "organization name must not be empty".into(),
            });
        }
        if !(MIN_FISCAL_YEAR..=MAX_FISCAL_YEAR).contains(&self.fiscal_year) {
            return Err(StageError::InvalidQuery {
                message: format!(
                    "fiscal year {} outside {MIN_FISCAL_YEAR}..={MAX_FISCAL_YEAR}",
                    self.fiscal_year
                ),
            });
        }
        Ok(())
    }

    /// Search phrase sent to the remote search endpoint.
    pub fn search_phrase(&self) -> String {
        format!(
            "{} {} {} filetype:pdf",
            self.organization_name.trim(),
            self.document_type,
            self.fiscal_year
        )
    }
}

/// Location of the matched filing document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilingReference {
    /// Absolute URL of the document.
    pub url: String,
}

/// Downloaded filing plus the text the parser recovered from it.
#[derive(Debug, Clone)]
pub struct FilingDocument {
    /// Body returned by the document host.
    pub raw_bytes: Vec<u8>,
    /// Parser output; may be empty for image-only documents.
    pub full_text: String,
}

/// Length-bounded prefix of a document's text, used as summarization input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextExcerpt {
    text: String,
    char_len: usize,
}

impl TextExcerpt {
    /// Take at most `max_chars` characters from the start of `full_text`.
    ///
    /// The cut always lands on a char boundary, so multi-byte text is never split.
    pub fn new(full_text: &str, max_chars: usize) -> Self {
        let cut = full_text
            .char_indices()
            .nth(max_chars)
            .map(|(index, _)| index)
            .unwrap_or(full_text.len());
        let text = full_text[..cut].to_string();
        let char_len = text.chars().count();
        Self { text, char_len }
    }

    /// Borrow the excerpt text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of characters in the excerpt.
    pub fn char_len(&self) -> usize {
        self.char_len
    }
}

/// Markdown summary produced by the summarization stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Summary body in markdown.
    pub markdown: String,
}

/// Headline financial figures extracted from the filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialPerformance {
    /// Total revenue for the fiscal year.
    pub total_revenue: f64,
    /// Year-over-year revenue growth in percent.
    pub revenue_growth: f64,
    /// Net income for the fiscal year.
    pub net_income: f64,
}

/// Capital project called out in the filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyProject {
    /// Project name.
    pub name: String,
    /// Capital expenditure attributed to the project.
    pub capex: f64,
    /// Short description.
    pub description: String,
}

/// Schema-conforming structured data extracted from the filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredExtraction {
    /// Headline financial figures.
    pub financial_performance: FinancialPerformance,
    /// Risk factors listed in the filing.
    #[serde(default)]
    pub risk_factors: Vec<String>,
    /// Capital projects listed in the filing.
    pub key_projects: Vec<KeyProject>,
}
