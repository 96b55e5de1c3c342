//! Wire payloads exchanged with the text-intelligence service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct SearchRequest<'a> {
    pub(crate) query: String,
    pub(crate) domain: &'a str,
    pub(crate) limit: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub(crate) results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    #[serde(default)]
    pub(crate) url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SummarizeRequest<'a> {
    pub(crate) text: &'a str,
    pub(crate) instructions: &'a str,
    pub(crate) format: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummarizeResponse {
    pub(crate) summary: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExtractRequest<'a> {
    pub(crate) text: &'a str,
    pub(crate) schema: &'a Value,
}
