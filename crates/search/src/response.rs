//! Search response contract and failure payload

use serde::{Deserialize, Serialize};
use thiserror::Error;

use voucher_search_core::{Error, QueryComponents, SearchMethod, SearchResult};
use voucher_search_retrieval::SearchStrategy;

use crate::request::SearchMode;

/// Timing and provenance metadata attached to every response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub total_results: usize,
    pub processing_time_ms: u64,
    pub search_method: SearchMethod,
    pub embedding_dimension: usize,
}

/// One successful search response
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: SearchMode,
    /// Present for hybrid and rag modes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_components: Option<QueryComponents>,
    /// Present for hybrid and rag modes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_strategy: Option<SearchStrategy>,
    pub results: Vec<SearchResult>,
    /// Present for hybrid and rag modes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanations: Option<Vec<String>>,
    /// Present for rag mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Present for rag mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub metadata: ResponseMetadata,
}

/// Failure payload with a stable code and timing metadata
#[derive(Debug, Clone, Error, Serialize)]
#[error("{code}: {message}")]
pub struct SearchFailure {
    /// Machine-readable code
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
    /// Component the failure originated from
    pub component: &'static str,
    pub processing_time_ms: u64,
}

impl SearchFailure {
    pub fn from_error(error: &Error, processing_time_ms: u64) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
            component: error.component(),
            processing_time_ms,
        }
    }
}
