//! Search results with ranking provenance

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::voucher::{PriceRange, ServiceInfo};

/// Which rule set decided a result's final rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingFactor {
    /// Voucher location equals the resolved query location
    ExactLocationMatch,
    /// Voucher location neighbors the resolved query location
    NearbyLocationMatch,
    /// Voucher shares the query location's region
    RegionalMatch,
    /// No geographic rule applied
    SemanticMatch,
}

impl RankingFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactLocationMatch => "exact_location_match",
            Self::NearbyLocationMatch => "nearby_location_match",
            Self::RegionalMatch => "regional_match",
            Self::SemanticMatch => "semantic_match",
        }
    }
}

impl fmt::Display for RankingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pipeline produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    VectorSearch,
    HybridSearch,
    AdvancedRag,
    /// RAG requested but the generator was unavailable; templated answer
    AdvancedRagFallback,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VectorSearch => "vector_search",
            Self::HybridSearch => "hybrid_search",
            Self::AdvancedRag => "advanced_rag",
            Self::AdvancedRagFallback => "advanced_rag_fallback",
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price fields exposed on a result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceInfo {
    /// Amount in VND, if known
    #[serde(default)]
    pub amount: Option<u64>,
    /// Derived bracket
    pub range: PriceRange,
}

/// One ranked voucher in a search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub voucher_id: String,
    pub voucher_name: String,
    /// Leading excerpt of the voucher content
    pub content_snippet: String,
    /// Canonical location name or "unknown"
    pub location: String,
    pub service_info: ServiceInfo,
    pub price_info: PriceInfo,
    #[serde(default)]
    pub target_audience: Option<String>,
    /// Final score in [0, 1] after all re-ranking
    pub similarity_score: f32,
    /// Pre-boost score in [0, 1]
    pub raw_score: f32,
    /// Which rule set ranked this result
    pub ranking_factor: RankingFactor,
    /// Which pipeline produced it
    pub search_method: SearchMethod,
}

impl SearchResult {
    /// Trim content to a display snippet on a character boundary
    pub fn make_snippet(content: &str, max_chars: usize) -> String {
        if content.chars().count() <= max_chars {
            return content.to_string();
        }
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}
