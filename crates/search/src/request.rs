//! Search request contract

use serde::{Deserialize, Serialize};

/// Operating mode of one search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Vector,
    #[default]
    Hybrid,
    Rag,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Hybrid => "hybrid",
            Self::Rag => "rag",
        }
    }
}

/// Optional exact-match filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Location name in any recognized surface form
    #[serde(default)]
    pub location: Option<String>,
    /// Service category name
    #[serde(default)]
    pub service: Option<String>,
    /// Price bracket name
    #[serde(default)]
    pub price_range: Option<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.service.is_none() && self.price_range.is_none()
    }
}

/// One search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-form Vietnamese query
    pub query: String,

    /// Operating mode, defaults to hybrid
    #[serde(default)]
    pub mode: SearchMode,

    /// Results wanted (1..=50); engine default when unset
    #[serde(default)]
    pub top_k: Option<usize>,

    /// Exact-match filters
    #[serde(default)]
    pub filters: SearchFilters,

    /// Drop candidates outside the resolved location and its neighbors
    #[serde(default)]
    pub strict_location: bool,

    /// Similarity floor in [0, 1], applied after boosting
    #[serde(default)]
    pub min_score: f32,

    /// Overall request deadline in milliseconds
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            mode: SearchMode::default(),
            top_k: None,
            filters: SearchFilters::default(),
            strict_location: false,
            min_score: 0.0,
            deadline_ms: None,
        }
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_location_filter(mut self, location: impl Into<String>) -> Self {
        self.filters.location = Some(location.into());
        self
    }

    pub fn with_service_filter(mut self, service: impl Into<String>) -> Self {
        self.filters.service = Some(service.into());
        self
    }

    pub fn with_price_filter(mut self, price_range: impl Into<String>) -> Self {
        self.filters.price_range = Some(price_range.into());
        self
    }

    pub fn with_strict_location(mut self) -> Self {
        self.strict_location = true;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }
}
