//! Index query DSL and hit shape

use serde::{Deserialize, Serialize};

use voucher_search_core::{PriceRange, ServiceCategory, Voucher};

/// Dense vector fields stored per document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenseField {
    Content,
    Location,
    Service,
    Target,
    Combined,
}

impl DenseField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content_emb",
            Self::Location => "location_emb",
            Self::Service => "service_emb",
            Self::Target => "target_emb",
            Self::Combined => "combined_emb",
        }
    }
}

/// Lexically analyzed fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalField {
    Name,
    Content,
}

/// Best-fields keyword clause with automatic fuzziness
#[derive(Debug, Clone)]
pub struct LexicalClause {
    /// Query text in analyzer form (folded)
    pub text: String,
    /// Searched fields with their per-field boosts
    pub fields: Vec<(LexicalField, f32)>,
    /// Clause boost applied on top of the best field score
    pub boost: f32,
}

impl LexicalClause {
    /// The reference configuration: name^3, content^1, clause boost 3.0
    pub fn best_fields(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fields: vec![(LexicalField::Name, 3.0), (LexicalField::Content, 1.0)],
            boost: 3.0,
        }
    }
}

/// Script-scored cosine clause; per-document fallback to `combined`
/// when the chosen field is absent
#[derive(Debug, Clone)]
pub struct DenseClause {
    pub field: DenseField,
    pub vector: Vec<f32>,
    pub boost: f32,
}

impl DenseClause {
    pub fn new(field: DenseField, vector: Vec<f32>) -> Self {
        Self {
            field,
            vector,
            boost: 1.0,
        }
    }
}

/// Exact-term filters over symbolic metadata
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    Location(String),
    Region(String),
    ServiceCategory(ServiceCategory),
    PriceRange(PriceRange),
    TargetAudience(String),
    HasKidsArea(bool),
}

impl FieldFilter {
    /// Whether a stored voucher passes this filter
    pub fn accepts(&self, voucher: &Voucher) -> bool {
        match self {
            Self::Location(name) => voucher.location.name == *name,
            Self::Region(region) => {
                voucher.location.region.as_deref() == Some(region.as_str())
            }
            Self::ServiceCategory(category) => voucher.service.category == *category,
            Self::PriceRange(range) => voucher.price_range == *range,
            Self::TargetAudience(tag) => {
                voucher.target_audience.as_deref() == Some(tag.as_str())
            }
            Self::HasKidsArea(flag) => voucher.service.has_kids_area == *flag,
        }
    }

    /// Short description for strategy reporting
    pub fn describe(&self) -> String {
        match self {
            Self::Location(name) => format!("location={name}"),
            Self::Region(region) => format!("region={region}"),
            Self::ServiceCategory(category) => format!("service_category={category}"),
            Self::PriceRange(range) => format!("price_range={range}"),
            Self::TargetAudience(tag) => format!("target_audience={tag}"),
            Self::HasKidsArea(flag) => format!("has_kids_area={flag}"),
        }
    }
}

/// One single-round-trip hybrid query
#[derive(Debug, Clone)]
pub struct IndexQuery {
    /// Keyword should-clause
    pub lexical: Option<LexicalClause>,
    /// Dense should-clause
    pub dense: Option<DenseClause>,
    /// Hard filters, all must pass
    pub filters: Vec<FieldFilter>,
    /// Maximum hits returned
    pub size: usize,
}

/// One scored hit with its separated score components
///
/// Lexical and dense scores live on different scales; callers must
/// normalize each to [0, 1] before comparing or boosting.
#[derive(Debug, Clone)]
pub struct IndexHit {
    pub voucher: Voucher,
    /// Boosted best-fields score, when the lexical clause matched
    pub lexical_score: Option<f32>,
    /// Raw cosine in [-1, 1], when a dense clause was present
    pub cosine: Option<f32>,
    /// Combined should-clause score the engine sorted by
    pub score: f32,
}
