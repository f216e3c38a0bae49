//! Voucher entity and per-field embeddings
//!
//! Vouchers are produced by the ingestion collaborator and consumed
//! read-only by the retrieval pipeline. Updates are whole-document
//! replace-by-id so the combined embedding always stays consistent
//! with its field vectors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal location name for vouchers without a recognized area
pub const UNKNOWN_LOCATION: &str = "unknown";

/// Price bracket thresholds in VND
pub const BUDGET_MAX: u64 = 100_000;
pub const MID_RANGE_MAX: u64 = 500_000;
pub const PREMIUM_MAX: u64 = 1_000_000;

/// A stored voucher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    /// Stable opaque id, unique
    pub id: String,
    /// Short human-readable title
    pub name: String,
    /// Long-form description and terms
    pub content: String,
    /// Location metadata
    pub location: VoucherLocation,
    /// Service metadata
    pub service: ServiceInfo,
    /// Symbolic audience tag (e.g. "family", "couple", "kids")
    #[serde(default)]
    pub target_audience: Option<String>,
    /// Price in VND, if known
    #[serde(default)]
    pub price: Option<u64>,
    /// Derived price bracket, must be consistent with `price`
    pub price_range: PriceRange,
    /// Per-field dense vectors
    pub embeddings: FieldEmbeddings,
    /// Ingest-time data quality in [0, 1]
    #[serde(default)]
    pub data_quality_score: f32,
}

/// Location metadata of a voucher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherLocation {
    /// Canonical name recognized by the registry, or "unknown"
    pub name: String,
    /// Optional district within the city
    #[serde(default)]
    pub district: Option<String>,
    /// Region the city belongs to ("north", "central", "south")
    #[serde(default)]
    pub region: Option<String>,
}

impl VoucherLocation {
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_LOCATION.to_string(),
            district: None,
            region: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_LOCATION
    }
}

/// Service metadata of a voucher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Top-level category
    pub category: ServiceCategory,
    /// Cuisine or sub-type (e.g. "hải sản", "buffet")
    #[serde(default)]
    pub cuisine: Option<String>,
    /// Free-form service tags (e.g. "kids_area", "parking")
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the venue has a dedicated kids area
    #[serde(default)]
    pub has_kids_area: bool,
    /// Restaurant sub-type when applicable (e.g. "buffet", "hotpot")
    #[serde(default)]
    pub restaurant_type: Option<String>,
}

/// Closed set of service categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Restaurant,
    Cafe,
    Bar,
    Hotel,
    Entertainment,
    Shopping,
    Beauty,
    Travel,
    Other,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Cafe => "cafe",
            Self::Bar => "bar",
            Self::Hotel => "hotel",
            Self::Entertainment => "entertainment",
            Self::Shopping => "shopping",
            Self::Beauty => "beauty",
            Self::Travel => "travel",
            Self::Other => "other",
        }
    }

    /// Parse a filter value, case-insensitive
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "restaurant" => Some(Self::Restaurant),
            "cafe" | "coffee" => Some(Self::Cafe),
            "bar" => Some(Self::Bar),
            "hotel" => Some(Self::Hotel),
            "entertainment" => Some(Self::Entertainment),
            "shopping" => Some(Self::Shopping),
            "beauty" => Some(Self::Beauty),
            "travel" => Some(Self::Travel),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price bracket derived from the VND amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceRange {
    Budget,
    MidRange,
    Premium,
    Luxury,
    /// Price missing at ingest; unranked for price filters
    Unknown,
}

impl PriceRange {
    /// Derive the bracket from an amount in VND
    pub fn from_price(price: Option<u64>) -> Self {
        match price {
            None => Self::Unknown,
            Some(p) if p < BUDGET_MAX => Self::Budget,
            Some(p) if p < MID_RANGE_MAX => Self::MidRange,
            Some(p) if p < PREMIUM_MAX => Self::Premium,
            Some(_) => Self::Luxury,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::MidRange => "mid_range",
            Self::Premium => "premium",
            Self::Luxury => "luxury",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a filter value; "unknown" is not a valid filter
    pub fn parse_filter(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "budget" => Some(Self::Budget),
            "mid_range" | "midrange" => Some(Self::MidRange),
            "premium" => Some(Self::Premium),
            "luxury" => Some(Self::Luxury),
            _ => None,
        }
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dense vectors carried by a voucher
///
/// `content` and `combined` are required for the voucher to be visible
/// to retrieval; the remaining axes are optional. All vectors are
/// unit-length of the configured dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEmbeddings {
    pub content: Vec<f32>,
    pub combined: Vec<f32>,
    #[serde(default)]
    pub name: Option<Vec<f32>>,
    #[serde(default)]
    pub location: Option<Vec<f32>>,
    #[serde(default)]
    pub service: Option<Vec<f32>>,
    #[serde(default)]
    pub target: Option<Vec<f32>>,
}

impl FieldEmbeddings {
    /// Iterate present field vectors with their index-time weight keys
    pub fn present_fields(&self) -> Vec<(&'static str, &[f32])> {
        let mut fields: Vec<(&'static str, &[f32])> = vec![("content", &self.content)];
        if let Some(v) = &self.name {
            fields.push(("name", v));
        }
        if let Some(v) = &self.location {
            fields.push(("location", v));
        }
        if let Some(v) = &self.service {
            fields.push(("service", v));
        }
        if let Some(v) = &self.target {
            fields.push(("target", v));
        }
        fields
    }
}
