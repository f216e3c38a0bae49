//! Parsed query components
//!
//! The query parser turns a raw Vietnamese query into this transient
//! per-request record. Parsing never fails; a low-confidence parse is a
//! legitimate outcome and downstream stages degrade gracefully.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::voucher::PriceRange;

/// High-level goal guessed from the query, drawn from a closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    FindRestaurant,
    FindHotel,
    FindEntertainment,
    FindShopping,
    FindBeauty,
    FindTravel,
    FindKids,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FindRestaurant => "find_restaurant",
            Self::FindHotel => "find_hotel",
            Self::FindEntertainment => "find_entertainment",
            Self::FindShopping => "find_shopping",
            Self::FindBeauty => "find_beauty",
            Self::FindTravel => "find_travel",
            Self::FindKids => "find_kids",
            Self::General => "general",
        }
    }

    /// All intents that carry detection patterns, in the lexical order
    /// of their names (used for deterministic tie-breaking)
    pub fn detectable() -> [Intent; 7] {
        [
            Self::FindBeauty,
            Self::FindEntertainment,
            Self::FindHotel,
            Self::FindKids,
            Self::FindRestaurant,
            Self::FindShopping,
            Self::FindTravel,
        ]
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the parser extracted from one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryComponents {
    /// Raw query as received
    pub original: String,
    /// Canonical lowercase form, diacritics retained
    pub normalized: String,
    /// Diacritic-free form for fuzzy matching
    pub stripped: String,
    /// Detected intent
    pub intent: Intent,
    /// Canonical location name, if one was resolved
    #[serde(default)]
    pub location: Option<String>,
    /// Matched service requirement tags
    #[serde(default)]
    pub service_requirements: Vec<String>,
    /// Detected audience tag
    #[serde(default)]
    pub target_audience: Option<String>,
    /// At most one price bracket cue
    #[serde(default)]
    pub price_preference: Option<PriceRange>,
    /// Remaining salient tokens in query order
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Parse confidence in [0, 1]
    pub confidence: f32,
}

impl QueryComponents {
    /// A minimal parse used by vector-only mode: normalization applied,
    /// everything else left at its neutral default.
    pub fn bare(original: &str, normalized: &str, stripped: &str) -> Self {
        Self {
            original: original.to_string(),
            normalized: normalized.to_string(),
            stripped: stripped.to_string(),
            intent: Intent::General,
            location: None,
            service_requirements: Vec::new(),
            target_audience: None,
            price_preference: None,
            keywords: Vec::new(),
            confidence: 0.0,
        }
    }

    /// True when the query expresses a service need beyond a bare intent
    pub fn has_service_cue(&self) -> bool {
        !self.service_requirements.is_empty()
    }
}

/// Formatting bias for generated answers
///
/// Selected from the parsed components; changes presentation only,
/// never the grounding rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStyle {
    LocationFocused,
    ServiceFocused,
    TargetFocused,
    General,
}

impl ResponseStyle {
    pub fn from_components(components: &QueryComponents) -> Self {
        if components.location.is_some() {
            Self::LocationFocused
        } else if !components.service_requirements.is_empty() {
            Self::ServiceFocused
        } else if components.target_audience.is_some() {
            Self::TargetFocused
        } else {
            Self::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocationFocused => "location_focused",
            Self::ServiceFocused => "service_focused",
            Self::TargetFocused => "target_focused",
            Self::General => "general",
        }
    }
}
