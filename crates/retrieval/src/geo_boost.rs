//! Geographic re-ranking
//!
//! Post-processes retrieval candidates with multiplicative boosts for
//! exact, content-level, neighbor and regional location matches, then
//! applies the deterministic sort and tie-break order. Vouchers whose
//! location is "unknown" never receive a boost.

use std::sync::Arc;

use voucher_search_core::{QueryComponents, RankingFactor, UNKNOWN_LOCATION};
use voucher_search_text::LocationRegistry;

use crate::retriever::Candidate;

/// Canonical location equality
const EXACT_BOOST: f32 = 1.60;
/// Query location's surface form appears in the voucher content
const CONTENT_BOOST: f32 = 1.30;
/// Voucher located in a neighboring area
const NEIGHBOR_BOOST: f32 = 1.15;
/// Voucher located in the same region
const REGION_BOOST: f32 = 1.05;

/// Geographic re-ranker
pub struct GeoReRanker {
    registry: Arc<LocationRegistry>,
}

impl GeoReRanker {
    pub fn new(registry: Arc<LocationRegistry>) -> Self {
        Self { registry }
    }

    /// Boost, optionally filter, sort and truncate the candidate list
    ///
    /// `min_score` applies after boosting; `strict_location` drops
    /// candidates below the canonical-or-neighbor level before sorting.
    pub fn rerank(
        &self,
        mut candidates: Vec<Candidate>,
        components: &QueryComponents,
        top_k: usize,
        strict_location: bool,
        min_score: f32,
    ) -> Vec<Candidate> {
        if let Some(query_location) = components.location.as_deref() {
            let surfaces = self.registry.surfaces_of(query_location);
            let neighbors = self.registry.neighbors_of(query_location);
            let query_region = self.registry.region_of(query_location);

            for candidate in &mut candidates {
                self.boost_candidate(candidate, query_location, surfaces, neighbors, query_region);
            }

            if strict_location {
                candidates.retain(|c| {
                    c.result.location == query_location
                        || neighbors.contains(&c.result.location)
                });
            }
        }

        candidates.retain(|c| c.result.similarity_score >= min_score);

        candidates.sort_by(|a, b| {
            b.result
                .similarity_score
                .partial_cmp(&a.result.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.dense_similarity
                        .partial_cmp(&a.dense_similarity)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| {
                    b.data_quality
                        .partial_cmp(&a.data_quality)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.result.voucher_id.cmp(&b.result.voucher_id))
        });
        candidates.truncate(top_k);
        candidates
    }

    /// First matching rule wins; score is clamped back to [0, 1]
    fn boost_candidate(
        &self,
        candidate: &mut Candidate,
        query_location: &str,
        surfaces: &[String],
        neighbors: &[String],
        query_region: Option<&str>,
    ) {
        if candidate.result.location == UNKNOWN_LOCATION {
            return;
        }

        let boost;
        if candidate.result.location == query_location {
            boost = EXACT_BOOST;
            candidate.result.ranking_factor = RankingFactor::ExactLocationMatch;
        } else if surfaces
            .iter()
            .any(|s| contains_phrase(&candidate.content_folded, s))
        {
            boost = CONTENT_BOOST;
            // Content mention alone stays a semantic match
        } else if neighbors.contains(&candidate.result.location) {
            boost = NEIGHBOR_BOOST;
            candidate.result.ranking_factor = RankingFactor::NearbyLocationMatch;
        } else if query_region.is_some()
            && self.registry.region_of(&candidate.result.location) == query_region
        {
            boost = REGION_BOOST;
            candidate.result.ranking_factor = RankingFactor::RegionalMatch;
        } else {
            return;
        }

        candidate.result.similarity_score =
            (candidate.result.similarity_score * boost).clamp(0.0, 1.0);
    }
}

/// Token-aligned containment over folded text
fn contains_phrase(folded_text: &str, phrase: &str) -> bool {
    let tokens: Vec<&str> = folded_text.split(' ').collect();
    let phrase_tokens: Vec<&str> = phrase.split(' ').collect();
    if phrase_tokens.is_empty() || phrase_tokens.len() > tokens.len() {
        return false;
    }
    tokens
        .windows(phrase_tokens.len())
        .any(|w| w == phrase_tokens)
}
