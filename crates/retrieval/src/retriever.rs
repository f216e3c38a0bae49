//! Hybrid retrieval engine
//!
//! Executes the single-round-trip hybrid query against the index under
//! intent-adaptive dense-field selection, then normalizes the
//! heterogeneous lexical and dense scores to [0, 1] so downstream
//! boosting never compares raw scales.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use voucher_search_config::{AdaptiveDeltas, IndexFieldWeights, RetrievalSettings};
use voucher_search_core::{
    EmbeddingProvider, Intent, PriceInfo, QueryComponents, RankingFactor, Result, SearchMethod,
    SearchResult,
};
use voucher_search_text::fold_tokens;

use crate::index::{
    DenseClause, DenseField, FieldFilter, IndexHit, IndexQuery, LexicalClause, VoucherIndex,
};

/// Characters kept in a result's content snippet
const SNIPPET_CHARS: usize = 160;

/// Retrieval tuning, usually sourced from `Settings`
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub lexical_saturation: f32,
    pub over_fetch_multiplier: usize,
    pub hard_cap: usize,
    pub index_weights: IndexFieldWeights,
    pub adaptive_deltas: AdaptiveDeltas,
}

impl RetrievalConfig {
    pub fn from_settings(settings: &RetrievalSettings) -> Self {
        Self {
            lexical_saturation: settings.lexical_saturation,
            over_fetch_multiplier: settings.over_fetch_multiplier,
            hard_cap: settings.hard_cap,
            index_weights: settings.index_weights,
            adaptive_deltas: settings.adaptive_deltas,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::from_settings(&RetrievalSettings::default())
    }
}

/// Query-time re-focused field weights, normalized to sum 1
///
/// Reported for observability; the dense score itself comes from the
/// single field chosen in `SearchStrategy::dense_field`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdaptiveWeights {
    pub content: f32,
    pub name: f32,
    pub location: f32,
    pub service: f32,
    pub target: f32,
}

/// How one query was executed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStrategy {
    /// Dense field the similarity was scored against
    pub dense_field: DenseField,
    /// Re-focused weights after intent-adaptive deltas
    pub adaptive_weights: AdaptiveWeights,
    /// Clause boosts of the assembled query
    pub lexical_boost: f32,
    pub dense_boost: f32,
    /// Hard filters applied, human-readable
    pub filters: Vec<String>,
    /// Candidates requested from the index (over-fetch)
    pub fetch_size: usize,
}

/// One scored candidate between retrieval and final ranking
#[derive(Debug, Clone)]
pub struct Candidate {
    pub result: SearchResult,
    /// Normalized dense similarity in [0, 1]; 0 when lexical-only
    pub dense_similarity: f32,
    /// Ingest-time quality used as a tie-breaker
    pub data_quality: f32,
    /// Folded content for diacritic-insensitive surface matching
    pub content_folded: String,
}

/// The hybrid retrieval engine
pub struct RetrievalEngine {
    index: Arc<dyn VoucherIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(
        index: Arc<dyn VoucherIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
        }
    }

    /// Full hybrid retrieval: lexical + dense, over-fetched so the
    /// geographic re-ranker can shuffle winners
    pub async fn retrieve_hybrid(
        &self,
        components: &QueryComponents,
        top_k: usize,
        filters: Vec<FieldFilter>,
    ) -> Result<(Vec<Candidate>, SearchStrategy)> {
        let dense_field = self.select_dense_field(components);
        let fetch_size = (top_k * self.config.over_fetch_multiplier).min(self.config.hard_cap);

        let query_vector = self.embedder.embed(&components.normalized).await?;

        let lexical = LexicalClause::best_fields(components.stripped.clone());
        let dense = DenseClause::new(dense_field, query_vector);

        let strategy = SearchStrategy {
            dense_field,
            adaptive_weights: self.adaptive_weights(components),
            lexical_boost: lexical.boost,
            dense_boost: dense.boost,
            filters: filters.iter().map(|f| f.describe()).collect(),
            fetch_size,
        };

        let hits = self
            .index
            .search(IndexQuery {
                lexical: Some(lexical),
                dense: Some(dense),
                filters,
                size: fetch_size,
            })
            .await?;

        tracing::debug!(
            dense_field = dense_field.as_str(),
            candidates = hits.len(),
            "hybrid retrieval complete"
        );

        let candidates = hits
            .into_iter()
            .map(|hit| self.into_candidate(hit, SearchMethod::HybridSearch))
            .collect();
        Ok((candidates, strategy))
    }

    /// Pure vector retrieval on the combined field, no over-fetch
    pub async fn retrieve_vector(
        &self,
        components: &QueryComponents,
        top_k: usize,
        filters: Vec<FieldFilter>,
    ) -> Result<(Vec<Candidate>, SearchStrategy)> {
        let query_vector = self.embedder.embed(&components.normalized).await?;
        let dense = DenseClause::new(DenseField::Combined, query_vector);

        let strategy = SearchStrategy {
            dense_field: DenseField::Combined,
            adaptive_weights: self.adaptive_weights(components),
            lexical_boost: 0.0,
            dense_boost: dense.boost,
            filters: filters.iter().map(|f| f.describe()).collect(),
            fetch_size: top_k,
        };

        let hits = self
            .index
            .search(IndexQuery {
                lexical: None,
                dense: Some(dense),
                filters,
                size: top_k,
            })
            .await?;

        let candidates = hits
            .into_iter()
            .map(|hit| self.into_candidate(hit, SearchMethod::VectorSearch))
            .collect();
        Ok((candidates, strategy))
    }

    /// Dense field choice by intent focus
    pub fn select_dense_field(&self, components: &QueryComponents) -> DenseField {
        if matches!(components.intent, Intent::FindKids | Intent::General) {
            return DenseField::Combined;
        }
        if components.location.is_some() && !components.has_service_cue() {
            return DenseField::Location;
        }
        if components.has_service_cue() {
            return DenseField::Service;
        }
        DenseField::Combined
    }

    /// Index-time weights re-focused by the query's extracted cues
    pub fn adaptive_weights(&self, components: &QueryComponents) -> AdaptiveWeights {
        let w = &self.config.index_weights;
        let d = &self.config.adaptive_deltas;

        let mut location = w.location;
        let mut service = w.service;
        let mut target = w.target;

        if components.location.is_some() {
            location += d.location;
        }
        if components.has_service_cue() {
            service += d.service;
        }
        if components.target_audience.is_some() {
            target += d.target;
        }

        let sum = w.content + w.name + location + service + target;
        AdaptiveWeights {
            content: w.content / sum,
            name: w.name / sum,
            location: location / sum,
            service: service / sum,
            target: target / sum,
        }
    }

    /// Normalize heterogeneous index scores to a [0, 1] similarity
    fn into_candidate(&self, hit: IndexHit, method: SearchMethod) -> Candidate {
        let dense_similarity = hit.cosine.map(|c| (c + 1.0) / 2.0).unwrap_or(0.0);
        let lexical_similarity = hit
            .lexical_score
            .map(|s| (s / self.config.lexical_saturation).min(1.0))
            .unwrap_or(0.0);
        let similarity = dense_similarity.max(lexical_similarity);

        let voucher = hit.voucher;
        let content_folded = fold_tokens(&voucher.content).join(" ");

        Candidate {
            result: SearchResult {
                voucher_id: voucher.id,
                voucher_name: voucher.name,
                content_snippet: SearchResult::make_snippet(&voucher.content, SNIPPET_CHARS),
                location: voucher.location.name,
                service_info: voucher.service,
                price_info: PriceInfo {
                    amount: voucher.price,
                    range: voucher.price_range,
                },
                target_audience: voucher.target_audience,
                similarity_score: similarity,
                raw_score: similarity,
                ranking_factor: RankingFactor::SemanticMatch,
                search_method: method,
            },
            dense_similarity,
            data_quality: voucher.data_quality_score,
            content_folded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;
    use crate::index::schema::{build_combined, DocumentValidator};
    use crate::index::MemoryIndex;
    use voucher_search_core::{
        FieldEmbeddings, PriceRange, ServiceCategory, ServiceInfo, Voucher, VoucherLocation,
    };
    use voucher_search_text::{LocationRegistry, QueryParser};

    const DIM: usize = 64;

    fn parser() -> QueryParser {
        QueryParser::new(Arc::new(LocationRegistry::with_defaults()))
    }

    async fn voucher(id: &str, name: &str, content: &str, location: &str) -> Voucher {
        let embedder = HashingEmbedder::new(DIM);
        let content_emb = embedder.embed(content).await.unwrap();
        let name_emb = embedder.embed(name).await.unwrap();
        let mut embeddings = FieldEmbeddings {
            content: content_emb,
            combined: vec![],
            name: Some(name_emb),
            location: None,
            service: None,
            target: None,
        };
        embeddings.combined = build_combined(&embeddings, &IndexFieldWeights::default());

        let region = match location {
            "Hà Nội" | "Hải Phòng" => Some("north".to_string()),
            "Đà Nẵng" => Some("central".to_string()),
            "unknown" => None,
            _ => Some("south".to_string()),
        };

        Voucher {
            id: id.to_string(),
            name: name.to_string(),
            content: content.to_string(),
            location: VoucherLocation {
                name: location.to_string(),
                district: None,
                region,
            },
            service: ServiceInfo {
                category: ServiceCategory::Restaurant,
                cuisine: None,
                tags: vec![],
                has_kids_area: false,
                restaurant_type: None,
            },
            target_audience: None,
            price: Some(200_000),
            price_range: PriceRange::MidRange,
            embeddings,
            data_quality_score: 0.8,
        }
    }

    async fn engine_with_docs(docs: Vec<Voucher>) -> RetrievalEngine {
        let index = MemoryIndex::new(DocumentValidator::new(
            DIM,
            IndexFieldWeights::default(),
            Arc::new(LocationRegistry::with_defaults()),
        ));
        for doc in docs {
            index.upsert(doc).await.unwrap();
        }
        RetrievalEngine::new(
            Arc::new(index),
            Arc::new(HashingEmbedder::new(DIM)),
            RetrievalConfig::default(),
        )
    }

    #[test]
    fn test_dense_field_selection() {
        let engine = RetrievalEngine::new(
            Arc::new(MemoryIndex::new(DocumentValidator::new(
                DIM,
                IndexFieldWeights::default(),
                Arc::new(LocationRegistry::with_defaults()),
            ))),
            Arc::new(HashingEmbedder::new(DIM)),
            RetrievalConfig::default(),
        );

        // Kids and general intents stay on the combined field
        let kids = parser().parse("chỗ chơi cho trẻ em");
        assert_eq!(engine.select_dense_field(&kids), DenseField::Combined);

        // Location focus without service cues
        let located = parser().parse("khách sạn tại đà nẵng");
        assert_eq!(engine.select_dense_field(&located), DenseField::Location);

        // Service cues win over location when both are present
        let service = parser().parse("nhà hàng buffet hải sản tại hà nội");
        assert_eq!(engine.select_dense_field(&service), DenseField::Service);
    }

    #[test]
    fn test_adaptive_weights_renormalize() {
        let engine = RetrievalEngine::new(
            Arc::new(MemoryIndex::new(DocumentValidator::new(
                DIM,
                IndexFieldWeights::default(),
                Arc::new(LocationRegistry::with_defaults()),
            ))),
            Arc::new(HashingEmbedder::new(DIM)),
            RetrievalConfig::default(),
        );

        let components = parser().parse("quán ăn tại hải phòng");
        let weights = engine.adaptive_weights(&components);
        let sum = weights.content + weights.name + weights.location + weights.service + weights.target;
        assert!((sum - 1.0).abs() < 1e-5);
        // Location got its delta, so it outweighs its index-time share
        assert!(weights.location > 0.15);
    }

    #[tokio::test]
    async fn test_hybrid_retrieval_scores_in_unit_range() {
        let docs = vec![
            voucher("a", "Quán Ăn Ngon", "quán ăn ngon tại hải phòng", "Hải Phòng").await,
            voucher("b", "Nhà Hàng Biển", "hải sản tươi sống đà nẵng", "Đà Nẵng").await,
        ];
        let engine = engine_with_docs(docs).await;

        let components = parser().parse("quán ăn hải phòng");
        let (candidates, strategy) = engine
            .retrieve_hybrid(&components, 5, vec![])
            .await
            .unwrap();

        assert!(!candidates.is_empty());
        assert_eq!(strategy.fetch_size, 15);
        for c in &candidates {
            assert!((0.0..=1.0).contains(&c.result.similarity_score));
            assert!((0.0..=1.0).contains(&c.result.raw_score));
            assert_eq!(c.result.search_method, SearchMethod::HybridSearch);
        }
    }

    #[tokio::test]
    async fn test_fetch_size_respects_hard_cap() {
        let engine = engine_with_docs(vec![]).await;
        let components = parser().parse("quán ăn");
        let (_, strategy) = engine
            .retrieve_hybrid(&components, 30, vec![])
            .await
            .unwrap();
        assert_eq!(strategy.fetch_size, 50);
    }

    #[tokio::test]
    async fn test_vector_retrieval_has_no_lexical_clause() {
        let docs = vec![
            voucher("a", "Cafe Sáng", "cà phê view đẹp lãng mạn", "Hà Nội").await,
        ];
        let engine = engine_with_docs(docs).await;

        let components = parser().normalize_only("cà phê lãng mạn");
        let (candidates, strategy) = engine
            .retrieve_vector(&components, 3, vec![])
            .await
            .unwrap();

        assert_eq!(strategy.dense_field, DenseField::Combined);
        assert_eq!(strategy.lexical_boost, 0.0);
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates[0].result.search_method,
            SearchMethod::VectorSearch
        );
        // Dense-only similarity equals the normalized cosine
        assert!((candidates[0].result.similarity_score - candidates[0].dense_similarity).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_exact_name_match_saturates_lexical_score() {
        let mut docs = vec![
            voucher("target", "Bellissimo", "nhà hàng ý sang trọng", "Hà Nội").await,
            voucher("other-1", "Quán Cơm Bình Dân", "cơm văn phòng", "Hà Nội").await,
            voucher("other-2", "Trà Sữa Nhà Làm", "trà sữa trân châu", "Hà Nội").await,
        ];
        for i in 0..7 {
            docs.push(
                voucher(
                    &format!("filler-{i}"),
                    &format!("Quán Số {i} Ngon"),
                    "món ăn đường phố",
                    "Hà Nội",
                )
                .await,
            );
        }
        let engine = engine_with_docs(docs).await;

        let components = parser().parse("Bellissimo");
        let (candidates, _) = engine.retrieve_hybrid(&components, 3, vec![]).await.unwrap();

        assert_eq!(candidates[0].result.voucher_id, "target");
        assert!(
            candidates[0].result.similarity_score >= 0.7,
            "lexical hit should saturate: {}",
            candidates[0].result.similarity_score
        );
    }
}
