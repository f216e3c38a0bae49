//! Search service façade

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use voucher_search_config::Settings;
use voucher_search_core::{
    AnswerGenerator, EmbeddingProvider, Error, PriceRange, QueryComponents, Result,
    SearchMethod, SearchResult, ServiceCategory,
};
use voucher_search_rag::{AnswerComposer, ComposerConfig};
use voucher_search_retrieval::{
    FieldFilter, GeoReRanker, RetrievalConfig, RetrievalEngine, SearchStrategy, VoucherIndex,
};
use voucher_search_text::{LocationRegistry, QueryParser};

use crate::explain::explain_results;
use crate::gate::RagGate;
use crate::request::{SearchFilters, SearchMode, SearchRequest};
use crate::response::{ResponseMetadata, SearchFailure, SearchResponse};

/// Single public entry point over the retrieval pipeline
pub struct SearchService {
    parser: QueryParser,
    registry: Arc<LocationRegistry>,
    engine: RetrievalEngine,
    reranker: GeoReRanker,
    composer: AnswerComposer,
    gate: RagGate,
    default_top_k: usize,
    embedding_dimension: usize,
}

impl SearchService {
    pub fn new(
        index: Arc<dyn VoucherIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn AnswerGenerator>,
        settings: &Settings,
    ) -> Self {
        let registry = Arc::new(LocationRegistry::from_settings(&settings.locations));
        let embedding_dimension = embedder.dimension();

        Self {
            parser: QueryParser::new(Arc::clone(&registry)),
            engine: RetrievalEngine::new(
                index,
                embedder,
                RetrievalConfig::from_settings(&settings.retrieval),
            ),
            reranker: GeoReRanker::new(Arc::clone(&registry)),
            composer: AnswerComposer::new(
                generator,
                ComposerConfig {
                    max_context_tokens: settings.rag.max_context_tokens,
                    temperature: settings.generator.temperature,
                    max_tokens: settings.generator.max_tokens,
                },
            ),
            gate: RagGate::new(settings.rag.concurrency_limit, settings.rag.queue_capacity),
            default_top_k: settings.retrieval.default_top_k,
            registry,
            embedding_dimension,
        }
    }

    /// Execute one search request
    pub async fn search(
        &self,
        request: SearchRequest,
    ) -> std::result::Result<SearchResponse, SearchFailure> {
        let started = Instant::now();
        match self.execute(&request, started).await {
            Ok(response) => Ok(response),
            Err(error) => {
                let failure =
                    SearchFailure::from_error(&error, started.elapsed().as_millis() as u64);
                tracing::warn!(
                    code = failure.code,
                    component = failure.component,
                    "search request failed"
                );
                Err(failure)
            }
        }
    }

    async fn execute(&self, request: &SearchRequest, started: Instant) -> Result<SearchResponse> {
        let deadline = request
            .deadline_ms
            .map(|ms| started + Duration::from_millis(ms));
        let top_k = request.top_k.unwrap_or(self.default_top_k);

        self.validate(request, top_k)?;
        let (filters, filter_location) = self.build_filters(&request.filters)?;

        match request.mode {
            SearchMode::Vector => {
                self.run_vector(request, top_k, filters, deadline, started)
                    .await
            }
            SearchMode::Hybrid => {
                let (components, results, strategy) = self
                    .run_retrieval(request, top_k, filters, filter_location, deadline)
                    .await?;
                let explanations = explain_results(&components, &results);
                Ok(self.assemble(
                    request,
                    results,
                    Some(components),
                    Some(strategy),
                    Some(explanations),
                    None,
                    None,
                    SearchMethod::HybridSearch,
                    started,
                ))
            }
            SearchMode::Rag => {
                self.run_rag(request, top_k, filters, filter_location, deadline, started)
                    .await
            }
        }
    }

    /// Request validation; every rejection is a `BadRequest`
    fn validate(&self, request: &SearchRequest, top_k: usize) -> Result<()> {
        let normalized = self.parser.normalize_only(&request.query);
        if normalized.normalized.chars().count() < 2 {
            return Err(Error::BadRequest(
                "query must be at least 2 characters after normalization".to_string(),
            ));
        }
        if !(1..=50).contains(&top_k) {
            return Err(Error::BadRequest(format!(
                "top_k must be in 1..=50, got {top_k}"
            )));
        }
        if !(0.0..=1.0).contains(&request.min_score) {
            return Err(Error::BadRequest(format!(
                "min_score must be in [0, 1], got {}",
                request.min_score
            )));
        }
        Ok(())
    }

    /// Translate the filter bag into index filters
    ///
    /// Returns the canonical filter location separately so it can seed
    /// geographic re-ranking when the query itself names no area.
    fn build_filters(
        &self,
        filters: &SearchFilters,
    ) -> Result<(Vec<FieldFilter>, Option<String>)> {
        let mut index_filters = Vec::new();
        let mut filter_location = None;

        if let Some(location) = &filters.location {
            let canonical = self.registry.resolve(location).ok_or_else(|| {
                Error::BadRequest(format!("unknown filter value: location '{location}'"))
            })?;
            index_filters.push(FieldFilter::Location(canonical.clone()));
            filter_location = Some(canonical);
        }
        if let Some(service) = &filters.service {
            let category = ServiceCategory::parse(service).ok_or_else(|| {
                Error::BadRequest(format!("unknown filter value: service '{service}'"))
            })?;
            index_filters.push(FieldFilter::ServiceCategory(category));
        }
        if let Some(price_range) = &filters.price_range {
            let range = PriceRange::parse_filter(price_range).ok_or_else(|| {
                Error::BadRequest(format!(
                    "unknown filter value: price_range '{price_range}'"
                ))
            })?;
            index_filters.push(FieldFilter::PriceRange(range));
        }

        Ok((index_filters, filter_location))
    }

    /// Vector mode: normalization only, combined field, no re-ranking
    async fn run_vector(
        &self,
        request: &SearchRequest,
        top_k: usize,
        filters: Vec<FieldFilter>,
        deadline: Option<Instant>,
        started: Instant,
    ) -> Result<SearchResponse> {
        let components = self.parser.normalize_only(&request.query);

        let (candidates, _strategy) = with_deadline(
            deadline,
            self.engine.retrieve_vector(&components, top_k, filters),
        )
        .await?;

        let results: Vec<SearchResult> = candidates
            .into_iter()
            .map(|c| c.result)
            .filter(|r| r.similarity_score >= request.min_score)
            .collect();

        Ok(self.assemble(
            request,
            results,
            None,
            None,
            None,
            None,
            None,
            SearchMethod::VectorSearch,
            started,
        ))
    }

    /// Shared hybrid core: parse, retrieve, geographically re-rank
    async fn run_retrieval(
        &self,
        request: &SearchRequest,
        top_k: usize,
        filters: Vec<FieldFilter>,
        filter_location: Option<String>,
        deadline: Option<Instant>,
    ) -> Result<(QueryComponents, Vec<SearchResult>, SearchStrategy)> {
        let mut components = self.parser.parse(&request.query);
        if components.location.is_none() {
            // A location filter seeds geographic ranking when the query
            // text names no area itself
            components.location = filter_location;
        }

        let (candidates, strategy) = with_deadline(
            deadline,
            self.engine.retrieve_hybrid(&components, top_k, filters),
        )
        .await?;

        let ranked = self.reranker.rerank(
            candidates,
            &components,
            top_k,
            request.strict_location,
            request.min_score,
        );
        let results = ranked.into_iter().map(|c| c.result).collect();

        Ok((components, results, strategy))
    }

    /// RAG mode: hybrid retrieval plus a gated generator call
    async fn run_rag(
        &self,
        request: &SearchRequest,
        top_k: usize,
        filters: Vec<FieldFilter>,
        filter_location: Option<String>,
        deadline: Option<Instant>,
        started: Instant,
    ) -> Result<SearchResponse> {
        let (components, results, strategy) = self
            .run_retrieval(request, top_k, filters, filter_location, deadline)
            .await?;

        // Retrieval is complete; from here every failure degrades to
        // the templated answer instead of erroring
        let composed = match self.gate.acquire(remaining(deadline)).await {
            Ok(_permit) => {
                self.composer
                    .compose(&components, &results, remaining(deadline))
                    .await
            }
            Err(Error::DeadlineExceeded) => {
                self.composer
                    .compose(&components, &results, Some(Duration::ZERO))
                    .await
            }
            Err(e) => return Err(e),
        };

        let method = if composed.fallback {
            SearchMethod::AdvancedRagFallback
        } else {
            SearchMethod::AdvancedRag
        };

        let explanations = explain_results(&components, &results);
        Ok(self.assemble(
            request,
            results,
            Some(components),
            Some(strategy),
            Some(explanations),
            Some(composed.answer),
            Some(composed.confidence),
            method,
            started,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        request: &SearchRequest,
        results: Vec<SearchResult>,
        parsed_components: Option<QueryComponents>,
        search_strategy: Option<SearchStrategy>,
        explanations: Option<Vec<String>>,
        answer: Option<String>,
        confidence: Option<f32>,
        search_method: SearchMethod,
        started: Instant,
    ) -> SearchResponse {
        SearchResponse {
            query: request.query.clone(),
            mode: request.mode,
            parsed_components,
            search_strategy,
            explanations,
            answer,
            confidence,
            metadata: ResponseMetadata {
                total_results: results.len(),
                processing_time_ms: started.elapsed().as_millis() as u64,
                search_method,
                embedding_dimension: self.embedding_dimension,
            },
            results,
        }
    }
}

/// Bound a pipeline stage by the request deadline
async fn with_deadline<T>(
    deadline: Option<Instant>,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    match deadline {
        Some(deadline) => {
            let budget = deadline.saturating_duration_since(Instant::now());
            tokio::time::timeout(budget, future)
                .await
                .map_err(|_| Error::DeadlineExceeded)?
        }
        None => future.await,
    }
}

/// Time left until the deadline, if one was set
fn remaining(deadline: Option<Instant>) -> Option<Duration> {
    deadline.map(|d| d.saturating_duration_since(Instant::now()))
}
