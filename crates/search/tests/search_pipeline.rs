//! End-to-end pipeline tests over a fixed fixture index
//!
//! Uses the deterministic hashing embedder and the in-memory engine so
//! every assertion is reproducible.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use voucher_search::{SearchMode, SearchRequest, SearchService};
use voucher_search_config::{IndexFieldWeights, Settings};
use voucher_search_core::{
    AnswerGenerator, EmbeddingProvider, Error, FieldEmbeddings, GenerateRequest,
    GenerateResponse, PriceRange, RankingFactor, Result, SearchMethod, ServiceCategory,
    ServiceInfo, Voucher, VoucherLocation,
};
use voucher_search_retrieval::{
    build_combined, DocumentValidator, HashingEmbedder, MemoryIndex, VoucherIndex,
};
use voucher_search_text::LocationRegistry;

const DIM: usize = 256;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

struct FixtureDoc {
    id: &'static str,
    name: &'static str,
    content: &'static str,
    location: &'static str,
    category: ServiceCategory,
    has_kids_area: bool,
    price: Option<u64>,
    quality: f32,
}

fn fixture_docs() -> Vec<FixtureDoc> {
    vec![
        FixtureDoc {
            id: "hp-01",
            name: "Buffet Biển Đông",
            content: "buffet hải sản tươi sống tại hải phòng có chỗ cho trẻ em chơi, khu vui chơi trẻ em rộng rãi",
            location: "Hải Phòng",
            category: ServiceCategory::Restaurant,
            has_kids_area: true,
            price: Some(250_000),
            quality: 0.9,
        },
        FixtureDoc {
            id: "hp-02",
            name: "Lẩu Phố Cảng",
            content: "lẩu hải sản hải phòng không gian gia đình, có khu trẻ em",
            location: "Hải Phòng",
            category: ServiceCategory::Restaurant,
            has_kids_area: true,
            price: Some(300_000),
            quality: 0.8,
        },
        FixtureDoc {
            id: "hp-03",
            name: "Nhà Hàng Hoa Phượng",
            content: "món ăn gia đình tại hải phòng có chỗ cho trẻ em chơi",
            location: "Hải Phòng",
            category: ServiceCategory::Restaurant,
            has_kids_area: true,
            price: Some(200_000),
            quality: 0.85,
        },
        FixtureDoc {
            id: "hp-04",
            name: "Quán Ăn Cát Bà",
            content: "quán ăn hải sản ngon tại hải phòng",
            location: "Hải Phòng",
            category: ServiceCategory::Restaurant,
            has_kids_area: false,
            price: Some(150_000),
            quality: 0.7,
        },
        FixtureDoc {
            id: "hp-05",
            name: "Cafe Nhà Hát Lớn",
            content: "cà phê view nhà hát lớn hải phòng, không gian lãng mạn",
            location: "Hải Phòng",
            category: ServiceCategory::Cafe,
            has_kids_area: false,
            price: Some(80_000),
            quality: 0.75,
        },
        FixtureDoc {
            id: "hn-01",
            name: "Buffet Thiếu Nhi Hà Nội",
            content: "buffet cho trẻ em tại hà nội, khu vui chơi trẻ em",
            location: "Hà Nội",
            category: ServiceCategory::Restaurant,
            has_kids_area: true,
            price: Some(220_000),
            quality: 0.9,
        },
        FixtureDoc {
            id: "hn-02",
            name: "Bellissimo",
            content: "nhà hàng ý sang trọng tại hà nội, pizza và mỳ ý",
            location: "Hà Nội",
            category: ServiceCategory::Restaurant,
            has_kids_area: false,
            price: Some(500_000),
            quality: 0.9,
        },
        FixtureDoc {
            id: "hn-03",
            name: "Khách Sạn Hồ Gươm",
            content: "khách sạn trung tâm hà nội, phòng gia đình rộng rãi",
            location: "Hà Nội",
            category: ServiceCategory::Hotel,
            has_kids_area: false,
            price: Some(800_000),
            quality: 0.8,
        },
        FixtureDoc {
            id: "hcm-01",
            name: "Buffet Kids Sài Gòn",
            content: "buffet trẻ em lớn nhất sài gòn, khu vui chơi trong nhà",
            location: "Hồ Chí Minh",
            category: ServiceCategory::Restaurant,
            has_kids_area: true,
            price: Some(280_000),
            quality: 0.85,
        },
        FixtureDoc {
            id: "hcm-02",
            name: "Cafe Bầu Trời",
            content: "cà phê rooftop không gian lãng mạn sài gòn",
            location: "Hồ Chí Minh",
            category: ServiceCategory::Cafe,
            has_kids_area: false,
            price: Some(120_000),
            quality: 0.8,
        },
        FixtureDoc {
            id: "dn-01",
            name: "Resort Biển Xanh",
            content: "resort nghỉ dưỡng đà nẵng, hồ bơi riêng",
            location: "Đà Nẵng",
            category: ServiceCategory::Hotel,
            has_kids_area: false,
            price: Some(1_500_000),
            quality: 0.9,
        },
        FixtureDoc {
            id: "dn-02",
            name: "Quán Nhậu Sông Hàn",
            content: "quán nhậu hải sản đà nẵng",
            location: "Đà Nẵng",
            category: ServiceCategory::Restaurant,
            has_kids_area: false,
            price: Some(180_000),
            quality: 0.7,
        },
        FixtureDoc {
            id: "uk-01",
            name: "Trà Sữa Nhà Làm",
            content: "trà sữa ngon, giao hàng tận nơi",
            location: "unknown",
            category: ServiceCategory::Cafe,
            has_kids_area: false,
            price: Some(50_000),
            quality: 0.6,
        },
    ]
}

async fn build_voucher(doc: &FixtureDoc, embedder: &HashingEmbedder) -> Voucher {
    let registry = LocationRegistry::with_defaults();
    let weights = IndexFieldWeights::default();

    let mut embeddings = FieldEmbeddings {
        content: embedder.embed(doc.content).await.unwrap(),
        combined: vec![],
        name: Some(embedder.embed(doc.name).await.unwrap()),
        location: Some(embedder.embed(doc.location).await.unwrap()),
        service: Some(
            embedder
                .embed(doc.category.as_str())
                .await
                .unwrap(),
        ),
        target: None,
    };
    embeddings.combined = build_combined(&embeddings, &weights);

    Voucher {
        id: doc.id.to_string(),
        name: doc.name.to_string(),
        content: doc.content.to_string(),
        location: VoucherLocation {
            name: doc.location.to_string(),
            district: None,
            region: registry.region_of(doc.location).map(|r| r.to_string()),
        },
        service: ServiceInfo {
            category: doc.category,
            cuisine: None,
            tags: vec![],
            has_kids_area: doc.has_kids_area,
            restaurant_type: None,
        },
        target_audience: doc.has_kids_area.then(|| "kids".to_string()),
        price: doc.price,
        price_range: PriceRange::from_price(doc.price),
        embeddings,
        data_quality_score: doc.quality,
    }
}

/// Stub generators for RAG paths
struct StubGenerator {
    hang: bool,
}

#[async_trait]
impl AnswerGenerator for StubGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        if self.hang {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Ok(GenerateResponse {
            text: format!("Gợi ý dựa trên {} ký tự ngữ cảnh.", request.user.chars().count()),
            total_time_ms: 1,
            model: "stub".to_string(),
        })
    }

    async fn is_available(&self) -> bool {
        !self.hang
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

async fn service_with(generator: StubGenerator, docs: Vec<FixtureDoc>) -> SearchService {
    init_tracing();
    let settings = Settings::default();
    let embedder = Arc::new(HashingEmbedder::new(DIM));
    let registry = Arc::new(LocationRegistry::from_settings(&settings.locations));
    let index = MemoryIndex::new(DocumentValidator::new(
        DIM,
        settings.retrieval.index_weights,
        Arc::clone(&registry),
    ));

    for doc in &docs {
        index
            .upsert(build_voucher(doc, &embedder).await)
            .await
            .unwrap();
    }

    SearchService::new(
        Arc::new(index),
        embedder,
        Arc::new(generator),
        &settings,
    )
}

async fn fixture_service() -> SearchService {
    service_with(StubGenerator { hang: false }, fixture_docs()).await
}

#[tokio::test]
async fn scenario_kid_friendly_dining_in_hai_phong() {
    let service = fixture_service().await;

    let response = service
        .search(
            SearchRequest::new("quán ăn tại hải phòng có chỗ cho trẻ em chơi")
                .with_mode(SearchMode::Hybrid)
                .with_top_k(5),
        )
        .await
        .unwrap();

    let components = response.parsed_components.as_ref().unwrap();
    assert!(
        components.intent.as_str() == "find_restaurant"
            || components.intent.as_str() == "find_kids",
        "unexpected intent {}",
        components.intent
    );
    assert_eq!(components.location.as_deref(), Some("Hải Phòng"));
    assert!(components.confidence >= 0.6);

    assert_eq!(response.results.len(), 5);
    let in_hai_phong = response
        .results
        .iter()
        .filter(|r| r.location == "Hải Phòng")
        .count();
    assert!(in_hai_phong >= 4, "only {in_hai_phong} results in Hải Phòng");
    assert_eq!(
        response.results[0].ranking_factor,
        RankingFactor::ExactLocationMatch
    );

    // All final scores stay inside the unit interval
    for result in &response.results {
        assert!((0.0..=1.0).contains(&result.similarity_score));
        assert!((0.0..=1.0).contains(&result.raw_score));
    }

    assert_eq!(response.metadata.search_method, SearchMethod::HybridSearch);
    assert_eq!(response.metadata.total_results, 5);
    assert!(response.explanations.is_some());
}

#[tokio::test]
async fn scenario_brand_exact_match() {
    let service = fixture_service().await;

    let response = service
        .search(
            SearchRequest::new("Bellissimo")
                .with_mode(SearchMode::Hybrid)
                .with_top_k(3),
        )
        .await
        .unwrap();

    let top = &response.results[0];
    assert!(
        top.voucher_name.to_lowercase().contains("bellissimo"),
        "top result was {}",
        top.voucher_name
    );
    assert!(
        top.similarity_score >= 0.7,
        "lexical hit should dominate: {}",
        top.similarity_score
    );
}

#[tokio::test]
async fn scenario_pure_vector_semantic() {
    let service = fixture_service().await;

    let response = service
        .search(
            SearchRequest::new("quán cafe có không gian lãng mạn")
                .with_mode(SearchMode::Vector)
                .with_top_k(3),
        )
        .await
        .unwrap();

    assert_eq!(response.results.len(), 3);
    for result in &response.results {
        assert!(
            matches!(
                result.service_info.category,
                ServiceCategory::Restaurant | ServiceCategory::Cafe | ServiceCategory::Bar
            ),
            "unexpected category {:?} for {}",
            result.service_info.category,
            result.voucher_id
        );
        // No geographic re-ranking in vector mode
        assert_eq!(result.ranking_factor, RankingFactor::SemanticMatch);
    }

    assert_eq!(response.metadata.search_method, SearchMethod::VectorSearch);
    assert!(response.parsed_components.is_none());
    assert!(response.search_strategy.is_none());
}

#[tokio::test]
async fn scenario_strict_location_filter() {
    let service = fixture_service().await;

    let response = service
        .search(
            SearchRequest::new("buffet trẻ em")
                .with_mode(SearchMode::Hybrid)
                .with_top_k(10)
                .with_location_filter("Hà Nội")
                .with_strict_location(),
        )
        .await
        .unwrap();

    assert!(!response.results.is_empty());
    for result in &response.results {
        assert_eq!(result.location, "Hà Nội", "leaked {}", result.voucher_id);
    }
    let ids: Vec<&str> = response
        .results
        .iter()
        .map(|r| r.voucher_id.as_str())
        .collect();
    assert!(!ids.contains(&"hcm-01"));
    assert!(!ids.contains(&"dn-01"));
}

#[tokio::test]
async fn scenario_rag_fallback_on_generator_timeout() {
    let hybrid_service = fixture_service().await;
    let hybrid = hybrid_service
        .search(
            SearchRequest::new("quán ăn tại hải phòng có chỗ cho trẻ em chơi")
                .with_mode(SearchMode::Hybrid)
                .with_top_k(5),
        )
        .await
        .unwrap();

    let rag_service = service_with(StubGenerator { hang: true }, fixture_docs()).await;
    let rag = rag_service
        .search(
            SearchRequest::new("quán ăn tại hải phòng có chỗ cho trẻ em chơi")
                .with_mode(SearchMode::Rag)
                .with_top_k(5)
                .with_deadline_ms(400),
        )
        .await
        .unwrap();

    assert_eq!(
        rag.metadata.search_method,
        SearchMethod::AdvancedRagFallback
    );
    let answer = rag.answer.as_deref().unwrap();
    assert!(!answer.is_empty());

    // Same results array as the hybrid run
    assert_eq!(rag.results.len(), hybrid.results.len());
    for (a, b) in rag.results.iter().zip(hybrid.results.iter()) {
        assert_eq!(a.voucher_id, b.voucher_id);
        assert!((a.similarity_score - b.similarity_score).abs() < 1e-6);
        assert_eq!(a.ranking_factor, b.ranking_factor);
        assert_eq!(a.search_method, b.search_method);
    }
}

#[tokio::test]
async fn scenario_diacritic_equivalence() {
    let service = fixture_service().await;

    let with_diacritics = service
        .search(
            SearchRequest::new("hải phòng")
                .with_mode(SearchMode::Hybrid)
                .with_top_k(10),
        )
        .await
        .unwrap();
    let without_diacritics = service
        .search(
            SearchRequest::new("hai phong")
                .with_mode(SearchMode::Hybrid)
                .with_top_k(10),
        )
        .await
        .unwrap();

    let mut ids_a: Vec<&str> = with_diacritics
        .results
        .iter()
        .map(|r| r.voucher_id.as_str())
        .collect();
    let mut ids_b: Vec<&str> = without_diacritics
        .results
        .iter()
        .map(|r| r.voucher_id.as_str())
        .collect();
    ids_a.sort_unstable();
    ids_b.sort_unstable();
    assert_eq!(ids_a, ids_b);
}

#[tokio::test]
async fn rag_happy_path_generates_answer() {
    let service = fixture_service().await;

    let response = service
        .search(
            SearchRequest::new("buffet hải sản cho gia đình")
                .with_mode(SearchMode::Rag)
                .with_top_k(5),
        )
        .await
        .unwrap();

    assert_eq!(response.metadata.search_method, SearchMethod::AdvancedRag);
    assert!(response.answer.as_deref().unwrap().contains("ngữ cảnh"));
    let confidence = response.confidence.unwrap();
    assert!((0.0..=1.0).contains(&confidence));
    assert!(confidence > 0.0);
    assert!(response.parsed_components.is_some());
    assert!(response.search_strategy.is_some());
}

#[tokio::test]
async fn identical_requests_return_identical_results() {
    let service = fixture_service().await;
    let request = SearchRequest::new("quán ăn tại hải phòng có chỗ cho trẻ em chơi")
        .with_mode(SearchMode::Hybrid)
        .with_top_k(5);

    let first = service.search(request.clone()).await.unwrap();
    let second = service.search(request).await.unwrap();

    let ids_first: Vec<&str> = first.results.iter().map(|r| r.voucher_id.as_str()).collect();
    let ids_second: Vec<&str> = second
        .results
        .iter()
        .map(|r| r.voucher_id.as_str())
        .collect();
    assert_eq!(ids_first, ids_second);
    for (a, b) in first.results.iter().zip(second.results.iter()) {
        assert!((a.similarity_score - b.similarity_score).abs() < 1e-6);
    }
}

#[tokio::test]
async fn top_k_results_are_a_prefix_of_larger_top_k() {
    let service = fixture_service().await;

    let smaller = service
        .search(
            SearchRequest::new("quán ăn tại hải phòng")
                .with_mode(SearchMode::Hybrid)
                .with_top_k(5),
        )
        .await
        .unwrap();
    let larger = service
        .search(
            SearchRequest::new("quán ăn tại hải phòng")
                .with_mode(SearchMode::Hybrid)
                .with_top_k(6),
        )
        .await
        .unwrap();

    let smaller_ids: Vec<&str> = smaller
        .results
        .iter()
        .map(|r| r.voucher_id.as_str())
        .collect();
    let larger_ids: Vec<&str> = larger
        .results
        .iter()
        .map(|r| r.voucher_id.as_str())
        .collect();
    assert_eq!(&larger_ids[..smaller_ids.len()], &smaller_ids[..]);
}

#[tokio::test]
async fn empty_index_returns_empty_results() {
    let service = service_with(StubGenerator { hang: false }, vec![]).await;

    let response = service
        .search(SearchRequest::new("quán ăn ngon").with_mode(SearchMode::Hybrid))
        .await
        .unwrap();

    assert!(response.results.is_empty());
    assert_eq!(response.metadata.total_results, 0);
}

#[tokio::test]
async fn min_score_above_every_candidate_returns_empty() {
    let service = fixture_service().await;

    let response = service
        .search(
            SearchRequest::new("zzz yyy")
                .with_mode(SearchMode::Vector)
                .with_top_k(10)
                .with_min_score(0.95),
        )
        .await
        .unwrap();

    assert!(response.results.is_empty());
}

#[tokio::test]
async fn query_length_validation() {
    let service = fixture_service().await;

    // Two normalized characters are valid
    assert!(service
        .search(SearchRequest::new("hp").with_mode(SearchMode::Hybrid))
        .await
        .is_ok());

    // Zero and one character are rejected
    for query in ["", " ", "a"] {
        let failure = service
            .search(SearchRequest::new(query))
            .await
            .unwrap_err();
        assert_eq!(failure.code, "bad_request");
        assert_eq!(failure.component, "facade");
    }
}

#[tokio::test]
async fn invalid_top_k_rejected() {
    let service = fixture_service().await;

    for top_k in [0, 51] {
        let failure = service
            .search(SearchRequest::new("quán ăn").with_top_k(top_k))
            .await
            .unwrap_err();
        assert_eq!(failure.code, "bad_request");
    }
}

#[tokio::test]
async fn unknown_filter_values_rejected() {
    let service = fixture_service().await;

    let failure = service
        .search(SearchRequest::new("quán ăn").with_location_filter("atlantis"))
        .await
        .unwrap_err();
    assert_eq!(failure.code, "bad_request");

    let failure = service
        .search(SearchRequest::new("quán ăn").with_price_filter("free"))
        .await
        .unwrap_err();
    assert_eq!(failure.code, "bad_request");

    let failure = service
        .search(SearchRequest::new("quán ăn").with_service_filter("gym"))
        .await
        .unwrap_err();
    assert_eq!(failure.code, "bad_request");
}

#[tokio::test]
async fn price_filter_narrows_results() {
    let service = fixture_service().await;

    let response = service
        .search(
            SearchRequest::new("khách sạn nghỉ dưỡng")
                .with_mode(SearchMode::Hybrid)
                .with_price_filter("luxury"),
        )
        .await
        .unwrap();

    assert!(!response.results.is_empty());
    for result in &response.results {
        assert_eq!(result.price_info.range, PriceRange::Luxury);
    }
}

#[tokio::test]
async fn unknown_location_voucher_gets_no_boost() {
    let service = fixture_service().await;

    let response = service
        .search(
            SearchRequest::new("trà sữa giao hàng tại hải phòng")
                .with_mode(SearchMode::Hybrid)
                .with_top_k(13),
        )
        .await
        .unwrap();

    let unknown = response
        .results
        .iter()
        .find(|r| r.voucher_id == "uk-01")
        .expect("unknown-location voucher retrieved");
    assert_eq!(unknown.ranking_factor, RankingFactor::SemanticMatch);
    // No boost: the final score equals the pre-boost score
    assert!((unknown.similarity_score - unknown.raw_score).abs() < 1e-6);
}

#[tokio::test]
async fn ingest_rejects_invalid_documents() {
    let settings = Settings::default();
    let embedder = HashingEmbedder::new(DIM);
    let registry = Arc::new(LocationRegistry::from_settings(&settings.locations));
    let index = MemoryIndex::new(DocumentValidator::new(
        DIM,
        settings.retrieval.index_weights,
        registry,
    ));

    let mut voucher = build_voucher(&fixture_docs()[0], &embedder).await;
    voucher.price_range = PriceRange::Luxury; // inconsistent with price

    let err = index.upsert(voucher).await.unwrap_err();
    assert!(matches!(err, Error::InvalidDocument(_)));
}
