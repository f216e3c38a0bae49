//! Settings model and loader

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Generative LM settings
    #[serde(default)]
    pub generator: GeneratorSettings,

    /// Retrieval tuning
    #[serde(default)]
    pub retrieval: RetrievalSettings,

    /// RAG composition and backpressure
    #[serde(default)]
    pub rag: RagSettings,

    /// Extra location registry rows merged over the built-in set
    #[serde(default)]
    pub locations: Vec<LocationEntry>,
}

/// Embedding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Vector dimension shared by all field embeddings
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Embedding endpoint (Ollama-compatible)
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,

    /// Retry attempts for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Entries kept by the embedding memo cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_embedding_dimension() -> usize {
    768
}
fn default_embedding_endpoint() -> String {
    "http://localhost:11434".to_string()
}
fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}
fn default_embedding_timeout_ms() -> u64 {
    5_000
}
fn default_max_retries() -> u32 {
    3
}
fn default_cache_capacity() -> usize {
    1024
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            dimension: default_embedding_dimension(),
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            timeout_ms: default_embedding_timeout_ms(),
            max_retries: default_max_retries(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Generative LM settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Generator endpoint (Ollama-compatible)
    #[serde(default = "default_generator_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_generator_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_generator_temperature")]
    pub temperature: f32,

    /// Generation cap in tokens
    #[serde(default = "default_generator_max_tokens")]
    pub max_tokens: usize,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_generator_timeout_ms")]
    pub timeout_ms: u64,

    /// Retry attempts for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_generator_endpoint() -> String {
    "http://localhost:11434".to_string()
}
fn default_generator_model() -> String {
    "qwen2.5:7b-instruct-q4_K_M".to_string()
}
fn default_generator_temperature() -> f32 {
    0.3
}
fn default_generator_max_tokens() -> usize {
    512
}
fn default_generator_timeout_ms() -> u64 {
    15_000
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            endpoint: default_generator_endpoint(),
            model: default_generator_model(),
            temperature: default_generator_temperature(),
            max_tokens: default_generator_max_tokens(),
            timeout_ms: default_generator_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

/// Retrieval tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Saturation divisor normalizing lexical-only scores to [0, 1]
    #[serde(default = "default_lexical_saturation")]
    pub lexical_saturation: f32,

    /// Candidates fetched per requested result, before re-ranking
    #[serde(default = "default_over_fetch_multiplier")]
    pub over_fetch_multiplier: usize,

    /// Upper bound on fetched candidates
    #[serde(default = "default_hard_cap")]
    pub hard_cap: usize,

    /// top_k used when the request leaves it unset
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Index-time field weights; changing these requires re-indexing
    #[serde(default)]
    pub index_weights: IndexFieldWeights,

    /// Query-time additive deltas re-focusing the dense field choice
    #[serde(default)]
    pub adaptive_deltas: AdaptiveDeltas,
}

fn default_lexical_saturation() -> f32 {
    20.0
}
fn default_over_fetch_multiplier() -> usize {
    3
}
fn default_hard_cap() -> usize {
    50
}
fn default_top_k() -> usize {
    10
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            lexical_saturation: default_lexical_saturation(),
            over_fetch_multiplier: default_over_fetch_multiplier(),
            hard_cap: default_hard_cap(),
            default_top_k: default_top_k(),
            index_weights: IndexFieldWeights::default(),
            adaptive_deltas: AdaptiveDeltas::default(),
        }
    }
}

/// Index-time weights combining field vectors into `combined`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexFieldWeights {
    #[serde(default = "default_weight_content")]
    pub content: f32,
    #[serde(default = "default_weight_name")]
    pub name: f32,
    #[serde(default = "default_weight_location")]
    pub location: f32,
    #[serde(default = "default_weight_service")]
    pub service: f32,
    #[serde(default = "default_weight_target")]
    pub target: f32,
}

fn default_weight_content() -> f32 {
    0.40
}
fn default_weight_name() -> f32 {
    0.25
}
fn default_weight_location() -> f32 {
    0.15
}
fn default_weight_service() -> f32 {
    0.10
}
fn default_weight_target() -> f32 {
    0.10
}

impl Default for IndexFieldWeights {
    fn default() -> Self {
        Self {
            content: default_weight_content(),
            name: default_weight_name(),
            location: default_weight_location(),
            service: default_weight_service(),
            target: default_weight_target(),
        }
    }
}

impl IndexFieldWeights {
    /// Weight for a named field; unknown fields weigh nothing
    pub fn for_field(&self, field: &str) -> f32 {
        match field {
            "content" => self.content,
            "name" => self.name,
            "location" => self.location,
            "service" => self.service,
            "target" => self.target,
            _ => 0.0,
        }
    }
}

/// Query-time additive deltas over the index-time weights
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdaptiveDeltas {
    /// Added to the location weight when the query resolves a location
    #[serde(default = "default_delta_location")]
    pub location: f32,
    /// Added to the service weight when service requirements are present
    #[serde(default = "default_delta_service")]
    pub service: f32,
    /// Added to the target weight when a target audience is present
    #[serde(default = "default_delta_target")]
    pub target: f32,
}

fn default_delta_location() -> f32 {
    0.20
}
fn default_delta_service() -> f32 {
    0.15
}
fn default_delta_target() -> f32 {
    0.10
}

impl Default for AdaptiveDeltas {
    fn default() -> Self {
        Self {
            location: default_delta_location(),
            service: default_delta_service(),
            target: default_delta_target(),
        }
    }
}

/// RAG composition and backpressure settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagSettings {
    /// Token budget for the assembled context
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    /// Concurrent in-flight generations per process
    #[serde(default = "default_rag_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Requests allowed to wait for a generation slot
    #[serde(default = "default_rag_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_max_context_tokens() -> usize {
    4_000
}
fn default_rag_concurrency_limit() -> usize {
    8
}
fn default_rag_queue_capacity() -> usize {
    16
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            max_context_tokens: default_max_context_tokens(),
            concurrency_limit: default_rag_concurrency_limit(),
            queue_capacity: default_rag_queue_capacity(),
        }
    }
}

/// One location registry row supplied through configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationEntry {
    /// Canonical spelling, diacritics included
    pub canonical: String,
    /// Alternative surface forms (aliases, stripped spellings)
    #[serde(default)]
    pub surface_forms: Vec<String>,
    /// Region tag ("north", "central", "south")
    pub region: String,
    /// Canonical names of neighboring areas
    #[serde(default)]
    pub neighbors: Vec<String>,
}

/// Load settings from an optional file plus the environment
///
/// Environment variables use the VOUCHER_SEARCH_ prefix with `__` as
/// the section separator, e.g. `VOUCHER_SEARCH_RETRIEVAL__HARD_CAP=30`.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        builder = builder.add_source(config::File::from(path));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("VOUCHER_SEARCH").separator("__"),
    );

    let settings: Settings = builder.build()?.try_deserialize()?;
    validate(&settings)?;

    tracing::debug!(
        dimension = settings.embedding.dimension,
        hard_cap = settings.retrieval.hard_cap,
        "settings loaded"
    );
    Ok(settings)
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.embedding.dimension == 0 {
        return Err(ConfigError::InvalidValue {
            field: "embedding.dimension".to_string(),
            message: "must be positive".to_string(),
        });
    }
    if settings.retrieval.lexical_saturation <= 0.0 {
        return Err(ConfigError::InvalidValue {
            field: "retrieval.lexical_saturation".to_string(),
            message: "must be positive".to_string(),
        });
    }
    if settings.retrieval.over_fetch_multiplier == 0 || settings.retrieval.hard_cap == 0 {
        return Err(ConfigError::InvalidValue {
            field: "retrieval.over_fetch".to_string(),
            message: "multiplier and hard cap must be positive".to_string(),
        });
    }
    if settings.rag.concurrency_limit == 0 {
        return Err(ConfigError::InvalidValue {
            field: "rag.concurrency_limit".to_string(),
            message: "must be positive".to_string(),
        });
    }
    Ok(())
}
