//! Hybrid retrieval for voucher discovery
//!
//! Features:
//! - Embedding provider clients (HTTP endpoint + deterministic hashing
//!   fallback) with a bounded memo cache
//! - Multi-field index schema with ingest-time validation
//! - In-memory reference engine: BM25 best-fields + cosine script score
//!   combined as disjunctive should-clauses
//! - Intent-adaptive hybrid retrieval with heterogeneous score
//!   normalization
//! - Geographic re-ranking with exact/neighbor/regional boosts

pub mod embeddings;
pub mod geo_boost;
pub mod index;
pub mod retriever;

pub use embeddings::{EmbeddingCache, HashingEmbedder, HttpEmbedder};
pub use geo_boost::GeoReRanker;
pub use index::{
    DenseClause, DenseField, FieldFilter, IndexHit, IndexQuery, LexicalClause, LexicalField,
    MemoryIndex, VoucherIndex,
};
pub use index::schema::{build_combined, DocumentValidator};
pub use retriever::{AdaptiveWeights, Candidate, RetrievalConfig, RetrievalEngine, SearchStrategy};
