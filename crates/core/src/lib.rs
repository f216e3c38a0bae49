//! Core traits and types for the voucher discovery engine
//!
//! This crate provides foundational types used across all other crates:
//! - Voucher entity and its per-field embeddings
//! - Parsed query components and intents
//! - Search results with ranking provenance
//! - Error taxonomy surfaced to callers
//! - Traits for pluggable collaborators (embedding, generation)

pub mod error;
pub mod query;
pub mod result;
pub mod traits;
pub mod voucher;

pub use error::{Error, Result};
pub use query::{Intent, QueryComponents, ResponseStyle};
pub use result::{PriceInfo, RankingFactor, SearchMethod, SearchResult};
pub use voucher::{
    FieldEmbeddings, PriceRange, ServiceCategory, ServiceInfo, Voucher, VoucherLocation,
    UNKNOWN_LOCATION,
};

pub use traits::{
    AnswerGenerator, EmbeddingProvider, GenerateRequest, GenerateResponse,
};
pub use traits::embedding::{cosine, normalize_in_place};
