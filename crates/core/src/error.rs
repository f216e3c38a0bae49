//! Error taxonomy surfaced to callers
//!
//! Every failure carries a stable machine-readable code plus a
//! human-readable message. Parser and re-ranker stages degrade to
//! defaults instead of erroring; only external collaborators and
//! request validation produce these variants.

use thiserror::Error;

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Failures visible at the search façade
#[derive(Error, Debug)]
pub enum Error {
    /// Empty or too-short query, invalid top_k, unknown filter value
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Embedding provider failed or timed out
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Index engine failed
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    /// RAG generator failed or timed out
    #[error("generator unavailable: {0}")]
    GeneratorUnavailable(String),

    /// Overall request deadline reached before results could be assembled
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Concurrency cap reached and no capacity to queue
    #[error("overloaded: {0}")]
    Overloaded(String),

    /// Ingestion write rejected
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable machine-readable code for API payloads
    pub fn code(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "bad_request",
            Error::EmbeddingUnavailable(_) => "embedding_unavailable",
            Error::IndexUnavailable(_) => "index_unavailable",
            Error::GeneratorUnavailable(_) => "generator_unavailable",
            Error::DeadlineExceeded => "deadline_exceeded",
            Error::Overloaded(_) => "overloaded",
            Error::InvalidDocument(_) => "invalid_document",
            Error::Config(_) => "config_error",
        }
    }

    /// Pipeline component the failure originated from
    pub fn component(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "facade",
            Error::EmbeddingUnavailable(_) => "embedding_provider",
            Error::IndexUnavailable(_) => "index",
            Error::GeneratorUnavailable(_) => "generator",
            Error::DeadlineExceeded => "facade",
            Error::Overloaded(_) => "facade",
            Error::InvalidDocument(_) => "index",
            Error::Config(_) => "config",
        }
    }
}
