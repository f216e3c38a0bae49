//! Traits for pluggable external collaborators

pub mod embedding;
pub mod generator;

pub use embedding::EmbeddingProvider;
pub use generator::{AnswerGenerator, GenerateRequest, GenerateResponse};
