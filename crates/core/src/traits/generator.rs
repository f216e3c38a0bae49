//! Generative language model trait
//!
//! The generator is a text-in/text-out collaborator with its own
//! deadline. Retrieval correctness never depends on it; the RAG
//! composer keeps a templated fallback ready.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// One generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// System prompt fixing language, persona and grounding rules
    pub system: String,
    /// User prompt with the query and assembled context
    pub user: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Generation cap in tokens
    pub max_tokens: usize,
}

impl GenerateRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.3,
            max_tokens: 512,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Generation outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text
    pub text: String,
    /// Wall-clock generation time
    pub total_time_ms: u64,
    /// Model that produced the text
    pub model: String,
}

/// Generative LM collaborator
#[async_trait]
pub trait AnswerGenerator: Send + Sync + 'static {
    /// Produce a completion; failures surface as
    /// `Error::GeneratorUnavailable`
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Health probe; false when the backend is unreachable
    async fn is_available(&self) -> bool;

    /// Model name for logging
    fn model_name(&self) -> &str;
}
