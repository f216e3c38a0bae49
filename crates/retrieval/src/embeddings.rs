//! Embedding provider clients
//!
//! The embedding model itself is an external collaborator; this module
//! provides the HTTP client for an Ollama-compatible endpoint, a
//! deterministic hashing embedder used offline and in tests, and a
//! bounded memo cache valid for the lifetime of one process.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use voucher_search_config::EmbeddingSettings;
use voucher_search_core::{normalize_in_place, EmbeddingProvider, Error, Result};
use voucher_search_text::fold_tokens;

/// Client for an Ollama-compatible embedding endpoint
pub struct HttpEmbedder {
    client: Client,
    settings: EmbeddingSettings,
}

impl HttpEmbedder {
    pub fn new(settings: EmbeddingSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| Error::EmbeddingUnavailable(format!("http client: {e}")))?;
        Ok(Self { client, settings })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.settings.endpoint, path)
    }

    async fn execute(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: self.settings.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(self.api_url("/embeddings"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::EmbeddingUnavailable(format!("{status}: {body}")));
        }

        let payload: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::EmbeddingUnavailable(format!("invalid payload: {e}")))?;

        if payload.embedding.len() != self.settings.dimension {
            return Err(Error::EmbeddingUnavailable(format!(
                "expected dimension {}, got {}",
                self.settings.dimension,
                payload.embedding.len()
            )));
        }

        let mut vector = payload.embedding;
        normalize_in_place(&mut vector);
        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut backoff = Duration::from_millis(100);
        let mut last_error = None;

        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    attempt,
                    max = self.settings.max_retries,
                    "embedding call failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            match self.execute(text).await {
                Ok(vector) => return Ok(vector),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::EmbeddingUnavailable("max retries exceeded".to_string())))
    }

    fn dimension(&self) -> usize {
        self.settings.dimension
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.settings.endpoint))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Deterministic token-hash embedder
///
/// Hashes the diacritic-stripped tokens of the input into a fixed
/// number of buckets, so texts sharing vocabulary land near each other
/// and a query with or without diacritics embeds identically. No model
/// required; used by tests and as an offline fallback.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in fold_tokens(text) {
            let hash = fnv1a64(token.as_bytes());
            for shift in [0u64, 21, 42] {
                let bucket = ((hash >> shift) % self.dimension as u64) as usize;
                vector[bucket] += 1.0;
            }
        }

        if vector.iter().all(|x| *x == 0.0) {
            vector[0] = 1.0;
        }
        normalize_in_place(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// FNV-1a, 64-bit
fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Bounded per-run memo cache in front of any provider
///
/// The provider contract guarantees identical output for identical
/// input within one run, so memoization is observationally transparent.
/// Eviction is oldest-first once capacity is reached.
pub struct EmbeddingCache {
    inner: Arc<dyn EmbeddingProvider>,
    entries: Mutex<CacheState>,
    capacity: usize,
}

struct CacheState {
    map: HashMap<String, Vec<f32>>,
    order: VecDeque<String>,
}

impl EmbeddingCache {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, capacity: usize) -> Self {
        Self {
            inner,
            entries: Mutex::new(CacheState {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingCache {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(hit) = self.entries.lock().map.get(text) {
            return Ok(hit.clone());
        }

        let vector = self.inner.embed(text).await?;

        let mut state = self.entries.lock();
        if !state.map.contains_key(text) {
            if state.map.len() >= self.capacity {
                if let Some(oldest) = state.order.pop_front() {
                    state.map.remove(&oldest);
                }
            }
            state.map.insert(text.to_string(), vector.clone());
            state.order.push_back(text.to_string());
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }
}
