//! Ollama-compatible generation backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use voucher_search_config::GeneratorSettings;
use voucher_search_core::{
    AnswerGenerator, Error, GenerateRequest, GenerateResponse, Result,
};

/// Chat-completions client for a local or remote Ollama server
pub struct OllamaGenerator {
    client: Client,
    settings: GeneratorSettings,
}

impl OllamaGenerator {
    pub fn new(settings: GeneratorSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| Error::GeneratorUnavailable(format!("http client: {e}")))?;
        Ok(Self { client, settings })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.settings.endpoint, path)
    }

    async fn execute(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .client
            .post(self.api_url("/chat"))
            .json(request)
            .send()
            .await
            .map_err(|e| Error::GeneratorUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GeneratorUnavailable(format!("{status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| Error::GeneratorUnavailable(format!("invalid payload: {e}")))
    }
}

#[async_trait]
impl AnswerGenerator for OllamaGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let started = std::time::Instant::now();

        let chat_request = ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens as i32,
            },
        };

        let mut backoff = Duration::from_millis(100);
        let mut last_error = None;

        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    attempt,
                    max = self.settings.max_retries,
                    "generation call failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            match self.execute(&chat_request).await {
                Ok(result) => {
                    return Ok(GenerateResponse {
                        text: result.message.content,
                        total_time_ms: started.elapsed().as_millis() as u64,
                        model: self.settings.model.clone(),
                    });
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::GeneratorUnavailable("max retries exceeded".to_string())))
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.settings.endpoint))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}

// Ollama API types
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: i32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}
