//! Answer composition
//!
//! Invokes the generative collaborator over the assembled context and
//! computes an answer confidence from retrieval similarity. Generation
//! is never on the critical path for retrieval correctness: any
//! failure or timeout falls back to a deterministic templated answer.

use std::sync::Arc;
use std::time::Duration;

use voucher_search_core::{
    AnswerGenerator, QueryComponents, ResponseStyle, SearchResult,
};
use voucher_search_llm::PromptBuilder;

use crate::context::{CharHeuristicEstimator, ContextAssembler};

/// Composer tuning, usually sourced from `Settings`
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    pub max_context_tokens: usize,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: 4_000,
            temperature: 0.3,
            max_tokens: 512,
        }
    }
}

/// A composed answer with its provenance
#[derive(Debug, Clone)]
pub struct ComposedAnswer {
    pub answer: String,
    pub confidence: f32,
    pub style: ResponseStyle,
    /// True when the generator failed and the templated path answered
    pub fallback: bool,
}

/// RAG answer composer
pub struct AnswerComposer {
    generator: Arc<dyn AnswerGenerator>,
    assembler: ContextAssembler,
    prompts: PromptBuilder,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn AnswerGenerator>, config: ComposerConfig) -> Self {
        Self {
            generator,
            assembler: ContextAssembler::new(
                config.max_context_tokens,
                Box::new(CharHeuristicEstimator),
            ),
            prompts: PromptBuilder::new(config.temperature, config.max_tokens),
        }
    }

    /// Compose an answer over the retrieved results
    ///
    /// `remaining` bounds the generator call; expiry or failure takes
    /// the fallback path instead of erroring.
    pub async fn compose(
        &self,
        components: &QueryComponents,
        results: &[SearchResult],
        remaining: Option<Duration>,
    ) -> ComposedAnswer {
        let style = ResponseStyle::from_components(components);

        if results.is_empty() {
            return ComposedAnswer {
                answer: no_results_answer().to_string(),
                confidence: 0.0,
                style,
                fallback: false,
            };
        }

        let confidence = answer_confidence(results);
        let (context, included) = self.assembler.assemble(results);
        let request = self
            .prompts
            .build(&components.original, &context, style);

        let generation = match remaining {
            Some(budget) => {
                match tokio::time::timeout(budget, self.generator.generate(request)).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!("generator deadline expired, using templated answer");
                        return self.fallback_answer(results, style, confidence);
                    }
                }
            }
            None => self.generator.generate(request).await,
        };

        match generation {
            Ok(response) => {
                tracing::debug!(
                    included,
                    total_time_ms = response.total_time_ms,
                    "answer generated"
                );
                ComposedAnswer {
                    answer: response.text,
                    confidence,
                    style,
                    fallback: false,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "generator unavailable, using templated answer");
                self.fallback_answer(results, style, confidence)
            }
        }
    }

    /// Deterministic Markdown enumeration of the retrieved vouchers
    fn fallback_answer(
        &self,
        results: &[SearchResult],
        style: ResponseStyle,
        confidence: f32,
    ) -> ComposedAnswer {
        let mut answer =
            String::from("Mình tìm thấy các ưu đãi phù hợp với yêu cầu của bạn:\n\n");
        for result in results {
            answer.push_str(&format!(
                "- **{}** ({}) — {}\n",
                result.voucher_name,
                result.location,
                voucher_tip(result)
            ));
        }
        answer.push_str("\nBạn muốn xem chi tiết ưu đãi nào không?");

        ComposedAnswer {
            answer,
            confidence,
            style,
            fallback: true,
        }
    }
}

/// Mean retrieval similarity with a small bonus for richer contexts
fn answer_confidence(results: &[SearchResult]) -> f32 {
    if results.is_empty() {
        return 0.0;
    }
    let mean: f32 = results
        .iter()
        .map(|r| r.similarity_score)
        .sum::<f32>()
        / results.len() as f32;
    let bonus = if results.len() >= 3 { 1.1 } else { 1.0 };
    (mean.clamp(0.0, 1.0) * bonus).clamp(0.0, 1.0)
}

/// One-line tip for the templated answer
fn voucher_tip(result: &SearchResult) -> String {
    match result.price_info.amount {
        Some(amount) => format!(
            "ưu đãi {} khoảng {amount} VND",
            result.service_info.category
        ),
        None => format!("ưu đãi {}", result.service_info.category),
    }
}

fn no_results_answer() -> &'static str {
    "Rất tiếc, mình chưa tìm thấy ưu đãi nào phù hợp. Bạn thử mở rộng khu vực \
     hoặc dùng từ khóa chung hơn nhé?"
}
