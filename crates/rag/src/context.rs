//! Context assembly under a token budget
//!
//! Retrieved vouchers are rendered into templated blocks and
//! concatenated in retrieval order until the budget is reached.

use voucher_search_core::SearchResult;

/// Characters of voucher content carried into the context
const EXCERPT_CHARS: usize = 200;

/// Token counting collaborator
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// Character-count heuristic, roughly three characters per token for
/// Vietnamese text
pub struct CharHeuristicEstimator;

impl TokenEstimator for CharHeuristicEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count().div_ceil(3)
    }
}

/// Assembles the context block passed to the generator
pub struct ContextAssembler {
    max_tokens: usize,
    estimator: Box<dyn TokenEstimator>,
}

impl ContextAssembler {
    pub fn new(max_tokens: usize, estimator: Box<dyn TokenEstimator>) -> Self {
        Self {
            max_tokens,
            estimator,
        }
    }

    /// Concatenate voucher blocks until the budget is reached
    ///
    /// Returns the assembled context and how many vouchers made it in.
    pub fn assemble(&self, results: &[SearchResult]) -> (String, usize) {
        let mut context = String::new();
        let mut used_tokens = 0usize;
        let mut included = 0usize;

        for (position, result) in results.iter().enumerate() {
            let block = render_block(position + 1, result);
            let block_tokens = self.estimator.estimate(&block);
            if used_tokens + block_tokens > self.max_tokens {
                break;
            }
            context.push_str(&block);
            used_tokens += block_tokens;
            included += 1;
        }

        tracing::debug!(included, used_tokens, "context assembled");
        (context, included)
    }
}

fn render_block(position: usize, result: &SearchResult) -> String {
    let mut service = result.service_info.category.as_str().to_string();
    if let Some(cuisine) = &result.service_info.cuisine {
        service.push_str(", ");
        service.push_str(cuisine);
    }
    if result.service_info.has_kids_area {
        service.push_str(", có khu vui chơi trẻ em");
    }

    let price = match result.price_info.amount {
        Some(amount) => format!("{amount} VND ({})", result.price_info.range),
        None => "chưa rõ giá".to_string(),
    };

    let excerpt: String = result.content_snippet.chars().take(EXCERPT_CHARS).collect();

    format!(
        "{position}. {name} — {location}\n   Dịch vụ: {service}\n   Giá: {price} | Độ phù hợp: {score:.2}\n   {excerpt}\n",
        name = result.voucher_name,
        location = result.location,
        score = result.similarity_score,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use voucher_search_core::{
        PriceInfo, PriceRange, RankingFactor, SearchMethod, ServiceCategory, ServiceInfo,
    };

    fn result(id: &str, name: &str, content: &str) -> SearchResult {
        SearchResult {
            voucher_id: id.to_string(),
            voucher_name: name.to_string(),
            content_snippet: content.to_string(),
            location: "Hải Phòng".to_string(),
            service_info: ServiceInfo {
                category: ServiceCategory::Restaurant,
                cuisine: Some("hải sản".to_string()),
                tags: vec![],
                has_kids_area: true,
                restaurant_type: None,
            },
            price_info: PriceInfo {
                amount: Some(250_000),
                range: PriceRange::MidRange,
            },
            target_audience: Some("family".to_string()),
            similarity_score: 0.82,
            raw_score: 0.51,
            ranking_factor: RankingFactor::ExactLocationMatch,
            search_method: SearchMethod::HybridSearch,
        }
    }

    #[test]
    fn test_char_heuristic() {
        let estimator = CharHeuristicEstimator;
        assert_eq!(estimator.estimate(""), 0);
        assert_eq!(estimator.estimate("abc"), 1);
        assert_eq!(estimator.estimate("abcd"), 2);
    }

    #[test]
    fn test_blocks_keep_retrieval_order() {
        let assembler = ContextAssembler::new(4_000, Box::new(CharHeuristicEstimator));
        let (context, included) = assembler.assemble(&[
            result("a", "Buffet Biển Đông", "mô tả a"),
            result("b", "Lẩu Phố Cảng", "mô tả b"),
        ]);

        assert_eq!(included, 2);
        let first = context.find("Buffet Biển Đông").unwrap();
        let second = context.find("Lẩu Phố Cảng").unwrap();
        assert!(first < second);
        assert!(context.contains("250000 VND"));
        assert!(context.contains("có khu vui chơi trẻ em"));
    }

    #[test]
    fn test_budget_cuts_off_tail() {
        // Each block is well over 20 tokens, so only one fits
        let assembler = ContextAssembler::new(60, Box::new(CharHeuristicEstimator));
        let long_content = "nội dung rất dài ".repeat(20);
        let (context, included) = assembler.assemble(&[
            result("a", "Quán Một", &long_content),
            result("b", "Quán Hai", &long_content),
        ]);

        assert_eq!(included, 1);
        assert!(context.contains("Quán Một"));
        assert!(!context.contains("Quán Hai"));
    }

    #[test]
    fn test_empty_results_empty_context() {
        let assembler = ContextAssembler::new(4_000, Box::new(CharHeuristicEstimator));
        let (context, included) = assembler.assemble(&[]);
        assert!(context.is_empty());
        assert_eq!(included, 0);
    }
}
