//! Mechanical result explanations
//!
//! One short Vietnamese paragraph per result, derived from the parsed
//! components and the re-ranker's chosen factor. No generation
//! involved; the text is fully templated.

use voucher_search_core::{Intent, QueryComponents, RankingFactor, SearchResult};

/// Render one explanation per result
pub fn explain_results(components: &QueryComponents, results: &[SearchResult]) -> Vec<String> {
    results
        .iter()
        .map(|result| explain_one(components, result))
        .collect()
}

fn explain_one(components: &QueryComponents, result: &SearchResult) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(match result.ranking_factor {
        RankingFactor::ExactLocationMatch => format!(
            "\"{}\" nằm đúng khu vực {} mà bạn tìm kiếm",
            result.voucher_name, result.location
        ),
        RankingFactor::NearbyLocationMatch => format!(
            "\"{}\" ở {}, lân cận khu vực bạn tìm kiếm",
            result.voucher_name, result.location
        ),
        RankingFactor::RegionalMatch => format!(
            "\"{}\" ở {}, cùng vùng với khu vực bạn tìm kiếm",
            result.voucher_name, result.location
        ),
        RankingFactor::SemanticMatch => format!(
            "\"{}\" được chọn vì nội dung phù hợp với câu hỏi của bạn",
            result.voucher_name
        ),
    });

    if let Some(need) = intent_need(components.intent) {
        parts.push(format!("phù hợp với nhu cầu {need}"));
    }
    if !components.service_requirements.is_empty() {
        parts.push(format!(
            "đáp ứng yêu cầu dịch vụ ({})",
            components.service_requirements.join(", ")
        ));
    }

    let mut text = parts.join(", ");
    text.push_str(&format!(
        ". Điểm phù hợp: {:.2}.",
        result.similarity_score
    ));
    text
}

fn intent_need(intent: Intent) -> Option<&'static str> {
    match intent {
        Intent::FindRestaurant => Some("ăn uống"),
        Intent::FindHotel => Some("lưu trú"),
        Intent::FindEntertainment => Some("vui chơi giải trí"),
        Intent::FindShopping => Some("mua sắm"),
        Intent::FindBeauty => Some("làm đẹp"),
        Intent::FindTravel => Some("du lịch"),
        Intent::FindKids => Some("vui chơi cho trẻ em"),
        Intent::General => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voucher_search_core::{
        PriceInfo, PriceRange, SearchMethod, ServiceCategory, ServiceInfo,
    };

    fn result(factor: RankingFactor) -> SearchResult {
        SearchResult {
            voucher_id: "v".to_string(),
            voucher_name: "Buffet Biển Đông".to_string(),
            content_snippet: "mô tả".to_string(),
            location: "Hải Phòng".to_string(),
            service_info: ServiceInfo {
                category: ServiceCategory::Restaurant,
                cuisine: None,
                tags: vec![],
                has_kids_area: true,
                restaurant_type: None,
            },
            price_info: PriceInfo {
                amount: Some(250_000),
                range: PriceRange::MidRange,
            },
            target_audience: None,
            similarity_score: 0.83,
            raw_score: 0.52,
            ranking_factor: factor,
            search_method: SearchMethod::HybridSearch,
        }
    }

    #[test]
    fn test_exact_match_explanation() {
        let mut components = QueryComponents::bare("q", "q", "q");
        components.intent = Intent::FindRestaurant;
        components.service_requirements.push("kids_area".to_string());

        let explanations =
            explain_results(&components, &[result(RankingFactor::ExactLocationMatch)]);
        assert_eq!(explanations.len(), 1);
        assert!(explanations[0].contains("đúng khu vực Hải Phòng"));
        assert!(explanations[0].contains("ăn uống"));
        assert!(explanations[0].contains("kids_area"));
        assert!(explanations[0].contains("0.83"));
    }

    #[test]
    fn test_semantic_match_explanation() {
        let components = QueryComponents::bare("q", "q", "q");
        let explanations = explain_results(&components, &[result(RankingFactor::SemanticMatch)]);
        assert!(explanations[0].contains("nội dung phù hợp"));
    }
}
