//! Prompt construction for grounded voucher answers
//!
//! The system prompt fixes the language (Vietnamese), the assistant
//! persona and the grounding rules: answer only from the provided
//! context, never invent vouchers, suggest at most one clarifying
//! follow-up question.

use voucher_search_core::{GenerateRequest, ResponseStyle};

/// Builds the system/user prompt pair for one answer
pub struct PromptBuilder {
    temperature: f32,
    max_tokens: usize,
}

impl PromptBuilder {
    pub fn new(temperature: f32, max_tokens: usize) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }

    /// Assemble the full request from query, context and style
    pub fn build(&self, query: &str, context: &str, style: ResponseStyle) -> GenerateRequest {
        let system = format!(
            "Bạn là trợ lý tư vấn ưu đãi của một nền tảng thương mại Việt Nam. \
             Luôn trả lời bằng tiếng Việt, thân thiện và ngắn gọn.\n\n\
             Quy tắc bắt buộc:\n\
             - Chỉ dùng thông tin trong phần \"Danh sách ưu đãi\" bên dưới.\n\
             - Không bao giờ bịa ra ưu đãi không có trong danh sách.\n\
             - Nếu thiếu thông tin, nói rõ là chưa có và gợi ý tối đa một câu hỏi làm rõ.\n\n\
             Cách trình bày:\n{}",
            style_guidance(style)
        );

        let user = format!(
            "Câu hỏi của khách: {query}\n\nDanh sách ưu đãi:\n{context}"
        );

        GenerateRequest::new(system, user)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

/// Formatting hint per response style; presentation only
fn style_guidance(style: ResponseStyle) -> &'static str {
    match style {
        ResponseStyle::LocationFocused => {
            "- Nhóm các gợi ý theo khu vực, nêu rõ địa điểm của từng ưu đãi.\n\
             - Dùng gạch đầu dòng, mỗi ưu đãi một dòng."
        }
        ResponseStyle::ServiceFocused => {
            "- Nhấn mạnh loại dịch vụ và tiện ích phù hợp với yêu cầu.\n\
             - Dùng gạch đầu dòng, mỗi ưu đãi một dòng."
        }
        ResponseStyle::TargetFocused => {
            "- Nhấn mạnh mức độ phù hợp với nhóm khách (gia đình, cặp đôi, trẻ em).\n\
             - Dùng gạch đầu dòng, mỗi ưu đãi một dòng."
        }
        ResponseStyle::General => {
            "- Trả lời tự nhiên theo đoạn văn ngắn, tối đa ba gợi ý nổi bật."
        }
    }
}
