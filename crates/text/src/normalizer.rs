//! Text normalization
//!
//! Folds raw Vietnamese text to a canonical lowercase form and derives
//! a diacritic-free secondary form for fuzzy matching. Both passes are
//! pure and deterministic; empty input yields empty outputs.

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Punctuation retained because it delimits meaningful tokens
const KEPT_PUNCTUATION: [char; 8] = ['-', '.', ',', '(', ')', '[', ']', '/'];

/// Canonical and diacritic-free forms of one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    /// Lowercase, NFC, whitespace-collapsed; diacritics retained
    pub normalized: String,
    /// Same, with Vietnamese diacritics folded away
    pub stripped: String,
}

/// Normalize a raw string into its two canonical forms
pub fn normalize(raw: &str) -> NormalizedText {
    let mut cleaned = String::with_capacity(raw.len());

    for c in raw.nfc() {
        if c.is_control() {
            continue;
        }
        let lowered = c.to_lowercase();
        for lc in lowered {
            if lc.is_alphanumeric() || lc.is_whitespace() || KEPT_PUNCTUATION.contains(&lc) {
                cleaned.push(lc);
            } else {
                // Other punctuation splits tokens instead of gluing them
                cleaned.push(' ');
            }
        }
    }

    let normalized = collapse_whitespace(&cleaned);
    let stripped = strip_diacritics(&normalized);

    NormalizedText { normalized, stripped }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Fold Vietnamese diacritics through a fixed table
///
/// One input character always maps to one output character, so char
/// offsets are preserved between the two forms.
pub fn strip_diacritics(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// Analyzer tokens shared by matching, indexing and hashing: folded
/// form split on word boundaries, punctuation dropped
pub fn fold_tokens(text: &str) -> Vec<String> {
    strip_diacritics(&normalize(text).normalized)
        .unicode_words()
        .map(|w| w.to_string())
        .collect()
}

fn fold_char(c: char) -> char {
    match c {
        'à' | 'á' | 'ạ' | 'ả' | 'ã' | 'â' | 'ầ' | 'ấ' | 'ậ' | 'ẩ' | 'ẫ' | 'ă' | 'ằ'
        | 'ắ' | 'ặ' | 'ẳ' | 'ẵ' => 'a',
        'è' | 'é' | 'ẹ' | 'ẻ' | 'ẽ' | 'ê' | 'ề' | 'ế' | 'ệ' | 'ể' | 'ễ' => 'e',
        'ì' | 'í' | 'ị' | 'ỉ' | 'ĩ' => 'i',
        'ò' | 'ó' | 'ọ' | 'ỏ' | 'õ' | 'ô' | 'ồ' | 'ố' | 'ộ' | 'ổ' | 'ỗ' | 'ơ' | 'ờ'
        | 'ớ' | 'ợ' | 'ở' | 'ỡ' => 'o',
        'ù' | 'ú' | 'ụ' | 'ủ' | 'ũ' | 'ư' | 'ừ' | 'ứ' | 'ự' | 'ử' | 'ữ' => 'u',
        'ỳ' | 'ý' | 'ỵ' | 'ỷ' | 'ỹ' => 'y',
        'đ' => 'd',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_collapse() {
        let out = normalize("  Quán   Ăn  NGON ");
        assert_eq!(out.normalized, "quán ăn ngon");
        assert_eq!(out.stripped, "quan an ngon");
    }

    #[test]
    fn test_empty_input() {
        let out = normalize("");
        assert_eq!(out.normalized, "");
        assert_eq!(out.stripped, "");
    }

    #[test]
    fn test_punctuation_handling() {
        let out = normalize("buffet (hải sản) - 50% off!");
        // Kept delimiters survive, '%' and '!' become separators
        assert_eq!(out.normalized, "buffet (hải sản) - 50 off");
    }

    #[test]
    fn test_control_characters_removed() {
        let out = normalize("hà\u{0000}nội\u{0007}");
        assert_eq!(out.normalized, "hànội");
    }

    #[test]
    fn test_strip_diacritics_table() {
        assert_eq!(strip_diacritics("hải phòng"), "hai phong");
        assert_eq!(strip_diacritics("đà nẵng"), "da nang");
        assert_eq!(strip_diacritics("trẻ em"), "tre em");
        assert_eq!(strip_diacritics("already plain"), "already plain");
    }

    #[test]
    fn test_fold_preserves_char_count() {
        let input = "quán ăn tại hải phòng có chỗ cho trẻ em chơi";
        assert_eq!(input.chars().count(), strip_diacritics(input).chars().count());
    }

    #[test]
    fn test_fold_tokens_drop_punctuation() {
        assert_eq!(
            fold_tokens("buffet (hải sản), trẻ em chơi!"),
            vec!["buffet", "hai", "san", "tre", "em", "choi"]
        );
        assert_eq!(fold_tokens("khách sạn 5 sao"), vec!["khach", "san", "5", "sao"]);
        assert!(fold_tokens("").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let a = normalize("Cà Phê Sữa Đá");
        let b = normalize("Cà Phê Sữa Đá");
        assert_eq!(a, b);
    }
}
