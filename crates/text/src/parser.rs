//! Query parser
//!
//! Turns a raw Vietnamese query into its parsed components: intent,
//! location, service requirements, target audience, price preference,
//! keywords and an overall confidence score. Parsing never fails; a
//! query that matches nothing simply comes back as a low-confidence
//! `general` parse.

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use voucher_search_core::{Intent, PriceRange, QueryComponents};

use crate::lexicon;
use crate::locations::LocationRegistry;
use crate::normalizer::{normalize, strip_diacritics};

/// Score added when every word of a pattern occurs in the text
const PATTERN_MATCH_SCORE: f32 = 0.30;
/// Extra score when the pattern occurs as a contiguous phrase
const EXACT_SUBSTRING_SCORE: f32 = 0.20;

/// Cue phrases announcing a location, stripped spellings
static LOCATION_CUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)(?:tai|o|gan|quanh|trong|khu vuc)\s+([a-z0-9][a-z0-9 ]{1,40})")
        .expect("location cue regex")
});

/// Vietnamese query parser
pub struct QueryParser {
    registry: Arc<LocationRegistry>,
}

impl QueryParser {
    pub fn new(registry: Arc<LocationRegistry>) -> Self {
        Self { registry }
    }

    /// Normalization only, for vector mode
    pub fn normalize_only(&self, raw: &str) -> QueryComponents {
        let forms = normalize(raw);
        QueryComponents::bare(raw, &forms.normalized, &forms.stripped)
    }

    /// Full parse
    pub fn parse(&self, raw: &str) -> QueryComponents {
        let forms = normalize(raw);
        let normalized_tokens: Vec<&str> = forms.normalized.unicode_words().collect();
        let stripped_tokens: Vec<&str> = forms.stripped.unicode_words().collect();

        let (intent, intent_score) = self.detect_intent(&normalized_tokens, &stripped_tokens);

        let mut consumed: HashSet<String> = HashSet::new();
        let location = self.extract_location(&forms.stripped, &mut consumed);

        let service_requirements =
            self.match_service_tags(&normalized_tokens, &stripped_tokens, &mut consumed);
        let target_audience =
            self.match_target_audience(&normalized_tokens, &stripped_tokens, &mut consumed);
        let price_preference =
            self.match_price_cue(&normalized_tokens, &stripped_tokens, &mut consumed);

        let keywords = self.extract_keywords(&stripped_tokens, &consumed);

        let location_signal = if location.is_some() { 1.0 } else { 0.0 };
        let keyword_signal = if keywords.is_empty() { 0.0 } else { 1.0 };
        let confidence =
            (0.5 * intent_score + 0.3 * location_signal + 0.2 * keyword_signal).min(1.0);

        tracing::debug!(
            intent = %intent,
            location = ?location,
            services = service_requirements.len(),
            confidence,
            "query parsed"
        );

        QueryComponents {
            original: raw.to_string(),
            normalized: forms.normalized,
            stripped: forms.stripped,
            intent,
            location,
            service_requirements,
            target_audience,
            price_preference,
            keywords,
            confidence,
        }
    }

    /// Score every detectable intent and take the argmax
    ///
    /// Ties fall to the lexical order of intent names; an all-zero
    /// board means `general`.
    fn detect_intent(
        &self,
        normalized_tokens: &[&str],
        stripped_tokens: &[&str],
    ) -> (Intent, f32) {
        let mut best = (Intent::General, 0.0f32);

        for intent in Intent::detectable() {
            let mut score = 0.0f32;
            for pattern in lexicon::intent_patterns(intent) {
                score += pattern_score(pattern, normalized_tokens);
                score += pattern_score(&strip_diacritics(pattern), stripped_tokens);
            }
            let score = score.min(1.0);
            if score > best.1 {
                best = (intent, score);
            }
        }

        best
    }

    /// Location extraction: ordered cue-phrase regexes first, then a
    /// direct surface-form scan over the whole query
    fn extract_location(
        &self,
        stripped: &str,
        consumed: &mut HashSet<String>,
    ) -> Option<String> {
        for caps in LOCATION_CUE_RE.captures_iter(stripped) {
            let tail = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            if let Some(canonical) = self.registry.resolve(tail) {
                self.consume_surfaces(&canonical, consumed);
                return Some(canonical);
            }
        }

        let found = self.registry.find_in(stripped)?;
        self.consume_surfaces(&found.canonical, consumed);
        Some(found.canonical)
    }

    /// Mark every surface-form token of a canonical area as consumed
    fn consume_surfaces(&self, canonical: &str, consumed: &mut HashSet<String>) {
        for surface in self.registry.surfaces_of(canonical) {
            for token in surface.split(' ') {
                consumed.insert(token.to_string());
            }
        }
    }

    fn match_service_tags(
        &self,
        normalized_tokens: &[&str],
        stripped_tokens: &[&str],
        consumed: &mut HashSet<String>,
    ) -> Vec<String> {
        let mut tags = Vec::new();
        for (tag, phrases) in lexicon::service_tags() {
            for phrase in *phrases {
                if phrase_hits(phrase, normalized_tokens, stripped_tokens) {
                    if !tags.contains(&(*tag).to_string()) {
                        tags.push((*tag).to_string());
                    }
                    consume_phrase(phrase, consumed);
                }
            }
        }
        tags
    }

    fn match_target_audience(
        &self,
        normalized_tokens: &[&str],
        stripped_tokens: &[&str],
        consumed: &mut HashSet<String>,
    ) -> Option<String> {
        for (tag, phrases) in lexicon::target_tags() {
            for phrase in *phrases {
                if phrase_hits(phrase, normalized_tokens, stripped_tokens) {
                    consume_phrase(phrase, consumed);
                    return Some((*tag).to_string());
                }
            }
        }
        None
    }

    /// At most one price bracket cue
    fn match_price_cue(
        &self,
        normalized_tokens: &[&str],
        stripped_tokens: &[&str],
        consumed: &mut HashSet<String>,
    ) -> Option<PriceRange> {
        for (phrase, range) in lexicon::price_cues() {
            if phrase_hits(phrase, normalized_tokens, stripped_tokens) {
                consume_phrase(phrase, consumed);
                return Some(*range);
            }
        }
        None
    }

    /// Remaining tokens after stop words and consumed spans
    fn extract_keywords(
        &self,
        stripped_tokens: &[&str],
        consumed: &HashSet<String>,
    ) -> Vec<String> {
        let stops = lexicon::stop_words();
        let mut keywords = Vec::new();
        for token in stripped_tokens {
            if token.is_empty() || stops.contains(token) || consumed.contains(*token) {
                continue;
            }
            if !keywords.contains(&(*token).to_string()) {
                keywords.push((*token).to_string());
            }
        }
        keywords
    }
}

/// +0.30 when every word occurs, +0.20 more when contiguous
fn pattern_score(pattern: &str, tokens: &[&str]) -> f32 {
    let pattern_tokens: Vec<&str> = pattern.split(' ').collect();
    let mut score = 0.0;
    if pattern_tokens.iter().all(|t| tokens.contains(t)) {
        score += PATTERN_MATCH_SCORE;
        if contains_seq(tokens, &pattern_tokens) {
            score += EXACT_SUBSTRING_SCORE;
        }
    }
    score
}

/// Whether the phrase matches either form, token-aligned
fn phrase_hits(phrase: &str, normalized_tokens: &[&str], stripped_tokens: &[&str]) -> bool {
    let phrase_tokens: Vec<&str> = phrase.split(' ').collect();
    if contains_seq(normalized_tokens, &phrase_tokens) {
        return true;
    }
    let stripped_phrase = strip_diacritics(phrase);
    let stripped_phrase_tokens: Vec<&str> = stripped_phrase.split(' ').collect();
    contains_seq(stripped_tokens, &stripped_phrase_tokens)
}

fn consume_phrase(phrase: &str, consumed: &mut HashSet<String>) {
    for token in strip_diacritics(phrase).split(' ') {
        consumed.insert(token.to_string());
    }
}

/// Contiguous token run containment
fn contains_seq(tokens: &[&str], phrase_tokens: &[&str]) -> bool {
    if phrase_tokens.is_empty() || phrase_tokens.len() > tokens.len() {
        return false;
    }
    tokens
        .windows(phrase_tokens.len())
        .any(|w| w == phrase_tokens)
}
